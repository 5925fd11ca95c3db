use std::path::Path;

use crate::error::Error;

/// A local image checked and read for upload.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct ImageFile {
    pub name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

fn image_mime(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

impl ImageFile {
    /// Checks type and size before anything is read or sent.
    pub fn open(path: &Path, max_bytes: u64) -> Result<Self, Error> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let mime = image_mime(path).ok_or_else(|| Error::NotAnImage(name.clone()))?;

        let size = std::fs::metadata(path)?.len();
        if size > max_bytes {
            return Err(Error::FileTooLarge {
                name,
                size,
                limit: max_bytes,
            });
        }

        let bytes = std::fs::read(path)?;
        Ok(ImageFile { name, mime, bytes })
    }
}
