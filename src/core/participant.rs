use serde::{Deserialize, Serialize};

use super::masks::{format_date_to_brazilian, format_phone};

/// A participant registered for the event.
#[derive(PartialEq, Eq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct Participant {
    /// Unique participant ID, allocated by the server
    pub id: i64,

    /// Full name
    pub name: String,

    /// The name this participant usually goes by
    pub common_name: Option<String>,

    /// Birth date as `YYYY-MM-DD`
    pub birth_date: Option<String>,

    pub instagram: Option<String>,
    pub address: Option<String>,
    pub neighborhood: Option<String>,
    pub email: Option<String>,

    /// 10 or 11 digits, no punctuation
    pub phone: Option<String>,

    /// Encoded `sacrament:status` pairs, see [`super::sections::Sacraments`]
    pub sacraments: Option<String>,

    /// Non-null (possibly empty) when the participant belongs to a church movement
    pub church_movement: Option<String>,
    pub church_movement_info: Option<String>,

    pub father_name: Option<String>,
    pub father_contact: Option<String>,
    pub mother_name: Option<String>,
    pub mother_contact: Option<String>,

    /// Whether the parents took part in ECC
    pub ecc_participant: Option<bool>,
    pub ecc_info: Option<String>,

    /// Dietary or medical restrictions
    pub has_restrictions: Option<bool>,
    pub restrictions_info: Option<String>,

    pub observations: Option<String>,

    /// Storage path or absolute URL of the participant photo
    pub photo_path: Option<String>,
}

impl Participant {
    pub fn birth_date_display(&self) -> String {
        format_date_to_brazilian(self.birth_date.as_deref())
    }

    pub fn phone_display(&self) -> String {
        format_phone(self.phone.as_deref())
    }

    /// The name used in report file names, e.g. `ficha_Maria_Silva.pdf`.
    pub fn report_file_name(&self) -> String {
        let name = self.name.split_whitespace().collect::<Vec<_>>().join("_");
        if name.is_empty() {
            "ficha_participante.pdf".to_owned()
        } else {
            format!("ficha_{}.pdf", name)
        }
    }
}

/// Request body for creating or updating a participant.
#[derive(PartialEq, Eq, Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ParticipantInput {
    pub name: String,
    pub common_name: Option<String>,
    pub birth_date: Option<String>,
    pub instagram: Option<String>,
    pub address: Option<String>,
    pub neighborhood: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub sacraments: Option<String>,
    pub church_movement: Option<String>,
    pub church_movement_info: Option<String>,
    pub father_name: Option<String>,
    pub father_contact: Option<String>,
    pub mother_name: Option<String>,
    pub mother_contact: Option<String>,
    pub ecc_participant: Option<bool>,
    pub ecc_info: Option<String>,
    pub has_restrictions: Option<bool>,
    pub restrictions_info: Option<String>,
    pub observations: Option<String>,
    pub photo_path: Option<String>,
}

/// Json struct returned by the participant listing
#[derive(PartialEq, Eq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct ParticipantList {
    pub participants: Vec<Participant>,
    pub total: u64,
}

/// Json struct returned by the photo and logo uploads
#[derive(PartialEq, Eq, Debug, Clone, Serialize, Deserialize)]
pub struct UploadedFile {
    pub filename: String,
    pub path: Option<String>,
    pub url: Option<String>,
}

impl UploadedFile {
    /// The reference to store in `photo_path`.
    pub fn stored_path(&self) -> &str {
        self.path.as_deref().unwrap_or(&self.filename)
    }
}

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// A one-based page of the participant listing
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

impl Page {
    pub fn new(number: u32, size: u32) -> Self {
        Page {
            number: number.max(1),
            size: size.max(1),
        }
    }

    pub fn skip(&self) -> u64 {
        (self.number as u64 - 1) * self.size as u64
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.size as u64).max(1)
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::new(1, DEFAULT_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_math() {
        let page = Page::new(3, 10);
        assert_eq!(page.skip(), 20);
        assert_eq!(page.total_pages(0), 1);
        assert_eq!(page.total_pages(10), 1);
        assert_eq!(page.total_pages(11), 2);

        assert_eq!(Page::new(0, 0), Page::new(1, 1));
        assert_eq!(Page::default().skip(), 0);
    }

    #[test]
    fn test_participant_json() {
        let json = r#"{
            "id": 7,
            "name": "Maria Silva",
            "birth_date": "2005-03-09",
            "phone": "11987654321",
            "ecc_participant": true,
            "ecc_info": "Parents in 2001",
            "photo_path": null
        }"#;

        let participant: Participant = serde_json::from_str(json).unwrap();
        assert_eq!(participant.id, 7);
        assert_eq!(participant.common_name, None);
        assert_eq!(participant.ecc_participant, Some(true));
        assert_eq!(participant.birth_date_display(), "09/03/2005");
        assert_eq!(participant.phone_display(), "(11) 98765-4321");
        assert_eq!(participant.report_file_name(), "ficha_Maria_Silva.pdf");
    }

    #[test]
    fn test_uploaded_file_path_fallback() {
        let uploaded: UploadedFile =
            serde_json::from_str(r#"{"filename": "abc.jpg"}"#).unwrap();
        assert_eq!(uploaded.stored_path(), "abc.jpg");

        let uploaded: UploadedFile = serde_json::from_str(
            r#"{"filename": "abc.jpg", "path": "photos/abc.jpg", "url": "https://cdn/abc.jpg"}"#,
        )
        .unwrap();
        assert_eq!(uploaded.stored_path(), "photos/abc.jpg");
    }
}
