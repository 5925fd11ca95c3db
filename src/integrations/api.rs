use reqwest::{multipart, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use url::Url;

use crate::{
    core::participant::{Page, Participant, ParticipantInput, ParticipantList, UploadedFile},
    error::Error,
};

use super::upload::ImageFile;

/// Error body returned by the API
#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Client for the participant REST API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, Error> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(ApiClient {
            http: reqwest::Client::new(),
            base,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base.join(path)?)
    }

    /// Turns non-success responses into [`Error::Api`], keeping the server's detail text.
    async fn check(response: Response) -> Result<Response, Error> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .map(|e| match e.detail {
                serde_json::Value::String(detail) => detail,
                other => other.to_string(),
            });

        log::warn!(
            "API returned {}: {}",
            status,
            detail.as_deref().unwrap_or("no detail")
        );
        Err(Error::Api {
            status: status.as_u16(),
            detail,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let response = self.http.get(self.url(path)?).send().await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn get_bytes(&self, path: &str) -> Result<Vec<u8>, Error> {
        let response = self.http.get(self.url(path)?).send().await?;
        Ok(Self::check(response).await?.bytes().await?.to_vec())
    }

    async fn upload(&self, path: &str, image: &ImageFile) -> Result<UploadedFile, Error> {
        let part = multipart::Part::bytes(image.bytes.clone())
            .file_name(image.name.clone())
            .mime_str(image.mime)?;
        let form = multipart::Form::new().part("file", part);

        log::info!("Uploading {} ({} bytes)", image.name, image.bytes.len());
        let response = self
            .http
            .post(self.url(path)?)
            .multipart(form)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn health(&self) -> Result<serde_json::Value, Error> {
        self.get_json("health").await
    }

    /// Lists one page of participants, optionally filtered by `search`.
    pub async fn list(&self, page: Page, search: Option<&str>) -> Result<ParticipantList, Error> {
        let mut query = vec![
            ("skip", page.skip().to_string()),
            ("limit", page.size.to_string()),
        ];
        if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
            query.push(("search", search.to_owned()));
        }

        let response = self
            .http
            .get(self.url("participants")?)
            .query(&query)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn get(&self, id: i64) -> Result<Participant, Error> {
        self.get_json(&format!("participants/{}", id)).await
    }

    pub async fn create(&self, participant: &ParticipantInput) -> Result<Participant, Error> {
        log::debug!("Creating participant {}", participant.name);
        let response = self
            .http
            .post(self.url("participants")?)
            .json(participant)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn update(&self, id: i64, participant: &ParticipantInput) -> Result<Participant, Error> {
        log::debug!("Updating participant {} ({})", participant.name, id);
        let response = self
            .http
            .put(self.url(&format!("participants/{}", id))?)
            .json(participant)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), Error> {
        log::debug!("Deleting participant {}", id);
        let response = self
            .http
            .delete(self.url(&format!("participants/{}", id))?)
            .send()
            .await?;
        Self::check(response).await.map(|_| ())
    }

    pub async fn upload_photo(&self, image: &ImageFile) -> Result<UploadedFile, Error> {
        self.upload("photos/upload", image).await
    }

    /// URL for a stored photo. Paths that already are http(s) URLs are used as-is.
    pub fn photo_url(&self, path: Option<&str>) -> Option<String> {
        let path = path.filter(|p| !p.is_empty())?;
        if path.starts_with("https://") || path.starts_with("http://") {
            Some(path.to_owned())
        } else {
            Some(format!("{}/photos/{}", self.base_url(), path))
        }
    }

    pub async fn individual_pdf(&self, id: i64) -> Result<Vec<u8>, Error> {
        self.get_bytes(&format!("pdf/participant/{}", id)).await
    }

    pub async fn complete_pdf(&self) -> Result<Vec<u8>, Error> {
        match self.get_bytes("pdf/complete").await {
            Err(Error::Api { status, .. }) if status == StatusCode::SERVICE_UNAVAILABLE.as_u16() => {
                Err(Error::CompletePdfUnavailable)
            }
            other => other,
        }
    }

    pub async fn upload_logo(&self, image: &ImageFile) -> Result<UploadedFile, Error> {
        self.upload("logo/upload", image).await
    }

    pub async fn logo(&self) -> Result<Vec<u8>, Error> {
        self.get_bytes("logo").await
    }

    pub async fn delete_logo(&self) -> Result<(), Error> {
        let response = self.http.delete(self.url("logo")?).send().await?;
        Self::check(response).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::fake::spawn_fake_api;

    fn image() -> ImageFile {
        ImageFile {
            name: "photo.png".to_owned(),
            mime: "image/png",
            bytes: vec![0x89, b'P', b'N', b'G'],
        }
    }

    #[test]
    fn test_photo_url() {
        let client = ApiClient::new("http://localhost:8000/api").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000/api");
        assert_eq!(client.photo_url(None), None);
        assert_eq!(client.photo_url(Some("")), None);
        assert_eq!(
            client.photo_url(Some("abc.jpg")).as_deref(),
            Some("http://localhost:8000/api/photos/abc.jpg")
        );
        assert_eq!(
            client.photo_url(Some("https://cdn.example.org/abc.jpg")).as_deref(),
            Some("https://cdn.example.org/abc.jpg")
        );
    }

    #[test]
    fn test_base_url_with_trailing_slash() {
        let client = ApiClient::new("http://localhost:8000/api/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000/api");
        assert!(ApiClient::new("not a url").is_err());
    }

    #[tokio::test]
    async fn test_participant_crud() {
        let client = ApiClient::new(&spawn_fake_api()).unwrap();

        let list = client.list(Page::new(2, 10), Some("  ")).await.unwrap();
        assert_eq!(list.total, 1);
        assert_eq!(list.participants[0].name, "skip=10 limit=10 search=");

        let list = client.list(Page::default(), Some("maria")).await.unwrap();
        assert_eq!(list.participants[0].name, "skip=0 limit=10 search=maria");

        let participant = client.get(7).await.unwrap();
        assert_eq!(participant.name, "Maria Silva");

        let input = ParticipantInput {
            name: "Ana".to_owned(),
            phone: Some("11987654321".to_owned()),
            ..Default::default()
        };
        let created = client.create(&input).await.unwrap();
        assert_eq!(created.id, 42);
        assert_eq!(created.phone.as_deref(), Some("11987654321"));

        let updated = client.update(7, &input).await.unwrap();
        assert_eq!(updated.id, 7);
        assert_eq!(updated.name, "Ana");

        client.delete(7).await.unwrap();
    }

    #[tokio::test]
    async fn test_api_error_detail() {
        let client = ApiClient::new(&spawn_fake_api()).unwrap();

        match client.get(404).await {
            Err(Error::Api { status, detail }) => {
                assert_eq!(status, 404);
                assert_eq!(detail.as_deref(), Some("Participante não encontrado"));
            }
            other => panic!("Expected API error, got {:?}", other),
        }

        match client.delete(500).await {
            Err(Error::Api { status, detail }) => {
                assert_eq!(status, 500);
                assert_eq!(detail, None);
            }
            other => panic!("Expected API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_pdfs() {
        let client = ApiClient::new(&spawn_fake_api()).unwrap();

        assert_eq!(client.individual_pdf(7).await.unwrap(), b"%PDF-7".to_vec());
        assert!(matches!(
            client.complete_pdf().await,
            Err(Error::CompletePdfUnavailable)
        ));
    }

    #[tokio::test]
    async fn test_uploads_and_logo() {
        let client = ApiClient::new(&spawn_fake_api()).unwrap();

        let uploaded = client.upload_photo(&image()).await.unwrap();
        assert_eq!(uploaded.stored_path(), "photos/photo.png");

        let uploaded = client.upload_logo(&image()).await.unwrap();
        assert_eq!(uploaded.filename, "logo.png");

        assert_eq!(client.logo().await.unwrap(), b"LOGO".to_vec());
        client.delete_logo().await.unwrap();

        assert_eq!(client.health().await.unwrap()["status"], "ok");
    }
}
