use thiserror::Error;

use crate::core::form::ValidationErrors;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid form: {0}")]
    Validation(ValidationErrors),

    #[error("A submission is already in progress")]
    Busy,

    #[error("API request failed ({status}): {}", .detail.as_deref().unwrap_or("no detail"))]
    Api {
        status: u16,
        detail: Option<String>,
    },

    #[error("Complete PDF generation is unavailable in this environment, use individual PDFs or run the API locally")]
    CompletePdfUnavailable,

    #[error("File {name} is {size} bytes, the limit is {limit} bytes")]
    FileTooLarge { name: String, size: u64, limit: u64 },

    #[error("File {0} is not an image")]
    NotAnImage(String),

    #[error("Invalid API base URL: {0}")]
    BaseUrl(#[from] url::ParseError),

    #[error("HTTP Error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Message to show to a user, preferring the server's detail text over `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Error::Api {
                detail: Some(detail),
                ..
            } => detail.clone(),
            Error::Api { .. } | Error::Http(_) => fallback.to_owned(),
            other => other.to_string(),
        }
    }
}
