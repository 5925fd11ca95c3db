use std::{env, fs::read_to_string, path::{Path, PathBuf}};

use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

const API_BASE_URL_VAR: &str = "EJC_API_BASE_URL";
const DATA_DIR_VAR: &str = "EJC_DATA_DIR";

/// Json struct for client settings. Every field is optional.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Settings {
    /// Base URL of the REST API, including the `/api` prefix
    pub api_base_url: Option<String>,

    /// Directory for unsaved form drafts
    pub data_dir: Option<PathBuf>,

    /// Participants per page in listings
    pub page_size: Option<u32>,

    /// Largest photo or logo accepted for upload
    pub max_upload_bytes: Option<u64>,
}

impl Settings {
    /// Loads settings from `file` if given, then applies environment overrides.
    pub fn load(file: Option<&Path>) -> anyhow::Result<Self> {
        let mut settings = match file {
            Some(file) => serde_json::from_str::<Settings>(&read_to_string(file)?)?,
            None => Settings::default(),
        };

        if let Ok(url) = env::var(API_BASE_URL_VAR) {
            log::debug!("Using {} from environment", API_BASE_URL_VAR);
            settings.api_base_url = Some(url);
        }

        if let Ok(dir) = env::var(DATA_DIR_VAR) {
            log::debug!("Using {} from environment", DATA_DIR_VAR);
            settings.data_dir = Some(PathBuf::from(dir));
        }

        Ok(settings)
    }

    pub fn api_base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(".ejcdesk"))
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
            .unwrap_or(crate::core::participant::DEFAULT_PAGE_SIZE)
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES)
    }
}
