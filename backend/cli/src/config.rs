use std::path::PathBuf;

use serde::Deserialize;

use pricelens_core::PricelensError;

/// pricelens runtime configuration.
///
/// Everything lives under one data directory:
/// `images/`, `labels/`, `classes.txt`, `crops/`.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// HTTP server bind address
    pub bind_address: String,
    /// HTTP server port
    pub port: u16,
    /// Root of the catalog data directory
    pub data_dir: PathBuf,
    /// OpenAI API key for the vision capability
    pub openai_api_key: Option<String>,
    /// Vision model id
    pub vision_model: String,
    /// Log level
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8000,
            data_dir: PathBuf::from("./data"),
            openai_api_key: None,
            vision_model: "gpt-4o-mini".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        Self {
            bind_address: std::env::var("PRICELENS_BIND").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PRICELENS_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            data_dir: std::env::var("PRICELENS_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
            vision_model: std::env::var("PRICELENS_VISION_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }

    pub fn images_dir(&self) -> PathBuf {
        self.data_dir.join("images")
    }

    pub fn labels_dir(&self) -> PathBuf {
        self.data_dir.join("labels")
    }

    pub fn classes_file(&self) -> PathBuf {
        self.data_dir.join("classes.txt")
    }

    pub fn crops_dir(&self) -> PathBuf {
        self.data_dir.join("crops")
    }

    /// A missing catalog is a deployment mistake, fatal at startup rather
    /// than surfacing per-request.
    pub fn validate(&self) -> Result<(), PricelensError> {
        for dir in [self.images_dir(), self.labels_dir()] {
            if !dir.is_dir() {
                return Err(PricelensError::ConfigError(format!(
                    "catalog directory does not exist: {}",
                    dir.display()
                )));
            }
        }
        if !self.classes_file().is_file() {
            return Err(PricelensError::ConfigError(format!(
                "class list does not exist: {}",
                self.classes_file().display()
            )));
        }
        Ok(())
    }
}
