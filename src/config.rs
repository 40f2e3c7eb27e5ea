//! Report configuration, read from an optional JSON file.

use crate::data::DEFAULT_TIMESTAMP_COLUMN;
use crate::stats::EventWindow;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Source of the event CSV.
pub const DEFAULT_DATA_URL: &str =
    "https://raw.githubusercontent.com/jasonchang0102/Streamlit0102/main/RAWBliz.csv";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Window '{0}' ends before it starts")]
    InvertedWindow(String),
    #[error("Expected exactly two event windows, found {0}")]
    WindowCount(usize),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub data_url: String,
    pub timestamp_column: String,
    pub output_dir: PathBuf,
    pub render_charts: bool,
    pub windows: Vec<EventWindow>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            data_url: DEFAULT_DATA_URL.to_string(),
            timestamp_column: DEFAULT_TIMESTAMP_COLUMN.to_string(),
            output_dir: PathBuf::from("output"),
            render_charts: true,
            windows: EventWindow::defaults(),
        }
    }
}

impl ReportConfig {
    /// Read a JSON config; missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text).map_err(|e| match e {
            ConfigError::Json { source, .. } => ConfigError::Json {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|source| ConfigError::Json {
            path: "<inline>".to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.windows.len() != 2 {
            return Err(ConfigError::WindowCount(self.windows.len()));
        }
        match self.windows.iter().find(|w| w.end < w.start) {
            Some(w) => Err(ConfigError::InvertedWindow(w.name.clone())),
            None => Ok(()),
        }
    }
}
