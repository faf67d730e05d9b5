//! Pipeline configuration.
//!
//! Defaults reproduce the original preparation run: the Kaggle files live in
//! `./datasets/favorita/` and the window is `[2015-01-01, 2016-06-01)`.
//! A TOML file may override any field (dates as quoted `"YYYY-MM-DD"`
//! strings), and the CLI may override the file.

use chrono::NaiveDate;
use favorita_core::DateWindow;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the consolidated output when no `output_path` is given.
pub const DEFAULT_OUTPUT_FILE: &str = "favorita_consolidated.csv";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid date window: start {start} is not before end {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    #[error("unreadable path {}: {reason}", .path.display())]
    UnreadablePath { path: PathBuf, reason: String },

    #[error("config parse error: {0}")]
    Parse(String),
}

/// Everything needed to run the pipeline once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Folder holding the extracted Favorita CSV files.
    pub data_folder: PathBuf,
    /// Destination table. `.parquet` selects Parquet, anything else CSV.
    pub output_path: Option<PathBuf>,
    /// Inclusive lower bound.
    pub start_date: Option<NaiveDate>,
    /// Exclusive upper bound.
    pub end_date: Option<NaiveDate>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_folder: PathBuf::from("./datasets/favorita/"),
            output_path: None,
            start_date: NaiveDate::from_ymd_opt(2015, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2016, 6, 1),
        }
    }
}

impl PipelineConfig {
    /// Load a config from a TOML file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::UnreadablePath {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn window(&self) -> DateWindow {
        DateWindow::new(self.start_date, self.end_date)
    }

    /// Resolved destination: `output_path`, or the default file inside `data_folder`.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .clone()
            .unwrap_or_else(|| self.data_folder.join(DEFAULT_OUTPUT_FILE))
    }

    /// Check the window and the source folder before any data is read.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start >= end {
                return Err(ConfigError::InvalidWindow { start, end });
            }
        }

        let meta = std::fs::metadata(&self.data_folder).map_err(|e| ConfigError::UnreadablePath {
            path: self.data_folder.clone(),
            reason: e.to_string(),
        })?;
        if !meta.is_dir() {
            return Err(ConfigError::UnreadablePath {
                path: self.data_folder.clone(),
                reason: "not a directory".into(),
            });
        }
        Ok(())
    }
}
