use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StorageError;
use crate::filename;
use crate::response_file::OutputFormat;

/// Default file name for the persisted configuration.
pub const CONFIG_FILE: &str = "config.json";

/// Configuration consumed by the survey core.
///
/// Constructed once and passed by reference into the session runner; no
/// component reads settings ambiently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyConfig {
    pub questions_directory: PathBuf,
    pub questions_file: String,
    pub log_directory: PathBuf,
    pub log_name_format: String,
    pub response_directory: PathBuf,
    pub response_name_format: String,
    pub output_format: OutputFormat,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            questions_directory: PathBuf::from("data/questions"),
            questions_file: "sample_questions.csv".to_string(),
            log_directory: PathBuf::from("data/logs"),
            log_name_format: "action_log_{respondent_id}_{date}.csv".to_string(),
            response_directory: PathBuf::from("data/responses"),
            response_name_format: "responses_{respondent_id}_{date}.csv".to_string(),
            output_format: OutputFormat::Csv,
        }
    }
}

impl SurveyConfig {
    /// Loads the config file, merging present fields over the defaults.
    ///
    /// A missing or malformed file yields the defaults.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_else(|err| {
            warn!(path = %path.display(), %err, "malformed config; using defaults");
            Self::default()
        })
    }

    /// Persists the configuration as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Full path of the question file, or `None` when either part is unset.
    #[must_use]
    pub fn questions_path(&self) -> Option<PathBuf> {
        if self.questions_directory.as_os_str().is_empty() || self.questions_file.is_empty() {
            return None;
        }
        Some(self.questions_directory.join(&self.questions_file))
    }

    /// Resolved action-log path for one session.
    #[must_use]
    pub fn log_path(&self, now: DateTime<Utc>, respondent_id: &str) -> PathBuf {
        filename::resolve(
            &self.log_name_format,
            &dir_or_cwd(&self.log_directory),
            now,
            Some(respondent_id),
        )
    }

    /// Resolved response-file path for one session.
    #[must_use]
    pub fn response_path(&self, now: DateTime<Utc>, respondent_id: &str) -> PathBuf {
        filename::resolve(
            &self.response_name_format,
            &dir_or_cwd(&self.response_directory),
            now,
            Some(respondent_id),
        )
    }

    /// Creates the question, log, and response directories if missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if a directory cannot be created.
    pub fn ensure_directories(&self) -> Result<(), StorageError> {
        for dir in [
            &self.questions_directory,
            &self.log_directory,
            &self.response_directory,
        ] {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        Ok(())
    }
}

fn dir_or_cwd(dir: &Path) -> PathBuf {
    if dir.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        dir.to_path_buf()
    }
}
