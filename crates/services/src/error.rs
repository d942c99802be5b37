//! Shared error types for the services crate.

use thiserror::Error;

use storage::StorageError;
use survey_core::model::{QuestionError, SessionError};

/// Errors emitted by `SurveyService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SurveyServiceError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `EditorService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EditorServiceError {
    #[error("no question at index {index} (have {len})")]
    OutOfRange { index: usize, len: usize },
    #[error("no questions to save")]
    Empty,
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
