#![forbid(unsafe_code)]

pub mod editor_service;
pub mod error;
pub mod survey_service;

pub use survey_core::Clock;

pub use editor_service::EditorService;
pub use error::{EditorServiceError, SurveyServiceError};
pub use survey_service::{SubmitOutcome, SurveyService};
