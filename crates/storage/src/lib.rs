#![forbid(unsafe_code)]

pub mod action_log;
pub mod config;
pub mod csv;
pub mod error;
pub mod filename;
pub mod question_file;
pub mod response_file;

pub use action_log::ActionLogger;
pub use config::SurveyConfig;
pub use error::StorageError;
pub use question_file::{MAX_TABULAR_CHOICES, QuestionFileFormat, load_questions, save_questions};
pub use response_file::{OutputFormat, save_responses};
