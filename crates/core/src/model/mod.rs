mod events;
mod question;
mod response;
mod session;

pub use events::{ActionEvent, ActionKind, REASON_PREVIEW_LEN, reason_preview};
pub use question::{MAX_CHOICES, MIN_CHOICES, Question, QuestionDraft, QuestionError, QuestionSet};
pub use response::Response;
pub use session::{QuestionPhase, SessionError, SurveySession, new_respondent_id};
