use chrono::{DateTime, Utc};

/// A finalized answer for one question.
///
/// Created only by the session's advance step, immutable afterwards, and
/// removed only by a single step back. `question_num` is 1-based, matching
/// what respondents see and what the export formats record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub respondent_id: String,
    pub timestamp: DateTime<Utc>,
    pub question_num: usize,
    pub question_text: String,
    pub selected_choice: String,
    pub reason: String,
}
