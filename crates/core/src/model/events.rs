/// Maximum number of characters of reason text recorded in the action log.
///
/// Logging-only truncation; the stored `Response` keeps the full text.
pub const REASON_PREVIEW_LEN: usize = 100;

/// Kinds of respondent actions recorded in the action log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    ChoiceSelection,
    ReasonStart,
    ReasonText,
    ReasonRewrite,
    QuestionMove,
    Submit,
}

/// A single respondent action emitted by the session.
///
/// Question numbers are 1-based throughout, matching the display and the
/// exported files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionEvent {
    ChoiceSelection { question_num: usize, choice: String },
    ReasonStart { question_num: usize },
    ReasonText { question_num: usize, preview: String },
    ReasonRewrite { question_num: usize },
    QuestionMove { from: usize, to: usize },
    Submit,
}

impl ActionEvent {
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionEvent::ChoiceSelection { .. } => ActionKind::ChoiceSelection,
            ActionEvent::ReasonStart { .. } => ActionKind::ReasonStart,
            ActionEvent::ReasonText { .. } => ActionKind::ReasonText,
            ActionEvent::ReasonRewrite { .. } => ActionKind::ReasonRewrite,
            ActionEvent::QuestionMove { .. } => ActionKind::QuestionMove,
            ActionEvent::Submit => ActionKind::Submit,
        }
    }
}

/// Truncates reason text to `REASON_PREVIEW_LEN` characters for logging,
/// appending an ellipsis marker when anything was cut. Character-based so
/// multibyte text is never split.
#[must_use]
pub fn reason_preview(reason: &str) -> String {
    let mut chars = reason.char_indices();
    match chars.nth(REASON_PREVIEW_LEN) {
        None => reason.to_string(),
        Some((cut, _)) => format!("{}...", &reason[..cut]),
    }
}
