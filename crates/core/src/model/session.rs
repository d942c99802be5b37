use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::model::events::{ActionEvent, reason_preview};
use crate::model::{Question, QuestionSet, Response};
use crate::time::Clock;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("cannot start a session with no questions")]
    EmptyQuestionSet,

    #[error("choice {choice:?} is not offered by the current question")]
    UnknownChoice { choice: String },

    #[error("choice is locked; rewrite the reason before changing it")]
    ChoiceLocked,

    #[error("no choice selected")]
    NoChoiceSelected,

    #[error("reason is empty")]
    NoReason,

    #[error("already at the first question")]
    AtStart,

    #[error("all questions already answered")]
    Completed,

    #[error("survey not finished: {answered} of {total} answered")]
    NotFinished { answered: usize, total: usize },
}

//
// ─── SESSION STATE ─────────────────────────────────────────────────────────────
//

/// Per-question phase of the commit-then-justify protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionPhase {
    AwaitingSelection,
    SelectedUnlocked,
    SelectedLocked,
}

/// Generates an opaque 8-character respondent id, stable for one session.
#[must_use]
pub fn new_respondent_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Drives one respondent through the question sequence.
///
/// A choice locks as soon as the respondent starts typing a reason for it and
/// stays locked until an explicit `rewrite`, which clears the reason and is
/// itself recorded. Every transition pushes `ActionEvent`s into an outbox the
/// caller drains into the action log.
pub struct SurveySession {
    respondent_id: String,
    questions: Arc<QuestionSet>,
    current: usize,
    selected_choice: Option<String>,
    reason_locked: bool,
    reason: String,
    responses: Vec<Response>,
    events: Vec<ActionEvent>,
    clock: Clock,
}

impl SurveySession {
    /// Create a session over a loaded question set.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyQuestionSet` if no questions were loaded.
    pub fn new(
        questions: Arc<QuestionSet>,
        respondent_id: impl Into<String>,
        clock: Clock,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::EmptyQuestionSet);
        }

        Ok(Self {
            respondent_id: respondent_id.into(),
            questions,
            current: 0,
            selected_choice: None,
            reason_locked: false,
            reason: String::new(),
            responses: Vec::new(),
            events: Vec::new(),
            clock,
        })
    }

    /// Convenience constructor with a fresh respondent id and the system clock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyQuestionSet` if no questions were loaded.
    pub fn start(questions: Arc<QuestionSet>) -> Result<Self, SessionError> {
        Self::new(questions, new_respondent_id(), Clock::default_clock())
    }

    #[must_use]
    pub fn respondent_id(&self) -> &str {
        &self.respondent_id
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn selected_choice(&self) -> Option<&str> {
        self.selected_choice.as_deref()
    }

    #[must_use]
    pub fn reason_locked(&self) -> bool {
        self.reason_locked
    }

    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    #[must_use]
    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    /// True once every question has been answered and the session is ready
    /// for `submit`.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.current >= self.questions.len()
    }

    #[must_use]
    pub fn phase(&self) -> QuestionPhase {
        match (&self.selected_choice, self.reason_locked) {
            (None, _) => QuestionPhase::AwaitingSelection,
            (Some(_), false) => QuestionPhase::SelectedUnlocked,
            (Some(_), true) => QuestionPhase::SelectedLocked,
        }
    }

    /// Takes all events emitted since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<ActionEvent> {
        std::mem::take(&mut self.events)
    }

    //
    // ─── INTENTS ───────────────────────────────────────────────────────────────
    //

    /// Select (or re-select) a choice for the current question.
    ///
    /// Clears any reason text already entered, so a selection always starts
    /// its justification from scratch.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::ChoiceLocked` while the reason is locked,
    /// `SessionError::UnknownChoice` if the choice is not offered, and
    /// `SessionError::Completed` once every question has been answered.
    /// State is unchanged on every error.
    pub fn select(&mut self, choice: &str) -> Result<(), SessionError> {
        if self.is_finished() {
            return Err(SessionError::Completed);
        }
        if self.reason_locked {
            return Err(SessionError::ChoiceLocked);
        }

        let offered = self
            .questions
            .get(self.current)
            .is_some_and(|q| q.has_choice(choice));
        if !offered {
            return Err(SessionError::UnknownChoice {
                choice: choice.to_string(),
            });
        }

        self.selected_choice = Some(choice.to_string());
        self.reason.clear();
        self.events.push(ActionEvent::ChoiceSelection {
            question_num: self.current + 1,
            choice: choice.to_string(),
        });
        Ok(())
    }

    /// Marks the start of reason entry, locking the current choice.
    ///
    /// Silent no-op when already locked or when no choice is selected; the
    /// session never locks without a selection even if the caller's input
    /// handling lets a keystroke through early.
    pub fn begin_justification(&mut self) {
        if self.reason_locked || self.selected_choice.is_none() {
            return;
        }
        self.reason_locked = true;
        self.events.push(ActionEvent::ReasonStart {
            question_num: self.current + 1,
        });
    }

    /// Replaces the reason text with the caller's current buffer, locking the
    /// choice on first use. Ignored while no choice is selected.
    pub fn type_justification(&mut self, text: &str) {
        if self.selected_choice.is_none() {
            return;
        }
        self.begin_justification();
        self.reason.clear();
        self.reason.push_str(text);
    }

    /// Discards the reason and unlocks the choice. The selection itself is
    /// retained. Idempotent: a no-op (and no event) while unlocked.
    pub fn rewrite(&mut self) {
        if !self.reason_locked {
            return;
        }
        self.reason.clear();
        self.reason_locked = false;
        self.events.push(ActionEvent::ReasonRewrite {
            question_num: self.current + 1,
        });
    }

    /// Finalizes the current answer and moves to the next question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoChoiceSelected` without a selection,
    /// `SessionError::NoReason` when the trimmed reason is empty, and
    /// `SessionError::Completed` past the last question. State is unchanged
    /// on every error.
    pub fn advance(&mut self) -> Result<(), SessionError> {
        if self.is_finished() {
            return Err(SessionError::Completed);
        }
        let Some(selected_choice) = self.selected_choice.clone() else {
            return Err(SessionError::NoChoiceSelected);
        };
        let reason = self.reason.trim().to_string();
        if reason.is_empty() {
            return Err(SessionError::NoReason);
        }

        let question_num = self.current + 1;
        let question_text = self
            .questions
            .get(self.current)
            .map(|q| q.text().to_string())
            .unwrap_or_default();

        self.events.push(ActionEvent::ReasonText {
            question_num,
            preview: reason_preview(&reason),
        });

        self.responses.push(Response {
            respondent_id: self.respondent_id.clone(),
            timestamp: self.clock.now(),
            question_num,
            question_text,
            selected_choice,
            reason,
        });

        self.current += 1;
        self.events.push(ActionEvent::QuestionMove {
            from: question_num,
            to: self.current + 1,
        });
        self.reset_question_state();
        Ok(())
    }

    /// Steps back to the previous question, discarding its recorded answer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AtStart` at the first question.
    pub fn retreat(&mut self) -> Result<(), SessionError> {
        if self.current == 0 {
            return Err(SessionError::AtStart);
        }

        let from = self.current + 1;
        self.current -= 1;
        self.responses.pop();
        self.events.push(ActionEvent::QuestionMove {
            from,
            to: self.current + 1,
        });
        self.reset_question_state();
        Ok(())
    }

    /// Finalizes the session and hands the ledger to the caller for flushing.
    ///
    /// Calling this twice is undefined by design; the caller is expected to
    /// treat submission as single-shot.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFinished` while questions remain.
    pub fn submit(&mut self) -> Result<&[Response], SessionError> {
        if !self.is_finished() {
            return Err(SessionError::NotFinished {
                answered: self.current,
                total: self.questions.len(),
            });
        }
        self.events.push(ActionEvent::Submit);
        Ok(&self.responses)
    }

    fn reset_question_state(&mut self) {
        self.selected_choice = None;
        self.reason_locked = false;
        self.reason.clear();
    }
}

impl fmt::Debug for SurveySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurveySession")
            .field("respondent_id", &self.respondent_id)
            .field("current", &self.current)
            .field("total_questions", &self.questions.len())
            .field("phase", &self.phase())
            .field("responses_len", &self.responses.len())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ActionKind, QuestionDraft, REASON_PREVIEW_LEN};
    use crate::time::{fixed_clock, fixed_now};

    fn color_session() -> SurveySession {
        let questions: QuestionSet = [
            ("Pick a color?", vec!["red", "blue"]),
            ("Pick a number?", vec!["one", "two", "three"]),
        ]
        .into_iter()
        .map(|(text, choices)| QuestionDraft::new(text, choices).validate().unwrap())
        .collect();

        SurveySession::new(Arc::new(questions), "resp0001", fixed_clock()).unwrap()
    }

    fn answer_current(session: &mut SurveySession, choice: &str, reason: &str) {
        session.select(choice).unwrap();
        session.type_justification(reason);
        session.advance().unwrap();
    }

    #[test]
    fn empty_question_set_is_rejected() {
        let err = SurveySession::start(Arc::new(QuestionSet::new())).unwrap_err();
        assert_eq!(err, SessionError::EmptyQuestionSet);
    }

    #[test]
    fn select_only_accepts_offered_choices() {
        let mut session = color_session();
        let err = session.select("green").unwrap_err();
        assert_eq!(
            err,
            SessionError::UnknownChoice {
                choice: "green".into()
            }
        );
        assert_eq!(session.phase(), QuestionPhase::AwaitingSelection);
    }

    #[test]
    fn locked_choice_cannot_be_changed() {
        let mut session = color_session();
        session.select("red").unwrap();
        session.type_justification("because");
        assert_eq!(session.phase(), QuestionPhase::SelectedLocked);

        let err = session.select("blue").unwrap_err();
        assert_eq!(err, SessionError::ChoiceLocked);
        assert_eq!(session.selected_choice(), Some("red"));
        assert_eq!(session.reason(), "because");
    }

    #[test]
    fn reselect_while_unlocked_clears_reason() {
        let mut session = color_session();
        session.select("red").unwrap();
        session.select("blue").unwrap();
        assert_eq!(session.selected_choice(), Some("blue"));
        assert_eq!(session.reason(), "");
        assert_eq!(session.phase(), QuestionPhase::SelectedUnlocked);
    }

    #[test]
    fn typing_without_selection_never_locks() {
        let mut session = color_session();
        session.begin_justification();
        session.type_justification("early keystroke");
        assert!(!session.reason_locked());
        assert_eq!(session.reason(), "");
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn rewrite_unlocks_and_clears_reason_but_keeps_selection() {
        let mut session = color_session();
        session.select("red").unwrap();
        session.type_justification("first attempt");
        session.rewrite();

        assert_eq!(session.phase(), QuestionPhase::SelectedUnlocked);
        assert_eq!(session.selected_choice(), Some("red"));
        assert_eq!(session.reason(), "");
        session.select("blue").unwrap();
        assert_eq!(session.selected_choice(), Some("blue"));
    }

    #[test]
    fn rewrite_while_unlocked_is_a_silent_noop() {
        let mut session = color_session();
        session.select("red").unwrap();
        session.drain_events();
        session.rewrite();
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn rewrite_then_advance_fails_without_retyping() {
        let mut session = color_session();
        session.select("red").unwrap();
        session.type_justification("I like red");
        session.rewrite();

        let err = session.advance().unwrap_err();
        assert_eq!(err, SessionError::NoReason);
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn advance_requires_selection_then_reason() {
        let mut session = color_session();
        assert_eq!(session.advance().unwrap_err(), SessionError::NoChoiceSelected);

        session.select("red").unwrap();
        assert_eq!(session.advance().unwrap_err(), SessionError::NoReason);

        session.type_justification("   \n ");
        assert_eq!(session.advance().unwrap_err(), SessionError::NoReason);
        assert_eq!(session.current_index(), 0);
        assert!(session.responses().is_empty());
    }

    #[test]
    fn advance_records_response_and_resets_state() {
        let mut session = color_session();
        session.select("red").unwrap();
        session.type_justification("  I like red  ");
        session.advance().unwrap();

        assert_eq!(session.current_index(), 1);
        assert_eq!(session.phase(), QuestionPhase::AwaitingSelection);
        assert_eq!(session.reason(), "");

        let response = &session.responses()[0];
        assert_eq!(response.respondent_id, "resp0001");
        assert_eq!(response.timestamp, fixed_now());
        assert_eq!(response.question_num, 1);
        assert_eq!(response.question_text, "Pick a color?");
        assert_eq!(response.selected_choice, "red");
        assert_eq!(response.reason, "I like red");
    }

    #[test]
    fn advance_emits_preview_then_move() {
        let mut session = color_session();
        session.select("red").unwrap();
        let long_reason = "r".repeat(REASON_PREVIEW_LEN + 5);
        session.type_justification(&long_reason);
        session.drain_events();
        session.advance().unwrap();

        let events = session.drain_events();
        assert_eq!(
            events,
            vec![
                ActionEvent::ReasonText {
                    question_num: 1,
                    preview: format!("{}...", "r".repeat(REASON_PREVIEW_LEN)),
                },
                ActionEvent::QuestionMove { from: 1, to: 2 },
            ]
        );
        assert_eq!(session.responses()[0].reason, long_reason);
    }

    #[test]
    fn selection_and_lock_emit_events_in_order() {
        let mut session = color_session();
        session.select("red").unwrap();
        session.type_justification("b");
        session.type_justification("be");

        let kinds: Vec<ActionKind> = session
            .drain_events()
            .iter()
            .map(ActionEvent::kind)
            .collect();
        assert_eq!(kinds, [ActionKind::ChoiceSelection, ActionKind::ReasonStart]);
    }

    #[test]
    fn retreat_pops_exactly_the_last_response() {
        let mut session = color_session();
        answer_current(&mut session, "red", "one down");
        answer_current(&mut session, "two", "two down");
        assert_eq!(session.responses().len(), 2);

        session.retreat().unwrap();
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.responses().len(), 1);
        assert_eq!(session.responses()[0].question_num, 1);
        assert_eq!(session.phase(), QuestionPhase::AwaitingSelection);
    }

    #[test]
    fn retreat_at_start_is_a_boundary_error() {
        let mut session = color_session();
        assert_eq!(session.retreat().unwrap_err(), SessionError::AtStart);
    }

    #[test]
    fn ledger_length_tracks_index_through_cycles() {
        let mut session = color_session();
        answer_current(&mut session, "red", "r1");
        assert_eq!(session.responses().len(), session.current_index());

        session.retreat().unwrap();
        assert_eq!(session.responses().len(), session.current_index());

        answer_current(&mut session, "blue", "r2");
        assert_eq!(session.responses().len(), session.current_index());

        answer_current(&mut session, "three", "r3");
        assert_eq!(session.responses().len(), session.current_index());
        assert!(session.is_finished());
    }

    #[test]
    fn advance_past_end_is_rejected() {
        let mut session = color_session();
        answer_current(&mut session, "red", "r1");
        answer_current(&mut session, "two", "r2");
        assert_eq!(session.advance().unwrap_err(), SessionError::Completed);
        assert_eq!(session.select("red").unwrap_err(), SessionError::Completed);
    }

    #[test]
    fn submit_requires_all_answers() {
        let mut session = color_session();
        answer_current(&mut session, "red", "r1");
        assert_eq!(
            session.submit().unwrap_err(),
            SessionError::NotFinished {
                answered: 1,
                total: 2
            }
        );
    }

    #[test]
    fn submit_returns_ledger_and_emits_event() {
        let mut session = color_session();
        answer_current(&mut session, "red", "r1");
        answer_current(&mut session, "two", "r2");
        session.drain_events();

        let responses = session.submit().unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(session.drain_events(), vec![ActionEvent::Submit]);
    }
}
