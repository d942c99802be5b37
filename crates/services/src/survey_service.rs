use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::warn;

use storage::StorageError;
use storage::action_log::ActionLogger;
use storage::config::SurveyConfig;
use storage::response_file::save_responses;
use survey_core::Clock;
use survey_core::model::{
    Question, QuestionPhase, QuestionSet, Response, SessionError, SurveySession, new_respondent_id,
};

use crate::error::SurveyServiceError;

/// Files written by a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub files: Vec<PathBuf>,
    pub total_responses: usize,
}

/// Runs one respondent session end to end.
///
/// Wires a `SurveySession` to the action log and the response writer: every
/// intent is forwarded to the session and the emitted events are drained
/// into the log before the call returns. The presentation layer calls only
/// this surface and guarantees single-threaded call ordering.
pub struct SurveyService {
    config: SurveyConfig,
    session: SurveySession,
    logger: ActionLogger,
    clock: Clock,
}

impl SurveyService {
    /// Starts a session with a fresh respondent id.
    ///
    /// # Errors
    ///
    /// Returns `SurveyServiceError::Session` for an empty question set and
    /// `SurveyServiceError::Storage` if the action log cannot be created.
    pub fn start(
        config: SurveyConfig,
        questions: QuestionSet,
        clock: Clock,
    ) -> Result<Self, SurveyServiceError> {
        Self::with_respondent(config, questions, new_respondent_id(), clock)
    }

    /// Starts a session for a known respondent id (tests, resumed runs).
    ///
    /// # Errors
    ///
    /// Same as [`SurveyService::start`].
    pub fn with_respondent(
        config: SurveyConfig,
        questions: QuestionSet,
        respondent_id: String,
        clock: Clock,
    ) -> Result<Self, SurveyServiceError> {
        let session = SurveySession::new(Arc::new(questions), respondent_id, clock)?;
        let log_path = config.log_path(clock.now(), session.respondent_id());
        let logger = ActionLogger::create(log_path)?;

        Ok(Self {
            config,
            session,
            logger,
            clock,
        })
    }

    #[must_use]
    pub fn respondent_id(&self) -> &str {
        self.session.respondent_id()
    }

    #[must_use]
    pub fn log_path(&self) -> &Path {
        self.logger.path()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.session.current_question()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.session.current_index()
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.session.total_questions()
    }

    #[must_use]
    pub fn phase(&self) -> QuestionPhase {
        self.session.phase()
    }

    #[must_use]
    pub fn selected_choice(&self) -> Option<&str> {
        self.session.selected_choice()
    }

    #[must_use]
    pub fn reason_locked(&self) -> bool {
        self.session.reason_locked()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.session.is_finished()
    }

    #[must_use]
    pub fn responses(&self) -> &[Response] {
        self.session.responses()
    }

    //
    // ─── INTENTS ───────────────────────────────────────────────────────────────
    //

    /// Select a choice for the current question.
    ///
    /// # Errors
    ///
    /// Forwards `SessionError` unchanged; state and log are untouched on
    /// failure.
    pub fn select(&mut self, choice: &str) -> Result<(), SessionError> {
        let result = self.session.select(choice);
        self.flush_events();
        result
    }

    /// Mark the start of reason entry, locking the current choice.
    pub fn begin_justification(&mut self) {
        self.session.begin_justification();
        self.flush_events();
    }

    /// Forward the respondent's current reason text, locking the choice on
    /// the first keystroke.
    pub fn type_justification(&mut self, text: &str) {
        self.session.type_justification(text);
        self.flush_events();
    }

    /// Discard the reason and unlock the choice.
    pub fn rewrite(&mut self) {
        self.session.rewrite();
        self.flush_events();
    }

    /// Finalize the current answer and move on.
    ///
    /// # Errors
    ///
    /// Forwards `SessionError` unchanged.
    pub fn advance(&mut self) -> Result<(), SessionError> {
        let result = self.session.advance();
        self.flush_events();
        result
    }

    /// Step back one question, discarding its recorded answer.
    ///
    /// # Errors
    ///
    /// Forwards `SessionError` unchanged.
    pub fn retreat(&mut self) -> Result<(), SessionError> {
        let result = self.session.retreat();
        self.flush_events();
        result
    }

    /// Flush the ledger to the configured output format(s).
    ///
    /// On an I/O failure the in-memory ledger is intact and `submit` may be
    /// called again; the retry appends another SUBMIT row to the action log,
    /// which records attempted actions, not only completed ones.
    ///
    /// # Errors
    ///
    /// Returns `SurveyServiceError::Session` while questions remain and
    /// `SurveyServiceError::Storage` if the response files cannot be written.
    pub fn submit(&mut self) -> Result<SubmitOutcome, SurveyServiceError> {
        let responses = self.session.submit()?.to_vec();
        self.flush_events();

        let now = self.clock.now();
        let resolved = self.config.response_path(now, self.session.respondent_id());
        if let Some(parent) = resolved.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(StorageError::from)?;
            }
        }

        let base = resolved.with_extension("");
        let files = save_responses(&base, self.config.output_format, &responses, now)?;
        Ok(SubmitOutcome {
            files,
            total_responses: responses.len(),
        })
    }

    /// Drains session events into the action log. Best-effort: a failed
    /// append is reported and never aborts the action that produced it.
    fn flush_events(&mut self) {
        let now = self.clock.now();
        for event in self.session.drain_events() {
            if let Err(err) = self.logger.log(now, &event) {
                warn!(%err, path = %self.logger.path().display(), "dropping action log row");
            }
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
