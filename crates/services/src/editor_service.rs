use std::path::Path;

use chrono::{DateTime, Utc};

use storage::question_file::{QuestionFileFormat, load_questions, save_questions};
use survey_core::model::{Question, QuestionDraft, QuestionSet};

use crate::error::EditorServiceError;

/// Authoring surface: a mutable working list of questions that is loaded
/// from and saved to question files.
#[derive(Debug, Default)]
pub struct EditorService {
    questions: Vec<Question>,
}

impl EditorService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Validates and appends a question.
    ///
    /// # Errors
    ///
    /// Returns `EditorServiceError::Question` for an empty text or a choice
    /// count outside the allowed range.
    pub fn add(&mut self, draft: QuestionDraft) -> Result<(), EditorServiceError> {
        self.questions.push(draft.validate()?);
        Ok(())
    }

    /// Removes and returns the question at `index`.
    ///
    /// # Errors
    ///
    /// Returns `EditorServiceError::OutOfRange` for an invalid index.
    pub fn remove(&mut self, index: usize) -> Result<Question, EditorServiceError> {
        self.check_index(index)?;
        Ok(self.questions.remove(index))
    }

    /// Swaps the question at `index` with its predecessor. Returns false
    /// when it is already first.
    ///
    /// # Errors
    ///
    /// Returns `EditorServiceError::OutOfRange` for an invalid index.
    pub fn move_up(&mut self, index: usize) -> Result<bool, EditorServiceError> {
        self.check_index(index)?;
        if index == 0 {
            return Ok(false);
        }
        self.questions.swap(index - 1, index);
        Ok(true)
    }

    /// Swaps the question at `index` with its successor. Returns false when
    /// it is already last.
    ///
    /// # Errors
    ///
    /// Returns `EditorServiceError::OutOfRange` for an invalid index.
    pub fn move_down(&mut self, index: usize) -> Result<bool, EditorServiceError> {
        self.check_index(index)?;
        if index + 1 == self.questions.len() {
            return Ok(false);
        }
        self.questions.swap(index, index + 1);
        Ok(true)
    }

    /// Replaces the working list with the contents of a question file.
    /// Degrades like the loader: a missing or malformed file leaves the
    /// list empty.
    pub fn load(&mut self, path: &Path) {
        self.questions = load_questions(path).iter().cloned().collect();
    }

    /// Writes the working list in the encoding named by the path extension.
    ///
    /// # Errors
    ///
    /// Returns `EditorServiceError::Empty` when there is nothing to save and
    /// `EditorServiceError::Storage` if the write fails.
    pub fn save(&self, path: &Path, now: DateTime<Utc>) -> Result<(), EditorServiceError> {
        if self.questions.is_empty() {
            return Err(EditorServiceError::Empty);
        }
        let format = QuestionFileFormat::from_path(path);
        let set = QuestionSet::from_questions(self.questions.clone());
        save_questions(&set, path, format, now)?;
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<(), EditorServiceError> {
        if index >= self.questions.len() {
            return Err(EditorServiceError::OutOfRange {
                index,
                len: self.questions.len(),
            });
        }
        Ok(())
    }
}
