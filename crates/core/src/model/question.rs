use thiserror::Error;

/// Minimum number of choices a question must offer.
pub const MIN_CHOICES: usize = 2;

/// Maximum number of choices a question may offer.
pub const MAX_CHOICES: usize = 10;

//
// ─── QUESTION TYPES ────────────────────────────────────────────────────────────
//

/// Unvalidated question input from the editor or a loaded file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionDraft {
    pub text: String,
    pub choices: Vec<String>,
}

impl QuestionDraft {
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        choices: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            text: text.into(),
            choices: choices.into_iter().map(Into::into).collect(),
        }
    }

    /// Validate the draft into an immutable `Question`.
    ///
    /// Text is trimmed; blank choice cells are dropped before the count check.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the text is empty or the remaining choice
    /// count falls outside `MIN_CHOICES..=MAX_CHOICES`.
    pub fn validate(self) -> Result<Question, QuestionError> {
        let text = self.text.trim().to_string();
        if text.is_empty() {
            return Err(QuestionError::EmptyText);
        }

        let choices: Vec<String> = self
            .choices
            .into_iter()
            .map(|choice| choice.trim().to_string())
            .filter(|choice| !choice.is_empty())
            .collect();

        if choices.len() < MIN_CHOICES {
            return Err(QuestionError::TooFewChoices {
                found: choices.len(),
            });
        }
        if choices.len() > MAX_CHOICES {
            return Err(QuestionError::TooManyChoices {
                found: choices.len(),
            });
        }

        Ok(Question { text, choices })
    }
}

/// A multiple-choice question, immutable once loaded into a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    text: String,
    choices: Vec<String>,
}

impl Question {
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    /// Returns true if `choice` is one of this question's choices.
    #[must_use]
    pub fn has_choice(&self, choice: &str) -> bool {
        self.choices.iter().any(|c| c == choice)
    }
}

//
// ─── QUESTION SET ──────────────────────────────────────────────────────────────
//

/// Ordered, index-addressed sequence of questions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionSet {
    questions: Vec<Question>,
}

impl QuestionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_questions(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    pub fn push(&mut self, question: Question) {
        self.questions.push(question);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }
}

impl FromIterator<Question> for QuestionSet {
    fn from_iter<I: IntoIterator<Item = Question>>(iter: I) -> Self {
        Self {
            questions: iter.into_iter().collect(),
        }
    }
}

//
// ─── VALIDATION ERRORS ─────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text is empty")]
    EmptyText,

    #[error("too few choices: {found} (minimum {MIN_CHOICES})")]
    TooFewChoices { found: usize },

    #[error("too many choices: {found} (maximum {MAX_CHOICES})")]
    TooManyChoices { found: usize },
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_fails_if_text_blank() {
        let err = QuestionDraft::new("   ", ["a", "b"]).validate().unwrap_err();
        assert_eq!(err, QuestionError::EmptyText);
    }

    #[test]
    fn draft_drops_blank_choices_before_count_check() {
        let err = QuestionDraft::new("Q", ["a", "  ", ""])
            .validate()
            .unwrap_err();
        assert_eq!(err, QuestionError::TooFewChoices { found: 1 });
    }

    #[test]
    fn draft_rejects_too_many_choices() {
        let choices: Vec<String> = (0..=MAX_CHOICES).map(|i| format!("c{i}")).collect();
        let err = QuestionDraft::new("Q", choices).validate().unwrap_err();
        assert_eq!(
            err,
            QuestionError::TooManyChoices {
                found: MAX_CHOICES + 1
            }
        );
    }

    #[test]
    fn valid_draft_trims_text_and_choices() {
        let question = QuestionDraft::new(" Pick a color? ", [" red ", "blue"])
            .validate()
            .unwrap();
        assert_eq!(question.text(), "Pick a color?");
        assert_eq!(question.choices(), ["red", "blue"]);
        assert!(question.has_choice("red"));
        assert!(!question.has_choice("green"));
    }

    #[test]
    fn question_set_is_index_addressed() {
        let set: QuestionSet = [("A", ["1", "2"]), ("B", ["3", "4"])]
            .into_iter()
            .map(|(text, choices)| QuestionDraft::new(text, choices).validate().unwrap())
            .collect();

        assert_eq!(set.len(), 2);
        assert_eq!(set.get(1).unwrap().text(), "B");
        assert!(set.get(2).is_none());
    }
}
