use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use survey_core::model::{QuestionDraft, QuestionSet};
use survey_core::time::format_timestamp;

use crate::csv;
use crate::error::StorageError;

/// Number of choice columns in the tabular question format.
///
/// Saving a question with more choices truncates the extras, and loading
/// such a file yields only the first five. This loss is a constraint of the
/// fixed 7-column layout; the JSON encoding is lossless.
pub const MAX_TABULAR_CHOICES: usize = 5;

pub const QUESTION_CSV_HEADER: [&str; 7] = [
    "問題番号",
    "質問文",
    "選択肢1",
    "選択肢2",
    "選択肢3",
    "選択肢4",
    "選択肢5",
];

/// Encoding of a question file, decided once from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionFileFormat {
    Csv,
    Json,
}

impl QuestionFileFormat {
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Csv,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct QuestionRecord {
    text: String,
    #[serde(default)]
    choices: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QuestionDocument {
    Wrapped { questions: Vec<QuestionRecord> },
    Bare(Vec<QuestionRecord>),
}

#[derive(Serialize)]
struct QuestionExport {
    questions: Vec<QuestionRecord>,
    total_questions: usize,
    created_date: String,
}

//
// ─── LOADING ───────────────────────────────────────────────────────────────────
//

/// Loads a question file, degrading gracefully: a missing, unreadable, or
/// malformed file yields an empty set, and individually invalid rows are
/// skipped with a warning rather than failing the load.
#[must_use]
pub fn load_questions(path: &Path) -> QuestionSet {
    let format = QuestionFileFormat::from_path(path);
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            warn!(path = %path.display(), %err, "question file unreadable; starting empty");
            return QuestionSet::new();
        }
    };

    match format {
        QuestionFileFormat::Csv => parse_csv_questions(&content),
        QuestionFileFormat::Json => parse_json_questions(&content),
    }
}

fn parse_csv_questions(content: &str) -> QuestionSet {
    let mut set = QuestionSet::new();
    // first row is the header
    for row in csv::parse(content).into_iter().skip(1) {
        if row.len() < 2 {
            continue;
        }
        push_validated(
            &mut set,
            QuestionDraft::new(row[1].clone(), row[2..].to_vec()),
        );
    }
    set
}

fn parse_json_questions(content: &str) -> QuestionSet {
    let records = match serde_json::from_str::<QuestionDocument>(content) {
        Ok(QuestionDocument::Wrapped { questions }) | Ok(QuestionDocument::Bare(questions)) => {
            questions
        }
        Err(err) => {
            warn!(%err, "malformed question JSON; starting empty");
            return QuestionSet::new();
        }
    };

    let mut set = QuestionSet::new();
    for record in records {
        push_validated(&mut set, QuestionDraft::new(record.text, record.choices));
    }
    set
}

fn push_validated(set: &mut QuestionSet, draft: QuestionDraft) {
    match draft.validate() {
        Ok(question) => set.push(question),
        Err(err) => warn!(%err, "skipping invalid question row"),
    }
}

//
// ─── SAVING ────────────────────────────────────────────────────────────────────
//

/// Writes a question set in the given encoding.
///
/// # Errors
///
/// Returns `StorageError` if the file cannot be written.
pub fn save_questions(
    set: &QuestionSet,
    path: &Path,
    format: QuestionFileFormat,
    now: DateTime<Utc>,
) -> Result<(), StorageError> {
    let content = match format {
        QuestionFileFormat::Csv => render_csv_questions(set),
        QuestionFileFormat::Json => render_json_questions(set, now)?,
    };
    fs::write(path, content)?;
    Ok(())
}

fn render_csv_questions(set: &QuestionSet) -> String {
    let mut out = String::from(csv::BOM);
    out.push_str(&csv::format_record(&QUESTION_CSV_HEADER));

    for (i, question) in set.iter().enumerate() {
        let number = (i + 1).to_string();
        let mut fields: Vec<&str> = Vec::with_capacity(2 + MAX_TABULAR_CHOICES);
        fields.push(&number);
        fields.push(question.text());
        for choice in question.choices().iter().take(MAX_TABULAR_CHOICES) {
            fields.push(choice);
        }
        while fields.len() < 2 + MAX_TABULAR_CHOICES {
            fields.push("");
        }
        out.push_str(&csv::format_record(&fields));
    }

    out
}

fn render_json_questions(set: &QuestionSet, now: DateTime<Utc>) -> Result<String, StorageError> {
    let questions: Vec<QuestionRecord> = set
        .iter()
        .map(|question| QuestionRecord {
            text: question.text().to_string(),
            choices: question.choices().to_vec(),
        })
        .collect();

    let export = QuestionExport {
        total_questions: questions.len(),
        created_date: format_timestamp(now),
        questions,
    };
    Ok(serde_json::to_string_pretty(&export)?)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
