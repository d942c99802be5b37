use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use survey_core::model::Response;
use survey_core::time::format_timestamp;

use crate::csv;
use crate::error::StorageError;

pub const RESPONSE_CSV_HEADER: [&str; 6] = [
    "回答者ID",
    "タイムスタンプ",
    "問題番号",
    "質問文",
    "選択した回答",
    "理由",
];

/// Which encoding(s) the response ledger is flushed to on submit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
    Both,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown output format: {0:?} (expected csv, json, or both)")]
pub struct ParseOutputFormatError(String);

impl FromStr for OutputFormat {
    type Err = ParseOutputFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "both" => Ok(Self::Both),
            other => Err(ParseOutputFormatError(other.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Both => "both",
        };
        write!(f, "{name}")
    }
}

/// Export shape for one response row; timestamps are rendered to the
/// millisecond-precision string both encodings use.
#[derive(Serialize)]
struct ResponseRecord<'a> {
    respondent_id: &'a str,
    timestamp: String,
    question_num: usize,
    question_text: &'a str,
    selected_choice: &'a str,
    reason: &'a str,
}

impl<'a> From<&'a Response> for ResponseRecord<'a> {
    fn from(response: &'a Response) -> Self {
        Self {
            respondent_id: &response.respondent_id,
            timestamp: format_timestamp(response.timestamp),
            question_num: response.question_num,
            question_text: &response.question_text,
            selected_choice: &response.selected_choice,
            reason: &response.reason,
        }
    }
}

#[derive(Serialize)]
struct ResponseExport<'a> {
    responses: Vec<ResponseRecord<'a>>,
    export_date: String,
    total_responses: usize,
}

//
// ─── WRITERS ───────────────────────────────────────────────────────────────────
//

/// Appends responses to a CSV file, writing the header (and BOM) only when
/// the file is created.
///
/// # Errors
///
/// Returns `StorageError` if the file cannot be opened or written.
pub fn append_responses_csv(path: &Path, responses: &[Response]) -> Result<(), StorageError> {
    let is_new = !path.exists();
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;

    let mut out = String::new();
    if is_new {
        out.push_str(csv::BOM);
        out.push_str(&csv::format_record(&RESPONSE_CSV_HEADER));
    }
    for response in responses {
        let record = ResponseRecord::from(response);
        let question_num = record.question_num.to_string();
        out.push_str(&csv::format_record(&[
            record.respondent_id,
            &record.timestamp,
            &question_num,
            record.question_text,
            record.selected_choice,
            record.reason,
        ]));
    }

    file.write_all(out.as_bytes())?;
    file.flush()?;
    Ok(())
}

/// Writes the full ledger as a JSON export document.
///
/// # Errors
///
/// Returns `StorageError` if serialization or the write fails.
pub fn write_responses_json(
    path: &Path,
    responses: &[Response],
    now: DateTime<Utc>,
) -> Result<(), StorageError> {
    let export = ResponseExport {
        responses: responses.iter().map(ResponseRecord::from).collect(),
        export_date: format_timestamp(now),
        total_responses: responses.len(),
    };
    std::fs::write(path, serde_json::to_string_pretty(&export)?)?;
    Ok(())
}

/// Flushes the ledger in the selected format(s) against an extension-less
/// base path and reports the files written.
///
/// # Errors
///
/// Returns `StorageError` on the first failed write; the caller keeps the
/// in-memory ledger and may retry.
pub fn save_responses(
    base_path: &Path,
    format: OutputFormat,
    responses: &[Response],
    now: DateTime<Utc>,
) -> Result<Vec<PathBuf>, StorageError> {
    let mut written = Vec::new();

    if matches!(format, OutputFormat::Csv | OutputFormat::Both) {
        let path = base_path.with_extension("csv");
        append_responses_csv(&path, responses)?;
        written.push(path);
    }
    if matches!(format, OutputFormat::Json | OutputFormat::Both) {
        let path = base_path.with_extension("json");
        write_responses_json(&path, responses, now)?;
        written.push(path);
    }

    Ok(written)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use survey_core::time::fixed_now;

    fn sample_response(question_num: usize) -> Response {
        Response {
            respondent_id: "abc12345".into(),
            timestamp: fixed_now(),
            question_num,
            question_text: "Pick a color?".into(),
            selected_choice: "red".into(),
            reason: "I like red".into(),
        }
    }

    #[test]
    fn output_format_parses_and_displays() {
        assert_eq!("csv".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("both".parse::<OutputFormat>().unwrap(), OutputFormat::Both);
        assert!("xml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Both.to_string(), "both");
    }

    #[test]
    fn csv_header_is_written_once_across_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("responses.csv");

        append_responses_csv(&path, &[sample_response(1)]).unwrap();
        append_responses_csv(&path, &[sample_response(2)]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let rows = csv::parse(&content);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], RESPONSE_CSV_HEADER);
        assert_eq!(rows[1][2], "1");
        assert_eq!(rows[2][2], "2");
        assert_eq!(rows[1][1], "2023-11-14 22:13:20.000");
    }

    #[test]
    fn json_export_carries_totals() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("responses.json");

        write_responses_json(&path, &[sample_response(1), sample_response(2)], fixed_now())
            .unwrap();

        let doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["total_responses"], 2);
        assert_eq!(doc["responses"][0]["selected_choice"], "red");
        assert_eq!(doc["export_date"], "2023-11-14 22:13:20.000");
    }

    #[test]
    fn both_writes_two_files_from_one_base_path() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("responses_abc_20231114");

        let written =
            save_responses(&base, OutputFormat::Both, &[sample_response(1)], fixed_now()).unwrap();

        assert_eq!(
            written,
            vec![base.with_extension("csv"), base.with_extension("json")]
        );
        assert!(written.iter().all(|p| p.exists()));
    }
}
