use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use survey_core::model::{ActionEvent, ActionKind};
use survey_core::time::format_timestamp;

use crate::csv;
use crate::error::StorageError;

pub const LOG_CSV_HEADER: [&str; 3] = ["タイムスタンプ", "アクション種別", "詳細情報"];

/// Kind label as it appears in the アクション種別 column.
#[must_use]
pub fn kind_label(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::ChoiceSelection => "選択肢選択",
        ActionKind::ReasonStart => "理由入力開始",
        ActionKind::ReasonText => "理由入力内容",
        ActionKind::ReasonRewrite => "理由書き直し",
        ActionKind::QuestionMove => "問題移動",
        ActionKind::Submit => "アンケート送信",
    }
}

/// Detail string as it appears in the 詳細情報 column.
#[must_use]
pub fn event_detail(event: &ActionEvent) -> String {
    match event {
        ActionEvent::ChoiceSelection {
            question_num,
            choice,
        } => format!("問題{question_num}: {choice}"),
        ActionEvent::ReasonStart { question_num }
        | ActionEvent::ReasonRewrite { question_num } => format!("問題{question_num}"),
        ActionEvent::ReasonText {
            question_num,
            preview,
        } => format!("問題{question_num}: {preview}"),
        ActionEvent::QuestionMove { from, to } => format!("問題{from} → 問題{to}"),
        ActionEvent::Submit => "完了".to_string(),
    }
}

/// Append-only sink for respondent action events.
///
/// One file per session; the header row is written on first use and every
/// event is flushed before the call returns. No batching: events are small
/// and infrequent, and an intact audit trail after a crash matters more
/// than throughput here.
#[derive(Debug)]
pub struct ActionLogger {
    path: PathBuf,
}

impl ActionLogger {
    /// Binds the logger to `path`, creating parent directories and the
    /// header row if the file does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the directory or header cannot be created.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        if !path.exists() {
            fs::write(
                &path,
                format!("{}{}", csv::BOM, csv::format_record(&LOG_CSV_HEADER)),
            )?;
        }
        Ok(Self { path })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one event row, flushed before returning.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the append fails. Callers treat this as
    /// best-effort: a failed log never aborts the action that produced it.
    pub fn log(&self, at: DateTime<Utc>, event: &ActionEvent) -> Result<(), StorageError> {
        let timestamp = format_timestamp(at);
        let detail = event_detail(event);
        let row = csv::format_record(&[&timestamp, kind_label(event.kind()), &detail]);

        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(row.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use survey_core::time::fixed_now;

    #[test]
    fn creates_header_and_appends_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("action_log.csv");

        let logger = ActionLogger::create(&path).unwrap();
        logger
            .log(
                fixed_now(),
                &ActionEvent::ChoiceSelection {
                    question_num: 1,
                    choice: "red".into(),
                },
            )
            .unwrap();
        logger
            .log(fixed_now(), &ActionEvent::QuestionMove { from: 1, to: 2 })
            .unwrap();

        let rows = csv::parse(&fs::read_to_string(&path).unwrap());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], LOG_CSV_HEADER);
        assert_eq!(rows[1], ["2023-11-14 22:13:20.000", "選択肢選択", "問題1: red"]);
        assert_eq!(rows[2][1], "問題移動");
        assert_eq!(rows[2][2], "問題1 → 問題2");
    }

    #[test]
    fn existing_file_is_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("action_log.csv");

        let logger = ActionLogger::create(&path).unwrap();
        logger
            .log(fixed_now(), &ActionEvent::ReasonStart { question_num: 3 })
            .unwrap();

        // a second logger on the same path keeps the existing rows
        let logger = ActionLogger::create(&path).unwrap();
        logger.log(fixed_now(), &ActionEvent::Submit).unwrap();

        let rows = csv::parse(&fs::read_to_string(&path).unwrap());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][2], "問題3");
        assert_eq!(rows[2], ["2023-11-14 22:13:20.000", "アンケート送信", "完了"]);
    }
}
