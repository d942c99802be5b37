use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::warn;

/// Width of the zero-padded `{sequence}` substitution.
const SEQUENCE_PAD: usize = 3;

/// Placeholder tokens and the patterns their substitutions match when
/// scanning a directory for prior sequence numbers.
const PLACEHOLDERS: [(&str, &str); 4] = [
    ("{date}", r"\d{8}"),
    ("{time}", r"\d{6}"),
    ("{respondent_id}", r"[^_]+"),
    ("{sequence}", r"(\d+)"),
];

/// Resolves a naming template against a target directory.
///
/// `{date}` becomes `YYYYMMDD`, `{time}` becomes `HHMMSS`,
/// `{respondent_id}` is substituted only when supplied, and `{sequence}`
/// becomes the next free number in `dir`, zero-padded to three digits.
#[must_use]
pub fn resolve(
    template: &str,
    dir: &Path,
    now: DateTime<Utc>,
    respondent_id: Option<&str>,
) -> PathBuf {
    let mut filename = template
        .replace("{date}", &now.format("%Y%m%d").to_string())
        .replace("{time}", &now.format("%H%M%S").to_string());
    if let Some(id) = respondent_id {
        filename = filename.replace("{respondent_id}", id);
    }
    if filename.contains("{sequence}") {
        let next = next_sequence(dir, template);
        filename = filename.replace("{sequence}", &format!("{next:0width$}", width = SEQUENCE_PAD));
    }
    dir.join(filename)
}

/// Returns the next free sequence number for `template` in `dir`.
///
/// The directory listing is the only source of truth: no counter survives
/// between calls, and every resolution scans afresh, so independent
/// sessions pick monotonically increasing numbers. Two sessions resolving
/// at the same instant can still pick the same number; with the default
/// templates the respondent id disambiguates the final name.
///
/// A missing or unreadable directory resolves to 1 (fails open); the
/// caller creates the directory before writing.
#[must_use]
pub fn next_sequence(dir: &Path, template: &str) -> u32 {
    let Some(pattern) = template_pattern(template) else {
        return 1;
    };
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(dir = %dir.display(), %err, "sequence scan failed; defaulting to 1");
            return 1;
        }
    };

    let mut max_seen = 0;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(num) = pattern
            .captures(name)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
        {
            max_seen = max_seen.max(num);
        }
    }
    max_seen + 1
}

/// Builds the scan pattern from the raw template: literal text escaped,
/// placeholders replaced with their match classes.
fn template_pattern(template: &str) -> Option<Regex> {
    let mut pattern = String::new();
    let mut rest = template;
    while !rest.is_empty() {
        let next = PLACEHOLDERS
            .iter()
            .filter_map(|(token, class)| rest.find(token).map(|pos| (pos, *token, *class)))
            .min_by_key(|(pos, ..)| *pos);
        match next {
            Some((pos, token, class)) => {
                pattern.push_str(&regex::escape(&rest[..pos]));
                pattern.push_str(class);
                rest = &rest[pos + token.len()..];
            }
            None => {
                pattern.push_str(&regex::escape(rest));
                rest = "";
            }
        }
    }
    Regex::new(&pattern).ok()
}
