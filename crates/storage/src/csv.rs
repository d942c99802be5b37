//! Just enough CSV for the three tabular formats this tool reads and
//! writes: quoted fields, doubled quotes, quoted fields spanning lines, and
//! the UTF-8 BOM the original data files carry for spreadsheet
//! compatibility.

/// Byte-order mark written at the start of newly created tabular files and
/// stripped on read.
pub const BOM: &str = "\u{feff}";

/// Renders one record as a CRLF-terminated CSV row, quoting fields that
/// need it.
#[must_use]
pub fn format_record(fields: &[&str]) -> String {
    let mut row = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            row.push(',');
        }
        if needs_quoting(field) {
            row.push('"');
            row.push_str(&field.replace('"', "\"\""));
            row.push('"');
        } else {
            row.push_str(field);
        }
    }
    row.push_str("\r\n");
    row
}

fn needs_quoting(field: &str) -> bool {
    field.contains([',', '"', '\n', '\r'])
}

/// Parses CSV content into records.
///
/// Accepts LF or CRLF line endings and a leading BOM. Empty trailing lines
/// produce no record; blank lines inside the content produce a single empty
/// field, which loaders skip via their minimum-field checks.
#[must_use]
pub fn parse(input: &str) -> Vec<Vec<String>> {
    let input = input.strip_prefix(BOM).unwrap_or(input);

    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' | '\n' => {
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    records
}
