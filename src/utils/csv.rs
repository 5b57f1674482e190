//! Minimal CSV field handling.
//!
//! Ledger fields are numbers and RFC 3339 timestamps, so writing needs no
//! quoting. Reading still has to cope with quoted fields in the registry's
//! published files.

/// Split one CSV line into trimmed fields, honoring double quotes.
pub fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());

    fields
}

/// Split a whole CSV document into records of trimmed fields.
///
/// Records end at unquoted newlines only, so a quoted field may span lines.
/// Blank lines are dropped.
pub fn split_records(text: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;

    for (idx, c) in text.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '\n' if !in_quotes => {
                push_record(&mut records, &text[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    push_record(&mut records, &text[start..]);

    records
}

fn push_record(records: &mut Vec<Vec<String>>, raw: &str) {
    let raw = raw.strip_suffix('\r').unwrap_or(raw);
    if !raw.trim().is_empty() {
        records.push(split_record(raw));
    }
}

/// Join fields into a CSV line (no trailing newline).
pub fn join_record<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| f.as_ref())
        .collect::<Vec<_>>()
        .join(",")
}

/// Position of a header column, matched after trimming whitespace.
pub fn column_index(header: &[String], name: &str) -> Option<usize> {
    header.iter().position(|h| h.trim() == name)
}
