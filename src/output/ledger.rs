//! The append-only CSV ledger of derived rows.
//!
//! Appends only ever add rows to a file whose header matches the current
//! schema exactly. A full replay is the one path allowed to rewrite the file,
//! and it does so wholesale via a temp file and rename.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::{
    error::{Result, WaitlistError},
    models::{DerivedRow, COLUMNS},
    utils::{join_record, split_record, split_records},
};

pub fn header_line() -> String {
    join_record(&COLUMNS[..])
}

pub fn row_line(row: &DerivedRow) -> String {
    join_record(&row.to_record()[..])
}

/// Write rows as CSV, optionally preceded by the header.
pub fn write_rows<W: Write>(writer: &mut W, rows: &[DerivedRow], include_header: bool) -> io::Result<()> {
    if include_header {
        writeln!(writer, "{}", header_line())?;
    }
    for row in rows {
        writeln!(writer, "{}", row_line(row))?;
    }
    writer.flush()
}

/// Parsed ledger file.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerContents {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row, creating the file with a header if it is new or empty.
    pub fn append(&self, row: &DerivedRow) -> Result<()> {
        let existing = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        let is_new = existing.trim().is_empty();
        if !is_new {
            self.check_header(existing.lines().next().unwrap_or_default())?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;

        if is_new {
            if !existing.is_empty() {
                // Whitespace-only file: start it over.
                file.set_len(0)?;
            }
            writeln!(file, "{}", header_line())?;
        } else if !existing.ends_with('\n') {
            writeln!(file)?;
        }

        writeln!(file, "{}", row_line(row))?;
        file.flush()?;

        info!("Appended row for {} to {}", row.to_record()[0], self.path.display());
        Ok(())
    }

    /// Replace the ledger with `rows`. Used only by full replay.
    ///
    /// An empty row set is refused rather than leaving a header-only file
    /// that would read as valid empty history.
    pub fn replace(&self, rows: &[DerivedRow]) -> Result<()> {
        if rows.is_empty() {
            return Err(WaitlistError::EmptyReplay);
        }

        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        {
            let mut file = io::BufWriter::new(fs::File::create(&tmp_path)?);
            write_rows(&mut file, rows, true)?;
        }
        fs::rename(&tmp_path, &self.path)?;

        info!("Wrote {} rows to {}", rows.len(), self.path.display());
        Ok(())
    }

    pub fn read(&self) -> Result<LedgerContents> {
        let text = fs::read_to_string(&self.path)?;
        let mut records = split_records(&text).into_iter();

        let header = records.next().unwrap_or_default();
        let rows = records.collect();

        Ok(LedgerContents { header, rows })
    }

    fn check_header(&self, line: &str) -> Result<()> {
        let found = split_record(line);
        if found.iter().map(String::as_str).eq(COLUMNS.iter().copied()) {
            return Ok(());
        }

        let is_older_schema = found.len() < COLUMNS.len()
            && found.iter().zip(COLUMNS.iter()).all(|(a, b)| a == b);

        let reason = if is_older_schema {
            format!(
                "written with {} of the current {} columns",
                found.len(),
                COLUMNS.len()
            )
        } else {
            "columns do not match the current layout".to_string()
        };

        Err(WaitlistError::SchemaMismatch {
            path: self.path.clone(),
            reason,
        })
    }
}
