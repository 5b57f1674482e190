//! Utility functions shared by the engine and the file sources.
//!
//! This module is organized into focused submodules:
//!
//! - [`dates`] - Timestamp and calendar-date parsing, month arithmetic
//! - [`csv`] - Quote-aware CSV field splitting and joining

mod csv;
mod dates;

// CSV helpers
pub use csv::{column_index, join_record, split_record, split_records};

// Date helpers
pub use dates::{
    months_before, parse_archive_datetime, parse_date, parse_datetime, parse_entry_date, parse_utc,
};
