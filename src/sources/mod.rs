//! File-backed inputs: snapshots, clearing history and archived pages.

pub mod clearing_file;
pub mod html;
pub mod snapshot_file;

pub use clearing_file::{load_clearing_records, parse_json_cache, parse_registry_csv};
pub use html::{extract_waitlist_file, extract_waitlist_rows};
pub use snapshot_file::{load_snapshot, load_snapshot_dir, timestamp_from_file_name};
