mod age_bucket;
mod block_size;
mod clearing_record;
mod derived_row;
mod request;
mod snapshot;

pub use age_bucket::AgeBucket;
pub use block_size::{BlockSize, PerSize};
pub use clearing_record::{HistoricalClearingRecord, Quarter};
pub use derived_row::{format_estimate, format_timestamp, DerivedRow, COLUMNS, INFINITY_TOKEN};
pub use request::Request;
pub use snapshot::Snapshot;
