pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod output;
pub mod sources;
pub mod utils;

pub use self::config::{OutputFormat, Settings};
pub use engine::{derive_row, replay, ClearingRates};
pub use error::{Result, WaitlistError};
pub use models::{BlockSize, DerivedRow, HistoricalClearingRecord, Request, Snapshot};
pub use output::Ledger;
