use std::path::PathBuf;

/// Input-level failures surfaced to the caller.
///
/// Per-record problems (bad size, unparseable date) never show up here; the
/// parser absorbs them and reports a skipped count instead.
#[derive(Debug, thiserror::Error)]
pub enum WaitlistError {
    #[error("snapshot {source_name} is unreadable: {reason}")]
    SnapshotUnreadable { source_name: String, reason: String },

    #[error("replay sequence is empty, no rows produced")]
    EmptyReplay,

    #[error("snapshot at {current} precedes the previous snapshot at {previous}")]
    OutOfOrder { previous: String, current: String },

    #[error("ledger {} has an incompatible header ({reason}); run a full replay to regenerate it", path.display())]
    SchemaMismatch { path: PathBuf, reason: String },

    #[error("unknown block size tag: {tag}")]
    UnknownBlockSize { tag: String },

    #[error("invalid quarter label: {label}")]
    InvalidPeriod { label: String },

    #[error("clearing cache {source_name} is unreadable: {reason}")]
    ClearingCacheUnreadable { source_name: String, reason: String },

    #[error("no waitlist rows found in {source_name}")]
    NothingExtracted { source_name: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WaitlistError>;
