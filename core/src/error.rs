/// Errors surfaced by store backends and the history writer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("malformed stored value: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage quota of {quota} bytes exceeded")]
    QuotaExceeded {
        quota: usize,
    },

    #[error("unknown store version: {0}")]
    UnknownVersion(i64),
}

pub type Result<T> = std::result::Result<T, Error>;
