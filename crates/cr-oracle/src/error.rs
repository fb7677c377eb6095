//! Oracle and persistence errors

/// Failure of a narrative source. Never surfaces past [`crate::Oracle`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    #[error("Narrative source unavailable: {0}")]
    Unavailable(String),

    #[error("Narrative source timed out after {0} ms")]
    Timeout(u64),

    #[error("Narrative source returned an empty reply")]
    Empty,
}

/// Cache and preference file failures. Call sites log and continue.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("No data directory on this platform")]
    NoDataDir,
}
