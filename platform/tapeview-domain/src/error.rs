use thiserror::Error;

/// Structural breakage of the tick log. Always fatal for the cycle that hit it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("tick log row {row}: expected {expected} columns, found {found}")]
    ColumnCount {
        row: u64,
        expected: usize,
        found: usize,
    },

    #[error("malformed tick log near row {row}: {message}")]
    Malformed { row: u64, message: String },
}

/// Errors surfaced by a [`TickLogRepository`](crate::repositories::tick_log::TickLogRepository) read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TickLogError {
    #[error("failed to read tick log {path}: {message}")]
    Io { path: String, message: String },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl TickLogError {
    /// Determine if the error must halt the orchestration cycle.
    ///
    /// Io errors are transient (the writer may not have created the file yet), so the
    /// next timer cycle acts as the retry.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TickLogError::Parse(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("bucket width must be > 0 seconds, got {0}")]
    InvalidBucketWidth(i64),

    #[error("tick log has {available} symbol groups, symbol group {requested} requested")]
    UnknownSymbolGroup { requested: usize, available: usize },
}
