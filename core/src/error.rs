use thiserror::Error;

#[derive(Error, Debug)]
pub enum DqError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Table '{table}' not found")]
    MissingTable { table: String },

    #[error("Column '{column}' not found in table '{table}'")]
    MissingColumn { table: String, column: String },

    #[error("Table '{table}' is unavailable: {reason}")]
    TableUnavailable { table: String, reason: String },

    #[error("Type mismatch in {table}.{column} at row {row}: expected {expected}, found '{found}'")]
    TypeMismatch {
        table: String,
        column: String,
        row: usize,
        expected: &'static str,
        found: String,
    },

    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("No input tables could be loaded")]
    EmptyRecordStore,

    #[error("Stage '{stage}' failed after {attempts} attempt(s): {reason}")]
    StageFailed {
        stage: &'static str,
        attempts: u32,
        reason: String,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DqError {
    /// Faults that concern a single table or check. The engine turns these
    /// into an ERROR result instead of aborting the run.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::MissingTable { .. }
                | Self::TableUnavailable { .. }
                | Self::MissingColumn { .. }
                | Self::TypeMismatch { .. }
                | Self::InvalidPattern(_)
        )
    }
}

pub type DqResult<T> = Result<T, DqError>;
