//! Shared primitive types used across the checks and rules.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on `sample_values` in every emitted result.
pub const MAX_SAMPLES: usize = 5;

/// A stable, unique identifier for a generated entity.
pub type EntityId = String;

/// Identifier of one pipeline run.
pub type RunId = String;

/// Positional identifier of a row inside one table snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RowKey(pub usize);

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An opaque displayable token in a result's sample list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SampleToken {
    Row(RowKey),
    Value(String),
}

impl fmt::Display for SampleToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Row(key) => write!(f, "{key}"),
            Self::Value(v) => f.write_str(v),
        }
    }
}
