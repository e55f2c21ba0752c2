//! Structural data-quality checks.
//!
//! Each check kind is a pure function over one or two tables, wrapped in a
//! small struct implementing [`Check`] so the engine can run a fixed list of
//! them against a [`RecordStore`]. Every check scans its whole input; the
//! affected row count is always the true total.

mod foreign_key;
mod format;
mod null;
mod uniqueness;

pub use foreign_key::{foreign_key_check, ForeignKeyCheck, NullPolicy};
pub use format::{format_check, FormatCheck, FormatRule};
pub use null::{null_check, NullCheck};
pub use uniqueness::{uniqueness_check, UniquenessCheck};

use crate::{error::DqResult, result::CheckResult, table::RecordStore};
use chrono::NaiveDateTime;

/// The contract every structural check fulfills.
pub trait Check {
    /// Stable rule kind, e.g. `null_check`.
    fn name(&self) -> &str;

    /// Table label the results are reported against.
    fn table(&self) -> &str;

    /// Target column, `None` for table-wide checks.
    fn column(&self) -> Option<&str>;

    /// Evaluate against the snapshot. Violations are returned as FAIL
    /// results; `Err` is reserved for structural faults.
    fn evaluate(&self, store: &RecordStore, at: NaiveDateTime) -> DqResult<Vec<CheckResult>>;
}
