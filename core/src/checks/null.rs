use super::Check;
use crate::{
    error::DqResult,
    result::CheckResult,
    schema::TableKind,
    table::{RecordStore, Table},
    types::{RowKey, SampleToken, MAX_SAMPLES},
};
use chrono::NaiveDateTime;

pub const NULL_CHECK: &str = "null_check";

/// Count absent values in every column of `table`, one result per column.
/// Samples are the positional keys of the first offending rows.
pub fn null_check(table: &Table, at: NaiveDateTime) -> Vec<CheckResult> {
    let width = table.columns().len();
    let mut counts = vec![0usize; width];
    let mut samples: Vec<Vec<SampleToken>> = vec![Vec::new(); width];

    for (i, row) in table.rows().iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            if value.is_null() {
                counts[c] += 1;
                if samples[c].len() < MAX_SAMPLES {
                    samples[c].push(SampleToken::Row(RowKey(i)));
                }
            }
        }
    }

    table
        .columns()
        .iter()
        .zip(counts)
        .zip(samples)
        .map(|((column, count), samples)| {
            CheckResult::from_count(
                NULL_CHECK,
                table.name(),
                Some(column),
                count,
                samples,
                |n| format!("{n} nulls in '{column}'"),
                at,
            )
        })
        .collect()
}

pub struct NullCheck {
    kind: TableKind,
}

impl NullCheck {
    pub fn new(kind: TableKind) -> Self {
        Self { kind }
    }
}

impl Check for NullCheck {
    fn name(&self) -> &str {
        NULL_CHECK
    }

    fn table(&self) -> &str {
        self.kind.label()
    }

    fn column(&self) -> Option<&str> {
        None
    }

    fn evaluate(&self, store: &RecordStore, at: NaiveDateTime) -> DqResult<Vec<CheckResult>> {
        Ok(null_check(store.table(self.kind)?, at))
    }
}
