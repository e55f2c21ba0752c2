use super::Check;
use crate::{
    error::DqResult,
    result::CheckResult,
    schema::TableKind,
    table::{RecordStore, Table},
    types::SampleToken,
    value::ValueKey,
};
use chrono::NaiveDateTime;
use std::collections::HashMap;

pub const UNIQUENESS_CHECK: &str = "uniqueness_check";

/// Every row whose value in `column` occurs more than once is a duplicate,
/// including the first occurrence. Samples are the distinct duplicated
/// values in order of first appearance. Nulls group together like any
/// other value.
pub fn uniqueness_check(table: &Table, column: &str, at: NaiveDateTime) -> DqResult<CheckResult> {
    let mut counts: HashMap<ValueKey, usize> = HashMap::new();
    let mut first_seen: Vec<(ValueKey, String)> = Vec::new();

    for value in table.column(column)? {
        let key = value.key();
        let count = counts.entry(key.clone()).or_insert(0);
        if *count == 0 {
            first_seen.push((key, value.to_string()));
        }
        *count += 1;
    }

    let duplicated: Vec<(usize, String)> = first_seen
        .into_iter()
        .filter_map(|(key, shown)| {
            let n = counts[&key];
            (n > 1).then_some((n, shown))
        })
        .collect();
    let affected: usize = duplicated.iter().map(|(n, _)| n).sum();

    Ok(CheckResult::from_count(
        UNIQUENESS_CHECK,
        table.name(),
        Some(column),
        affected,
        duplicated.into_iter().map(|(_, v)| SampleToken::Value(v)),
        |n| format!("{n} duplicate values in '{column}'"),
        at,
    ))
}

pub struct UniquenessCheck {
    kind: TableKind,
    column: &'static str,
}

impl UniquenessCheck {
    pub fn new(kind: TableKind, column: &'static str) -> Self {
        Self { kind, column }
    }
}

impl Check for UniquenessCheck {
    fn name(&self) -> &str {
        UNIQUENESS_CHECK
    }

    fn table(&self) -> &str {
        self.kind.label()
    }

    fn column(&self) -> Option<&str> {
        Some(self.column)
    }

    fn evaluate(&self, store: &RecordStore, at: NaiveDateTime) -> DqResult<Vec<CheckResult>> {
        let table = store.table(self.kind)?;
        Ok(vec![uniqueness_check(table, self.column, at)?])
    }
}
