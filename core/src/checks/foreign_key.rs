use super::Check;
use crate::{
    error::DqResult,
    result::CheckResult,
    schema::TableKind,
    table::{RecordStore, Table},
    types::{SampleToken, MAX_SAMPLES},
    value::ValueKey,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const FOREIGN_KEY_CHECK: &str = "foreign_key_check";

/// How a null child value is judged. A null is never found in the parent
/// column, so under `Violation` it counts like any dangling reference;
/// `Exempt` treats it as "no reference".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullPolicy {
    #[default]
    Violation,
    Exempt,
}

/// Every child value must appear among the parent values. Samples are the
/// distinct unmatched values in order of first appearance.
pub fn foreign_key_check(
    child: &Table,
    child_column: &str,
    parent: &Table,
    parent_column: &str,
    nulls: NullPolicy,
    at: NaiveDateTime,
) -> DqResult<CheckResult> {
    let parent_keys: HashSet<ValueKey> = parent
        .column(parent_column)?
        .map(|v| v.key())
        .filter(|k| !k.is_null())
        .collect();

    let mut affected = 0;
    let mut seen: HashSet<ValueKey> = HashSet::new();
    let mut samples = Vec::new();
    for value in child.column(child_column)? {
        let key = value.key();
        if key.is_null() && nulls == NullPolicy::Exempt {
            continue;
        }
        if parent_keys.contains(&key) {
            continue;
        }
        affected += 1;
        if samples.len() < MAX_SAMPLES && seen.insert(key) {
            samples.push(SampleToken::Value(value.to_string()));
        }
    }

    Ok(CheckResult::from_count(
        FOREIGN_KEY_CHECK,
        child.name(),
        Some(child_column),
        affected,
        samples,
        |n| format!("{n} FK violations: values in '{child_column}' not in {}", parent.name()),
        at,
    ))
}

pub struct ForeignKeyCheck {
    child: TableKind,
    parent: TableKind,
    child_column: &'static str,
    parent_column: &'static str,
    nulls: NullPolicy,
}

impl ForeignKeyCheck {
    pub fn new(
        child: TableKind,
        parent: TableKind,
        child_column: &'static str,
        parent_column: &'static str,
    ) -> Self {
        Self {
            child,
            parent,
            child_column,
            parent_column,
            nulls: NullPolicy::default(),
        }
    }

    pub fn with_null_policy(mut self, nulls: NullPolicy) -> Self {
        self.nulls = nulls;
        self
    }
}

impl Check for ForeignKeyCheck {
    fn name(&self) -> &str {
        FOREIGN_KEY_CHECK
    }

    fn table(&self) -> &str {
        self.child.label()
    }

    fn column(&self) -> Option<&str> {
        Some(self.child_column)
    }

    fn evaluate(&self, store: &RecordStore, at: NaiveDateTime) -> DqResult<Vec<CheckResult>> {
        let child = store.table(self.child)?;
        let parent = store.table(self.parent)?;
        Ok(vec![foreign_key_check(
            child,
            self.child_column,
            parent,
            self.parent_column,
            self.nulls,
            at,
        )?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{result::CheckStatus, value::Value};
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    fn column(name: &str, col: &str, values: Vec<Value>) -> Table {
        Table::new(name, &[col]).with_rows(values.into_iter().map(|v| vec![v]).collect())
    }

    #[test]
    fn unmatched_duplicates_count_per_row_but_sample_once() {
        let child = column("Transaction", "device_id", vec!["d1".into(), "dx".into(), "dx".into()]);
        let parent = column("Device", "device_id", vec!["d1".into()]);
        let r = foreign_key_check(&child, "device_id", &parent, "device_id", NullPolicy::Violation, at())
            .unwrap();
        assert_eq!(r.affected_rows, 2);
        assert_eq!(r.sample_values, vec![SampleToken::Value("dx".into())]);
        assert_eq!(r.message, "2 FK violations: values in 'device_id' not in Device");
    }

    #[test]
    fn null_policy_decides_null_children() {
        let child = column("Account", "customer_id", vec!["c1".into(), Value::Null]);
        let parent = column("Customer", "customer_id", vec!["c1".into(), Value::Null]);

        let strict = foreign_key_check(&child, "customer_id", &parent, "customer_id", NullPolicy::Violation, at())
            .unwrap();
        assert_eq!(strict.status, CheckStatus::Fail);
        assert_eq!(strict.affected_rows, 1);
        assert_eq!(strict.sample_values, vec![SampleToken::Value("null".into())]);

        let lenient = foreign_key_check(&child, "customer_id", &parent, "customer_id", NullPolicy::Exempt, at())
            .unwrap();
        assert_eq!(lenient.status, CheckStatus::Pass);
    }
}
