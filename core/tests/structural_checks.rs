//! Structural check properties over small hand-built tables.

use bankdq_core::{
    aggregator::RunReport,
    checks::{foreign_key_check, format_check, null_check, uniqueness_check, FormatRule, NullPolicy},
    clock::FixedClock,
    config::{CheckConfig, DqConfig},
    engine::CheckEngine,
    generator::DatasetGenerator,
    result::CheckStatus,
    schema::TableKind,
    table::{RecordStore, Table},
    types::{RowKey, SampleToken},
    value::Value,
};
use chrono::{NaiveDate, NaiveDateTime};

fn at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn single_column(name: &str, column: &str, values: Vec<Value>) -> Table {
    Table::new(name, &[column]).with_rows(values.into_iter().map(|v| vec![v]).collect())
}

fn value(s: &str) -> SampleToken {
    SampleToken::Value(s.to_string())
}

#[test]
fn null_check_counts_every_absent_value() {
    let table = Table::new("Account", &["account_id", "balance"]).with_rows(vec![
        vec![Value::text("a1"), Value::Null],
        vec![Value::text("a2"), Value::Number(10.0)],
        vec![Value::text("a3"), Value::Null],
    ]);

    let results = null_check(&table, at());
    assert_eq!(results.len(), 2);

    let ids = &results[0];
    assert_eq!(ids.status, CheckStatus::Pass);
    assert_eq!(ids.affected_rows, 0);
    assert!(ids.sample_values.is_empty());

    let balance = &results[1];
    assert_eq!(balance.status, CheckStatus::Fail);
    assert_eq!(balance.column.as_deref(), Some("balance"));
    assert_eq!(balance.affected_rows, 2);
    assert_eq!(
        balance.sample_values,
        vec![SampleToken::Row(RowKey(0)), SampleToken::Row(RowKey(2))]
    );
    assert_eq!(balance.message, "2 nulls in 'balance'");
}

#[test]
fn uniqueness_counts_all_rows_sharing_a_duplicated_value() {
    let table = single_column(
        "Customer",
        "national_number",
        ["1", "2", "1", "3", "2", "1"].into_iter().map(Value::from).collect(),
    );

    let result = uniqueness_check(&table, "national_number", at()).unwrap();
    assert_eq!(result.status, CheckStatus::Fail);
    // Three copies of "1" and two of "2", not two distinct values.
    assert_eq!(result.affected_rows, 5);
    assert_eq!(result.sample_values, vec![value("1"), value("2")]);
}

#[test]
fn unique_column_passes() {
    let table = single_column("Device", "device_id", vec!["d1".into(), "d2".into()]);
    let result = uniqueness_check(&table, "device_id", at()).unwrap();
    assert_eq!(result.status, CheckStatus::Pass);
    assert_eq!(result.affected_rows, 0);
}

#[test]
fn format_check_only_scopes_matching_discriminator() {
    let table = Table::new("Customer", &["national_id", "national_number"]).with_rows(vec![
        vec!["CCCD".into(), "123456789012".into()],
        vec!["CCCD".into(), "12345".into()],
        vec!["PASSPORT".into(), "X".into()],
    ]);
    let rule = FormatRule::new("national_id", "CCCD", "national_number", r"\d{12}").unwrap();

    let result = format_check(
        "regex_check_cccd",
        &table,
        &rule,
        "Invalid CCCD format (not 12 digits)",
        at(),
    )
    .unwrap();
    assert_eq!(result.status, CheckStatus::Fail);
    assert_eq!(result.affected_rows, 1);
    assert_eq!(result.sample_values, vec![value("12345")]);
    assert_eq!(result.message, "Invalid CCCD format (not 12 digits)");
}

#[test]
fn format_check_requires_a_full_match() {
    let table = Table::new("Customer", &["national_id", "national_number"]).with_rows(vec![
        vec!["CCCD".into(), "1234567890123".into()],
        vec!["CCCD".into(), "x123456789012".into()],
    ]);
    let rule = FormatRule::new("national_id", "CCCD", "national_number", r"\d{12}").unwrap();
    let result = format_check("regex_check_cccd", &table, &rule, "bad", at()).unwrap();
    assert_eq!(result.affected_rows, 2);
}

#[test]
fn foreign_key_subset_passes_otherwise_fails() {
    let child = single_column("Child", "ref", vec![1.0.into(), 2.0.into(), 3.0.into()]);
    let parent = single_column("Parent", "id", vec![1.0.into(), 2.0.into()]);

    let result =
        foreign_key_check(&child, "ref", &parent, "id", NullPolicy::Violation, at()).unwrap();
    assert_eq!(result.status, CheckStatus::Fail);
    assert_eq!(result.affected_rows, 1);
    assert_eq!(result.sample_values, vec![value("3")]);

    let result =
        foreign_key_check(&parent, "id", &child, "ref", NullPolicy::Violation, at()).unwrap();
    assert_eq!(result.status, CheckStatus::Pass);
}

#[test]
fn null_foreign_keys_follow_the_policy() {
    let child = single_column("Account", "customer_id", vec!["c1".into(), Value::Null]);
    let parent = single_column("Customer", "customer_id", vec!["c1".into()]);

    let strict =
        foreign_key_check(&child, "customer_id", &parent, "customer_id", NullPolicy::Violation, at())
            .unwrap();
    assert_eq!(strict.status, CheckStatus::Fail);
    assert_eq!(strict.affected_rows, 1);
    assert_eq!(strict.sample_values, vec![value("null")]);

    let lenient =
        foreign_key_check(&child, "customer_id", &parent, "customer_id", NullPolicy::Exempt, at())
            .unwrap();
    assert_eq!(lenient.status, CheckStatus::Pass);
}

#[test]
fn quality_suite_results_keep_their_invariants() {
    let dataset = DatasetGenerator::new(DqConfig::default_test().generator).generate();
    let engine = CheckEngine::quality_suite(&CheckConfig::default());
    let results = engine.run(&dataset, &FixedClock(at())).unwrap();

    // One null result per column of every table, plus 6 + 1 + 6 checks.
    let columns: usize = TableKind::ALL.iter().map(|k| k.columns().len()).sum();
    assert_eq!(results.len(), columns + 13);

    for r in &results {
        assert_ne!(r.status, CheckStatus::Error, "{} on {}", r.check_name, r.target());
        assert_eq!(r.status == CheckStatus::Fail, r.affected_rows > 0);
        assert!(r.sample_values.len() <= 5.min(r.affected_rows));
        assert_eq!(r.check_time, at());
    }
    assert_eq!(
        results.iter().filter(|r| r.check_name == "regex_check_cccd").count(),
        1
    );
}

#[test]
fn faulted_table_only_errors_its_own_checks() {
    let mut dataset = DatasetGenerator::new(DqConfig::default_test().generator).generate();
    dataset.record_fault(TableKind::Devices, "is_verified holds 'maybe'");

    let results = CheckEngine::quality_suite(&CheckConfig::default())
        .run(&dataset, &FixedClock(at()))
        .unwrap();

    let errors: Vec<_> = results.iter().filter(|r| r.status == CheckStatus::Error).collect();
    // Device nulls, Device uniqueness, and the two FKs pointing at Device.
    assert_eq!(errors.len(), 4);
    for r in &errors {
        assert_eq!(r.affected_rows, 0);
        assert!(r.message.contains("maybe"), "{}", r.message);
    }
    assert!(results
        .iter()
        .any(|r| r.table == "Customer" && r.status != CheckStatus::Error));
}

#[test]
fn empty_record_store_fails_fast() {
    assert!(RecordStore::new().ensure_loaded().is_err());
}

#[test]
fn clean_iff_every_status_passes() {
    let clean = Table::new("Device", &["device_id"]).with_rows(vec![vec!["d1".into()]]);
    let dirty = Table::new("Device", &["device_id"]).with_rows(vec![vec![Value::Null]]);

    let pass = RunReport::from_quality(null_check(&clean, at()));
    assert!(pass.is_clean());

    let fail = RunReport::from_quality(null_check(&dirty, at()));
    assert!(!fail.is_clean());
    assert!(!pass.merge(fail).is_clean());
}
