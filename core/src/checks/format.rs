use super::Check;
use crate::{
    error::DqResult,
    result::CheckResult,
    schema::TableKind,
    table::{RecordStore, Table},
    types::{SampleToken, MAX_SAMPLES},
};
use chrono::NaiveDateTime;
use regex::Regex;

/// A format rule scoped to rows whose discriminator equals a given value.
#[derive(Debug, Clone)]
pub struct FormatRule {
    pub discriminator_column: String,
    pub discriminator_value: String,
    pub target_column: String,
    /// Anchored on both ends: the whole rendered value must match.
    pub pattern: Regex,
}

impl FormatRule {
    pub fn new(
        discriminator_column: &str,
        discriminator_value: &str,
        target_column: &str,
        pattern: &str,
    ) -> DqResult<Self> {
        Ok(Self {
            discriminator_column: discriminator_column.to_string(),
            discriminator_value: discriminator_value.to_string(),
            target_column: target_column.to_string(),
            pattern: Regex::new(&format!("^(?:{pattern})$"))?,
        })
    }
}

/// Flag in-scope rows whose target, rendered as text, does not fully match
/// the rule's pattern. Rows with any other discriminator are exempt.
pub fn format_check(
    check_name: &str,
    table: &Table,
    rule: &FormatRule,
    message: &str,
    at: NaiveDateTime,
) -> DqResult<CheckResult> {
    let disc = table.column_index(&rule.discriminator_column)?;
    let target = table.column_index(&rule.target_column)?;

    let mut affected = 0;
    let mut samples = Vec::new();
    for row in table.rows() {
        if row[disc].as_str() != Some(rule.discriminator_value.as_str()) {
            continue;
        }
        let shown = row[target].to_string();
        if !rule.pattern.is_match(&shown) {
            affected += 1;
            if samples.len() < MAX_SAMPLES {
                samples.push(SampleToken::Value(shown));
            }
        }
    }

    Ok(CheckResult::from_count(
        check_name,
        table.name(),
        Some(&rule.target_column),
        affected,
        samples,
        |_| message.to_string(),
        at,
    ))
}

pub struct FormatCheck {
    name: String,
    kind: TableKind,
    pattern: String,
    discriminator_column: &'static str,
    discriminator_value: String,
    target_column: &'static str,
    message: String,
}

impl FormatCheck {
    pub fn new(
        name: &str,
        kind: TableKind,
        discriminator_column: &'static str,
        discriminator_value: &str,
        target_column: &'static str,
        pattern: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            kind,
            pattern: pattern.to_string(),
            discriminator_column,
            discriminator_value: discriminator_value.to_string(),
            target_column,
            message: format!("Invalid {discriminator_value} format (does not match {pattern})"),
        }
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.message = message.to_string();
        self
    }
}

impl Check for FormatCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn table(&self) -> &str {
        self.kind.label()
    }

    fn column(&self) -> Option<&str> {
        Some(self.target_column)
    }

    fn evaluate(&self, store: &RecordStore, at: NaiveDateTime) -> DqResult<Vec<CheckResult>> {
        let table = store.table(self.kind)?;
        let rule = FormatRule::new(
            self.discriminator_column,
            &self.discriminator_value,
            self.target_column,
            &self.pattern,
        )?;
        Ok(vec![format_check(&self.name, table, &rule, &self.message, at)?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::DqError, result::CheckStatus, value::Value};
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    fn cccd() -> FormatRule {
        FormatRule::new("national_id", "CCCD", "national_number", r"\d{12}").unwrap()
    }

    #[test]
    fn pattern_must_match_whole_value() {
        let rule = cccd();
        assert!(rule.pattern.is_match("123456789012"));
        assert!(!rule.pattern.is_match("1234567890123"));
        assert!(!rule.pattern.is_match("x123456789012"));
    }

    #[test]
    fn numeric_cells_are_matched_as_text() {
        let table = Table::new("Customer", &["national_id", "national_number"]).with_rows(vec![
            vec![Value::from("CCCD"), Value::Number(123456789012.0)],
            vec![Value::from("CCCD"), Value::Number(98765.0)],
        ]);
        let r = format_check("regex_check_cccd", &table, &cccd(), "bad", at()).unwrap();
        assert_eq!(r.affected_rows, 1);
        assert_eq!(r.sample_values, vec![SampleToken::Value("98765".into())]);
    }

    #[test]
    fn null_target_in_scope_is_a_violation() {
        let table = Table::new("Customer", &["national_id", "national_number"])
            .with_rows(vec![vec![Value::from("CCCD"), Value::Null]]);
        let r = format_check("regex_check_cccd", &table, &cccd(), "bad", at()).unwrap();
        assert_eq!(r.status, CheckStatus::Fail);
    }

    #[test]
    fn invalid_pattern_is_a_fault() {
        let err = FormatRule::new("a", "b", "c", "(").unwrap_err();
        assert!(matches!(err, DqError::InvalidPattern(_)));
    }
}
