//! The uniform outcome records emitted by every check and risk rule.
//!
//! RULE: results are built only through the constructors here, which
//! enforce `status == FAIL` iff `affected_rows > 0` and cap samples.

use crate::{
    error::DqError,
    types::{EntityId, SampleToken, MAX_SAMPLES},
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Pass,
    Fail,
    /// The check could not be evaluated (structural fault).
    Error,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Error => "ERROR",
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub check_name: String,
    pub table: String,
    pub column: Option<String>,
    pub status: CheckStatus,
    pub affected_rows: usize,
    pub sample_values: Vec<SampleToken>,
    pub message: String,
    pub check_time: NaiveDateTime,
}

impl CheckResult {
    /// Build a PASS/FAIL result from a violation count. `message` is only
    /// rendered for failures.
    pub fn from_count(
        check_name: &str,
        table: &str,
        column: Option<&str>,
        affected_rows: usize,
        samples: impl IntoIterator<Item = SampleToken>,
        message: impl FnOnce(usize) -> String,
        check_time: NaiveDateTime,
    ) -> Self {
        let (status, sample_values, message) = if affected_rows > 0 {
            let samples = samples
                .into_iter()
                .take(MAX_SAMPLES.min(affected_rows))
                .collect();
            (CheckStatus::Fail, samples, message(affected_rows))
        } else {
            (CheckStatus::Pass, Vec::new(), String::new())
        };
        Self {
            check_name: check_name.to_string(),
            table: table.to_string(),
            column: column.map(str::to_string),
            status,
            affected_rows,
            sample_values,
            message,
            check_time,
        }
    }

    /// Result for a check that hit a structural fault.
    pub fn fault(
        check_name: &str,
        table: &str,
        column: Option<&str>,
        error: &DqError,
        check_time: NaiveDateTime,
    ) -> Self {
        Self {
            check_name: check_name.to_string(),
            table: table.to_string(),
            column: column.map(str::to_string),
            status: CheckStatus::Error,
            affected_rows: 0,
            sample_values: Vec::new(),
            message: error.to_string(),
            check_time,
        }
    }

    /// `table.column`, or just the table for table-wide results.
    pub fn target(&self) -> String {
        match &self.column {
            Some(c) => format!("{}.{}", self.table, c),
            None => self.table.clone(),
        }
    }
}

/// Symbolic risk rule codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskRuleCode {
    MissingStrongAuth,
    UnverifiedOrUntrustedDevice,
    NoStrongAuthInHighVolumeDay,
}

impl RiskRuleCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingStrongAuth => "MISSING_STRONG_AUTH",
            Self::UnverifiedOrUntrustedDevice => "UNVERIFIED_OR_UNTRUSTED_DEVICE",
            Self::NoStrongAuthInHighVolumeDay => "NO_STRONG_AUTH_IN_HIGH_VOLUME_DAY",
        }
    }
}

impl fmt::Display for RiskRuleCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const NO_VIOLATION: &str = "No violation";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskCheckResult {
    pub check_name: String,
    pub risk_rule: RiskRuleCode,
    pub status: CheckStatus,
    pub affected_rows: usize,
    pub sample_transaction_ids: Vec<String>,
    pub message: String,
    pub detected_at: NaiveDateTime,
}

impl RiskCheckResult {
    /// `transaction_ids` is the full violation column in row order; the
    /// sample keeps the first distinct ids. A null id still counts as an
    /// affected row but is never sampled.
    pub fn from_violations<'a>(
        check_name: &str,
        risk_rule: RiskRuleCode,
        reason: &str,
        transaction_ids: impl IntoIterator<Item = Option<&'a str>>,
        detected_at: NaiveDateTime,
    ) -> Self {
        let mut affected_rows = 0;
        let mut sample: Vec<String> = Vec::new();
        for id in transaction_ids {
            affected_rows += 1;
            let Some(id) = id else { continue };
            if sample.len() < MAX_SAMPLES && !sample.iter().any(|s| s == id) {
                sample.push(id.to_string());
            }
        }
        let (status, message) = if affected_rows > 0 {
            (CheckStatus::Fail, reason.to_string())
        } else {
            (CheckStatus::Pass, NO_VIOLATION.to_string())
        };
        Self {
            check_name: check_name.to_string(),
            risk_rule,
            status,
            affected_rows,
            sample_transaction_ids: sample,
            message,
            detected_at,
        }
    }

    pub fn fault(
        check_name: &str,
        risk_rule: RiskRuleCode,
        error: &DqError,
        detected_at: NaiveDateTime,
    ) -> Self {
        Self {
            check_name: check_name.to_string(),
            risk_rule,
            status: CheckStatus::Error,
            affected_rows: 0,
            sample_transaction_ids: Vec::new(),
            message: error.to_string(),
            detected_at,
        }
    }
}

impl From<&RiskCheckResult> for CheckResult {
    fn from(r: &RiskCheckResult) -> Self {
        Self {
            check_name: r.check_name.clone(),
            table: crate::schema::TableKind::Transactions.label().to_string(),
            column: None,
            status: r.status,
            affected_rows: r.affected_rows,
            sample_values: r
                .sample_transaction_ids
                .iter()
                .cloned()
                .map(SampleToken::Value)
                .collect(),
            message: if r.status.is_pass() { String::new() } else { r.message.clone() },
            check_time: r.detected_at,
        }
    }
}

/// One transaction flagged by one risk rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskTag {
    pub risk_id: Uuid,
    /// `None` when the flagged row had no transaction id.
    pub transaction_id: Option<EntityId>,
    pub customer_id: Option<EntityId>,
    pub account_id: Option<EntityId>,
    pub device_id: Option<EntityId>,
    pub timestamp: Option<NaiveDateTime>,
    pub risk_rule: RiskRuleCode,
    pub risk_reason: String,
    pub created_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RowKey;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn zero_count_passes_with_empty_message() {
        let r = CheckResult::from_count(
            "null_check",
            "Device",
            Some("device_id"),
            0,
            vec![SampleToken::Row(RowKey(1))],
            |n| format!("{n} nulls"),
            at(),
        );
        assert_eq!(r.status, CheckStatus::Pass);
        assert!(r.sample_values.is_empty());
        assert!(r.message.is_empty());
    }

    #[test]
    fn samples_are_capped_at_five_in_encounter_order() {
        let rows = (0..9).map(|i| SampleToken::Row(RowKey(i)));
        let r = CheckResult::from_count("null_check", "Device", None, 9, rows, |n| n.to_string(), at());
        assert_eq!(r.status, CheckStatus::Fail);
        assert_eq!(
            r.sample_values,
            (0..5).map(|i| SampleToken::Row(RowKey(i))).collect::<Vec<_>>()
        );
        assert_eq!(r.message, "9");
    }

    #[test]
    fn samples_never_exceed_affected_rows() {
        let rows = (0..4).map(|i| SampleToken::Row(RowKey(i)));
        let r = CheckResult::from_count("x", "T", None, 2, rows, |_| "m".into(), at());
        assert_eq!(r.sample_values.len(), 2);
    }

    #[test]
    fn risk_sample_ids_are_distinct() {
        let ids = ["t1", "t1", "t2", "t3", "t2", "t4", "t5", "t6"];
        let r = RiskCheckResult::from_violations(
            "high_value_no_auth",
            RiskRuleCode::MissingStrongAuth,
            "reason",
            ids.into_iter().map(Some),
            at(),
        );
        assert_eq!(r.affected_rows, 8);
        assert_eq!(r.sample_transaction_ids, vec!["t1", "t2", "t3", "t4", "t5"]);
        assert_eq!(r.message, "reason");

        let clean = RiskCheckResult::from_violations(
            "high_value_no_auth",
            RiskRuleCode::MissingStrongAuth,
            "reason",
            std::iter::empty(),
            at(),
        );
        assert_eq!(clean.status, CheckStatus::Pass);
        assert_eq!(clean.message, NO_VIOLATION);
    }

    #[test]
    fn null_ids_count_but_are_not_sampled() {
        let r = RiskCheckResult::from_violations(
            "high_value_no_auth",
            RiskRuleCode::MissingStrongAuth,
            "reason",
            [None, Some("t1"), None],
            at(),
        );
        assert_eq!(r.status, CheckStatus::Fail);
        assert_eq!(r.affected_rows, 3);
        assert_eq!(r.sample_transaction_ids, vec!["t1"]);
    }

    #[test]
    fn status_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&CheckStatus::Fail).unwrap(), "\"FAIL\"");
        assert_eq!(
            serde_json::to_string(&RiskRuleCode::NoStrongAuthInHighVolumeDay).unwrap(),
            "\"NO_STRONG_AUTH_IN_HIGH_VOLUME_DAY\""
        );
    }
}
