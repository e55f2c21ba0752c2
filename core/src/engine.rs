//! The evaluation engines.
//!
//! QUALITY SUITE ORDER (fixed, documented, never reordered):
//!   1. Null checks, every column of every table
//!   2. Uniqueness of natural and primary keys
//!   3. CCCD national number format
//!   4. Foreign keys, children before grandchildren
//!
//! RISK AUDIT ORDER:
//!   1. High-value transaction without strong auth
//!   2. Unverified or untrusted device
//!   3. High-volume day without strong auth
//!
//! RULES:
//!   - Checks run in registration order, one after another.
//!   - No check sees another check's output.
//!   - A structural fault in one check becomes an ERROR result for that
//!     check only; the rest of the suite still runs.

use crate::{
    checks::{Check, FormatCheck, ForeignKeyCheck, NullCheck, UniquenessCheck},
    clock::Clock,
    config::{CheckConfig, RiskConfig},
    error::DqResult,
    result::{CheckResult, CheckStatus, RiskCheckResult, RiskRuleCode, RiskTag},
    risk::{emit, DailyVolumeNoStrongAuth, HighValueNoStrongAuth, RiskRule, UnverifiedOrUntrustedDevice},
    schema::TableKind,
    table::RecordStore,
};
use serde::{Deserialize, Serialize};

#[derive(Default)]
pub struct CheckEngine {
    checks: Vec<Box<dyn Check>>,
}

impl CheckEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard structural suite over the six banking tables.
    pub fn quality_suite(config: &CheckConfig) -> Self {
        use TableKind::*;

        let mut engine = Self::new();
        for kind in TableKind::ALL {
            engine.register(Box::new(NullCheck::new(kind)));
        }

        for (kind, column) in [
            (Customers, "national_number"),
            (Customers, "customer_id"),
            (Devices, "device_id"),
            (Accounts, "account_id"),
            (Transactions, "transaction_id"),
            (AuthLogs, "auth_log_id"),
        ] {
            engine.register(Box::new(UniquenessCheck::new(kind, column)));
        }

        engine.register(Box::new(
            FormatCheck::new(
                "regex_check_cccd",
                Customers,
                "national_id",
                "CCCD",
                "national_number",
                &config.national_id_pattern,
            )
            .with_message("Invalid CCCD format (not 12 digits)"),
        ));

        for (child, parent, column) in [
            (Accounts, Customers, "customer_id"),
            (Transactions, Accounts, "account_id"),
            (Transactions, Devices, "device_id"),
            (AuthLogs, Transactions, "transaction_id"),
            (CustomerDevice, Customers, "customer_id"),
            (CustomerDevice, Devices, "device_id"),
        ] {
            engine.register(Box::new(
                ForeignKeyCheck::new(child, parent, column, column)
                    .with_null_policy(config.foreign_key_nulls),
            ));
        }
        engine
    }

    /// Register a check. Call in the documented order.
    pub fn register(&mut self, check: Box<dyn Check>) {
        self.checks.push(check);
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Run every check and collect results in registration order.
    pub fn run(&self, store: &RecordStore, clock: &dyn Clock) -> DqResult<Vec<CheckResult>> {
        let mut results = Vec::new();
        for check in &self.checks {
            let at = clock.now();
            match check.evaluate(store, at) {
                Ok(batch) => {
                    for r in &batch {
                        log_check(r);
                    }
                    results.extend(batch);
                }
                Err(e) if e.is_structural() => {
                    log::error!("{} on {} could not run: {e}", check.name(), check.table());
                    results.push(CheckResult::fault(
                        check.name(),
                        check.table(),
                        check.column(),
                        &e,
                        at,
                    ));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(results)
    }
}

fn log_check(r: &CheckResult) {
    match r.status {
        CheckStatus::Pass => log::info!("{} passed for {}", r.check_name, r.target()),
        _ => log::warn!(
            "{} {} for {}: {} ({} rows)",
            r.check_name,
            r.status,
            r.target(),
            r.message,
            r.affected_rows
        ),
    }
}

/// Output of one risk audit pass. Tags are grouped by rule, in rule order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskAudit {
    pub results: Vec<RiskCheckResult>,
    pub tags: Vec<RiskTag>,
}

impl RiskAudit {
    pub fn tags_for(&self, code: RiskRuleCode) -> impl Iterator<Item = &RiskTag> + '_ {
        self.tags.iter().filter(move |t| t.risk_rule == code)
    }

    pub fn result_for(&self, code: RiskRuleCode) -> Option<&RiskCheckResult> {
        self.results.iter().find(|r| r.risk_rule == code)
    }
}

#[derive(Default)]
pub struct RiskEngine {
    rules: Vec<Box<dyn RiskRule>>,
}

impl RiskEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The three standard rules in audit order.
    pub fn standard(config: &RiskConfig) -> Self {
        let mut engine = Self::new();
        engine.register(Box::new(HighValueNoStrongAuth::new(config)));
        engine.register(Box::new(UnverifiedOrUntrustedDevice));
        engine.register(Box::new(DailyVolumeNoStrongAuth::new(config)));
        engine
    }

    pub fn register(&mut self, rule: Box<dyn RiskRule>) {
        self.rules.push(rule);
    }

    pub fn run(&self, store: &RecordStore, clock: &dyn Clock) -> DqResult<RiskAudit> {
        let mut audit = RiskAudit::default();
        for rule in &self.rules {
            let at = clock.now();
            match rule.violations(store) {
                Ok(violations) => {
                    let (result, tags) = emit(rule.as_ref(), &violations, at);
                    if result.status.is_pass() {
                        log::info!("{} ({}): no violation", rule.check_name(), rule.code());
                    } else {
                        log::warn!(
                            "{} ({}): {} violating rows",
                            rule.check_name(),
                            rule.code(),
                            result.affected_rows
                        );
                    }
                    audit.results.push(result);
                    audit.tags.extend(tags);
                }
                Err(e) if e.is_structural() => {
                    log::error!("{} could not run: {e}", rule.check_name());
                    audit
                        .results
                        .push(RiskCheckResult::fault(rule.check_name(), rule.code(), &e, at));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(audit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_suite_has_the_documented_shape() {
        // 6 null + 6 uniqueness + 1 format + 6 foreign key
        assert_eq!(CheckEngine::quality_suite(&CheckConfig::default()).len(), 19);
    }

    #[test]
    fn standard_rules_run_in_audit_order() {
        let engine = RiskEngine::standard(&RiskConfig::default());
        let codes: Vec<RiskRuleCode> = engine.rules.iter().map(|r| r.code()).collect();
        assert_eq!(
            codes,
            vec![
                RiskRuleCode::MissingStrongAuth,
                RiskRuleCode::UnverifiedOrUntrustedDevice,
                RiskRuleCode::NoStrongAuthInHighVolumeDay,
            ]
        );
    }
}
