use super::{is_strong, number_at, transactions_with_auth, RiskRule, Violation};
use crate::{config::RiskConfig, error::DqResult, result::RiskRuleCode, table::RecordStore};

/// Transactions at or above the high-value threshold that were not
/// authorized by a strong method. A transaction with no auth log at all has
/// no method and is flagged.
pub struct HighValueNoStrongAuth {
    threshold: f64,
    strong_methods: Vec<String>,
}

impl HighValueNoStrongAuth {
    pub fn new(config: &RiskConfig) -> Self {
        Self {
            threshold: config.high_value_threshold,
            strong_methods: config.strong_auth_methods.clone(),
        }
    }
}

impl RiskRule for HighValueNoStrongAuth {
    fn check_name(&self) -> &'static str {
        "high_value_no_auth"
    }

    fn code(&self) -> RiskRuleCode {
        RiskRuleCode::MissingStrongAuth
    }

    fn reason(&self) -> &'static str {
        "Transaction >= 10M VND must use OTP or biometric authentication"
    }

    fn violations(&self, store: &RecordStore) -> DqResult<Vec<Violation>> {
        let frame = transactions_with_auth(store)?;

        let amount = frame.column_index("amount")?;
        let method = frame.column_index("auth_method")?;
        let risky = frame.try_filter(|n, row| {
            let high = number_at(row, amount, "amount", n)?.is_some_and(|a| a >= self.threshold);
            Ok(high && !is_strong(&row[method], &self.strong_methods))
        })?;

        Violation::from_frame(&risky)
    }
}
