//! Risk rules over the transaction set.
//!
//! Every rule is the same three steps:
//!   1. enrich transactions with left joins against auxiliary tables,
//!   2. filter the enriched frame down to the risky rows,
//!   3. emit one result plus one tag per surviving row.
//!
//! Rules implement steps 1 and 2 in [`RiskRule::violations`]; step 3 is
//! shared in [`emit`]. Rules run independently over the full transaction
//! set and never see each other's output.

mod daily_volume;
mod device_trust;
mod frame;
mod high_value;

pub use daily_volume::DailyVolumeNoStrongAuth;
pub use device_trust::UnverifiedOrUntrustedDevice;
pub use frame::{bool_at, number_at, timestamp_at, Frame};
pub use high_value::HighValueNoStrongAuth;

use crate::{
    error::DqResult,
    result::{RiskCheckResult, RiskRuleCode, RiskTag},
    schema::TableKind,
    table::RecordStore,
    value::Value,
};
use chrono::NaiveDateTime;
use uuid::Uuid;

/// Transaction columns every enriched frame starts from.
pub(crate) const TXN_COLUMNS: &[&str] = &[
    "transaction_id",
    "account_id",
    "device_id",
    "amount",
    "timestamp",
];

/// The contract every risk rule fulfills.
pub trait RiskRule {
    /// Stable check name, e.g. `high_value_no_auth`.
    fn check_name(&self) -> &'static str;

    fn code(&self) -> RiskRuleCode;

    fn reason(&self) -> &'static str;

    /// Steps 1 and 2: the violating transaction rows, in frame order.
    fn violations(&self, store: &RecordStore) -> DqResult<Vec<Violation>>;
}

/// The identifying fields of one violating enriched row.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub transaction_id: Value,
    pub customer_id: Value,
    pub account_id: Value,
    pub device_id: Value,
    pub timestamp: Value,
}

impl Violation {
    /// Project every row of an enriched frame.
    pub fn from_frame(frame: &Frame) -> DqResult<Vec<Self>> {
        let txn = frame.column_index("transaction_id")?;
        let customer = frame.column_index("customer_id")?;
        let account = frame.column_index("account_id")?;
        let device = frame.column_index("device_id")?;
        let ts = frame.column_index("timestamp")?;
        Ok(frame
            .rows()
            .iter()
            .map(|row| Self {
                transaction_id: row[txn].clone(),
                customer_id: row[customer].clone(),
                account_id: row[account].clone(),
                device_id: row[device].clone(),
                timestamp: row[ts].clone(),
            })
            .collect())
    }
}

/// Step 3: fold violations into a result and, on failure, one tag each.
pub fn emit(
    rule: &dyn RiskRule,
    violations: &[Violation],
    at: NaiveDateTime,
) -> (RiskCheckResult, Vec<RiskTag>) {
    let ids: Vec<Option<String>> = violations.iter().map(|v| v.transaction_id.to_opt_string()).collect();
    let result = RiskCheckResult::from_violations(
        rule.check_name(),
        rule.code(),
        rule.reason(),
        ids.iter().map(Option::as_deref),
        at,
    );

    let tags = violations
        .iter()
        .zip(ids)
        .map(|(v, transaction_id)| RiskTag {
            risk_id: Uuid::new_v4(),
            transaction_id,
            customer_id: v.customer_id.to_opt_string(),
            account_id: v.account_id.to_opt_string(),
            device_id: v.device_id.to_opt_string(),
            timestamp: v.timestamp.as_timestamp(),
            risk_rule: rule.code(),
            risk_reason: rule.reason().to_string(),
            created_at: at,
        })
        .collect();

    (result, tags)
}

/// Transactions enriched with the owning customer (via accounts).
pub(crate) fn transactions_with_customer(store: &RecordStore) -> DqResult<Frame> {
    Frame::from_table(store.table(TableKind::Transactions)?, TXN_COLUMNS)?.left_join(
        store.table(TableKind::Accounts)?,
        &[("account_id", "account_id")],
        &["customer_id"],
    )
}

/// Transactions enriched with their auth method(s), then the owning
/// customer. One row per (transaction, auth log) pair.
pub(crate) fn transactions_with_auth(store: &RecordStore) -> DqResult<Frame> {
    Frame::from_table(store.table(TableKind::Transactions)?, TXN_COLUMNS)?
        .left_join(
            store.table(TableKind::AuthLogs)?,
            &[("transaction_id", "transaction_id")],
            &["auth_method"],
        )?
        .left_join(
            store.table(TableKind::Accounts)?,
            &[("account_id", "account_id")],
            &["customer_id"],
        )
}

/// Membership in the strong-auth set. Null or non-text methods are never strong.
pub(crate) fn is_strong(method: &Value, strong: &[String]) -> bool {
    method
        .as_str()
        .is_some_and(|m| strong.iter().any(|s| s == m))
}
