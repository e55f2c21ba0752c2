use super::{bool_at, transactions_with_customer, RiskRule, Violation};
use crate::{error::DqResult, result::RiskRuleCode, schema::TableKind, table::RecordStore};

/// Transactions made from a device that is not verified, or not trusted
/// by the account owner. Missing flags count as not true: a device must
/// prove both to pass.
pub struct UnverifiedOrUntrustedDevice;

impl RiskRule for UnverifiedOrUntrustedDevice {
    fn check_name(&self) -> &'static str {
        "device_not_verified_or_trusted"
    }

    fn code(&self) -> RiskRuleCode {
        RiskRuleCode::UnverifiedOrUntrustedDevice
    }

    fn reason(&self) -> &'static str {
        "Transaction used unverified or untrusted device"
    }

    fn violations(&self, store: &RecordStore) -> DqResult<Vec<Violation>> {
        let frame = transactions_with_customer(store)?
            .left_join(
                store.table(TableKind::Devices)?,
                &[("device_id", "device_id")],
                &["is_verified"],
            )?
            .left_join(
                store.table(TableKind::CustomerDevice)?,
                &[("customer_id", "customer_id"), ("device_id", "device_id")],
                &["is_trusted"],
            )?;

        let verified = frame.column_index("is_verified")?;
        let trusted = frame.column_index("is_trusted")?;
        let risky = frame.try_filter(|n, row| {
            let verified = bool_at(row, verified, "is_verified", n)?;
            let trusted = bool_at(row, trusted, "is_trusted", n)?;
            Ok(verified != Some(true) || trusted != Some(true))
        })?;

        Violation::from_frame(&risky)
    }
}
