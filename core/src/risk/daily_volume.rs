use super::{is_strong, number_at, timestamp_at, transactions_with_auth, RiskRule, Violation};
use crate::{
    config::RiskConfig,
    error::DqResult,
    result::RiskRuleCode,
    table::RecordStore,
    value::ValueKey,
};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

type CustomerDay = (ValueKey, NaiveDate);

/// Customer-days whose summed amount exceeds the daily threshold with not
/// a single strongly authenticated transaction that day. Every transaction
/// of such a day is flagged; one strong transaction clears the whole day.
pub struct DailyVolumeNoStrongAuth {
    threshold: f64,
    strong_methods: Vec<String>,
}

impl DailyVolumeNoStrongAuth {
    pub fn new(config: &RiskConfig) -> Self {
        Self {
            threshold: config.daily_volume_threshold,
            strong_methods: config.strong_auth_methods.clone(),
        }
    }
}

impl RiskRule for DailyVolumeNoStrongAuth {
    fn check_name(&self) -> &'static str {
        "daily_sum_no_auth"
    }

    fn code(&self) -> RiskRuleCode {
        RiskRuleCode::NoStrongAuthInHighVolumeDay
    }

    fn reason(&self) -> &'static str {
        "Total transaction > 20M/day but no OTP/BIOMETRIC used"
    }

    fn violations(&self, store: &RecordStore) -> DqResult<Vec<Violation>> {
        let frame = transactions_with_auth(store)?;

        let customer = frame.column_index("customer_id")?;
        let ts = frame.column_index("timestamp")?;
        let amount = frame.column_index("amount")?;
        let method = frame.column_index("auth_method")?;

        // Rows without a customer or a timestamp belong to no group.
        let mut days: Vec<Option<CustomerDay>> = Vec::with_capacity(frame.len());
        // Summed in whole cents so a day adding up to exactly the threshold
        // never drifts above it.
        let mut sums: HashMap<CustomerDay, i64> = HashMap::new();
        let mut strong_days: HashSet<CustomerDay> = HashSet::new();

        for (n, row) in frame.rows().iter().enumerate() {
            let key = row[customer].key();
            let date = timestamp_at(row, ts, "timestamp", n)?.map(|t| t.date());
            let day = match date {
                Some(d) if !key.is_null() => (key, d),
                _ => {
                    days.push(None);
                    continue;
                }
            };
            let value = number_at(row, amount, "amount", n)?.unwrap_or(0.0);
            *sums.entry(day.clone()).or_insert(0) += to_cents(value);
            if is_strong(&row[method], &self.strong_methods) {
                strong_days.insert(day.clone());
            }
            days.push(Some(day));
        }

        let threshold = to_cents(self.threshold);
        let flagged: HashSet<&CustomerDay> = sums
            .iter()
            .filter(|(day, total)| **total > threshold && !strong_days.contains(*day))
            .map(|(day, _)| day)
            .collect();

        let risky = frame.try_filter(|n, _| Ok(days[n].as_ref().is_some_and(|d| flagged.contains(d))))?;

        Violation::from_frame(&risky)
    }
}

fn to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}
