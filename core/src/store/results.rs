use super::DqStore;
use crate::{
    aggregator::ResultSink,
    error::DqResult,
    result::{CheckResult, RiskCheckResult, RiskTag},
    value::TIMESTAMP_FORMAT,
};
use rusqlite::params;

/// One row of `data_quality_log` as read back.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityLogRow {
    pub check_name: String,
    pub table_name: String,
    pub column_name: Option<String>,
    pub status: String,
    pub affected_rows: i64,
    pub sample_values: Vec<String>,
    pub message: String,
}

/// One row of `risk_check_log` as read back.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskLogRow {
    pub check_name: String,
    pub risk_rule: String,
    pub status: String,
    pub affected_rows: i64,
    pub sample_transaction_ids: Vec<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskTagRow {
    pub risk_id: String,
    pub transaction_id: Option<String>,
    pub customer_id: Option<String>,
    pub risk_rule: String,
    pub risk_reason: String,
}

fn samples_json<T: ToString>(samples: &[T]) -> serde_json::Result<String> {
    serde_json::to_string(&samples.iter().map(ToString::to_string).collect::<Vec<_>>())
}

/// Each write replaces the previous run's rows. Writing risk results also
/// clears old tags, since a clean audit writes no tags at all.
impl ResultSink for DqStore {
    fn write_quality(&mut self, results: &[CheckResult]) -> DqResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM data_quality_log", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO data_quality_log
                 (check_name, table_name, column_name, status, affected_rows, sample_values, message, check_time)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for r in results {
                stmt.execute(params![
                    r.check_name,
                    r.table,
                    r.column,
                    r.status.as_str(),
                    r.affected_rows as i64,
                    samples_json(&r.sample_values[..])?,
                    r.message,
                    r.check_time.format(TIMESTAMP_FORMAT).to_string(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_risk(&mut self, results: &[RiskCheckResult]) -> DqResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM risk_check_log", [])?;
        tx.execute("DELETE FROM risk_tag", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO risk_check_log
                 (check_name, risk_rule, status, affected_rows, sample_transaction_ids, message, detected_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for r in results {
                stmt.execute(params![
                    r.check_name,
                    r.risk_rule.as_str(),
                    r.status.as_str(),
                    r.affected_rows as i64,
                    samples_json(&r.sample_transaction_ids[..])?,
                    r.message,
                    r.detected_at.format(TIMESTAMP_FORMAT).to_string(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_risk_tags(&mut self, tags: &[RiskTag]) -> DqResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO risk_tag
                 (risk_id, transaction_id, customer_id, account_id, device_id, timestamp, risk_rule, risk_reason, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for t in tags {
                stmt.execute(params![
                    t.risk_id.to_string(),
                    t.transaction_id,
                    t.customer_id,
                    t.account_id,
                    t.device_id,
                    t.timestamp.map(|ts| ts.format(TIMESTAMP_FORMAT).to_string()),
                    t.risk_rule.as_str(),
                    t.risk_reason,
                    t.created_at.format(TIMESTAMP_FORMAT).to_string(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

impl DqStore {
    // ── Result logs ───────────────────────────────────────────────

    pub fn quality_log(&self) -> DqResult<Vec<QualityLogRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT check_name, table_name, column_name, status, affected_rows, sample_values, message
             FROM data_quality_log ORDER BY id ASC",
        )?;
        let raw = stmt
            .query_map([], |row| {
                Ok((
                    QualityLogRow {
                        check_name: row.get(0)?,
                        table_name: row.get(1)?,
                        column_name: row.get(2)?,
                        status: row.get(3)?,
                        affected_rows: row.get(4)?,
                        sample_values: Vec::new(),
                        message: row.get(6)?,
                    },
                    row.get::<_, String>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        raw.into_iter()
            .map(|(mut row, samples)| -> DqResult<QualityLogRow> {
                row.sample_values = serde_json::from_str(&samples)?;
                Ok(row)
            })
            .collect()
    }

    pub fn risk_log(&self) -> DqResult<Vec<RiskLogRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT check_name, risk_rule, status, affected_rows, sample_transaction_ids, message
             FROM risk_check_log ORDER BY id ASC",
        )?;
        let raw = stmt
            .query_map([], |row| {
                Ok((
                    RiskLogRow {
                        check_name: row.get(0)?,
                        risk_rule: row.get(1)?,
                        status: row.get(2)?,
                        affected_rows: row.get(3)?,
                        sample_transaction_ids: Vec::new(),
                        message: row.get(5)?,
                    },
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        raw.into_iter()
            .map(|(mut row, samples)| -> DqResult<RiskLogRow> {
                row.sample_transaction_ids = serde_json::from_str(&samples)?;
                Ok(row)
            })
            .collect()
    }

    pub fn risk_tags(&self) -> DqResult<Vec<RiskTagRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT risk_id, transaction_id, customer_id, risk_rule, risk_reason
             FROM risk_tag ORDER BY rowid ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(RiskTagRow {
                    risk_id: row.get(0)?,
                    transaction_id: row.get(1)?,
                    customer_id: row.get(2)?,
                    risk_rule: row.get(3)?,
                    risk_reason: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::RiskRuleCode;
    use chrono::NaiveDate;
    use uuid::Uuid;

    #[test]
    fn tag_without_transaction_id_is_stored_as_null() {
        let mut store = DqStore::in_memory().unwrap();
        store.migrate().unwrap();
        let at = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let tag = RiskTag {
            risk_id: Uuid::new_v4(),
            transaction_id: None,
            customer_id: Some("c1".into()),
            account_id: None,
            device_id: None,
            timestamp: None,
            risk_rule: RiskRuleCode::MissingStrongAuth,
            risk_reason: "reason".into(),
            created_at: at,
        };
        store.write_risk_tags(&[tag]).unwrap();

        let rows = store.risk_tags().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].transaction_id, None);
        assert_eq!(rows[0].customer_id.as_deref(), Some("c1"));
        assert_eq!(rows[0].risk_rule, "MISSING_STRONG_AUTH");
    }
}
