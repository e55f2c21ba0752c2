//! Result aggregation and hand-off to sinks.

use crate::{
    engine::RiskAudit,
    error::DqResult,
    result::{CheckResult, CheckStatus, RiskCheckResult, RiskTag},
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Clean,
    Flagged,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clean => f.write_str("clean"),
            Self::Flagged => f.write_str("flagged"),
        }
    }
}

/// Everything one run produced, in evaluation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub quality: Vec<CheckResult>,
    pub risk: Vec<RiskCheckResult>,
    pub risk_tags: Vec<RiskTag>,
}

impl RunReport {
    pub fn from_quality(quality: Vec<CheckResult>) -> Self {
        Self {
            quality,
            ..Self::default()
        }
    }

    pub fn from_audit(audit: RiskAudit) -> Self {
        Self {
            risk: audit.results,
            risk_tags: audit.tags,
            ..Self::default()
        }
    }

    pub fn merge(mut self, other: RunReport) -> Self {
        self.quality.extend(other.quality);
        self.risk.extend(other.risk);
        self.risk_tags.extend(other.risk_tags);
        self
    }

    /// True iff every result, structural and risk, passed.
    pub fn is_clean(&self) -> bool {
        self.quality.iter().all(|r| r.status.is_pass()) && self.risk.iter().all(|r| r.status.is_pass())
    }

    pub fn verdict(&self) -> Verdict {
        if self.is_clean() {
            Verdict::Clean
        } else {
            Verdict::Flagged
        }
    }

    pub fn quality_failures(&self) -> impl Iterator<Item = &CheckResult> + '_ {
        self.quality.iter().filter(|r| !r.status.is_pass())
    }

    pub fn risk_failures(&self) -> impl Iterator<Item = &RiskCheckResult> + '_ {
        self.risk.iter().filter(|r| !r.status.is_pass())
    }

    pub fn error_count(&self) -> usize {
        self.quality.iter().filter(|r| r.status == CheckStatus::Error).count()
            + self.risk.iter().filter(|r| r.status == CheckStatus::Error).count()
    }

    /// Write the report to `sink`. Results are always written; risk tags
    /// only when at least one rule failed.
    pub fn publish(&self, sink: &mut dyn ResultSink) -> DqResult<()> {
        if !self.quality.is_empty() {
            sink.write_quality(&self.quality)?;
        }
        if !self.risk.is_empty() {
            sink.write_risk(&self.risk)?;
        }
        if !self.risk_tags.is_empty() {
            sink.write_risk_tags(&self.risk_tags)?;
        }
        Ok(())
    }
}

/// External destination for results.
pub trait ResultSink {
    fn write_quality(&mut self, results: &[CheckResult]) -> DqResult<()>;
    fn write_risk(&mut self, results: &[RiskCheckResult]) -> DqResult<()>;
    fn write_risk_tags(&mut self, tags: &[RiskTag]) -> DqResult<()>;
}

/// Collects everything it is given and writes one pretty JSON report.
pub struct JsonReportSink {
    path: String,
    report: RunReport,
}

impl JsonReportSink {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            report: RunReport::default(),
        }
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    pub fn flush(&self) -> DqResult<()> {
        #[derive(Serialize)]
        struct Document<'a> {
            verdict: Verdict,
            #[serde(flatten)]
            report: &'a RunReport,
        }
        let json = serde_json::to_string_pretty(&Document {
            verdict: self.report.verdict(),
            report: &self.report,
        })?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl ResultSink for JsonReportSink {
    fn write_quality(&mut self, results: &[CheckResult]) -> DqResult<()> {
        self.report.quality.extend_from_slice(results);
        Ok(())
    }

    fn write_risk(&mut self, results: &[RiskCheckResult]) -> DqResult<()> {
        self.report.risk.extend_from_slice(results);
        Ok(())
    }

    fn write_risk_tags(&mut self, tags: &[RiskTag]) -> DqResult<()> {
        self.report.risk_tags.extend_from_slice(tags);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::RiskRuleCode;
    use chrono::NaiveDate;

    fn at() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    fn quality(affected: usize) -> CheckResult {
        CheckResult::from_count("null_check", "Device", Some("device_id"), affected, vec![], |n| n.to_string(), at())
    }

    fn risk(ids: &[&str]) -> RiskCheckResult {
        RiskCheckResult::from_violations(
            "high_value_no_auth",
            RiskRuleCode::MissingStrongAuth,
            "reason",
            ids.iter().copied().map(Some),
            at(),
        )
    }

    #[test]
    fn verdict_is_the_conjunction_of_statuses() {
        let clean = RunReport {
            quality: vec![quality(0), quality(0)],
            risk: vec![risk(&[])],
            risk_tags: vec![],
        };
        assert!(clean.is_clean());
        assert_eq!(clean.verdict(), Verdict::Clean);

        let flagged_by_quality = RunReport::from_quality(vec![quality(0), quality(3)]);
        assert_eq!(flagged_by_quality.verdict(), Verdict::Flagged);
        assert_eq!(flagged_by_quality.quality_failures().count(), 1);

        let flagged_by_risk = clean.clone().merge(RunReport {
            risk: vec![risk(&["t1"])],
            ..RunReport::default()
        });
        assert!(!flagged_by_risk.is_clean());
    }

    #[test]
    fn empty_report_is_clean() {
        assert!(RunReport::default().is_clean());
    }

    #[test]
    fn publish_skips_tags_when_none() {
        let report = RunReport::from_quality(vec![quality(1)]);
        let mut sink = JsonReportSink::new("unused.json");
        report.publish(&mut sink).unwrap();
        assert_eq!(sink.report().quality.len(), 1);
        assert!(sink.report().risk.is_empty());
        assert!(sink.report().risk_tags.is_empty());
    }
}
