//! Stage orchestration.
//!
//! STAGE ORDER (fixed, never reordered):
//!   1. generate  - synthesize the dataset and write the six tables
//!   2. quality   - load, run the quality suite, write data_quality_log
//!   3. risk      - load, run the risk audit, write risk_check_log/risk_tag
//!
//! RULES:
//!   - Stages share nothing but the store.
//!   - A failing stage is retried up to `retries` times, then the run halts
//!     with `StageFailed`; later stages never start.
//!   - Every stage start, attempt outcome and retry is recorded as a RunEvent.
//!   - Business violations are results, not failures.

use crate::{
    aggregator::RunReport,
    clock::{Clock, SystemClock},
    config::DqConfig,
    engine::{CheckEngine, RiskEngine},
    error::{DqError, DqResult},
    event::RunEvent,
    generator::DatasetGenerator,
    store::DqStore,
    types::RunId,
};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Generate,
    Quality,
    Risk,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Self::Generate, Self::Quality, Self::Risk];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Generate => "generate",
            Self::Quality => "quality",
            Self::Risk => "risk",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|stage| stage.name() == s)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub struct Pipeline {
    pub run_id: RunId,
    config: DqConfig,
    clock: Box<dyn Clock>,
    retries: u32,
    store: DqStore,
}

impl Pipeline {
    pub fn new(store: DqStore, config: DqConfig) -> Self {
        let clock: Box<dyn Clock> = Box::new(SystemClock);
        // The suffix keeps two runs started in the same second apart.
        let run_id = format!(
            "run-{}-{}-{}",
            config.generator.seed,
            clock.now().format("%Y%m%d%H%M%S"),
            &Uuid::new_v4().simple().to_string()[..8]
        );
        Self {
            run_id,
            config,
            clock,
            retries: 1,
            store,
        }
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Number of retries after a stage's first failed attempt.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_run_id(mut self, run_id: impl Into<RunId>) -> Self {
        self.run_id = run_id.into();
        self
    }

    pub fn config(&self) -> &DqConfig {
        &self.config
    }

    pub fn store(&self) -> &DqStore {
        &self.store
    }

    pub fn into_store(self) -> DqStore {
        self.store
    }

    /// Run every stage in order. Halts at the first stage that fails all
    /// of its attempts.
    pub fn run_all(&mut self) -> DqResult<RunReport> {
        self.record(&RunEvent::RunStarted {
            run_id: self.run_id.clone(),
            seed: self.config.generator.seed,
        })?;

        let mut report = RunReport::default();
        for stage in Stage::ALL {
            report = report.merge(self.run_stage(stage)?);
        }

        self.record(&RunEvent::RunCompleted {
            run_id: self.run_id.clone(),
            clean: report.is_clean(),
        })?;
        log::info!("run {} finished: {}", self.run_id, report.verdict());
        Ok(report)
    }

    /// Run one stage with retries.
    pub fn run_stage(&mut self, stage: Stage) -> DqResult<RunReport> {
        let attempts = self.retries + 1;
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            self.record(&RunEvent::StageStarted {
                stage: stage.name().to_string(),
                attempt,
            })?;
            log::info!("stage {stage} started (attempt {attempt}/{attempts})");

            match self.attempt(stage) {
                Ok((report, summary)) => {
                    log::info!("stage {stage} succeeded: {summary}");
                    self.record(&RunEvent::StageSucceeded {
                        stage: stage.name().to_string(),
                        attempt,
                        summary,
                    })?;
                    return Ok(report);
                }
                Err(e) => {
                    log::warn!("stage {stage} attempt {attempt} failed: {e}");
                    last_error = e.to_string();
                    self.record(&RunEvent::StageFailed {
                        stage: stage.name().to_string(),
                        attempt,
                        reason: last_error.clone(),
                    })?;
                    if attempt < attempts {
                        self.record(&RunEvent::StageRetried {
                            stage: stage.name().to_string(),
                            next_attempt: attempt + 1,
                        })?;
                    }
                }
            }
        }

        log::error!("stage {stage} failed after {attempts} attempt(s), halting");
        self.record(&RunEvent::RunHalted {
            stage: stage.name().to_string(),
            attempts,
        })?;
        Err(DqError::StageFailed {
            stage: stage.name(),
            attempts,
            reason: last_error,
        })
    }

    fn attempt(&mut self, stage: Stage) -> DqResult<(RunReport, String)> {
        match stage {
            Stage::Generate => {
                let dataset = DatasetGenerator::new(self.config.generator.clone()).generate();
                self.store.replace_dataset(&dataset)?;
                let rows: usize = dataset
                    .kinds()
                    .filter_map(|kind| dataset.table(kind).ok())
                    .map(|t| t.len())
                    .sum();
                Ok((RunReport::default(), format!("{rows} rows written")))
            }
            Stage::Quality => {
                let records = self.store.load_record_store()?;
                let results =
                    CheckEngine::quality_suite(&self.config.checks).run(&records, self.clock.as_ref())?;
                let report = RunReport::from_quality(results);
                report.publish(&mut self.store)?;
                let summary = format!(
                    "{} checks, {} not passing",
                    report.quality.len(),
                    report.quality_failures().count()
                );
                Ok((report, summary))
            }
            Stage::Risk => {
                let records = self.store.load_record_store()?;
                let audit = RiskEngine::standard(&self.config.risk).run(&records, self.clock.as_ref())?;
                let report = RunReport::from_audit(audit);
                report.publish(&mut self.store)?;
                let summary = format!(
                    "{} rules, {} not passing, {} tags",
                    report.risk.len(),
                    report.risk_failures().count(),
                    report.risk_tags.len()
                );
                Ok((report, summary))
            }
        }
    }

    fn record(&self, event: &RunEvent) -> DqResult<()> {
        self.store.record_event(&self.run_id, event, self.clock.now())
    }
}
