//! Pipeline events.
//!
//! Every stage start, attempt outcome and retry is appended to the
//! `run_event` log so a run can be audited after the fact.

use crate::types::RunId;
use serde::{Deserialize, Serialize};

/// Every event emitted while running the pipeline.
/// Variants are only ever appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    RunStarted {
        run_id: RunId,
        seed: u64,
    },
    StageStarted {
        stage: String,
        attempt: u32,
    },
    StageSucceeded {
        stage: String,
        attempt: u32,
        summary: String,
    },
    StageFailed {
        stage: String,
        attempt: u32,
        reason: String,
    },
    StageRetried {
        stage: String,
        next_attempt: u32,
    },
    RunHalted {
        stage: String,
        attempts: u32,
    },
    RunCompleted {
        run_id: RunId,
        clean: bool,
    },
}

impl RunEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::RunStarted { .. } => "run_started",
            Self::StageStarted { .. } => "stage_started",
            Self::StageSucceeded { .. } => "stage_succeeded",
            Self::StageFailed { .. } => "stage_failed",
            Self::StageRetried { .. } => "stage_retried",
            Self::RunHalted { .. } => "run_halted",
            Self::RunCompleted { .. } => "run_completed",
        }
    }

    /// Stage the event belongs to, or "run" for run-level events.
    pub fn stage(&self) -> &str {
        match self {
            Self::StageStarted { stage, .. }
            | Self::StageSucceeded { stage, .. }
            | Self::StageFailed { stage, .. }
            | Self::StageRetried { stage, .. }
            | Self::RunHalted { stage, .. } => stage,
            Self::RunStarted { .. } | Self::RunCompleted { .. } => "run",
        }
    }
}

/// A persisted event. `payload` is the JSON-serialized `RunEvent`.
#[derive(Debug, Clone)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub run_id: RunId,
    pub stage: String,
    pub event_type: String,
    pub payload: String,
    pub created_at: String,
}

impl EventLogEntry {
    pub fn decode(&self) -> serde_json::Result<RunEvent> {
        serde_json::from_str(&self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = RunEvent::StageRetried {
            stage: "quality".into(),
            next_attempt: 2,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"stage_retried""#));
        let back: RunEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
        assert_eq!(back.stage(), "quality");
    }
}
