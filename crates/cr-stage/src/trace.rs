//! StageTrace: the ordered stage stream of one session
//!
//! Two machines driven by the same seed and the same commands produce equal
//! `type_sequence()` and `status_sequence()`; replay tests lean on that.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::StageEvent;
use crate::stage::{Stage, StageCategory};

/// A complete trace of stage events for a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTrace {
    /// Unique identifier for this trace
    pub trace_id: String,

    /// Game identifier
    pub game_id: String,

    /// Seed the session PRNG was created from, when known
    #[serde(default)]
    pub seed: Option<u64>,

    /// All events in chronological order
    pub events: Vec<StageEvent>,

    /// When this trace was started
    pub recorded_at: DateTime<Utc>,

    /// Custom metadata
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl StageTrace {
    /// Create a new empty trace
    pub fn new(trace_id: impl Into<String>, game_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            game_id: game_id.into(),
            seed: None,
            events: Vec::new(),
            recorded_at: Utc::now(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Set seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Add an event to the trace
    pub fn push(&mut self, event: StageEvent) {
        self.events.push(event);
    }

    /// Remove and return all recorded events
    pub fn drain(&mut self) -> Vec<StageEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Get total duration in milliseconds
    pub fn duration_ms(&self) -> f64 {
        match (self.events.first(), self.events.last()) {
            (Some(first), Some(last)) => last.timestamp_ms - first.timestamp_ms,
            _ => 0.0,
        }
    }

    /// Get events by category
    pub fn events_by_category(&self, category: StageCategory) -> Vec<&StageEvent> {
        self.events
            .iter()
            .filter(|e| e.stage.category() == category)
            .collect()
    }

    /// Get events by stage type name
    pub fn events_by_type(&self, type_name: &str) -> Vec<&StageEvent> {
        self.events
            .iter()
            .filter(|e| e.stage.type_name() == type_name)
            .collect()
    }

    /// Check if trace contains a specific stage type
    pub fn has_stage(&self, type_name: &str) -> bool {
        self.events.iter().any(|e| e.stage.type_name() == type_name)
    }

    /// Stage type names in recorded order
    pub fn type_sequence(&self) -> Vec<&'static str> {
        self.events.iter().map(|e| e.stage.type_name()).collect()
    }

    /// Status ids the machine moved through, starting from the first `from`
    pub fn status_sequence(&self) -> Vec<String> {
        let mut sequence = Vec::new();
        for event in &self.events {
            if let Stage::StatusChange { from, to } = &event.stage {
                if sequence.is_empty() {
                    sequence.push(from.clone());
                }
                sequence.push(to.clone());
            }
        }
        sequence
    }

    /// Sum of every cascade step payout in the trace
    pub fn total_cascade_win(&self) -> i64 {
        self.events
            .iter()
            .filter_map(|e| match &e.stage {
                Stage::CascadeStep { step_win, .. } => Some(*step_win),
                _ => None,
            })
            .sum()
    }

    /// Number of rounds that reached a terminal stage
    pub fn round_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| e.stage.is_round_terminal())
            .count()
    }

    /// Export as pretty JSON
    pub fn to_json(&self) -> Result<String, TraceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Import from JSON
    pub fn from_json(json: &str) -> Result<Self, TraceError> {
        let trace: Self = serde_json::from_str(json)?;
        if let Some(bad) = trace
            .events
            .iter()
            .find(|e| !Stage::is_valid_type_name(e.stage.type_name()))
        {
            return Err(TraceError::Invalid(bad.stage.type_name().to_string()));
        }
        Ok(trace)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid trace: unknown stage {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(from: &str, to: &str) -> StageEvent {
        StageEvent::new(
            Stage::StatusChange {
                from: from.into(),
                to: to.into(),
            },
            0.0,
        )
    }

    #[test]
    fn test_status_sequence() {
        let mut trace = StageTrace::new("t1", "crimson_reels");
        trace.push(status("idle", "spinning"));
        trace.push(StageEvent::new(Stage::EvaluateWins, 2900.0));
        trace.push(status("spinning", "loss"));

        assert_eq!(trace.status_sequence(), vec!["idle", "spinning", "loss"]);
        assert_eq!(
            trace.type_sequence(),
            vec!["status_change", "evaluate_wins", "status_change"]
        );
        assert_eq!(trace.duration_ms(), 0.0);
    }

    #[test]
    fn test_total_cascade_win() {
        let mut trace = StageTrace::new("t2", "crimson_reels");
        for (i, win) in [200, 400].iter().enumerate() {
            trace.push(StageEvent::new(
                Stage::CascadeStep {
                    step_index: i as u32,
                    multiplier: i as u32 + 1,
                    step_win: *win,
                    winning_reels: vec![0, 1],
                },
                i as f64 * 1800.0,
            ));
        }
        assert_eq!(trace.total_cascade_win(), 600);
        assert_eq!(trace.duration_ms(), 1800.0);
    }

    #[test]
    fn test_json_roundtrip() {
        let mut trace = StageTrace::new("t3", "crimson_reels").with_seed(7);
        trace.push(StageEvent::new(Stage::SpinEnd { total_win: 0 }, 10.0));

        let json = trace.to_json().unwrap();
        let restored = StageTrace::from_json(&json).unwrap();
        assert_eq!(restored, trace);
        assert_eq!(restored.round_count(), 1);
    }

    #[test]
    fn test_drain() {
        let mut trace = StageTrace::new("t4", "crimson_reels");
        trace.push(StageEvent::new(Stage::AltarOpen, 0.0));
        let drained = trace.drain();
        assert_eq!(drained.len(), 1);
        assert!(trace.is_empty());
    }
}
