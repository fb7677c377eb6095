//! StageEvent: a stage occurrence with metadata
//!
//! Wraps a Stage with its timeline position and a ledger snapshot.

use serde::{Deserialize, Serialize};

use crate::stage::Stage;

/// A stage event with full metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageEvent {
    /// The canonical stage
    pub stage: Stage,

    /// Position on the virtual round timeline, in milliseconds
    pub timestamp_ms: f64,

    /// Ledger snapshot taken when the stage was recorded
    #[serde(default)]
    pub payload: StagePayload,

    /// Custom tags for filtering/routing
    #[serde(default)]
    pub tags: Vec<String>,
}

impl StageEvent {
    /// Create a new stage event
    pub fn new(stage: Stage, timestamp_ms: f64) -> Self {
        Self {
            stage,
            timestamp_ms,
            payload: StagePayload::default(),
            tags: Vec::new(),
        }
    }

    /// Create with payload
    pub fn with_payload(stage: Stage, timestamp_ms: f64, payload: StagePayload) -> Self {
        Self {
            stage,
            timestamp_ms,
            payload,
            tags: Vec::new(),
        }
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Get stage type name
    pub fn type_name(&self) -> &'static str {
        self.stage.type_name()
    }
}

/// Ledger snapshot attached to a stage event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StagePayload {
    /// Balance after the stage was applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<i64>,

    /// Jackpot pool after the stage was applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jackpot_pool: Option<f64>,

    /// Cascade multiplier in effect
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<u32>,

    /// Spin counter within the session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spin_index: Option<u64>,
}

impl StagePayload {
    /// Payload carrying balance and pool
    pub fn ledger(balance: i64, jackpot_pool: f64) -> Self {
        Self {
            balance: Some(balance),
            jackpot_pool: Some(jackpot_pool),
            ..Default::default()
        }
    }

    /// Builder: set multiplier
    pub fn multiplier(mut self, multiplier: u32) -> Self {
        self.multiplier = Some(multiplier);
        self
    }

    /// Builder: set spin index
    pub fn spin_index(mut self, index: u64) -> Self {
        self.spin_index = Some(index);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_event_creation() {
        let event = StageEvent::new(Stage::AltarOpen, 0.0).with_tag("altar");

        assert_eq!(event.stage, Stage::AltarOpen);
        assert_eq!(event.timestamp_ms, 0.0);
        assert_eq!(event.type_name(), "altar_open");
        assert!(event.tags.contains(&"altar".to_string()));
    }

    #[test]
    fn test_payload_serialization() {
        let payload = StagePayload::ledger(990, 5000.2).multiplier(2);

        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("balance"));
        assert!(json.contains("multiplier"));

        // Empty fields should be skipped
        assert!(!json.contains("spin_index"));
    }
}
