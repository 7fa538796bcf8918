//! Event types for profiling.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A profiling event with timestamp and optional duration.
#[derive(Serialize)]
pub struct ProfileEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    /// Duration in microseconds (for timed events)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_us: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl ProfileEvent {
    pub fn new(event_type: EventType) -> Self {
        Self {
            timestamp: Utc::now(),
            event_type,
            duration_us: None,
            metadata: None,
        }
    }

    pub fn with_duration(event_type: EventType, duration: std::time::Duration) -> Self {
        Self {
            duration_us: Some(duration.as_micros() as u64),
            ..Self::new(event_type)
        }
    }

    pub fn with_metadata(event_type: EventType, metadata: serde_json::Value) -> Self {
        Self {
            metadata: Some(metadata),
            ..Self::new(event_type)
        }
    }
}

/// Types of events that can be logged.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventType {
    // === Session lifecycle ===
    SessionStart {
        session_id: String,
    },
    SessionEnd {
        total_events: u64,
    },

    // === Database operations ===
    DbQuery {
        /// Operation type (select, upsert, delete)
        operation: String,
        table: String,
    },

    // === Practice engine ===
    /// Exercise batch built
    ExerciseGeneration {
        targets: usize,
        /// Distinct items available for distractors
        pool: usize,
        questions: usize,
    },
    /// Staged placement answer recorded
    PlacementStep {
        tier: u8,
        answered: usize,
        correct: usize,
        outcome: String,
    },
    /// One second of the free trial elapsed
    TrialTick {
        remaining_seconds: i64,
    },
    BadgeEvaluation {
        xp: u32,
        streak: u32,
        lessons_completed: u32,
        earned: usize,
    },

    // === Timed scope ===
    /// A timed code block completed
    TimedScope {
        name: String,
        duration_ms: u64,
    },

    // === Custom events ===
    Custom {
        name: String,
        data: serde_json::Value,
    },
}
