//! Per-character relationship state.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::ids::{ChoiceId, NodeId};

/// Lower trust bound.
pub const MIN_TRUST: i32 = 0;
/// Upper trust bound.
pub const MAX_TRUST: i32 = 10;

/// Where the relationship with a character currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipStatus {
    #[default]
    Stranger,
    Acquaintance,
    Friend,
    Confidant,
    /// The character has visibly transformed in front of the player.
    Transformed,
}

/// One entry in a character's append-only conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub node: NodeId,
    pub choice: ChoiceId,
    /// Logical turn counter at the moment the choice was taken.
    pub turn: u32,
}

/// A single trust reading on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustSample {
    pub value: i32,
    pub turn: u32,
}

/// Trust-over-time samples with running statistics.
///
/// The clock is the logical turn counter, never wall time, so replaying a
/// change log reproduces the timeline exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TrustTimeline {
    pub samples: Vec<TrustSample>,
    pub peak: i32,
    pub trough: i32,
    /// Consecutive positive deltas up to and including the latest sample.
    pub positive_streak: u32,
}

impl TrustTimeline {
    /// Append a sample and fold it into the running statistics.
    pub fn record(&mut self, value: i32, delta: i32, turn: u32) {
        if self.samples.is_empty() {
            self.peak = value;
            self.trough = value;
        } else {
            self.peak = self.peak.max(value);
            self.trough = self.trough.min(value);
        }
        self.samples.push(TrustSample { value, turn });
        if delta > 0 {
            self.positive_streak += 1;
        } else {
            self.positive_streak = 0;
        }
    }
}

/// Everything the engine tracks about one character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CharacterState {
    /// Clamped to `[MIN_TRUST, MAX_TRUST]` by every mutation path.
    pub trust: i32,
    pub status: RelationshipStatus,
    /// Facts this character knows about the player.
    pub knowledge: HashSet<String>,
    pub history: Vec<ConversationTurn>,
    /// Present only when the playthrough opted into trust tracking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<TrustTimeline>,
}

impl CharacterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh character state that records a trust timeline.
    pub fn with_timeline() -> Self {
        Self {
            timeline: Some(TrustTimeline::default()),
            ..Self::default()
        }
    }

    pub fn knows(&self, flag: &str) -> bool {
        self.knowledge.contains(flag)
    }

    /// Add a trust delta, clamp into bounds, and sample the timeline if one
    /// is being kept. Accumulate-then-clamp is the documented order.
    pub fn adjust_trust(&mut self, delta: i32, turn: u32) {
        self.trust = (self.trust + delta).clamp(MIN_TRUST, MAX_TRUST);
        if let Some(timeline) = &mut self.timeline {
            timeline.record(self.trust, delta, turn);
        }
    }
}
