//! The condition expression language gating choice visibility and selection.

use serde::{Deserialize, Serialize};
use story_state::{CharacterId, CharacterState, GameState, Pattern, RelationshipStatus, MIN_TRUST};

/// Comparison operator for numeric leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Compare {
    #[default]
    AtLeast,
    AtMost,
    Exactly,
}

impl Compare {
    fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            Compare::AtLeast => lhs >= rhs,
            Compare::AtMost => lhs <= rhs,
            Compare::Exactly => lhs == rhs,
        }
    }
}

/// A serializable predicate over game state.
///
/// Conditions are authored in content files alongside the graphs they gate,
/// so the representation is a small tagged tree rather than code. Compound
/// nodes short-circuit left to right; leaves naming no character fall back
/// to the character whose graph is being evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Every sub-condition holds.
    All(Vec<Condition>),
    /// At least one sub-condition holds.
    Any(Vec<Condition>),
    Not(Box<Condition>),
    /// A global flag is set.
    HasFlag(String),
    /// A character knows a fact about the player.
    Knows {
        #[serde(default)]
        character: Option<CharacterId>,
        flag: String,
    },
    Trust {
        #[serde(default)]
        character: Option<CharacterId>,
        #[serde(default)]
        op: Compare,
        value: i32,
    },
    RelationshipIs {
        #[serde(default)]
        character: Option<CharacterId>,
        status: RelationshipStatus,
    },
    PatternTotal {
        pattern: Pattern,
        #[serde(default)]
        op: Compare,
        value: i64,
    },
}

impl Condition {
    /// Evaluate against a state.
    ///
    /// Pure and total: a character the state has never touched evaluates
    /// against the default character record (trust at the floor, stranger,
    /// no knowledge), never as an error.
    pub fn evaluate(&self, state: &GameState, current: Option<&CharacterId>) -> bool {
        match self {
            Condition::All(parts) => parts.iter().all(|c| c.evaluate(state, current)),
            Condition::Any(parts) => parts.iter().any(|c| c.evaluate(state, current)),
            Condition::Not(inner) => !inner.evaluate(state, current),
            Condition::HasFlag(flag) => state.has_flag(flag),
            Condition::Knows { character, flag } => {
                character_state(state, character.as_ref(), current)
                    .map_or(false, |c| c.knows(flag))
            }
            Condition::Trust {
                character,
                op,
                value,
            } => {
                let trust = character_state(state, character.as_ref(), current)
                    .map_or(MIN_TRUST, |c| c.trust);
                op.holds(trust as i64, *value as i64)
            }
            Condition::RelationshipIs { character, status } => {
                character_state(state, character.as_ref(), current)
                    .map_or(RelationshipStatus::default(), |c| c.status)
                    == *status
            }
            Condition::PatternTotal { pattern, op, value } => {
                op.holds(state.pattern_total(*pattern), *value)
            }
        }
    }

    pub fn all(parts: Vec<Condition>) -> Self {
        Condition::All(parts)
    }

    pub fn any(parts: Vec<Condition>) -> Self {
        Condition::Any(parts)
    }

    pub fn not(inner: Condition) -> Self {
        Condition::Not(Box::new(inner))
    }

    pub fn flag(name: impl Into<String>) -> Self {
        Condition::HasFlag(name.into())
    }

    pub fn knows(character: Option<CharacterId>, flag: impl Into<String>) -> Self {
        Condition::Knows {
            character,
            flag: flag.into(),
        }
    }

    pub fn trust_at_least(character: Option<CharacterId>, value: i32) -> Self {
        Condition::Trust {
            character,
            op: Compare::AtLeast,
            value,
        }
    }

    pub fn pattern_at_least(pattern: Pattern, value: i64) -> Self {
        Condition::PatternTotal {
            pattern,
            op: Compare::AtLeast,
            value,
        }
    }
}

fn character_state<'a>(
    state: &'a GameState,
    named: Option<&CharacterId>,
    current: Option<&CharacterId>,
) -> Option<&'a CharacterState> {
    let id = named.or(current)?;
    state.character(id)
}
