//! Declarative state changes - the only mutation vocabulary in the engine.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::character::RelationshipStatus;
use crate::ids::CharacterId;
use crate::pattern::Pattern;

/// A serializable diff applied to a `GameState`.
///
/// Pure data, never a closure: changes can be logged, replayed, and fuzzed.
/// Every field is optional and absence means "no effect on that axis", so
/// partially specified hand-authored changes are valid by construction.
/// Field names follow the camelCase wire format of the content files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct StateChange {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub add_global_flags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remove_global_flags: Vec<String>,
    /// Signed delta per pattern accumulator.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub pattern_changes: HashMap<Pattern, i64>,
    /// Target of the character-scoped fields below.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_id: Option<CharacterId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_change: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set_relationship_status: Option<RelationshipStatus>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub add_knowledge_flags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remove_knowledge_flags: Vec<String>,
}

impl StateChange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_flag(mut self, flag: impl Into<String>) -> Self {
        self.add_global_flags.push(flag.into());
        self
    }

    pub fn remove_flag(mut self, flag: impl Into<String>) -> Self {
        self.remove_global_flags.push(flag.into());
        self
    }

    pub fn pattern(mut self, pattern: Pattern, delta: i64) -> Self {
        *self.pattern_changes.entry(pattern).or_insert(0) += delta;
        self
    }

    pub fn for_character(mut self, id: CharacterId) -> Self {
        self.character_id = Some(id);
        self
    }

    pub fn trust(mut self, delta: i32) -> Self {
        self.trust_change = Some(delta);
        self
    }

    pub fn set_status(mut self, status: RelationshipStatus) -> Self {
        self.set_relationship_status = Some(status);
        self
    }

    pub fn add_knowledge(mut self, flag: impl Into<String>) -> Self {
        self.add_knowledge_flags.push(flag.into());
        self
    }

    pub fn remove_knowledge(mut self, flag: impl Into<String>) -> Self {
        self.remove_knowledge_flags.push(flag.into());
        self
    }

    /// True when applying this change is a no-op on every axis.
    pub fn is_empty(&self) -> bool {
        self.add_global_flags.is_empty()
            && self.remove_global_flags.is_empty()
            && self.pattern_changes.is_empty()
            && self.character_id.is_none()
            && self.add_knowledge_flags.is_empty()
            && self.remove_knowledge_flags.is_empty()
    }
}
