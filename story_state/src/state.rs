//! The root playthrough snapshot and the state-change applicator.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::change::StateChange;
use crate::character::{CharacterState, ConversationTurn};
use crate::ids::{CharacterId, ChoiceId, NodeId, PlayerId};
use crate::orbs::OrbState;
use crate::pattern::{Pattern, PerPattern};

/// Current snapshot format version.
pub const SAVE_VERSION: u32 = 1;

/// The complete state of one playthrough.
///
/// A `GameState` is created once per playthrough and thereafter exists only
/// as a chain of [`GameState::apply`] outputs. The applicator takes the old
/// snapshot by value and returns the new one, so no two snapshots ever alias
/// the same mutable container and no caller can observe a half-applied
/// change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub version: u32,
    pub player: PlayerId,
    /// Cursor into the dialogue graphs.
    pub current_node: NodeId,
    pub characters: HashMap<CharacterId, CharacterState>,
    pub global_flags: HashSet<String>,
    /// Unbounded signed accumulators, one per pattern.
    pub patterns: PerPattern<i64>,
    pub orbs: OrbState,
}

impl GameState {
    /// A fresh playthrough: empty maps and sets, zero patterns, cursor at
    /// the designated start node.
    pub fn new(player: PlayerId, start_node: NodeId) -> Self {
        Self {
            version: SAVE_VERSION,
            player,
            current_node: start_node,
            characters: HashMap::new(),
            global_flags: HashSet::new(),
            patterns: PerPattern::default(),
            orbs: OrbState::new(),
        }
    }

    pub fn character(&self, id: &CharacterId) -> Option<&CharacterState> {
        self.characters.get(id)
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.global_flags.contains(flag)
    }

    pub fn pattern_total(&self, pattern: Pattern) -> i64 {
        *self.patterns.get(pattern)
    }

    /// Total conversation turns taken across all characters - the logical
    /// clock used for history entries and trust timelines.
    pub fn turn_count(&self) -> u32 {
        self.characters
            .values()
            .map(|c| c.history.len() as u32)
            .sum()
    }

    /// Apply a declarative change, consuming the old snapshot.
    ///
    /// Order of operations is part of the contract:
    /// - global flags: removes land before adds, so a flag named in both
    ///   lists ends present;
    /// - pattern deltas: plain signed addition, no clamping and no flooring;
    /// - character axis: trust accumulates first and is clamped into
    ///   `[MIN_TRUST, MAX_TRUST]` after; status replaces the tag outright;
    ///   knowledge flags follow the same remove-then-add order as globals.
    ///
    /// A change naming a character the state has never seen heals by
    /// creating a default record - graph misconfiguration must never crash
    /// a live session.
    pub fn apply(mut self, change: &StateChange) -> GameState {
        for flag in &change.remove_global_flags {
            self.global_flags.remove(flag);
        }
        for flag in &change.add_global_flags {
            self.global_flags.insert(flag.clone());
        }

        for (pattern, delta) in &change.pattern_changes {
            *self.patterns.get_mut(*pattern) += delta;
        }

        if let Some(id) = &change.character_id {
            let turn = self.turn_count();
            let character = self.characters.entry(id.clone()).or_insert_with(|| {
                tracing::debug!(character = %id, "healing missing character state");
                CharacterState::new()
            });
            if let Some(delta) = change.trust_change {
                character.adjust_trust(delta, turn);
            }
            if let Some(status) = change.set_relationship_status {
                character.status = status;
            }
            for flag in &change.remove_knowledge_flags {
                character.knowledge.remove(flag);
            }
            for flag in &change.add_knowledge_flags {
                character.knowledge.insert(flag.clone());
            }
        }

        self
    }

    /// Record a taken choice: append to the speaking character's history
    /// and, when the choice carries a pattern tag, credit both the pattern
    /// accumulator and an orb. Live play and the reachability simulator
    /// both go through here.
    pub fn record_choice(
        mut self,
        character: &CharacterId,
        node: &NodeId,
        choice: &ChoiceId,
        pattern: Option<Pattern>,
    ) -> GameState {
        let turn = self.turn_count();
        let entry = self.characters.entry(character.clone()).or_default();
        entry.history.push(ConversationTurn {
            node: node.clone(),
            choice: choice.clone(),
            turn,
        });
        if let Some(pattern) = pattern {
            *self.patterns.get_mut(pattern) += 1;
            self.orbs.earn(pattern, 1);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::{RelationshipStatus, MAX_TRUST, MIN_TRUST};

    fn fresh() -> GameState {
        GameState::new(PlayerId::nil(), NodeId::new("start"))
    }

    #[test]
    fn test_empty_change_is_value_identity() {
        let state = fresh()
            .apply(&StateChange::new().add_flag("met_maya"))
            .apply(&StateChange::new().pattern(Pattern::Helping, 2));
        let after = state.clone().apply(&StateChange::new());
        assert_eq!(state, after);
    }

    #[test]
    fn test_flag_add_is_idempotent() {
        let once = fresh().apply(&StateChange::new().add_flag("met_maya"));
        let twice = once.clone().apply(&StateChange::new().add_flag("met_maya"));
        assert_eq!(once.global_flags, twice.global_flags);
    }

    #[test]
    fn test_removing_absent_flag_is_noop() {
        let state = fresh().apply(&StateChange::new().remove_flag("never_set"));
        assert!(state.global_flags.is_empty());
    }

    #[test]
    fn test_same_flag_added_and_removed_ends_present() {
        // Removes land before adds.
        let state = fresh().apply(&StateChange::new().add_flag("spark").remove_flag("spark"));
        assert!(state.has_flag("spark"));
    }

    #[test]
    fn test_pattern_totals_accumulate_signed() {
        let state = fresh()
            .apply(&StateChange::new().pattern(Pattern::Boldness, 2))
            .apply(&StateChange::new().pattern(Pattern::Boldness, -5));
        assert_eq!(state.pattern_total(Pattern::Boldness), -3);
    }

    #[test]
    fn test_trust_extremes_pin_to_bounds() {
        let maya = CharacterId::new("maya");
        let state = fresh().apply(&StateChange::new().for_character(maya.clone()).trust(999));
        assert_eq!(state.character(&maya).unwrap().trust, MAX_TRUST);

        let state = state.apply(&StateChange::new().for_character(maya.clone()).trust(-999));
        assert_eq!(state.character(&maya).unwrap().trust, MIN_TRUST);
    }

    #[test]
    fn test_missing_character_heals_with_default() {
        let state = fresh().apply(
            &StateChange::new()
                .for_character(CharacterId::new("rhett"))
                .add_knowledge("saw_the_garden"),
        );
        let rhett = state.character(&CharacterId::new("rhett")).unwrap();
        assert_eq!(rhett.trust, MIN_TRUST);
        assert_eq!(rhett.status, RelationshipStatus::Stranger);
        assert!(rhett.knows("saw_the_garden"));
    }

    #[test]
    fn test_status_replaces_outright() {
        let maya = CharacterId::new("maya");
        let state = fresh()
            .apply(
                &StateChange::new()
                    .for_character(maya.clone())
                    .set_status(RelationshipStatus::Friend),
            )
            .apply(
                &StateChange::new()
                    .for_character(maya.clone())
                    .set_status(RelationshipStatus::Acquaintance),
            );
        assert_eq!(
            state.character(&maya).unwrap().status,
            RelationshipStatus::Acquaintance
        );
    }

    #[test]
    fn test_repeated_trust_and_pattern_scenario() {
        // Three applications of {maya: trust +3, helping +1}.
        let maya = CharacterId::new("maya");
        let change = StateChange::new()
            .for_character(maya.clone())
            .trust(3)
            .pattern(Pattern::Helping, 1);

        let mut state = fresh();
        for _ in 0..3 {
            state = state.apply(&change);
        }

        assert_eq!(state.character(&maya).unwrap().trust, 9);
        assert_eq!(state.pattern_total(Pattern::Helping), 3);
    }

    #[test]
    fn test_record_choice_appends_history_and_earns_orb() {
        let maya = CharacterId::new("maya");
        let state = fresh().record_choice(
            &maya,
            &NodeId::new("intro"),
            &ChoiceId::new("wave"),
            Some(Pattern::Helping),
        );

        let history = &state.character(&maya).unwrap().history;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].node, NodeId::new("intro"));
        assert_eq!(*state.orbs.balances.get(Pattern::Helping), 1);
        assert_eq!(state.orbs.total_earned, 1);
        assert_eq!(state.pattern_total(Pattern::Helping), 1);
    }

    #[test]
    fn test_untagged_choice_earns_nothing() {
        let state = fresh().record_choice(
            &CharacterId::new("maya"),
            &NodeId::new("intro"),
            &ChoiceId::new("stay_silent"),
            None,
        );
        assert_eq!(state.orbs.total_earned, 0);
    }
}
