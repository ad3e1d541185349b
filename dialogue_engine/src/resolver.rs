//! Node resolution - entering a node under the current state.
//!
//! Resolution locates the graph that owns the target node (a choice may
//! jump into another character's graph, so the owning character is
//! re-resolved on every entry), applies the node's on-enter effects in
//! declared order, and computes which choices the player can see and take,
//! including the mercy unlock for fully orb-gated nodes.

use story_state::{CharacterId, GameState, NodeId};

use crate::error::EngineError;
use crate::graph::{Choice, DialogueNode};
use crate::registry::GraphRegistry;

/// A choice as presented to the player.
#[derive(Debug, Clone)]
pub struct ChoiceView {
    pub choice: Choice,
    /// Selectable right now.
    pub enabled: bool,
    /// Blocked by an unmet orb gate.
    pub orb_locked: bool,
    /// Force-enabled by the mercy rule.
    pub mercy_unlocked: bool,
}

/// The outcome of entering a node.
#[derive(Debug, Clone)]
pub struct ResolvedNode {
    pub state: GameState,
    /// Owner of the entered node, re-resolved on every entry.
    pub character: CharacterId,
    pub node: DialogueNode,
    /// Visible choices in declaration order.
    pub choices: Vec<ChoiceView>,
}

/// Enter a node: apply its on-enter effects and compute the choice set.
///
/// Fails only when the target id exists in no registered graph; the caller
/// can then fall back to a safe default node instead of crashing the
/// session.
pub fn resolve(
    registry: &GraphRegistry,
    target: &NodeId,
    state: GameState,
) -> Result<ResolvedNode, EngineError> {
    let (graph, node) = registry.node(target)?;
    let character = graph.character.clone();
    let node = node.clone();

    let mut state = state;
    state.current_node = target.clone();
    for change in &node.on_enter {
        state = state.apply(change);
    }

    let choices = present_choices(&node.choices, &state, &character);
    Ok(ResolvedNode {
        state,
        character,
        node,
        choices,
    })
}

/// Apply a selected choice's consequence and bookkeeping. The caller
/// follows up by resolving `choice.next`, which may live in another
/// character's graph.
pub fn take_choice(
    registry: &GraphRegistry,
    state: GameState,
    node: &NodeId,
    choice: &Choice,
) -> Result<GameState, EngineError> {
    let character = registry.owner(node)?.clone();
    let mut state = state;
    if let Some(consequence) = &choice.consequence {
        state = state.apply(consequence);
    }
    Ok(state.record_choice(&character, node, &choice.id, choice.pattern))
}

/// Compute visibility, orb locks, and the mercy unlock for a choice list.
///
/// A choice is visible iff its visibility condition holds, and selectable
/// iff additionally its enabled condition holds and its orb gate (if any)
/// is satisfied. When every visible-and-condition-enabled choice is orb
/// locked, exactly the candidate with the lowest threshold is force
/// enabled - ties broken by declaration order - so an otherwise eligible
/// node can never soft-lock the player.
fn present_choices(
    choices: &[Choice],
    state: &GameState,
    character: &CharacterId,
) -> Vec<ChoiceView> {
    let current = Some(character);
    let mut views: Vec<ChoiceView> = Vec::new();

    for choice in choices {
        let visible = choice
            .visible_when
            .as_ref()
            .map_or(true, |c| c.evaluate(state, current));
        if !visible {
            continue;
        }

        let condition_enabled = choice
            .enabled_when
            .as_ref()
            .map_or(true, |c| c.evaluate(state, current));
        let orb_locked = condition_enabled
            && choice.required_orb_fill.as_ref().map_or(false, |gate| {
                state.orbs.fill_level(gate.pattern) < gate.threshold
            });

        views.push(ChoiceView {
            choice: choice.clone(),
            enabled: condition_enabled && !orb_locked,
            orb_locked,
            mercy_unlocked: false,
        });
    }

    if !views.is_empty() && views.iter().all(|v| !v.enabled) {
        let lowest = views
            .iter()
            .enumerate()
            .filter(|(_, v)| v.orb_locked)
            .min_by_key(|(idx, v)| {
                let threshold = v
                    .choice
                    .required_orb_fill
                    .as_ref()
                    .map(|gate| gate.threshold)
                    .unwrap_or(u8::MAX);
                (threshold, *idx)
            })
            .map(|(idx, _)| idx);

        if let Some(idx) = lowest {
            tracing::debug!(
                choice = %views[idx].choice.id,
                "mercy-unlocking lowest orb threshold"
            );
            views[idx].enabled = true;
            views[idx].mercy_unlocked = true;
        }
    }

    views
}
