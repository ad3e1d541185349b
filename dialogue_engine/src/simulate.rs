//! Bounded reachability sweep over the dialogue graphs.
//!
//! The simulator walks every selectable edge from a starting state,
//! deduplicating by a structural fingerprint of the game state so loops
//! that change nothing terminate immediately, while loops that keep
//! accumulating state are cut off by the per-node and global caps. Runs
//! are fully deterministic for a given registry and starting state.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::{Hash, Hasher};

use story_state::{CharacterId, GameState, NodeId};

use crate::registry::GraphRegistry;
use crate::resolver;

/// Worklist discipline for the sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExploreStrategy {
    /// Breadth-first: shortest paths reach nodes first.
    #[default]
    Bfs,
    /// Depth-first: follows one storyline deep before backtracking.
    Dfs,
}

/// Caps keeping the sweep finite on graphs with state-growing loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatorConfig {
    pub strategy: ExploreStrategy,
    /// Maximum choice depth from the starting state.
    pub max_depth: u32,
    /// Global cap on expanded states.
    pub max_states: usize,
    /// Cap on distinct states expanded at any single node.
    pub max_states_per_node: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            strategy: ExploreStrategy::Bfs,
            max_depth: 64,
            max_states: 10_000,
            max_states_per_node: 32,
        }
    }
}

/// What a sweep found.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SimulationReport {
    /// Every node entered at least once.
    pub visited_nodes: BTreeSet<NodeId>,
    /// Visited node count per owning character.
    pub per_character: BTreeMap<CharacterId, usize>,
    /// Choice targets that exist in no registered graph.
    pub dangling_targets: BTreeSet<NodeId>,
    pub expanded_states: usize,
    pub hit_max_states: bool,
    pub hit_max_depth: bool,
}

impl SimulationReport {
    /// Registered nodes the sweep never entered.
    pub fn unreached<'a>(&self, registry: &'a GraphRegistry) -> Vec<&'a NodeId> {
        registry
            .graphs()
            .iter()
            .flat_map(|g| g.nodes.iter())
            .map(|n| &n.id)
            .filter(|id| !self.visited_nodes.contains(id))
            .collect()
    }

    pub fn truncated(&self) -> bool {
        self.hit_max_states || self.hit_max_depth
    }
}

/// Structural fingerprint of a state for deduplication.
///
/// Covers everything choice gating can observe: current node, pattern
/// totals, global flags, orb balances, and per-character trust, status,
/// and knowledge. History length is deliberately excluded, otherwise a
/// no-op loop would never converge. Unordered collections are folded in
/// sorted order so equal states always hash equal.
fn fingerprint(state: &GameState) -> u64 {
    let mut hasher = DefaultHasher::new();
    state.current_node.hash(&mut hasher);

    for pattern in story_state::Pattern::ALL {
        state.pattern_total(pattern).hash(&mut hasher);
        state.orbs.balances.get(pattern).hash(&mut hasher);
    }

    let mut flags: Vec<&String> = state.global_flags.iter().collect();
    flags.sort();
    flags.hash(&mut hasher);

    let mut characters: Vec<(&CharacterId, &story_state::CharacterState)> =
        state.characters.iter().collect();
    characters.sort_by_key(|(id, _)| *id);
    for (id, character) in characters {
        id.hash(&mut hasher);
        character.trust.hash(&mut hasher);
        (character.status as u8).hash(&mut hasher);
        let mut knowledge: Vec<&String> = character.knowledge.iter().collect();
        knowledge.sort();
        knowledge.hash(&mut hasher);
    }

    hasher.finish()
}

/// Sweep the graphs reachable from `start` under `initial`.
pub fn explore(
    registry: &GraphRegistry,
    start: &NodeId,
    initial: GameState,
    config: &SimulatorConfig,
) -> SimulationReport {
    let mut report = SimulationReport::default();
    let mut seen: HashSet<u64> = HashSet::new();
    let mut per_node: HashMap<NodeId, usize> = HashMap::new();
    // Entries are (target node, state before entering it, depth); entry
    // effects are applied exactly once, at pop.
    let mut worklist: VecDeque<(NodeId, GameState, u32)> = VecDeque::new();
    worklist.push_back((start.clone(), initial, 0));

    while let Some((target, state, depth)) = match config.strategy {
        ExploreStrategy::Bfs => worklist.pop_front(),
        ExploreStrategy::Dfs => worklist.pop_back(),
    } {
        let resolved = match resolver::resolve(registry, &target, state) {
            Ok(resolved) => resolved,
            Err(_) => {
                report.dangling_targets.insert(target);
                continue;
            }
        };

        if !seen.insert(fingerprint(&resolved.state)) {
            continue;
        }

        let node_states = per_node.entry(target.clone()).or_insert(0);
        if *node_states >= config.max_states_per_node {
            report.hit_max_states = true;
            continue;
        }
        *node_states += 1;

        report.expanded_states += 1;
        if report.visited_nodes.insert(target.clone()) {
            *report
                .per_character
                .entry(resolved.character.clone())
                .or_insert(0) += 1;
        }

        if report.expanded_states >= config.max_states {
            report.hit_max_states = true;
            break;
        }
        if depth >= config.max_depth {
            report.hit_max_depth = true;
            continue;
        }

        // The interrupt window is one extra edge out of the node.
        if let Some(interrupt) = &resolved.node.interrupt {
            worklist.push_back((interrupt.target.clone(), resolved.state.clone(), depth + 1));
        }

        for view in resolved.choices.iter().filter(|v| v.enabled) {
            let taken = match resolver::take_choice(
                registry,
                resolved.state.clone(),
                &target,
                &view.choice,
            ) {
                Ok(taken) => taken,
                Err(_) => continue,
            };
            worklist.push_back((view.choice.next.clone(), taken, depth + 1));
        }

        tracing::trace!(
            node = %target,
            depth,
            expanded = report.expanded_states,
            "expanded state"
        );
    }

    report
}
