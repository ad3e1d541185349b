//! Global registry of character graphs with a flat node index.

use std::collections::{HashMap, HashSet};

use story_state::{CharacterId, NodeId};

use crate::error::EngineError;
use crate::graph::{CharacterGraph, DialogueNode};

/// All loaded dialogue graphs, indexed for O(1) node lookup.
///
/// Node ids are globally unique across every registered graph; `register`
/// enforces the invariant at load time so lookups can trust it afterwards.
/// The registry is read-only once content is loaded and safe to share
/// across concurrent simulator runs.
#[derive(Debug, Default)]
pub struct GraphRegistry {
    graphs: Vec<CharacterGraph>,
    /// Node id -> (graph index, node index within the graph).
    index: HashMap<NodeId, (usize, usize)>,
}

impl GraphRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a character graph, rejecting any node id already registered
    /// (in this graph or any earlier one). Validation happens before any
    /// insertion, so a rejected graph leaves the registry untouched.
    pub fn register(&mut self, graph: CharacterGraph) -> Result<(), EngineError> {
        let mut local: HashSet<&NodeId> = HashSet::new();
        for node in &graph.nodes {
            if self.index.contains_key(&node.id) || !local.insert(&node.id) {
                return Err(EngineError::DuplicateNode(node.id.clone()));
            }
        }

        let graph_idx = self.graphs.len();
        for (node_idx, node) in graph.nodes.iter().enumerate() {
            self.index.insert(node.id.clone(), (graph_idx, node_idx));
        }
        self.graphs.push(graph);
        Ok(())
    }

    /// Look up a node and the graph that owns it.
    pub fn node(&self, id: &NodeId) -> Result<(&CharacterGraph, &DialogueNode), EngineError> {
        let (graph_idx, node_idx) = self
            .index
            .get(id)
            .ok_or_else(|| EngineError::UnknownNode(id.clone()))?;
        let graph = &self.graphs[*graph_idx];
        Ok((graph, &graph.nodes[*node_idx]))
    }

    /// Which character's graph owns a node.
    pub fn owner(&self, id: &NodeId) -> Result<&CharacterId, EngineError> {
        self.node(id).map(|(graph, _)| &graph.character)
    }

    /// Start node of a character's graph.
    pub fn start_of(&self, character: &CharacterId) -> Result<&NodeId, EngineError> {
        self.graphs
            .iter()
            .find(|g| &g.character == character)
            .map(|g| &g.start)
            .ok_or_else(|| EngineError::UnknownCharacter(character.clone()))
    }

    pub fn graphs(&self) -> &[CharacterGraph] {
        &self.graphs
    }

    pub fn node_count(&self) -> usize {
        self.index.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Choice, DialogueNode};

    fn maya_graph() -> CharacterGraph {
        CharacterGraph::new("maya", "maya_intro")
            .with_node(
                DialogueNode::new("maya_intro", "Hello.")
                    .with_choice(Choice::new("bye", "Goodbye.", "maya_end")),
            )
            .with_node(DialogueNode::new("maya_end", "She waves."))
    }

    #[test]
    fn test_lookup_after_register() {
        let mut registry = GraphRegistry::new();
        registry.register(maya_graph()).unwrap();

        let (graph, node) = registry.node(&NodeId::new("maya_end")).unwrap();
        assert_eq!(graph.character, CharacterId::new("maya"));
        assert_eq!(node.text, "She waves.");
        assert_eq!(registry.node_count(), 2);
    }

    #[test]
    fn test_unknown_node_error_carries_id() {
        let registry = GraphRegistry::new();
        match registry.node(&NodeId::new("nowhere")) {
            Err(EngineError::UnknownNode(id)) => assert_eq!(id, NodeId::new("nowhere")),
            other => panic!("expected UnknownNode, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_duplicate_across_graphs_rejected() {
        let mut registry = GraphRegistry::new();
        registry.register(maya_graph()).unwrap();

        let clash = CharacterGraph::new("rhett", "maya_intro")
            .with_node(DialogueNode::new("maya_intro", "Different text, same id."));
        match registry.register(clash) {
            Err(EngineError::DuplicateNode(id)) => assert_eq!(id, NodeId::new("maya_intro")),
            other => panic!("expected DuplicateNode, got {:?}", other),
        }
        // The rejected graph must not have been partially indexed.
        assert_eq!(registry.node_count(), 2);
    }

    #[test]
    fn test_duplicate_within_one_graph_rejected() {
        let mut registry = GraphRegistry::new();
        let twice = CharacterGraph::new("echo", "a")
            .with_node(DialogueNode::new("a", "first"))
            .with_node(DialogueNode::new("a", "second"));
        assert!(matches!(
            registry.register(twice),
            Err(EngineError::DuplicateNode(_))
        ));
    }

    #[test]
    fn test_start_of_unknown_character() {
        let registry = GraphRegistry::new();
        assert!(matches!(
            registry.start_of(&CharacterId::new("ghost")),
            Err(EngineError::UnknownCharacter(_))
        ));
    }
}
