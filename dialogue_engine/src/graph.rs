//! Dialogue graph content model.
//!
//! Graphs are immutable, statically loaded, hand-authored data. Everything
//! here is serde-first so writers can author nodes, choices, and conditions
//! in content files without touching engine code.

use serde::{Deserialize, Serialize};

use story_state::{CharacterId, ChoiceId, NodeId, Pattern, StateChange};

use crate::condition::Condition;

/// An orb gate on a choice: the fill level the player needs before the
/// choice unlocks. Thresholds live on the 0-100 fill scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrbGate {
    pub pattern: Pattern,
    pub threshold: u8,
}

/// A time-boxed alternate branch offered while a node is on screen.
///
/// The engine models the window as data plus one extra edge; counting down
/// the clock is the renderer's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterruptWindow {
    pub window_ms: u32,
    pub target: NodeId,
}

/// One selectable edge out of a dialogue node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub id: ChoiceId,
    pub text: String,
    /// Shown at all only when this holds (absent = always visible).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_when: Option<Condition>,
    /// Selectable only when this also holds (absent = always enabled).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_when: Option<Condition>,
    /// Behavioral pattern this choice expresses; earns an orb when taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<Pattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consequence: Option<StateChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_orb_fill: Option<OrbGate>,
    pub next: NodeId,
}

impl Choice {
    pub fn new(id: impl Into<ChoiceId>, text: impl Into<String>, next: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            visible_when: None,
            enabled_when: None,
            pattern: None,
            consequence: None,
            required_orb_fill: None,
            next: next.into(),
        }
    }

    pub fn visible_when(mut self, condition: Condition) -> Self {
        self.visible_when = Some(condition);
        self
    }

    pub fn enabled_when(mut self, condition: Condition) -> Self {
        self.enabled_when = Some(condition);
        self
    }

    pub fn with_pattern(mut self, pattern: Pattern) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn with_consequence(mut self, consequence: StateChange) -> Self {
        self.consequence = Some(consequence);
        self
    }

    pub fn with_orb_gate(mut self, pattern: Pattern, threshold: u8) -> Self {
        self.required_orb_fill = Some(OrbGate { pattern, threshold });
        self
    }
}

/// A single dialogue beat with its outgoing choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueNode {
    pub id: NodeId,
    pub text: String,
    /// State changes applied on entering the node, in declared order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on_enter: Vec<StateChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interrupt: Option<InterruptWindow>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
}

impl DialogueNode {
    pub fn new(id: impl Into<NodeId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            on_enter: Vec::new(),
            interrupt: None,
            choices: Vec::new(),
        }
    }

    pub fn on_enter(mut self, change: StateChange) -> Self {
        self.on_enter.push(change);
        self
    }

    pub fn with_interrupt(mut self, window_ms: u32, target: impl Into<NodeId>) -> Self {
        self.interrupt = Some(InterruptWindow {
            window_ms,
            target: target.into(),
        });
        self
    }

    pub fn with_choice(mut self, choice: Choice) -> Self {
        self.choices.push(choice);
        self
    }
}

/// One character's dialogue sub-graph.
///
/// Nodes are kept in declaration order; the registry builds the id index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterGraph {
    pub character: CharacterId,
    pub start: NodeId,
    pub nodes: Vec<DialogueNode>,
}

impl CharacterGraph {
    pub fn new(character: impl Into<String>, start: impl Into<NodeId>) -> Self {
        Self {
            character: CharacterId::new(character),
            start: start.into(),
            nodes: Vec::new(),
        }
    }

    pub fn with_node(mut self, node: DialogueNode) -> Self {
        self.nodes.push(node);
        self
    }
}
