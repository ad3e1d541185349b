//! End-to-end playthroughs exercising the resolver, pipeline, and
//! simulator together over a small authored story.

use dialogue_engine::{
    explore, resolver, ChoiceContext, Condition, ConsequencePipeline, FeedbackEvent,
    GraphRegistry, PipelineConfig, SimulatorConfig, TransformationRule,
};
use dialogue_engine::{CharacterGraph, Choice, DialogueNode};
use story_state::{CharacterId, GameState, NodeId, Pattern, PlayerId};

fn maya() -> CharacterId {
    CharacterId::new("maya")
}

const CONTENT: &str = r#"
    [[graph]]
    character = "maya"
    start = "maya_desk"

    [[graph.nodes]]
    id = "maya_desk"
    text = "Maya is buried in ledgers."

    [[graph.nodes.on_enter]]
    addGlobalFlags = ["met_maya"]

    [[graph.nodes.choices]]
    id = "offer_help"
    text = "Let me take half of those."
    pattern = "helping"
    next = "maya_desk"
    consequence = { characterId = "maya", trustChange = 1 }

    [[graph.nodes.choices]]
    id = "visit_rhett"
    text = "I should check on Rhett."
    next = "rhett_porch"

    [[graph]]
    character = "rhett"
    start = "rhett_porch"

    [[graph.nodes]]
    id = "rhett_porch"
    text = "Rhett whittles in silence."

    [[graph.nodes.choices]]
    id = "back"
    text = "Head back inside."
    next = "maya_desk"
"#;

fn pipeline() -> ConsequencePipeline {
    let mut config = PipelineConfig::new(CharacterId::new("narrator"));
    config.transformations.push(TransformationRule {
        character: maya(),
        min_trust: 9,
        required_knowledge: Vec::new(),
        marker_flag: "maya_transformed".to_string(),
    });
    ConsequencePipeline::new(config)
}

/// One full turn: enter the node, take a choice by id, resolve feedback,
/// commit, and return the state plus what was surfaced.
fn play_turn(
    registry: &GraphRegistry,
    pipeline: &ConsequencePipeline,
    state: GameState,
    node: &str,
    choice_id: &str,
) -> (GameState, Option<FeedbackEvent>) {
    let node = NodeId::new(node);
    let resolved = resolver::resolve(registry, &node, state).unwrap();
    let before = resolved.state.clone();
    let view = resolved
        .choices
        .iter()
        .find(|v| v.choice.id.as_str() == choice_id)
        .expect("choice not presented");
    assert!(view.enabled, "choice {choice_id} not selectable");

    let after = resolver::take_choice(registry, resolved.state, &node, &view.choice).unwrap();
    let ctx = ChoiceContext {
        character: resolved.character,
        pattern: view.choice.pattern,
    };
    let outcome = pipeline.resolve(&before, &after, &ctx);
    let committed = pipeline.commit(&outcome, after);
    (committed, outcome.primary)
}

#[test]
fn test_helping_playthrough_surfaces_echo_then_transformation() {
    let registry = GraphRegistry::from_toml_str(CONTENT).unwrap();
    let pipeline = pipeline();
    let mut state = GameState::new(PlayerId::new(), NodeId::new("maya_desk"));

    // Two helpful turns: plain trust feedback.
    for expected_trust in 1..=2 {
        let (next, primary) = play_turn(&registry, &pipeline, state, "maya_desk", "offer_help");
        state = next;
        assert_eq!(
            primary,
            Some(FeedbackEvent::TrustShift {
                character: maya(),
                delta: 1,
                trust: expected_trust,
            })
        );
    }

    // Third helpful turn crosses the pattern threshold: the echo wins.
    let (next, primary) = play_turn(&registry, &pipeline, state, "maya_desk", "offer_help");
    state = next;
    assert_eq!(
        primary,
        Some(FeedbackEvent::PatternEcho {
            pattern: Pattern::Helping,
            total: 3,
        })
    );

    // Keep helping until trust hits the transformation line.
    let mut transformed = None;
    for _ in 0..6 {
        let (next, primary) = play_turn(&registry, &pipeline, state, "maya_desk", "offer_help");
        state = next;
        if matches!(primary, Some(FeedbackEvent::Transformation { .. })) {
            transformed = primary;
            break;
        }
    }
    assert_eq!(transformed, Some(FeedbackEvent::Transformation { character: maya() }));
    assert!(state.has_flag("maya_transformed"));
    assert_eq!(state.character(&maya()).unwrap().trust, 9);
}

#[test]
fn test_cross_graph_round_trip() {
    let registry = GraphRegistry::from_toml_str(CONTENT).unwrap();
    let pipeline = pipeline();
    let state = GameState::new(PlayerId::new(), NodeId::new("maya_desk"));

    let (state, _) = play_turn(&registry, &pipeline, state, "maya_desk", "visit_rhett");
    let resolved = resolver::resolve(&registry, &NodeId::new("rhett_porch"), state).unwrap();
    assert_eq!(resolved.character, CharacterId::new("rhett"));

    // Coming back re-runs maya's on-enter; the flag set is idempotent.
    let (state, _) = play_turn(&registry, &pipeline, resolved.state, "rhett_porch", "back");
    let resolved = resolver::resolve(&registry, &NodeId::new("maya_desk"), state).unwrap();
    assert!(resolved.state.has_flag("met_maya"));
}

#[test]
fn test_mercy_unlock_in_play() {
    let mut registry = GraphRegistry::new();
    registry
        .register(
            CharacterGraph::new("hub", "vault")
                .with_node(
                    DialogueNode::new("vault", "Two sealed doors.")
                        .with_choice(
                            Choice::new("heavy", "Force the vault door.", "inside")
                                .with_orb_gate(Pattern::Boldness, 80),
                        )
                        .with_choice(
                            Choice::new("side", "Try the side door.", "inside")
                                .with_orb_gate(Pattern::Boldness, 50),
                        ),
                )
                .with_node(DialogueNode::new("inside", "You are in.")),
        )
        .unwrap();

    let state = GameState::new(PlayerId::new(), NodeId::new("vault"));
    let resolved = resolver::resolve(&registry, &NodeId::new("vault"), state).unwrap();

    let side = resolved
        .choices
        .iter()
        .find(|v| v.choice.id.as_str() == "side")
        .unwrap();
    assert!(side.enabled && side.mercy_unlocked);
    let heavy = resolved
        .choices
        .iter()
        .find(|v| v.choice.id.as_str() == "heavy")
        .unwrap();
    assert!(!heavy.enabled);

    // The player can actually proceed through the unlocked door.
    let state =
        resolver::take_choice(&registry, resolved.state, &NodeId::new("vault"), &side.choice)
            .unwrap();
    let inside = resolver::resolve(&registry, &NodeId::new("inside"), state).unwrap();
    assert_eq!(inside.node.text, "You are in.");
}

#[test]
fn test_simulator_covers_authored_content() {
    let registry = GraphRegistry::from_toml_str(CONTENT).unwrap();
    let start = NodeId::new("maya_desk");
    let initial = GameState::new(PlayerId::nil(), start.clone());

    let report = explore(&registry, &start, initial.clone(), &SimulatorConfig::default());
    assert!(report.unreached(&registry).is_empty());
    assert!(report.dangling_targets.is_empty());

    // Same content, same start: identical report.
    let again = explore(&registry, &start, initial, &SimulatorConfig::default());
    assert_eq!(report, again);
}

#[test]
fn test_simulator_flags_content_gated_shut() {
    let mut registry = GraphRegistry::new();
    registry
        .register(
            CharacterGraph::new("maya", "door")
                .with_node(DialogueNode::new("door", "Locked.").with_choice(
                    Choice::new("enter", "Step in.", "attic")
                        .visible_when(Condition::flag("has_attic_key")),
                ))
                .with_node(DialogueNode::new("attic", "Dust everywhere.")),
        )
        .unwrap();

    let start = NodeId::new("door");
    let report = explore(
        &registry,
        &start,
        GameState::new(PlayerId::nil(), start.clone()),
        &SimulatorConfig::default(),
    );
    let unreached: Vec<&str> = report
        .unreached(&registry)
        .iter()
        .map(|id| id.as_str())
        .collect();
    assert_eq!(unreached, vec!["attic"]);
}
