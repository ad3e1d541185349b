//! Consequence resolution pipeline.
//!
//! After a choice's state change has been applied, the pipeline decides
//! what narrative feedback the player sees. It runs in two tiers:
//!
//! 1. **Tier 1 - overwrite evaluators**, in fixed sequence, each allowed to
//!    overwrite the feedback computed so far: base trust message -> pattern
//!    threshold echo -> orb milestone echo -> character transformation.
//!    The order encodes a strict narrative priority (transformation >
//!    milestone > echo > trust): a character transforming in front of the
//!    player must never be clobbered by a routine trust tick.
//! 2. **Tier 2 - additive processors**, run only after Tier 1, each allowed
//!    to append extra events but never to touch Tier 1's result. Their
//!    internal order decides which of several simultaneously eligible
//!    effects is surfaced first when only one can be shown per turn.
//!
//! [`ConsequencePipeline::resolve`] is a pure function of the before/after
//! state pair and the choice metadata - no clocks, no randomness - so
//! replaying it over a stored transition reproduces the decision exactly.
//! The acknowledgement bits it relies on (orb milestones, transformation
//! markers, gift arming flags) are consumed in the separate
//! [`ConsequencePipeline::commit`] step, and those bits are themselves part
//! of the state.

mod tier_two;

use serde::{Deserialize, Serialize};
use story_state::{
    CharacterId, GameState, OrbMilestone, Pattern, RelationshipStatus, StateChange,
};

use crate::condition::Condition;

/// A pattern accumulator crossing this total triggers a narrative echo.
pub const PATTERN_ECHO_THRESHOLD: i64 = 3;

/// A narrative feedback event surfaced to the player after a choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedbackEvent {
    TrustShift {
        character: CharacterId,
        delta: i32,
        trust: i32,
    },
    PatternEcho {
        pattern: Pattern,
        total: i64,
    },
    OrbMilestone {
        milestone: OrbMilestone,
    },
    Transformation {
        character: CharacterId,
    },
    ArcUnlocked {
        arc: String,
    },
    SynthesisProgress {
        found: usize,
        total: usize,
    },
    KnowledgeDiscovered {
        character: CharacterId,
        flag: String,
    },
    CrossCharacterEcho {
        observer: CharacterId,
        subject: CharacterId,
    },
    ComboUnlocked {
        combo: String,
    },
    IcebergTopic {
        topic: String,
        depth: usize,
    },
    DelayedGift {
        gift: String,
    },
    ArcCompleted {
        arc: String,
        reward: StateChange,
    },
}

/// The pipeline's decision for one turn.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConsequenceOutcome {
    /// Tier 1's winner, if any evaluator fired.
    pub primary: Option<FeedbackEvent>,
    /// Tier 2 events in surfacing order.
    pub additional: Vec<FeedbackEvent>,
}

impl ConsequenceOutcome {
    /// All events, primary first.
    pub fn events(&self) -> impl Iterator<Item = &FeedbackEvent> {
        self.primary.iter().chain(self.additional.iter())
    }
}

/// Metadata about the choice that produced a state transition.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceContext {
    /// The character the player was talking to.
    pub character: CharacterId,
    /// The choice's pattern tag, if any.
    pub pattern: Option<Pattern>,
}

/// Eligibility rule for a character transformation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationRule {
    pub character: CharacterId,
    pub min_trust: i32,
    #[serde(default)]
    pub required_knowledge: Vec<String>,
    /// Global flag set once the transformation has been shown.
    pub marker_flag: String,
}

/// A story arc with an unlock gate and an optional completion reward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcRule {
    pub id: String,
    pub unlock: Condition,
    #[serde(default)]
    pub complete: Option<Condition>,
    /// Applied once when the arc completes.
    #[serde(default)]
    pub reward: StateChange,
}

impl ArcRule {
    /// Flag recording that the completion reward was already granted.
    pub(crate) fn completion_flag(&self) -> String {
        format!("arc.{}.completed", self.id)
    }
}

/// One character reacting to the player's standing with another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossEchoRule {
    pub observer: CharacterId,
    pub subject: CharacterId,
    /// Fires when the subject's trust crosses this value from below.
    pub min_trust: i32,
}

/// A pattern total plus a knowledge flag jointly unlocking something.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComboRule {
    pub id: String,
    pub pattern: Pattern,
    pub min_total: i64,
    pub knowledge_flag: String,
}

/// A gift armed earlier and delivered when its trigger holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiftRule {
    pub id: String,
    /// Global flag that arms the gift; removed on delivery.
    pub armed_flag: String,
    pub deliver_when: Condition,
}

fn default_iceberg_prefix() -> String {
    "iceberg.".to_string()
}

/// Authorable configuration for the consequence pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// The hub/narrator character; orb milestones surface only there.
    pub hub_character: CharacterId,
    #[serde(default)]
    pub transformations: Vec<TransformationRule>,
    #[serde(default)]
    pub arcs: Vec<ArcRule>,
    /// Knowledge flags that together complete the synthesis puzzle.
    #[serde(default)]
    pub synthesis_flags: Vec<String>,
    #[serde(default)]
    pub cross_echoes: Vec<CrossEchoRule>,
    #[serde(default)]
    pub combos: Vec<ComboRule>,
    #[serde(default)]
    pub gifts: Vec<GiftRule>,
    /// Global flags with this prefix are tracked as iceberg topics.
    #[serde(default = "default_iceberg_prefix")]
    pub iceberg_prefix: String,
}

impl PipelineConfig {
    pub fn new(hub_character: CharacterId) -> Self {
        Self {
            hub_character,
            transformations: Vec::new(),
            arcs: Vec::new(),
            synthesis_flags: Vec::new(),
            cross_echoes: Vec::new(),
            combos: Vec::new(),
            gifts: Vec::new(),
            iceberg_prefix: default_iceberg_prefix(),
        }
    }
}

/// The two-tier consequence pipeline.
#[derive(Debug, Clone)]
pub struct ConsequencePipeline {
    config: PipelineConfig,
}

impl ConsequencePipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Decide the feedback for one state transition.
    ///
    /// Pure function of `(before, after, ctx)`; see the module docs for the
    /// tier structure and ordering contract.
    pub fn resolve(
        &self,
        before: &GameState,
        after: &GameState,
        ctx: &ChoiceContext,
    ) -> ConsequenceOutcome {
        let mut primary = None;

        // Tier 1, in overwrite order.
        if let Some(event) = self.base_trust_feedback(before, after, ctx) {
            primary = Some(event);
        }
        if let Some(event) = self.pattern_echo(before, after) {
            primary = Some(event);
        }
        if let Some(event) = self.orb_milestone_echo(after, ctx) {
            primary = Some(event);
        }
        if let Some(event) = self.transformation(before, after, ctx) {
            primary = Some(event);
        }

        let additional = tier_two::run(&self.config, before, after, ctx);
        ConsequenceOutcome {
            primary,
            additional,
        }
    }

    /// Consume the acknowledgement bits an outcome implies.
    ///
    /// The only place orb-milestone acknowledgements, transformation
    /// markers, gift arming flags, and arc rewards are written back. Kept
    /// apart from [`ConsequencePipeline::resolve`] so that resolution stays
    /// replayable against stored state pairs.
    pub fn commit(&self, outcome: &ConsequenceOutcome, state: GameState) -> GameState {
        let mut state = state;
        for event in outcome.events() {
            match event {
                FeedbackEvent::OrbMilestone { milestone } => {
                    state.orbs.acknowledge(*milestone);
                }
                FeedbackEvent::Transformation { character } => {
                    if let Some(rule) = self
                        .config
                        .transformations
                        .iter()
                        .find(|r| &r.character == character)
                    {
                        state = state.apply(
                            &StateChange::new()
                                .add_flag(rule.marker_flag.clone())
                                .for_character(character.clone())
                                .set_status(RelationshipStatus::Transformed),
                        );
                    }
                }
                FeedbackEvent::DelayedGift { gift } => {
                    if let Some(rule) = self.config.gifts.iter().find(|r| &r.id == gift) {
                        state = state.apply(&StateChange::new().remove_flag(rule.armed_flag.clone()));
                    }
                }
                FeedbackEvent::ArcCompleted { arc, reward } => {
                    if let Some(rule) = self.config.arcs.iter().find(|r| &r.id == arc) {
                        state = state.apply(&StateChange::new().add_flag(rule.completion_flag()));
                    }
                    state = state.apply(reward);
                }
                _ => {}
            }
        }
        state
    }

    /// Tier 1 (1): message for the raw trust delta with the current
    /// character.
    fn base_trust_feedback(
        &self,
        before: &GameState,
        after: &GameState,
        ctx: &ChoiceContext,
    ) -> Option<FeedbackEvent> {
        let old = trust_of(before, &ctx.character);
        let new = trust_of(after, &ctx.character);
        let delta = new - old;
        if delta == 0 {
            return None;
        }
        Some(FeedbackEvent::TrustShift {
            character: ctx.character.clone(),
            delta,
            trust: new,
        })
    }

    /// Tier 1 (2): echo when a pattern total crosses the fixed threshold
    /// from below. Crossing detection means the echo fires exactly once per
    /// ascent - an echo that already exists is never re-emitted.
    fn pattern_echo(&self, before: &GameState, after: &GameState) -> Option<FeedbackEvent> {
        for pattern in Pattern::ALL {
            let old = before.pattern_total(pattern);
            let new = after.pattern_total(pattern);
            if old < PATTERN_ECHO_THRESHOLD && new >= PATTERN_ECHO_THRESHOLD {
                return Some(FeedbackEvent::PatternEcho {
                    pattern,
                    total: new,
                });
            }
        }
        None
    }

    /// Tier 1 (3): surface the next unacknowledged orb milestone, but only
    /// while talking to the hub character.
    fn orb_milestone_echo(&self, after: &GameState, ctx: &ChoiceContext) -> Option<FeedbackEvent> {
        if ctx.character != self.config.hub_character {
            return None;
        }
        after
            .orbs
            .unacknowledged_milestones()
            .into_iter()
            .next()
            .map(|milestone| FeedbackEvent::OrbMilestone { milestone })
    }

    /// Tier 1 (4): character transformation. Positive trust deltas only;
    /// the marker flag keeps it a once-per-character event.
    fn transformation(
        &self,
        before: &GameState,
        after: &GameState,
        ctx: &ChoiceContext,
    ) -> Option<FeedbackEvent> {
        let delta = trust_of(after, &ctx.character) - trust_of(before, &ctx.character);
        if delta <= 0 {
            return None;
        }
        let rule = self
            .config
            .transformations
            .iter()
            .find(|r| r.character == ctx.character)?;
        if after.has_flag(&rule.marker_flag) {
            return None;
        }
        let character = after.character(&ctx.character)?;
        if character.trust < rule.min_trust {
            return None;
        }
        if !rule
            .required_knowledge
            .iter()
            .all(|flag| character.knows(flag))
        {
            return None;
        }
        Some(FeedbackEvent::Transformation {
            character: ctx.character.clone(),
        })
    }
}

fn trust_of(state: &GameState, character: &CharacterId) -> i32 {
    state.character(character).map_or(0, |c| c.trust)
}
