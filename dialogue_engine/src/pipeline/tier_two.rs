//! Tier 2 additive consequence processors.
//!
//! Each processor may append events but never replaces what an earlier one
//! produced. The run order below is the surfacing priority when several
//! effects become eligible on the same turn: arc unlock, synthesis
//! progress, knowledge discovery, cross-character echo, combo unlock,
//! iceberg tracking, delayed gifts, arc completion. Within a processor,
//! rules fire in declaration order and set-valued inputs are sorted, so a
//! given transition always yields the same event list.

use story_state::GameState;

use super::{ChoiceContext, FeedbackEvent, PipelineConfig};

pub(crate) fn run(
    config: &PipelineConfig,
    before: &GameState,
    after: &GameState,
    ctx: &ChoiceContext,
) -> Vec<FeedbackEvent> {
    let mut events = Vec::new();
    arc_unlocks(config, before, after, &mut events);
    synthesis_progress(config, before, after, &mut events);
    knowledge_discoveries(before, after, ctx, &mut events);
    cross_character_echoes(config, before, after, &mut events);
    combo_unlocks(config, before, after, &mut events);
    iceberg_topics(config, before, after, &mut events);
    delayed_gifts(config, before, after, &mut events);
    arc_completions(config, after, &mut events);
    events
}

/// An arc unlocks when its gate starts holding on this transition.
fn arc_unlocks(
    config: &PipelineConfig,
    before: &GameState,
    after: &GameState,
    events: &mut Vec<FeedbackEvent>,
) {
    for arc in &config.arcs {
        if !arc.unlock.evaluate(before, None) && arc.unlock.evaluate(after, None) {
            events.push(FeedbackEvent::ArcUnlocked {
                arc: arc.id.clone(),
            });
        }
    }
}

/// Progress on the synthesis puzzle whenever another of its flags lands.
fn synthesis_progress(
    config: &PipelineConfig,
    before: &GameState,
    after: &GameState,
    events: &mut Vec<FeedbackEvent>,
) {
    if config.synthesis_flags.is_empty() {
        return;
    }
    let count = |state: &GameState| {
        config
            .synthesis_flags
            .iter()
            .filter(|flag| state.has_flag(flag))
            .count()
    };
    let found = count(after);
    if found > count(before) {
        events.push(FeedbackEvent::SynthesisProgress {
            found,
            total: config.synthesis_flags.len(),
        });
    }
}

/// Each fact the current character newly learned about the player.
fn knowledge_discoveries(
    before: &GameState,
    after: &GameState,
    ctx: &ChoiceContext,
    events: &mut Vec<FeedbackEvent>,
) {
    let Some(now) = after.character(&ctx.character) else {
        return;
    };
    let mut fresh: Vec<&String> = now
        .knowledge
        .iter()
        .filter(|flag| {
            before
                .character(&ctx.character)
                .map_or(true, |was| !was.knows(flag))
        })
        .collect();
    fresh.sort();
    for flag in fresh {
        events.push(FeedbackEvent::KnowledgeDiscovered {
            character: ctx.character.clone(),
            flag: flag.clone(),
        });
    }
}

/// An observer reacts when the player's standing with the subject crosses
/// the rule's trust line from below.
fn cross_character_echoes(
    config: &PipelineConfig,
    before: &GameState,
    after: &GameState,
    events: &mut Vec<FeedbackEvent>,
) {
    for rule in &config.cross_echoes {
        let was = before.character(&rule.subject).map_or(0, |c| c.trust);
        let now = after.character(&rule.subject).map_or(0, |c| c.trust);
        if was < rule.min_trust && now >= rule.min_trust {
            events.push(FeedbackEvent::CrossCharacterEcho {
                observer: rule.observer.clone(),
                subject: rule.subject.clone(),
            });
        }
    }
}

/// A combo fires the first time its pattern total and flag both hold.
fn combo_unlocks(
    config: &PipelineConfig,
    before: &GameState,
    after: &GameState,
    events: &mut Vec<FeedbackEvent>,
) {
    for combo in &config.combos {
        let satisfied = |state: &GameState| {
            state.pattern_total(combo.pattern) >= combo.min_total
                && state.has_flag(&combo.knowledge_flag)
        };
        if !satisfied(before) && satisfied(after) {
            events.push(FeedbackEvent::ComboUnlocked {
                combo: combo.id.clone(),
            });
        }
    }
}

/// Track newly touched iceberg topics; depth is how many the player has
/// uncovered so far.
fn iceberg_topics(
    config: &PipelineConfig,
    before: &GameState,
    after: &GameState,
    events: &mut Vec<FeedbackEvent>,
) {
    let depth = after
        .global_flags
        .iter()
        .filter(|flag| flag.starts_with(&config.iceberg_prefix))
        .count();
    let mut fresh: Vec<&String> = after
        .global_flags
        .iter()
        .filter(|flag| flag.starts_with(&config.iceberg_prefix) && !before.has_flag(flag))
        .collect();
    fresh.sort();
    for flag in fresh {
        let topic = flag[config.iceberg_prefix.len()..].to_string();
        events.push(FeedbackEvent::IcebergTopic { topic, depth });
    }
}

/// A gift armed earlier delivers once its trigger starts holding. The
/// arming flag is removed at commit, so a delivered gift cannot re-fire.
fn delayed_gifts(
    config: &PipelineConfig,
    before: &GameState,
    after: &GameState,
    events: &mut Vec<FeedbackEvent>,
) {
    for gift in &config.gifts {
        if !after.has_flag(&gift.armed_flag) {
            continue;
        }
        let deliverable_now = gift.deliver_when.evaluate(after, None);
        let was_pending = before.has_flag(&gift.armed_flag) && gift.deliver_when.evaluate(before, None);
        if deliverable_now && !was_pending {
            events.push(FeedbackEvent::DelayedGift {
                gift: gift.id.clone(),
            });
        }
    }
}

/// An arc completes once its completion condition holds; the completion
/// flag written at commit keeps the reward one-shot.
fn arc_completions(config: &PipelineConfig, after: &GameState, events: &mut Vec<FeedbackEvent>) {
    for arc in &config.arcs {
        let Some(complete) = &arc.complete else {
            continue;
        };
        if after.has_flag(&arc.completion_flag()) {
            continue;
        }
        if complete.evaluate(after, None) {
            events.push(FeedbackEvent::ArcCompleted {
                arc: arc.id.clone(),
                reward: arc.reward.clone(),
            });
        }
    }
}
