//! Orb economy - per-pattern collectible resources with streaks and milestones.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::pattern::{Pattern, PerPattern};

/// How much one orb contributes on the 0-100 fill scale.
pub const FILL_PER_ORB: u32 = 10;

/// Narrative milestones in the orb economy.
///
/// Milestones are derived from totals and streaks; whether a milestone has
/// been *acknowledged* to the player is tracked separately so the narrator
/// mentions each one exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrbMilestone {
    FirstOrb,
    TenEarned,
    TwentyFiveEarned,
    FiftyEarned,
    StreakOfThree,
    StreakOfFive,
}

impl OrbMilestone {
    pub fn description(&self) -> &'static str {
        match self {
            OrbMilestone::FirstOrb => "first orb earned",
            OrbMilestone::TenEarned => "ten orbs earned",
            OrbMilestone::TwentyFiveEarned => "twenty-five orbs earned",
            OrbMilestone::FiftyEarned => "fifty orbs earned",
            OrbMilestone::StreakOfThree => "three same-pattern choices in a row",
            OrbMilestone::StreakOfFive => "five same-pattern choices in a row",
        }
    }
}

/// The orb balances and everything derived from earning them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OrbState {
    pub balances: PerPattern<u32>,
    pub total_earned: u32,
    /// Length of the current run of same-pattern choices.
    pub current_streak: u32,
    pub current_streak_type: Option<Pattern>,
    pub best_streak: u32,
    /// Milestones already surfaced to the player.
    pub acknowledged: BTreeSet<OrbMilestone>,
    /// Balances at the last time the player opened the orb view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_viewed: Option<PerPattern<u32>>,
}

impl OrbState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit orbs of one pattern, extending or resetting the streak.
    pub fn earn(&mut self, pattern: Pattern, amount: u32) {
        *self.balances.get_mut(pattern) += amount;
        self.total_earned += amount;
        if self.current_streak_type == Some(pattern) {
            self.current_streak += 1;
        } else {
            self.current_streak_type = Some(pattern);
            self.current_streak = 1;
        }
        self.best_streak = self.best_streak.max(self.current_streak);
    }

    /// Fill level for a pattern on a 0-100 scale, capped at 100.
    pub fn fill_level(&self, pattern: Pattern) -> u8 {
        self.balances
            .get(pattern)
            .saturating_mul(FILL_PER_ORB)
            .min(100) as u8
    }

    /// Milestones implied by the current totals and streaks.
    pub fn reached_milestones(&self) -> BTreeSet<OrbMilestone> {
        let mut reached = BTreeSet::new();
        if self.total_earned >= 1 {
            reached.insert(OrbMilestone::FirstOrb);
        }
        if self.total_earned >= 10 {
            reached.insert(OrbMilestone::TenEarned);
        }
        if self.total_earned >= 25 {
            reached.insert(OrbMilestone::TwentyFiveEarned);
        }
        if self.total_earned >= 50 {
            reached.insert(OrbMilestone::FiftyEarned);
        }
        if self.best_streak >= 3 {
            reached.insert(OrbMilestone::StreakOfThree);
        }
        if self.best_streak >= 5 {
            reached.insert(OrbMilestone::StreakOfFive);
        }
        reached
    }

    /// Reached milestones the player has not yet been told about, in
    /// canonical order.
    pub fn unacknowledged_milestones(&self) -> Vec<OrbMilestone> {
        self.reached_milestones()
            .into_iter()
            .filter(|m| !self.acknowledged.contains(m))
            .collect()
    }

    pub fn acknowledge(&mut self, milestone: OrbMilestone) {
        self.acknowledged.insert(milestone);
    }

    /// Snapshot current balances as the "seen" baseline for the UI.
    pub fn mark_viewed(&mut self) {
        self.last_viewed = Some(self.balances);
    }

    /// Orbs earned per pattern since the last [`OrbState::mark_viewed`].
    pub fn new_since_viewed(&self) -> PerPattern<u32> {
        match &self.last_viewed {
            Some(seen) => {
                PerPattern::from_fn(|p| self.balances.get(p).saturating_sub(*seen.get(p)))
            }
            None => self.balances,
        }
    }
}
