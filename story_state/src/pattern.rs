//! Behavioral patterns - the five accumulating tendencies tracked per playthrough.

use serde::{Deserialize, Serialize};

/// One of the five behavioral patterns.
///
/// Pattern totals accumulate without bound over a playthrough; crossing
/// fixed thresholds triggers narrative echoes, and each pattern also backs
/// an independent orb balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pattern {
    Analytical,
    Helping,
    Creative,
    Patience,
    Boldness,
}

impl Pattern {
    /// All patterns in canonical order.
    pub const ALL: [Pattern; 5] = [
        Pattern::Analytical,
        Pattern::Helping,
        Pattern::Creative,
        Pattern::Patience,
        Pattern::Boldness,
    ];

    /// The content-file spelling of this pattern.
    pub fn as_str(&self) -> &'static str {
        match self {
            Pattern::Analytical => "analytical",
            Pattern::Helping => "helping",
            Pattern::Creative => "creative",
            Pattern::Patience => "patience",
            Pattern::Boldness => "boldness",
        }
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A value recorded once per pattern.
///
/// Used for the signed pattern accumulators (`PerPattern<i64>`) and for orb
/// balances (`PerPattern<u32>`). Field-per-pattern keeps snapshots flat and
/// makes "no entry for this pattern" unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct PerPattern<T> {
    pub analytical: T,
    pub helping: T,
    pub creative: T,
    pub patience: T,
    pub boldness: T,
}

impl<T> PerPattern<T> {
    pub fn get(&self, pattern: Pattern) -> &T {
        match pattern {
            Pattern::Analytical => &self.analytical,
            Pattern::Helping => &self.helping,
            Pattern::Creative => &self.creative,
            Pattern::Patience => &self.patience,
            Pattern::Boldness => &self.boldness,
        }
    }

    pub fn get_mut(&mut self, pattern: Pattern) -> &mut T {
        match pattern {
            Pattern::Analytical => &mut self.analytical,
            Pattern::Helping => &mut self.helping,
            Pattern::Creative => &mut self.creative,
            Pattern::Patience => &mut self.patience,
            Pattern::Boldness => &mut self.boldness,
        }
    }

    /// Build a record by computing a value for each pattern.
    pub fn from_fn(mut f: impl FnMut(Pattern) -> T) -> Self {
        Self {
            analytical: f(Pattern::Analytical),
            helping: f(Pattern::Helping),
            creative: f(Pattern::Creative),
            patience: f(Pattern::Patience),
            boldness: f(Pattern::Boldness),
        }
    }

    /// Iterate entries in canonical pattern order.
    pub fn iter(&self) -> impl Iterator<Item = (Pattern, &T)> {
        Pattern::ALL.iter().map(move |p| (*p, self.get(*p)))
    }
}
