//! # Story State
//!
//! The "save file" crate - the single source of truth for playthrough state.
//! It contains the typed state snapshot, the pure state-change applicator,
//! and the serializable snapshot boundary, and does not contain any graph or
//! narrative logic.
//!
//! ## Core Components
//!
//! - **state**: the [`GameState`] root snapshot and the `apply` operation
//! - **change**: [`StateChange`], the declarative mutation vocabulary
//! - **character**: per-character relationship state
//! - **orbs**: the per-pattern collectible economy
//! - **snapshot**: versioned (de)serialization at the persistence boundary
//!
//! ## Design Philosophy
//!
//! - **Value-semantic**: a `GameState` is never mutated in place; `apply`
//!   consumes the old snapshot and returns a new one, so callers can never
//!   hold a mutable alias of the internal containers
//! - **Data-driven**: every mutation is a serializable [`StateChange`] that
//!   can be logged, replayed, and fuzzed
//! - **Permissive**: hand-authored content that references a character the
//!   state has never seen heals with a default record instead of failing

pub mod change;
pub mod character;
pub mod ids;
pub mod orbs;
pub mod pattern;
pub mod snapshot;
pub mod state;

pub use change::*;
pub use character::*;
pub use ids::*;
pub use orbs::*;
pub use pattern::*;
pub use snapshot::*;
pub use state::*;
