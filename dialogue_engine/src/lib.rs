//! # Dialogue Engine
//!
//! The dialogue graph state machine and consequence resolution engine. This
//! crate interfaces with `story_state`, walks authored dialogue graphs under
//! the current playthrough state, and derives the narrative feedback a
//! choice deserves.
//!
//! ## Core Components
//!
//! - **condition**: the serializable predicate language gating choices
//! - **graph** / **registry**: authored content and the global node index
//! - **resolver**: node entry, choice presentation, and the mercy unlock
//! - **pipeline**: the two-tier consequence resolution pipeline
//! - **simulate**: bounded offline reachability exploration
//!
//! ## Design Philosophy
//!
//! - **State-Driven**: every decision is a pure function of the snapshot;
//!   no wall clocks, no randomness
//! - **One code path**: the simulator replays the exact evaluator, resolver,
//!   and applicator used in live play, so the two can never diverge
//! - **Permissive content**: unknown optional fields in authored content are
//!   no-ops; only dangling node references are hard errors

pub mod condition;
pub mod content;
pub mod error;
pub mod graph;
pub mod pipeline;
pub mod registry;
pub mod resolver;
pub mod simulate;

pub use condition::*;
pub use error::*;
pub use graph::*;
pub use pipeline::*;
pub use registry::*;
pub use resolver::*;
pub use simulate::*;
