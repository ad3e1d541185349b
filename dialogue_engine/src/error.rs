//! Engine error types.

use story_state::{CharacterId, NodeId};
use thiserror::Error;

/// Errors surfaced by registry lookups and content loading.
///
/// The pure evaluation layers never fail for well-formed input. Only
/// references to ids missing from the registry and malformed content files
/// produce errors, and both carry the offending id or parse detail so the
/// caller can fall back to a safe node instead of crashing the session.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unknown dialogue node: {0}")]
    UnknownNode(NodeId),

    #[error("unknown character: {0}")]
    UnknownCharacter(CharacterId),

    #[error("duplicate node id across graphs: {0}")]
    DuplicateNode(NodeId),

    #[error("content error: {0}")]
    Content(#[from] toml::de::Error),
}
