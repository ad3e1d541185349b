//! Loading authored content from TOML.

use serde::Deserialize;

use crate::error::EngineError;
use crate::graph::CharacterGraph;
use crate::pipeline::PipelineConfig;
use crate::registry::GraphRegistry;

#[derive(Debug, Deserialize)]
struct ContentFile {
    #[serde(rename = "graph")]
    graphs: Vec<CharacterGraph>,
}

impl GraphRegistry {
    /// Build a registry from a content file holding one or more `[[graph]]`
    /// tables. Graphs register in file order, so duplicate-id errors point
    /// at the later occurrence.
    pub fn from_toml_str(raw: &str) -> Result<Self, EngineError> {
        let file: ContentFile = toml::from_str(raw)?;
        let mut registry = GraphRegistry::new();
        for graph in file.graphs {
            tracing::debug!(
                character = %graph.character,
                nodes = graph.nodes.len(),
                "registering graph"
            );
            registry.register(graph)?;
        }
        Ok(registry)
    }
}

impl PipelineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, EngineError> {
        Ok(toml::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use story_state::{CharacterId, NodeId};

    const TWO_GRAPHS: &str = r#"
        [[graph]]
        character = "maya"
        start = "maya_intro"

        [[graph.nodes]]
        id = "maya_intro"
        text = "Maya looks up."

        [[graph.nodes.choices]]
        id = "cross"
        text = "Go see Rhett instead."
        next = "rhett_door"

        [[graph]]
        character = "rhett"
        start = "rhett_door"

        [[graph.nodes]]
        id = "rhett_door"
        text = "Rhett opens the door."
    "#;

    #[test]
    fn test_load_two_graphs() {
        let registry = GraphRegistry::from_toml_str(TWO_GRAPHS).unwrap();
        assert_eq!(registry.node_count(), 2);
        assert_eq!(
            registry.owner(&NodeId::new("rhett_door")).unwrap(),
            &CharacterId::new("rhett")
        );
    }

    #[test]
    fn test_duplicate_id_across_files_rejected() {
        let raw = r#"
            [[graph]]
            character = "maya"
            start = "shared"

            [[graph.nodes]]
            id = "shared"
            text = "a"

            [[graph]]
            character = "rhett"
            start = "shared"

            [[graph.nodes]]
            id = "shared"
            text = "b"
        "#;
        assert!(matches!(
            GraphRegistry::from_toml_str(raw),
            Err(EngineError::DuplicateNode(_))
        ));
    }

    #[test]
    fn test_malformed_toml_is_content_error() {
        assert!(matches!(
            GraphRegistry::from_toml_str("graph = 3"),
            Err(EngineError::Content(_))
        ));
    }

    #[test]
    fn test_pipeline_config_from_toml() {
        let raw = r#"
            hub_character = "narrator"
            synthesis_flags = ["clue_letter", "clue_photo"]

            [[transformations]]
            character = "maya"
            min_trust = 7
            required_knowledge = ["knows_real_name"]
            marker_flag = "maya_transformed"

            [[arcs]]
            id = "garden"
            unlock = { has_flag = "found_key" }
            complete = { has_flag = "garden_restored" }
            reward = { addGlobalFlags = ["garden_reward"] }

            [[cross_echoes]]
            observer = "rhett"
            subject = "maya"
            min_trust = 5
        "#;

        let config = PipelineConfig::from_toml_str(raw).unwrap();
        assert_eq!(config.hub_character, CharacterId::new("narrator"));
        assert_eq!(config.transformations.len(), 1);
        assert_eq!(config.arcs[0].id, "garden");
        assert_eq!(config.cross_echoes[0].min_trust, 5);
        assert_eq!(config.iceberg_prefix, "iceberg.");
    }
}
