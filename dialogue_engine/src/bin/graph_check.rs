//! Offline content checker: sweep a graph file and report coverage.
//!
//! Usage: graph_check <content.toml> [start_node]
//!
//! Loads the `[[graph]]` tables from the file, explores everything reachable
//! from the start node (the first graph's start when not given), and prints
//! coverage plus any dangling targets. Exits nonzero when the content has
//! unreachable nodes or dangling references, so it can gate a content merge.

use std::process::ExitCode;

use dialogue_engine::{explore, GraphRegistry, SimulatorConfig};
use story_state::{GameState, NodeId, PlayerId};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: graph_check <content.toml> [start_node]");
        return ExitCode::from(2);
    };

    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) => {
            eprintln!("cannot read {path}: {err}");
            return ExitCode::from(2);
        }
    };

    let registry = match GraphRegistry::from_toml_str(&raw) {
        Ok(registry) => registry,
        Err(err) => {
            eprintln!("cannot load {path}: {err}");
            return ExitCode::from(2);
        }
    };

    let start = match args.next() {
        Some(id) => NodeId::new(id),
        None => match registry.graphs().first() {
            Some(graph) => graph.start.clone(),
            None => {
                eprintln!("{path}: no graphs defined");
                return ExitCode::from(2);
            }
        },
    };

    let initial = GameState::new(PlayerId::new(), start.clone());
    let report = explore(&registry, &start, initial, &SimulatorConfig::default());

    println!(
        "visited {}/{} nodes from {} ({} states expanded)",
        report.visited_nodes.len(),
        registry.node_count(),
        start,
        report.expanded_states
    );
    for (character, count) in &report.per_character {
        println!("  {character}: {count} nodes");
    }

    let unreached = report.unreached(&registry);
    for id in &unreached {
        println!("unreached: {id}");
    }
    for id in &report.dangling_targets {
        println!("dangling target: {id}");
    }
    if report.truncated() {
        println!("warning: exploration truncated by caps; coverage is a lower bound");
    }

    if unreached.is_empty() && report.dangling_targets.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
