//! Shared setup for the integration tests.

#![allow(dead_code)]

pub mod fixtures;

use modelgen::codegen::{GenerationOptions, GeneratorTarget, TargetOutput, TypeScriptTarget};
use modelgen::hir::{ModelGraph, build_model_graph};
use modelgen::{SourceUnit, parse_sources};

/// Route `tracing` output to the test harness; repeated calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Parse and build a single in-memory source unit.
pub fn graph_from(text: &str) -> ModelGraph {
    graph_from_units(&[("model.sysml", text)])
}

pub fn graph_from_units(units: &[(&str, &str)]) -> ModelGraph {
    init_tracing();
    let units: Vec<SourceUnit> = units
        .iter()
        .map(|(path, text)| SourceUnit::new(*path, *text))
        .collect();
    let index = parse_sources(&units).unwrap_or_else(|e| panic!("parse failed: {e}"));
    build_model_graph(&index).unwrap_or_else(|e| panic!("build failed: {e}"))
}

/// Run the TypeScript target over one source unit.
pub fn typescript_from(text: &str, options: &GenerationOptions) -> TargetOutput {
    let graph = graph_from(text);
    TypeScriptTarget
        .generate(&graph, options)
        .unwrap_or_else(|e| panic!("generation failed: {e}"))
}

/// Contents of a generated artifact, panicking with the available paths.
pub fn artifact<'a>(output: &'a TargetOutput, path: &str) -> &'a str {
    match output.artifact(path) {
        Some(a) => &a.contents,
        None => panic!(
            "no artifact '{path}'; have {:?}",
            output.artifacts.iter().map(|a| &a.path).collect::<Vec<_>>()
        ),
    }
}
