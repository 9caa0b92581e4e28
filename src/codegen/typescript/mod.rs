//! The built-in TypeScript target.
//!
//! ```text
//! ModelGraph ──discover──▶ [Component] ──assemble (rayon)──▶ src/<module>.ts
//!                                      └──────────────────▶ src/index.ts
//!                                      └──────────────────▶ config.json
//! ```
//!
//! Components are assembled independently against the same immutable graph,
//! so they may run in parallel; artifacts are always emitted in component
//! order.

mod config;
mod module;

use rayon::prelude::*;
use tracing::{debug, info};

use super::components::{Component, discover_components};
use super::options::GenerationOptions;
use super::target::{AssemblyError, GeneratedArtifact, GeneratorTarget, TargetOutput};
use crate::hir::{Diagnostic, DiagnosticCollector, ModelGraph};

pub use config::generated_header;
pub use module::assemble_component;

/// Emits one TypeScript module per component plus `index.ts` and `config.json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeScriptTarget;

impl TypeScriptTarget {
    pub const NAME: &'static str = "typescript";
}

impl GeneratorTarget for TypeScriptTarget {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn generate(
        &self,
        graph: &ModelGraph,
        options: &GenerationOptions,
    ) -> Result<TargetOutput, AssemblyError> {
        let discovery = discover_components(graph)?;
        let mut diagnostics = discovery.diagnostics;
        let components = discovery.components;
        if components.is_empty() {
            info!("no components to generate");
            return Ok(TargetOutput {
                artifacts: Vec::new(),
                diagnostics,
            });
        }

        let language = options.language.as_str();
        let assemble = |component: &Component<'_>| -> (Option<String>, Vec<Diagnostic>) {
            let mut collector = DiagnosticCollector::new();
            let module = assemble_component(graph, component, language, &mut collector);
            (module, collector.finish())
        };
        let assembled: Vec<(Option<String>, Vec<Diagnostic>)> = if options.parallel {
            components.par_iter().map(assemble).collect()
        } else {
            components.iter().map(assemble).collect()
        };

        let header = generated_header(&options.version);
        let mut artifacts = Vec::with_capacity(components.len() + 2);
        let mut emitted: Vec<&Component<'_>> = Vec::with_capacity(components.len());
        for (component, (module, findings)) in components.iter().zip(assembled) {
            diagnostics.extend(findings);
            let Some(source) = module else {
                debug!(part = component.part.qname(), "component skipped");
                continue;
            };
            artifacts.push(GeneratedArtifact::new(
                format!("src/{}.ts", component.module_name),
                format!("{header}{source}"),
            ));
            emitted.push(component);
        }

        if !emitted.is_empty() {
            artifacts.push(GeneratedArtifact::new(
                "src/index.ts",
                format!("{header}{}", config::build_index(&emitted)),
            ));
            let json = config::build_config_json(&emitted)
                .map_err(|err| AssemblyError::serialize("config.json", err))?;
            artifacts.push(GeneratedArtifact::new("config.json", json));
        }

        info!(
            components = components.len(),
            artifacts = artifacts.len(),
            diagnostics = diagnostics.len(),
            "typescript target finished"
        );
        Ok(TargetOutput {
            artifacts,
            diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::build_model_graph;
    use crate::project::{SourceUnit, parse_sources};

    const MODEL: &str = "
        package Demo {
            attribute def Go;
            state def Toggle { entry; then Off; state Off; accept Go then On; state On; accept Go then Off; }
            part def 'Lamp Controller' {
                attribute brightness : Integer = 80;
                attribute label : String = \"desk\";
                exhibit state toggle : Toggle;
            }
            part def Fan { exhibit state toggle : Toggle; }
        }";

    fn generate(options: &GenerationOptions) -> TargetOutput {
        let index = parse_sources(&[SourceUnit::new("demo.sysml", MODEL)]).unwrap();
        let graph = build_model_graph(&index).unwrap();
        TypeScriptTarget.generate(&graph, options).unwrap()
    }

    #[test]
    fn test_artifact_set() {
        let output = generate(&GenerationOptions::default().with_version("v0.3.0"));
        let paths: Vec<_> = output
            .artifacts
            .iter()
            .map(|a| a.path.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            paths,
            vec!["src/fan.ts", "src/lamp_controller.ts", "src/index.ts", "config.json"]
        );
        let index = output.artifact("src/index.ts").unwrap();
        assert!(index.contents.starts_with("// Generated from SysML model. Do not edit by hand.\n// Version: v0.3.0\n\n"));
        assert!(index.contents.ends_with(
            "export { Fan } from './fan';\nexport { LampController } from './lamp_controller';\n"
        ));
        assert_eq!(
            output.artifact("config.json").unwrap().contents,
            "{\n  \"lampController\": {\n    \"brightness\": 80,\n    \"label\": \"desk\"\n  }\n}\n"
        );
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let parallel = generate(&GenerationOptions::default());
        let sequential = generate(&GenerationOptions::default().with_parallel(false));
        assert_eq!(parallel, sequential);
    }
}
