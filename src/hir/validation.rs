//! The validation gate between graph construction and code assembly.
//!
//! A gate inspects a finished [`ModelGraph`] and returns a [`GateReport`].
//! Assembly only runs when the report has passed, i.e. carries no
//! error-severity diagnostic.

use std::fmt;

use indexmap::IndexMap;
use tracing::debug;

use super::diagnostics::{Diagnostic, DiagnosticCollector, Severity, codes};
use super::graph::{ModelGraph, Node};
use crate::syntax::ElementKind;

/// Kinds whose `PREFIX_Name` names are stable identifiers
const STABLE_ID_KINDS: [ElementKind; 5] = [
    ElementKind::View,
    ElementKind::Viewpoint,
    ElementKind::Requirement,
    ElementKind::Part,
    ElementKind::State,
];

/// A check run on the graph before any artifact is assembled
pub trait ValidationGate {
    fn name(&self) -> &str;

    fn check(&self, graph: &ModelGraph) -> GateReport;
}

/// Outcome of one gate
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GateReport {
    pub diagnostics: Vec<Diagnostic>,
}

impl GateReport {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    /// Passes iff no diagnostic is an error.
    pub fn passed(&self) -> bool {
        !self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.by_severity(Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.by_severity(Severity::Warning)
    }

    fn by_severity(&self, severity: Severity) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |d| d.severity == severity)
    }
}

impl fmt::Display for GateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let errors = self.errors().count();
        write!(f, "{errors} error(s), {} warning(s)", self.warnings().count())?;
        for diag in self.errors() {
            write!(f, "\n  {diag}")?;
        }
        Ok(())
    }
}

// ============================================================================
// DEFAULT GATE
// ============================================================================

/// Stable-identifier uniqueness and documentation checks
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultGate;

impl ValidationGate for DefaultGate {
    fn name(&self) -> &str {
        "default"
    }

    fn check(&self, graph: &ModelGraph) -> GateReport {
        let mut collector = DiagnosticCollector::new();
        check_stable_ids(graph, &mut collector);
        check_documentation(graph, &mut collector);
        debug!(
            gate = self.name(),
            diagnostics = collector.len(),
            "validation gate finished"
        );
        GateReport::new(collector.finish())
    }
}

/// `PREFIX_Name`: one or more ASCII capitals, `_`, then at least one word char.
fn is_stable_id(name: &str) -> bool {
    let Some((prefix, rest)) = name.split_once('_') else {
        return false;
    };
    !prefix.is_empty()
        && prefix.bytes().all(|b| b.is_ascii_uppercase())
        && !rest.is_empty()
        && rest.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

fn stable_ids(node: &Node) -> Vec<&str> {
    let mut ids = Vec::new();
    if let Some(short) = node.short_name() {
        ids.push(short);
    }
    if STABLE_ID_KINDS.contains(&node.kind()) && is_stable_id(node.name()) {
        ids.push(node.name());
    }
    ids
}

fn check_stable_ids(graph: &ModelGraph, collector: &mut DiagnosticCollector) {
    let mut declared: IndexMap<&str, Vec<&Node>> = IndexMap::new();
    for node in graph.nodes() {
        for id in stable_ids(node) {
            let owners = declared.entry(id).or_default();
            if !owners.iter().any(|n| n.qname() == node.qname()) {
                owners.push(node);
            }
        }
    }
    declared.sort_keys();

    for (id, owners) in declared {
        let [first, rest @ ..] = owners.as_slice() else {
            continue;
        };
        for duplicate in rest {
            collector.add(
                Diagnostic::error(format!("duplicate stable identifier '{id}'"))
                    .with_code(codes::DUPLICATE_STABLE_ID)
                    .with_element(duplicate.qname(), duplicate.location().clone())
                    .with_related(first.location().clone(), "first declared here"),
            );
        }
    }
}

fn check_documentation(graph: &ModelGraph, collector: &mut DiagnosticCollector) {
    for node in graph.nodes() {
        let undocumented = node.doc().is_none_or(|d| d.trim().is_empty());
        if !undocumented {
            continue;
        }
        match node.kind() {
            ElementKind::View => collector.add(
                Diagnostic::error(format!("view '{}' has no documentation", node.name()))
                    .with_code(codes::MISSING_DOCUMENTATION)
                    .with_element(node.qname(), node.location().clone()),
            ),
            ElementKind::Requirement => collector.add(
                Diagnostic::warning(format!("requirement '{}' has no documentation", node.name()))
                    .with_code(codes::UNDOCUMENTED_REQUIREMENT)
                    .with_element(node.qname(), node.location().clone()),
            ),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::build_model_graph;
    use crate::project::{SourceUnit, parse_sources};
    use rstest::rstest;

    fn report(text: &str) -> GateReport {
        let index = parse_sources(&[SourceUnit::new("v.sysml", text)]).unwrap();
        let graph = build_model_graph(&index).unwrap();
        DefaultGate.check(&graph)
    }

    #[rstest]
    #[case("CM_Engine", true)]
    #[case("VP_Doc_2", true)]
    #[case("Engine", false)]
    #[case("Cm_Engine", false)]
    #[case("CM_", false)]
    #[case("_Engine", false)]
    fn test_is_stable_id(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_stable_id(name), expected);
    }

    #[test]
    fn test_duplicate_stable_id_fails() {
        let r = report(
            "package A { part def CM_Engine; }
             package B { part def CM_Engine; }",
        );
        assert!(!r.passed());
        let errors: Vec<_> = r.errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].qname.as_deref(), Some("B.CM_Engine"));
        assert_eq!(errors[0].code, Some(codes::DUPLICATE_STABLE_ID));
    }

    #[test]
    fn test_documentation_rules() {
        let r = report(
            "package P {
                view def Overview;
                requirement def Fast;
                view def Documented { doc /* shows everything */ }
            }",
        );
        assert_eq!(r.errors().count(), 1);
        assert_eq!(r.warnings().count(), 1);
        assert!(r.to_string().contains("view 'Overview' has no documentation"));
    }

    #[test]
    fn test_clean_model_passes() {
        let r = report("package P { part def Car; part def Bike; }");
        assert!(r.passed());
        assert!(r.diagnostics.is_empty());
    }
}
