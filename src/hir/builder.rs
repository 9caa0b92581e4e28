//! Graph construction: ModelIndex → ModelGraph.
//!
//! ```text
//! ModelIndex
//!     │  nodes (declaration order)
//!     ▼
//! contains ─► supertype ─► state machines ─► performs / exhibit
//!     │                                            │
//!     ▼                                            ▼
//! satisfy / expose / state_port ─► flattened transitions ─► cycle check
//! ```
//!
//! Every reference is resolved through [`Resolver`]. Failures are collected
//! rather than returned on the first one, so a single run reports every
//! unresolved reference in the model.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use thiserror::Error;
use tracing::{debug, info, trace};

use super::graph::{Edge, EdgeKind, EdgeLabel, FlatTransition, ModelGraph, Node};
use super::resolve::{ResolveResult, Resolver};
use crate::base::SourceLocation;
use crate::base::constants::QNAME_SEPARATOR;
use crate::syntax::{Element, ElementData, ElementKind, ModelIndex, StateData};

// ============================================================================
// ERRORS
// ============================================================================

/// One fatal problem found while building the graph
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("{location}: unresolved {relation} reference '{reference}' in '{element}'")]
    Unresolved {
        element: String,
        relation: EdgeLabel,
        reference: String,
        location: SourceLocation,
    },
    #[error(
        "{location}: ambiguous {relation} reference '{reference}' in '{element}' (candidates: {})",
        .candidates.join(", ")
    )]
    Ambiguous {
        element: String,
        relation: EdgeLabel,
        reference: String,
        candidates: Vec<String>,
        location: SourceLocation,
    },
    #[error("{location}: '{qname}': {message}")]
    Structural {
        qname: String,
        message: String,
        location: SourceLocation,
    },
}

impl BuildError {
    /// Qualified name of the element the error is reported against
    pub fn qname(&self) -> &str {
        match self {
            Self::Unresolved { element, .. } | Self::Ambiguous { element, .. } => element,
            Self::Structural { qname, .. } => qname,
        }
    }

    pub fn location(&self) -> &SourceLocation {
        match self {
            Self::Unresolved { location, .. }
            | Self::Ambiguous { location, .. }
            | Self::Structural { location, .. } => location,
        }
    }
}

/// Every error found while building one graph, in discovery order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphBuildError(pub Vec<BuildError>);

impl GraphBuildError {
    pub fn errors(&self) -> &[BuildError] {
        &self.0
    }
}

impl fmt::Display for GraphBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "graph construction failed with {} error(s)", self.0.len())?;
        for err in &self.0 {
            write!(f, "\n  {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for GraphBuildError {}

// ============================================================================
// BUILDER
// ============================================================================

/// Build the model graph for one run.
///
/// The graph is returned only when every reference resolved and no
/// structural problem was found.
pub fn build_model_graph(index: &ModelIndex) -> Result<ModelGraph, GraphBuildError> {
    let mut builder = GraphBuilder {
        index,
        resolver: Resolver::new(index),
        graph: ModelGraph::default(),
        errors: Vec::new(),
    };
    builder.run();

    if builder.errors.is_empty() {
        info!(
            nodes = builder.graph.node_count(),
            edges = builder.graph.edges().len(),
            "built model graph"
        );
        Ok(builder.graph)
    } else {
        debug!(errors = builder.errors.len(), "graph construction failed");
        Err(GraphBuildError(builder.errors))
    }
}

struct GraphBuilder<'a> {
    index: &'a ModelIndex,
    resolver: Resolver<'a>,
    graph: ModelGraph,
    errors: Vec<BuildError>,
}

impl<'a> GraphBuilder<'a> {
    fn run(&mut self) {
        let index = self.index;

        for element in index.iter() {
            self.graph.add_node(Node::new(element.clone()));
        }

        for element in index.iter() {
            self.add_containment(element);
            self.add_supertypes(element);
            self.add_satisfies(element);
            match &element.data {
                ElementData::State(state) => self.add_state(element, state),
                ElementData::Part(part) => {
                    for perform in &part.performs {
                        if let Some(target) = self.resolve(
                            element,
                            EdgeLabel::Performs,
                            &perform.behavior,
                            &[ElementKind::Action],
                        ) {
                            self.edge(
                                element,
                                EdgeKind::Performs {
                                    usage: perform.usage.clone(),
                                },
                                target,
                            );
                        }
                    }
                    for exhibit in &part.exhibits {
                        if let Some(target) =
                            self.resolve(element, EdgeLabel::Exhibit, exhibit, &[ElementKind::State])
                        {
                            self.edge(element, EdgeKind::Exhibit, target);
                        }
                    }
                }
                ElementData::View(view) => {
                    for expose in &view.exposes {
                        let reference = strip_wildcard(expose);
                        if let Some(target) =
                            self.resolve(element, EdgeLabel::Expose, reference, &[])
                        {
                            self.edge(element, EdgeKind::Expose, target);
                        }
                    }
                }
                _ => {}
            }
        }

        self.flatten_transitions();
        self.check_supertype_cycles();
    }

    fn edge(&mut self, source: &Element, kind: EdgeKind, target: String) {
        trace!(source = %source.qname, label = %kind.label(), %target, "edge");
        self.graph.add_edge(Edge::new(source.qname.clone(), kind, target));
    }

    /// Resolve a reference written in the body of `element`.
    fn resolve(
        &mut self,
        element: &Element,
        relation: EdgeLabel,
        reference: &str,
        kinds: &[ElementKind],
    ) -> Option<String> {
        self.resolve_in(&element.qname, element, relation, reference, kinds)
    }

    /// Resolve a reference written in `scope`, recording a failure against
    /// `element`.
    fn resolve_in(
        &mut self,
        scope: &str,
        element: &Element,
        relation: EdgeLabel,
        reference: &str,
        kinds: &[ElementKind],
    ) -> Option<String> {
        match self.resolver.resolve(scope, reference, kinds) {
            ResolveResult::Found(qname) => Some(qname),
            ResolveResult::Ambiguous(candidates) => {
                self.errors.push(BuildError::Ambiguous {
                    element: element.qname.clone(),
                    relation,
                    reference: reference.to_string(),
                    candidates,
                    location: element.location.clone(),
                });
                None
            }
            ResolveResult::NotFound => {
                self.errors.push(BuildError::Unresolved {
                    element: element.qname.clone(),
                    relation,
                    reference: reference.to_string(),
                    location: element.location.clone(),
                });
                None
            }
        }
    }

    fn structural(&mut self, element: &Element, message: String) {
        self.errors.push(BuildError::Structural {
            qname: element.qname.clone(),
            message,
            location: element.location.clone(),
        });
    }

    // ------------------------------------------------------------------------
    // Per-relation passes
    // ------------------------------------------------------------------------

    fn add_containment(&mut self, element: &Element) {
        let Some(parent) = element.parent_qname() else {
            return;
        };
        if self.index.contains(parent) {
            self.graph.add_edge(Edge::new(
                parent.to_string(),
                EdgeKind::Contains,
                element.qname.clone(),
            ));
        } else {
            self.structural(element, format!("enclosing element '{parent}' does not exist"));
        }
    }

    fn add_supertypes(&mut self, element: &Element) {
        // Specializations are written in the enclosing namespace.
        let scope = element.parent_qname().unwrap_or("");
        for reference in &element.supertypes {
            if let Some(target) =
                self.resolve_in(scope, element, EdgeLabel::Supertype, reference, &[])
            {
                if target == element.qname {
                    self.structural(element, format!("'{reference}' resolves to the element itself"));
                    continue;
                }
                self.edge(element, EdgeKind::Supertype, target);
            }
        }
    }

    /// `satisfy R;` links R to the declaring element, `satisfy R by B;` to B.
    fn add_satisfies(&mut self, element: &Element) {
        for satisfy in &element.satisfies {
            let Some(requirement) = self.resolve(
                element,
                EdgeLabel::Satisfy,
                &satisfy.requirement,
                &[ElementKind::Requirement],
            ) else {
                continue;
            };
            let by = match &satisfy.by {
                Some(by) => match self.resolve(element, EdgeLabel::Satisfy, by, &[]) {
                    Some(q) => q,
                    None => continue,
                },
                None => element.qname.clone(),
            };
            trace!(%requirement, %by, "edge satisfy");
            self.graph
                .add_edge(Edge::new(requirement, EdgeKind::Satisfy, by));
        }
    }

    fn add_state(&mut self, element: &Element, state: &StateData) {
        for decl in &state.transitions {
            let Some(source) = self.child_state(element, &decl.source) else {
                self.structural(
                    element,
                    format!("transition from '{}', which is not a state of this machine", decl.source),
                );
                continue;
            };
            let target = match self.child_state(element, &decl.target) {
                Some(q) => q,
                None => match self.resolve(
                    element,
                    EdgeLabel::Transition,
                    &decl.target,
                    &[ElementKind::State],
                ) {
                    Some(q) => q,
                    None => continue,
                },
            };
            let signal_ref = self
                .resolver
                .resolve(
                    &element.qname,
                    &decl.signal,
                    &[ElementKind::Signal, ElementKind::AttributeDef, ElementKind::Item],
                )
                .found()
                .map(str::to_string);
            let signal = SmolStr::new(crate::base::constants::last_segment(&decl.signal));
            trace!(machine = %element.qname, %source, %signal, %target, "edge transition");
            self.graph.add_edge(Edge::new(
                source,
                EdgeKind::Transition {
                    signal,
                    signal_ref,
                    machine: element.qname.clone(),
                },
                target,
            ));
        }

        if let Some(initial) = &state.initial {
            match self.child_state(element, initial) {
                Some(target) => self.edge(element, EdgeKind::InitialTransition, target),
                None => self.errors.push(BuildError::Unresolved {
                    element: element.qname.clone(),
                    relation: EdgeLabel::InitialTransition,
                    reference: initial.to_string(),
                    location: element.location.clone(),
                }),
            }
        }

        let behaviors = [ElementKind::Action, ElementKind::PerformAction];
        if let Some(action) = &state.entry_action {
            if let Some(target) = self.resolve(element, EdgeLabel::EntryAction, action, &behaviors) {
                self.edge(element, EdgeKind::EntryAction, target);
            }
        }
        if let Some(action) = &state.do_action {
            if let Some(target) = self.resolve(element, EdgeLabel::DoAction, action, &behaviors) {
                self.edge(element, EdgeKind::DoAction, target);
            }
        }

        for port in &state.ports {
            if let Some(target) =
                self.resolve(element, EdgeLabel::StatePort, &port.ty, &[ElementKind::Port])
            {
                self.edge(
                    element,
                    EdgeKind::StatePort {
                        direction: port.direction,
                        name: port.name.clone(),
                    },
                    target,
                );
            }
        }
    }

    /// A direct child state of `machine` named `name`
    fn child_state(&self, machine: &Element, name: &str) -> Option<String> {
        let qname = format!("{}{QNAME_SEPARATOR}{name}", machine.qname);
        self.index
            .get(&qname)
            .filter(|e| e.kind() == ElementKind::State)
            .map(|e| e.qname.clone())
    }

    // ------------------------------------------------------------------------
    // Derived properties and global checks
    // ------------------------------------------------------------------------

    fn flatten_transitions(&mut self) {
        let mut per_machine: FxHashMap<String, Vec<FlatTransition>> = FxHashMap::default();
        for edge in self.graph.edges() {
            if let EdgeKind::Transition {
                signal, machine, ..
            } = &edge.kind
            {
                per_machine
                    .entry(machine.clone())
                    .or_default()
                    .push(FlatTransition {
                        source: edge.source.clone(),
                        signal: signal.clone(),
                        target: edge.target.clone(),
                    });
            }
        }
        for (machine, mut transitions) in per_machine {
            transitions.sort();
            transitions.dedup();
            if let Some(node) = self.graph.node_mut(&machine) {
                node.transitions = transitions;
            }
        }
    }

    /// Report each supertype cycle once, against the first member reached.
    fn check_supertype_cycles(&mut self) {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Active,
            Done,
        }

        let mut marks: FxHashMap<String, Mark> = FxHashMap::default();
        let mut reported: FxHashSet<String> = FxHashSet::default();
        let mut cycles: Vec<(String, Vec<String>)> = Vec::new();

        let roots: Vec<String> = self.graph.nodes().map(|n| n.qname().to_string()).collect();
        for root in roots {
            if marks.contains_key(&root) {
                continue;
            }
            // Explicit stack of (node, next child index).
            let mut path: Vec<String> = Vec::new();
            let mut stack: Vec<(String, usize)> = vec![(root.clone(), 0)];
            marks.insert(root.clone(), Mark::Active);
            path.push(root);

            while let Some((current, child)) = stack.last_mut() {
                let parents: Vec<String> = self
                    .graph
                    .outgoing(current, EdgeLabel::Supertype)
                    .map(|e| e.target.clone())
                    .collect();
                if *child >= parents.len() {
                    marks.insert(current.clone(), Mark::Done);
                    stack.pop();
                    path.pop();
                    continue;
                }
                let next = parents[*child].clone();
                *child += 1;
                match marks.get(&next) {
                    None => {
                        marks.insert(next.clone(), Mark::Active);
                        path.push(next.clone());
                        stack.push((next, 0));
                    }
                    Some(Mark::Active) => {
                        let start = path.iter().position(|q| *q == next).unwrap_or(0);
                        let members: Vec<String> = path[start..].to_vec();
                        if members.iter().all(|m| !reported.contains(m)) {
                            reported.extend(members.iter().cloned());
                            cycles.push((next, members));
                        }
                    }
                    Some(Mark::Done) => {}
                }
            }
        }

        for (qname, members) in cycles {
            if let Some(element) = self.index.get(&qname) {
                let mut chain = members.join(" -> ");
                chain.push_str(" -> ");
                chain.push_str(&qname);
                self.structural(element, format!("supertype cycle: {chain}"));
            }
        }
    }
}

/// `Pkg.*` and `Pkg.**` expose the namespace itself.
fn strip_wildcard(reference: &str) -> &str {
    reference
        .strip_suffix(".**")
        .or_else(|| reference.strip_suffix(".*"))
        .unwrap_or(reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{SourceUnit, parse_sources};

    fn graph(text: &str) -> Result<ModelGraph, GraphBuildError> {
        let index = parse_sources(&[SourceUnit::new("m.sysml", text)]).unwrap();
        build_model_graph(&index)
    }

    #[test]
    fn test_strip_wildcard() {
        assert_eq!(strip_wildcard("Pkg.**"), "Pkg");
        assert_eq!(strip_wildcard("Pkg.*"), "Pkg");
        assert_eq!(strip_wildcard("Pkg.Thing"), "Pkg.Thing");
    }

    #[test]
    fn test_machine_edges_and_flat_transitions() {
        let g = graph(
            "package P {
                attribute def Go;
                action def Blink;
                state def Lamp {
                    entry; then Off;
                    state Off;
                    accept Go then On;
                    state On { entry Blink; }
                    accept Go then Off;
                }
            }",
        )
        .unwrap();
        assert_eq!(g.initial_state("P.Lamp").map(|n| n.qname()), Some("P.Lamp.Off"));
        let lamp = g.node("P.Lamp").unwrap();
        assert_eq!(
            lamp.transitions,
            vec![
                FlatTransition {
                    source: "P.Lamp.Off".into(),
                    signal: "Go".into(),
                    target: "P.Lamp.On".into(),
                },
                FlatTransition {
                    source: "P.Lamp.On".into(),
                    signal: "Go".into(),
                    target: "P.Lamp.Off".into(),
                },
            ]
        );
        let edge = g.outgoing("P.Lamp.Off", EdgeLabel::Transition).next().unwrap();
        assert!(matches!(
            &edge.kind,
            EdgeKind::Transition { signal_ref: Some(s), machine, .. }
                if s == "P.Go" && machine == "P.Lamp"
        ));
        assert_eq!(g.targets("P.Lamp.On", EdgeLabel::EntryAction).count(), 1);
    }

    #[test]
    fn test_all_unresolved_references_are_reported() {
        let err = graph(
            "package P {
                part def A :> Missing;
                part def B { perform action run : NoSuchAction; }
            }",
        )
        .unwrap_err();
        assert_eq!(err.errors().len(), 2);
        assert!(err.to_string().contains("'Missing'"));
        assert!(err.to_string().contains("'NoSuchAction'"));
    }

    #[test]
    fn test_supertype_cycle_is_structural() {
        let err = graph(
            "package P {
                part def A :> C;
                part def B :> A;
                part def C :> B;
            }",
        )
        .unwrap_err();
        assert_eq!(err.errors().len(), 1);
        assert!(matches!(&err.errors()[0], BuildError::Structural { message, .. }
            if message.starts_with("supertype cycle")));
    }

    #[test]
    fn test_satisfy_and_expose() {
        let g = graph(
            "package P {
                requirement def <'REQ-1'> Fast { doc /* be fast */ }
                part def Car { satisfy Fast; }
                part def Bike;
                satisfy Fast by Bike;
                view def Overview { doc /* all */ expose P::*; }
            }",
        )
        .unwrap();
        let satisfied: Vec<_> = g
            .targets("P.Fast", EdgeLabel::Satisfy)
            .map(|n| n.qname())
            .collect();
        assert_eq!(satisfied, vec!["P.Car", "P.Bike"]);
        assert_eq!(
            g.targets("P.Overview", EdgeLabel::Expose).map(|n| n.qname()).collect::<Vec<_>>(),
            vec!["P"]
        );
    }
}
