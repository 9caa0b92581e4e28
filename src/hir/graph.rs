//! The model graph IR and its query layer.
//!
//! Nodes are one-to-one with parsed elements and keep their declaration
//! order. Edges are typed relations between qualified names. The graph is
//! assembled once by [`build_model_graph`](super::build_model_graph) and is
//! read-only afterwards: every query below is a non-destructive read.

use std::fmt;

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use crate::base::SourceLocation;
use crate::syntax::{Direction, Element, ElementData, ElementKind};

// ============================================================================
// EDGES
// ============================================================================

/// The label of an edge, without its properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EdgeLabel {
    Contains,
    Supertype,
    Transition,
    InitialTransition,
    EntryAction,
    DoAction,
    Performs,
    Exhibit,
    Satisfy,
    Expose,
    StatePort,
}

impl EdgeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::Supertype => "supertype",
            Self::Transition => "transition",
            Self::InitialTransition => "initial_transition",
            Self::EntryAction => "entry_action",
            Self::DoAction => "do_action",
            Self::Performs => "performs",
            Self::Exhibit => "exhibit",
            Self::Satisfy => "satisfy",
            Self::Expose => "expose",
            Self::StatePort => "state_port",
        }
    }
}

impl fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An edge label together with its relationship-specific properties
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    Contains,
    Supertype,
    Transition {
        /// Signal name as written in the model
        signal: SmolStr,
        /// Qualified name of the signal declaration, when one exists
        signal_ref: Option<String>,
        /// Qualified name of the owning state machine
        machine: String,
    },
    InitialTransition,
    EntryAction,
    DoAction,
    Performs {
        usage: SmolStr,
    },
    Exhibit,
    Satisfy,
    Expose,
    StatePort {
        direction: Direction,
        name: SmolStr,
    },
}

impl EdgeKind {
    pub fn label(&self) -> EdgeLabel {
        match self {
            Self::Contains => EdgeLabel::Contains,
            Self::Supertype => EdgeLabel::Supertype,
            Self::Transition { .. } => EdgeLabel::Transition,
            Self::InitialTransition => EdgeLabel::InitialTransition,
            Self::EntryAction => EdgeLabel::EntryAction,
            Self::DoAction => EdgeLabel::DoAction,
            Self::Performs { .. } => EdgeLabel::Performs,
            Self::Exhibit => EdgeLabel::Exhibit,
            Self::Satisfy => EdgeLabel::Satisfy,
            Self::Expose => EdgeLabel::Expose,
            Self::StatePort { .. } => EdgeLabel::StatePort,
        }
    }
}

/// A directed relation `(source, kind, target)` between qualified names
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
}

impl Edge {
    pub fn new(source: impl Into<String>, kind: EdgeKind, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
        }
    }

    pub fn label(&self) -> EdgeLabel {
        self.kind.label()
    }

    /// Signal name of a transition edge
    pub fn signal(&self) -> Option<&str> {
        match &self.kind {
            EdgeKind::Transition { signal, .. } => Some(signal),
            _ => None,
        }
    }

    /// Usage name of a performs edge
    pub fn usage(&self) -> Option<&str> {
        match &self.kind {
            EdgeKind::Performs { usage } => Some(usage),
            _ => None,
        }
    }
}

// ============================================================================
// NODES
// ============================================================================

/// A transition of a machine with both ends resolved to state qnames
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlatTransition {
    pub source: String,
    pub signal: SmolStr,
    pub target: String,
}

/// One graph node: the parsed element plus derived properties
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub element: Element,
    /// Flattened, deduplicated transitions of a state machine
    pub transitions: Vec<FlatTransition>,
}

impl Node {
    pub fn new(element: Element) -> Self {
        Self {
            element,
            transitions: Vec::new(),
        }
    }

    pub fn qname(&self) -> &str {
        &self.element.qname
    }

    pub fn name(&self) -> &str {
        &self.element.name
    }

    pub fn short_name(&self) -> Option<&str> {
        self.element.short_name.as_deref()
    }

    pub fn kind(&self) -> ElementKind {
        self.element.kind()
    }

    pub fn data(&self) -> &ElementData {
        &self.element.data
    }

    pub fn doc(&self) -> Option<&str> {
        self.element.doc.as_deref()
    }

    pub fn location(&self) -> &SourceLocation {
        &self.element.location
    }

    pub fn is_def(&self) -> bool {
        self.element.is_def
    }

    /// Matches either the declared name or the short name
    pub fn answers_to(&self, name: &str) -> bool {
        self.name() == name || self.short_name() == Some(name)
    }
}

// ============================================================================
// GRAPH
// ============================================================================

/// Nodes, edges and adjacency for one generation run
#[derive(Debug, Clone, Default)]
pub struct ModelGraph {
    nodes: IndexMap<String, Node>,
    edges: Vec<Edge>,
    edge_set: FxHashSet<Edge>,
    outgoing: FxHashMap<String, Vec<usize>>,
    incoming: FxHashMap<String, Vec<usize>>,
}

impl ModelGraph {
    // ------------------------------------------------------------------------
    // Construction (crate-private; the builder is the only writer)
    // ------------------------------------------------------------------------

    pub(crate) fn add_node(&mut self, node: Node) {
        self.nodes.insert(node.qname().to_string(), node);
    }

    pub(crate) fn node_mut(&mut self, qname: &str) -> Option<&mut Node> {
        self.nodes.get_mut(qname)
    }

    /// Add an edge; an identical edge is stored once.
    pub(crate) fn add_edge(&mut self, edge: Edge) -> bool {
        if self.edge_set.contains(&edge) {
            return false;
        }
        let index = self.edges.len();
        self.outgoing
            .entry(edge.source.clone())
            .or_default()
            .push(index);
        self.incoming
            .entry(edge.target.clone())
            .or_default()
            .push(index);
        self.edge_set.insert(edge.clone());
        self.edges.push(edge);
        true
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn node(&self, qname: &str) -> Option<&Node> {
        self.nodes.get(qname)
    }

    pub fn contains(&self, qname: &str) -> bool {
        self.nodes.contains_key(qname)
    }

    /// All nodes in declaration order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes_of_kind(&self, kind: ElementKind) -> impl Iterator<Item = &Node> {
        self.nodes().filter(move |n| n.kind() == kind)
    }

    /// All edges in insertion order
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Outgoing edges of `qname` with the given label, in insertion order
    pub fn outgoing(&self, qname: &str, label: EdgeLabel) -> impl Iterator<Item = &Edge> {
        self.adjacent(&self.outgoing, qname)
            .filter(move |e| e.label() == label)
    }

    /// Incoming edges of `qname` with the given label, in insertion order
    pub fn incoming(&self, qname: &str, label: EdgeLabel) -> impl Iterator<Item = &Edge> {
        self.adjacent(&self.incoming, qname)
            .filter(move |e| e.label() == label)
    }

    fn adjacent<'a>(
        &'a self,
        map: &'a FxHashMap<String, Vec<usize>>,
        qname: &str,
    ) -> impl Iterator<Item = &'a Edge> + 'a {
        map.get(qname)
            .into_iter()
            .flatten()
            .map(move |&i| &self.edges[i])
    }

    /// Targets of the outgoing edges with the given label
    pub fn targets(&self, qname: &str, label: EdgeLabel) -> impl Iterator<Item = &Node> {
        self.outgoing(qname, label)
            .filter_map(move |e| self.node(&e.target))
    }

    /// Direct `contains` children, optionally restricted to one kind
    pub fn children(&self, qname: &str, kind: Option<ElementKind>) -> Vec<&Node> {
        self.targets(qname, EdgeLabel::Contains)
            .filter(|n| kind.is_none_or(|k| n.kind() == k))
            .collect()
    }

    /// All transitive `contains` descendants in pre-order
    pub fn descendants(&self, qname: &str) -> Vec<&Node> {
        let mut out = Vec::new();
        let mut visited: FxHashSet<&str> = FxHashSet::default();
        let mut stack: Vec<&Node> = self.children(qname, None);
        stack.reverse();
        while let Some(node) = stack.pop() {
            if !visited.insert(node.qname()) {
                continue;
            }
            out.push(node);
            let mut children = self.children(node.qname(), None);
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Nodes whose name or short name equals `name`
    pub fn lookup_by_name(&self, name: &str) -> Vec<&Node> {
        self.nodes().filter(|n| n.answers_to(name)).collect()
    }

    /// Ancestors along `supertype` edges, nearest first, each visited once.
    pub fn supertype_chain(&self, qname: &str) -> Vec<&Node> {
        let mut out = Vec::new();
        let mut visited: FxHashSet<&str> = FxHashSet::default();
        visited.insert(qname);
        let mut queue: std::collections::VecDeque<&str> = std::collections::VecDeque::new();
        queue.push_back(qname);
        while let Some(current) = queue.pop_front() {
            for parent in self.targets(current, EdgeLabel::Supertype) {
                if visited.insert(parent.qname()) {
                    out.push(parent);
                    queue.push_back(parent.qname());
                }
            }
        }
        out
    }

    /// States of a machine: its `contains` children of kind state
    pub fn states(&self, machine: &str) -> Vec<&Node> {
        self.children(machine, Some(ElementKind::State))
    }

    /// Target of the machine's `initial_transition` edge
    pub fn initial_state(&self, machine: &str) -> Option<&Node> {
        self.targets(machine, EdgeLabel::InitialTransition).next()
    }

    /// True for a state node that owns child states
    pub fn is_state_machine(&self, qname: &str) -> bool {
        self.node(qname).is_some_and(|n| n.kind() == ElementKind::State)
            && !self.states(qname).is_empty()
    }
}
