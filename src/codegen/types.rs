//! Type-preamble resolution.
//!
//! Behaviors of a component may mention other part definitions, either as
//! parameter types or by name inside their fragments. Those parts are
//! declared at the top of the module, each after the types it depends on.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashSet;
use tracing::trace;

use super::naming::{UnknownType, map_type, property_name};
use super::text::dedent;
use crate::base::constants::{PREAMBLE_FRAGMENT, last_segment};
use crate::hir::{EdgeLabel, ModelGraph, Node};
use crate::syntax::{Attribute, Cardinality, ElementKind, Fragment};

/// Declarations for every part type the behaviors reach, dependencies first.
///
/// Types already declared by the component's own preamble text are still
/// traversed but not emitted again.
pub fn resolve_type_preamble(
    graph: &ModelGraph,
    component: &Node,
    behaviors: &[&Node],
    language: &str,
    preamble: Option<&str>,
) -> Vec<String> {
    let known = known_types(graph, component);
    if known.is_empty() {
        return Vec::new();
    }

    let mut roots: BTreeSet<&str> = BTreeSet::new();
    for behavior in behaviors {
        if let Some(action) = behavior.data().as_action() {
            for param in &action.params {
                if let Some(ty) = param.ty.as_deref() {
                    roots.insert(last_segment(ty));
                }
            }
        }
        for fragment in language_fragments(behavior, language) {
            roots.extend(words(&fragment.body));
        }
    }
    roots.retain(|name| known.contains_key(name));

    let mut order: Vec<&Node> = Vec::new();
    let mut visited: FxHashSet<&str> = FxHashSet::default();
    for root in roots {
        visit(graph, &known, root, language, &mut visited, &mut order);
    }

    let already = preamble.map(declared_names).unwrap_or_default();
    order
        .into_iter()
        .filter(|node| !already.contains(node.name()))
        .map(|node| render_type(graph, node, language))
        .collect()
}

/// Part definitions by name; the first qname wins on a name clash.
fn known_types<'g>(graph: &'g ModelGraph, component: &Node) -> BTreeMap<&'g str, &'g Node> {
    let mut known: BTreeMap<&str, &Node> = BTreeMap::new();
    for node in graph.nodes_of_kind(ElementKind::Part) {
        if !node.is_def() || node.qname() == component.qname() {
            continue;
        }
        known
            .entry(node.name())
            .and_modify(|existing| {
                if node.qname() < existing.qname() {
                    *existing = node;
                }
            })
            .or_insert(node);
    }
    known
}

/// Post-order DFS: a type is pushed after everything it references.
fn visit<'g>(
    graph: &'g ModelGraph,
    known: &BTreeMap<&'g str, &'g Node>,
    name: &str,
    language: &str,
    visited: &mut FxHashSet<&'g str>,
    order: &mut Vec<&'g Node>,
) {
    let Some((&key, &node)) = known.get_key_value(name) else {
        return;
    };
    if !visited.insert(key) {
        return;
    }
    for dep in dependencies(graph, node, language) {
        if dep != key && known.contains_key(dep.as_str()) {
            visit(graph, known, &dep, language, visited, order);
        }
    }
    trace!(ty = node.qname(), "type preamble entry");
    order.push(node);
}

/// Sorted names a type declaration refers to
fn dependencies(graph: &ModelGraph, node: &Node, language: &str) -> BTreeSet<String> {
    let mut deps: BTreeSet<String> = BTreeSet::new();
    for attr in node.data().attributes() {
        if let Some(ty) = attr.ty.as_deref() {
            deps.insert(last_segment(ty).to_string());
        }
    }
    for parent in graph.targets(node.qname(), EdgeLabel::Supertype) {
        deps.insert(parent.name().to_string());
    }
    for fragment in language_fragments(node, language) {
        deps.extend(words(&fragment.body).map(str::to_string));
    }
    deps
}

fn render_type(graph: &ModelGraph, node: &Node, language: &str) -> String {
    let name = node.name();
    let attributes = node.data().attributes();
    if !attributes.is_empty() {
        let mut out = format!("export interface {name} {{\n");
        for attr in attributes {
            out.push_str(&format!("  {};\n", render_field(attr)));
        }
        out.push('}');
        return out;
    }

    let fragment = node
        .element
        .fragment(PREAMBLE_FRAGMENT, language)
        .or_else(|| language_fragments(node, language).next());
    if let Some(fragment) = fragment {
        let body = dedent(&fragment.body);
        if body.starts_with("export ") {
            return body;
        }
        return format!("export type {name} = {};", body.trim_end_matches(';').trim_end());
    }

    let parents: Vec<&str> = graph
        .targets(node.qname(), EdgeLabel::Supertype)
        .map(|n| n.name())
        .collect();
    match parents.as_slice() {
        [] => format!("export interface {name} {{}}"),
        _ => format!("export type {name} = {};", parents.join(" | ")),
    }
}

fn render_field(attr: &Attribute) -> String {
    let name = property_name(&attr.name);
    let ty = map_type(attr.ty.as_deref(), UnknownType::PassThrough);
    match attr.cardinality {
        Cardinality::One => format!("{name}: {ty}"),
        Cardinality::Optional => format!("{name}?: {ty}"),
        Cardinality::Many => format!("{name}: {ty}[]"),
    }
}

fn language_fragments<'n>(node: &'n Node, language: &'n str) -> impl Iterator<Item = &'n Fragment> {
    node.data()
        .fragments()
        .iter()
        .filter(move |f| f.is_language(language))
}

/// Identifier-shaped words of a fragment body
fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(unicode_ident::is_xid_continue(c) || c == '$'))
        .filter(|w| w.chars().next().is_some_and(unicode_ident::is_xid_start))
}

/// Names declared by `interface X`, `type X`, `class X` or `enum X`
fn declared_names(text: &str) -> FxHashSet<&str> {
    let tokens: Vec<&str> = words(text).collect();
    tokens
        .windows(2)
        .filter(|w| matches!(w[0], "interface" | "type" | "class" | "enum"))
        .map(|w| w[1])
        .collect()
}
