//! Deterministic state-machine derivation for generated dispatch logic.
//!
//! ```text
//! states       = contains-children of kind state, sorted by name
//! initial      = initial_transition target
//! transitions  = flattened transition edges, deduplicated, sorted
//! signals      = distinct transition signals, sorted
//! dispatch     = state → [(signal, target)], one row per state
//! ```

use smol_str::SmolStr;
use tracing::warn;

use crate::hir::{Diagnostic, DiagnosticCollector, ModelGraph, Node, codes};

/// One `(source, signal) → target` row, all by state name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Transition {
    pub source: SmolStr,
    pub signal: SmolStr,
    pub target: SmolStr,
}

/// Everything the generated skeleton needs from one machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateMachineModel {
    pub machine: String,
    pub states: Vec<SmolStr>,
    pub initial: SmolStr,
    pub transitions: Vec<Transition>,
    pub signals: Vec<SmolStr>,
}

/// Outer branch of the dispatch table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRow<'m> {
    pub state: &'m str,
    /// `(signal, target)` pairs, sorted by signal
    pub arms: Vec<(&'m str, &'m str)>,
}

impl StateMachineModel {
    /// One row per state, in state order; states without transitions have
    /// no arms.
    pub fn dispatch_table(&self) -> Vec<DispatchRow<'_>> {
        self.states
            .iter()
            .map(|state| DispatchRow {
                state: state.as_str(),
                arms: self
                    .transitions
                    .iter()
                    .filter(|t| t.source == *state)
                    .map(|t| (t.signal.as_str(), t.target.as_str()))
                    .collect(),
            })
            .collect()
    }
}

/// Derive the machine model. The caller guarantees an initial state exists.
///
/// Transitions that leave the machine's own states are dropped with a
/// warning, as are later targets for an already-matched `(state, signal)`.
pub fn derive_state_machine(
    graph: &ModelGraph,
    machine: &Node,
    collector: &mut DiagnosticCollector,
) -> StateMachineModel {
    let state_nodes = graph.states(machine.qname());
    let mut states: Vec<SmolStr> = state_nodes
        .iter()
        .map(|n| SmolStr::new(n.name()))
        .collect();
    states.sort();
    states.dedup();

    let initial = graph
        .initial_state(machine.qname())
        .map(|n| SmolStr::new(n.name()))
        .unwrap_or_default();

    let own_state = |qname: &str| state_nodes.iter().any(|n| n.qname() == qname);
    let mut all: Vec<Transition> = Vec::new();
    for flat in &machine.transitions {
        if !own_state(&flat.source) || !own_state(&flat.target) {
            let message = format!(
                "transition '{}' --{}--> '{}' leaves state machine '{}'; ignored",
                flat.source,
                flat.signal,
                flat.target,
                machine.qname()
            );
            warn!("{message}");
            collector.add(
                Diagnostic::warning(message).with_element(machine.qname(), machine.location().clone()),
            );
            continue;
        }
        all.push(Transition {
            source: name_of(graph, &flat.source),
            signal: flat.signal.clone(),
            target: name_of(graph, &flat.target),
        });
    }
    all.sort();
    all.dedup();

    let mut transitions: Vec<Transition> = Vec::with_capacity(all.len());
    for t in all {
        if let Some(kept) = transitions
            .iter()
            .find(|k| k.source == t.source && k.signal == t.signal)
        {
            collector.add(
                Diagnostic::warning(format!(
                    "state '{}' has conflicting targets for signal '{}': '{}' kept, '{}' ignored",
                    t.source, t.signal, kept.target, t.target
                ))
                .with_code(codes::CONFLICTING_TRANSITION)
                .with_element(machine.qname(), machine.location().clone()),
            );
            continue;
        }
        transitions.push(t);
    }

    let mut signals: Vec<SmolStr> = transitions.iter().map(|t| t.signal.clone()).collect();
    signals.sort();
    signals.dedup();

    StateMachineModel {
        machine: machine.qname().to_string(),
        states,
        initial,
        transitions,
        signals,
    }
}

fn name_of(graph: &ModelGraph, qname: &str) -> SmolStr {
    graph
        .node(qname)
        .map(|n| SmolStr::new(n.name()))
        .unwrap_or_else(|| SmolStr::new(crate::base::constants::last_segment(qname)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hir::build_model_graph;
    use crate::project::{SourceUnit, parse_sources};

    fn model(text: &str, machine: &str) -> (StateMachineModel, Vec<Diagnostic>) {
        let index = parse_sources(&[SourceUnit::new("sm.sysml", text)]).unwrap();
        let graph = build_model_graph(&index).unwrap();
        let mut collector = DiagnosticCollector::new();
        let node = graph.node(machine).unwrap();
        let m = derive_state_machine(&graph, node, &mut collector);
        (m, collector.finish())
    }

    #[test]
    fn test_idle_listening() {
        let (m, diags) = model(
            "package P {
                attribute def StartSignal;
                state def Listener {
                    entry; then Idle;
                    state Listening;
                    state Idle;
                    accept StartSignal then Listening;
                }
            }",
            "P.Listener",
        );
        assert!(diags.is_empty());
        assert_eq!(m.states, vec!["Idle", "Listening"]);
        assert_eq!(m.initial, "Idle");
        assert_eq!(m.signals, vec!["StartSignal"]);
        let table = m.dispatch_table();
        assert_eq!(
            table,
            vec![
                DispatchRow {
                    state: "Idle",
                    arms: vec![("StartSignal", "Listening")],
                },
                DispatchRow {
                    state: "Listening",
                    arms: vec![],
                },
            ]
        );
    }

    #[test]
    fn test_duplicates_collapse_and_conflicts_warn() {
        let (m, diags) = model(
            "package P {
                attribute def Go;
                state def M {
                    entry; then A;
                    state A;
                    accept Go then B;
                    transition first A accept Go then B;
                    transition first A accept Go then C;
                    state B;
                    state C;
                }
            }",
            "P.M",
        );
        assert_eq!(
            m.transitions,
            vec![Transition {
                source: "A".into(),
                signal: "Go".into(),
                target: "B".into(),
            }]
        );
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, Some(codes::CONFLICTING_TRANSITION));
    }
}
