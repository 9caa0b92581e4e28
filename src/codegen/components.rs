//! Component discovery: which part definitions become output units.
//!
//! A part definition is a component when it exhibits a state machine,
//! directly or through its supertype chain. The chain is walked breadth-first
//! with a visited set, nearest ancestor first.

use tracing::{debug, trace};

use super::naming::{to_class_name, to_snake};
use super::target::AssemblyError;
use crate::hir::{Diagnostic, DiagnosticCollector, EdgeLabel, ModelGraph, Node, codes};
use crate::syntax::ElementKind;

/// A part definition selected for generation
#[derive(Debug, Clone)]
pub struct Component<'g> {
    pub part: &'g Node,
    /// The state machine the part realizes
    pub machine: &'g Node,
    pub class_name: String,
    /// File stem of the generated module
    pub module_name: String,
}

/// Components in generation order plus discovery diagnostics
#[derive(Debug)]
pub struct Discovery<'g> {
    pub components: Vec<Component<'g>>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Select every eligible component, sorted by class name then qname.
pub fn discover_components(graph: &ModelGraph) -> Result<Discovery<'_>, AssemblyError> {
    let mut collector = DiagnosticCollector::new();
    let mut components = Vec::new();

    for part in graph.nodes_of_kind(ElementKind::Part).filter(|n| n.is_def()) {
        let Some(machine) = exhibited_machine(graph, part, &mut collector)? else {
            if graph.outgoing(part.qname(), EdgeLabel::Performs).next().is_some() {
                collector.add(
                    Diagnostic::info(format!(
                        "'{}' performs behaviors but exhibits no state machine; skipped",
                        part.qname()
                    ))
                    .with_code(codes::NO_STATE_MACHINE)
                    .with_element(part.qname(), part.location().clone()),
                );
            } else {
                trace!(part = part.qname(), "not a component");
            }
            continue;
        };

        if graph.initial_state(machine.qname()).is_none() {
            return Err(AssemblyError::MissingInitialState {
                part: part.qname().to_string(),
                machine: machine.qname().to_string(),
            });
        }

        let class_name = to_class_name(part.name());
        debug!(part = part.qname(), machine = machine.qname(), %class_name, "component");
        components.push(Component {
            part,
            machine,
            module_name: to_snake(&class_name),
            class_name,
        });
    }

    components.sort_by(|a, b| {
        a.class_name
            .cmp(&b.class_name)
            .then_with(|| a.part.qname().cmp(b.part.qname()))
    });
    for pair in components.windows(2) {
        if pair[0].class_name == pair[1].class_name || pair[0].module_name == pair[1].module_name {
            return Err(AssemblyError::DuplicateComponent {
                name: pair[1].class_name.clone(),
                first: pair[0].part.qname().to_string(),
                second: pair[1].part.qname().to_string(),
            });
        }
    }

    Ok(Discovery {
        components,
        diagnostics: collector.finish(),
    })
}

/// The machine a part realizes; a direct exhibit overrides inherited ones.
fn exhibited_machine<'g>(
    graph: &'g ModelGraph,
    part: &'g Node,
    collector: &mut DiagnosticCollector,
) -> Result<Option<&'g Node>, AssemblyError> {
    let direct = direct_machines(graph, part)?;
    let mut inherited: Vec<&Node> = Vec::new();
    for ancestor in graph.supertype_chain(part.qname()) {
        for machine in direct_machines(graph, ancestor)? {
            if !inherited.iter().any(|m| m.qname() == machine.qname()) {
                inherited.push(machine);
            }
        }
    }

    match direct.as_slice() {
        [] => match inherited.as_slice() {
            [] => Ok(None),
            [machine] => Ok(Some(*machine)),
            many => Err(conflict(part, many)),
        },
        [machine] => {
            let overridden: Vec<&str> = inherited
                .iter()
                .filter(|m| m.qname() != machine.qname())
                .map(|m| m.qname())
                .collect();
            if !overridden.is_empty() {
                collector.add(
                    Diagnostic::warning(format!(
                        "'{}' exhibits '{}', overriding inherited {}",
                        part.qname(),
                        machine.qname(),
                        overridden.join(", ")
                    ))
                    .with_code(codes::OVERRIDDEN_EXHIBIT)
                    .with_element(part.qname(), part.location().clone()),
                );
            }
            Ok(Some(*machine))
        }
        many => Err(conflict(part, many)),
    }
}

/// Distinct machines behind the node's own exhibit edges
fn direct_machines<'g>(graph: &'g ModelGraph, node: &Node) -> Result<Vec<&'g Node>, AssemblyError> {
    let mut machines: Vec<&Node> = Vec::new();
    for target in graph.targets(node.qname(), EdgeLabel::Exhibit) {
        let machine = machine_behind(graph, target).ok_or_else(|| AssemblyError::NotAStateMachine {
            part: node.qname().to_string(),
            target: target.qname().to_string(),
        })?;
        if !machines.iter().any(|m| m.qname() == machine.qname()) {
            machines.push(machine);
        }
    }
    Ok(machines)
}

/// An exhibited state usage realizes the nearest typed machine with states.
fn machine_behind<'g>(graph: &'g ModelGraph, target: &'g Node) -> Option<&'g Node> {
    if graph.is_state_machine(target.qname()) {
        return Some(target);
    }
    graph
        .supertype_chain(target.qname())
        .into_iter()
        .find(|n| graph.is_state_machine(n.qname()))
}

fn conflict(part: &Node, machines: &[&Node]) -> AssemblyError {
    AssemblyError::ConflictingExhibits {
        part: part.qname().to_string(),
        machines: machines.iter().map(|m| m.qname().to_string()).collect(),
    }
}
