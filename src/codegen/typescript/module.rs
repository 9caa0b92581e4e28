//! Component module assembly.
//!
//! A module is built in fixed stages; moving a stage changes what the
//! fragments can see, so the order below is part of the output contract:
//!
//! ```text
//! 1. textualRepresentation       module preamble
//! 2. referenced part types       dependency order
//! 3. performed, no `self`        free functions
//! 4. skeleton                    enum, signal union, config shape
//! 5. class fields + classMembers
//! 6. constructor, state getter
//! 7. dispatch                    private + wrapper when methods exist
//! 8. performed, with `self`      methods
//! 9. other part fragments        extra members
//! ```

use tracing::{debug, warn};

use crate::base::constants::{
    CLASS_MEMBERS_FRAGMENT, FUNCTION_BODY_FRAGMENT, PREAMBLE_FRAGMENT, RESERVED_PART_FRAGMENTS,
    SELF_PARAM,
};
use crate::codegen::components::Component;
use crate::codegen::naming::{
    UnknownType, find_collision, map_type, property_name, sanitize_identifier, to_screaming_snake,
};
use crate::codegen::state_machine::{StateMachineModel, derive_state_machine};
use crate::codegen::text::{dedent, indent, quoted};
use crate::codegen::types::resolve_type_preamble;
use crate::hir::{Diagnostic, DiagnosticCollector, EdgeLabel, ModelGraph, Node, codes};
use crate::syntax::{ActionData, Cardinality, Direction, Fragment, Parameter};

/// A behavior performed by the component, in perform-declaration order
struct Behavior<'g> {
    usage: &'g str,
    node: &'g Node,
    action: &'g ActionData,
}

impl Behavior<'_> {
    fn is_method(&self) -> bool {
        self.action.has_self_param()
    }
}

/// Where a behavior lands in the module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    FreeFunction,
    Method,
}

/// Assemble the module text of one component, without the header.
///
/// Returns `None` when the component cannot be generated; the reason is
/// recorded in `collector`.
pub fn assemble_component(
    graph: &ModelGraph,
    component: &Component<'_>,
    language: &str,
    collector: &mut DiagnosticCollector,
) -> Option<String> {
    let part = component.part;
    let machine = derive_state_machine(graph, component.machine, collector);

    let state_names: Vec<&str> = machine.states.iter().map(|s| s.as_str()).collect();
    if let Some((first, second, member)) = find_collision(&state_names, to_screaming_snake) {
        warn!(part = part.qname(), member = %member, "enum member collision");
        collector.add(
            Diagnostic::error(format!(
                "states '{first}' and '{second}' of '{}' both map to enum member '{member}'; component skipped",
                machine.machine
            ))
            .with_code(codes::NAME_COLLISION)
            .with_element(part.qname(), part.location().clone()),
        );
        return None;
    }

    let behaviors = performed_behaviors(graph, part);
    let extra_members: Vec<&Fragment> = part
        .data()
        .fragments()
        .iter()
        .filter(|f| f.is_language(language) && !RESERVED_PART_FRAGMENTS.contains(&f.name.as_str()))
        .collect();
    let has_methods = behaviors.iter().any(Behavior::is_method) || !extra_members.is_empty();

    let class = component.class_name.as_str();
    let enum_name = format!("{class}State");
    let mut lines: Vec<String> = Vec::new();

    // 1. preamble
    let preamble = part
        .element
        .fragment(PREAMBLE_FRAGMENT, language)
        .map(|f| dedent(&f.body))
        .filter(|p| !p.is_empty());
    if let Some(preamble) = &preamble {
        lines.push(preamble.clone());
        lines.push(String::new());
    }

    // 2. referenced part types
    let behavior_nodes: Vec<&Node> = behaviors.iter().map(|b| b.node).collect();
    for decl in resolve_type_preamble(graph, part, &behavior_nodes, language, preamble.as_deref()) {
        lines.push(decl);
        lines.push(String::new());
    }

    // 3. free functions
    for behavior in behaviors.iter().filter(|b| !b.is_method()) {
        if let Some(code) = render_behavior(behavior, Placement::FreeFunction, language, part, collector) {
            lines.push(code);
            lines.push(String::new());
        }
    }

    // 4. skeleton
    lines.push("import { EventEmitter } from 'events';".to_string());
    lines.push(String::new());

    lines.push(format!("export enum {enum_name} {{"));
    for state in &machine.states {
        lines.push(format!("  {} = {},", to_screaming_snake(state), quoted(state)));
    }
    lines.push("}".to_string());
    lines.push(String::new());

    if !machine.signals.is_empty() {
        lines.push(format!("export type {class}Signal ="));
        let last = machine.signals.len() - 1;
        for (i, signal) in machine.signals.iter().enumerate() {
            let end = if i == last { ";" } else { "" };
            lines.push(format!("  | {}{end}", quoted(signal)));
        }
        lines.push(String::new());
    }

    let config = part.data().attributes();
    if !config.is_empty() {
        lines.push(format!("export interface {class}Config {{"));
        for attr in config {
            lines.push(format!(
                "  {}: {};",
                property_name(&attr.name),
                map_type(attr.ty.as_deref(), UnknownType::AsString)
            ));
        }
        lines.push("}".to_string());
        lines.push(String::new());
    }

    // 5. class fields
    lines.push(format!("export class {class} extends EventEmitter {{"));
    lines.push(format!("  private _state: {enum_name};"));
    if !config.is_empty() {
        lines.push(format!("  private readonly _config: {class}Config;"));
    }
    if let Some(members) = part.element.fragment(CLASS_MEMBERS_FRAGMENT, language) {
        let members = dedent(&members.body);
        if !members.is_empty() {
            lines.push(indent(&members, 2));
        }
    }
    lines.push(String::new());

    // 6. constructor and accessor
    if config.is_empty() {
        lines.push("  constructor() {".to_string());
    } else {
        lines.push(format!("  constructor(config: {class}Config) {{"));
    }
    lines.push("    super();".to_string());
    if !config.is_empty() {
        lines.push("    this._config = config;".to_string());
    }
    lines.push(format!(
        "    this._state = {enum_name}.{};",
        to_screaming_snake(&machine.initial)
    ));
    lines.push("  }".to_string());
    lines.push(String::new());
    lines.push(format!("  get state(): {enum_name} {{"));
    lines.push("    return this._state;".to_string());
    lines.push("  }".to_string());
    lines.push(String::new());

    // 7. dispatch
    emit_dispatch(&mut lines, class, &enum_name, &machine, has_methods);

    // 8. methods
    for behavior in behaviors.iter().filter(|b| b.is_method()) {
        if let Some(code) = render_behavior(behavior, Placement::Method, language, part, collector) {
            lines.push(String::new());
            lines.push(code);
        }
    }

    // 9. extra members
    for fragment in extra_members {
        let code = dedent(&fragment.body);
        if !code.is_empty() {
            lines.push(String::new());
            lines.push(indent(&code, 2));
        }
    }

    lines.push("}".to_string());
    lines.push(String::new());

    debug!(
        part = part.qname(),
        states = machine.states.len(),
        transitions = machine.transitions.len(),
        behaviors = behaviors.len(),
        "assembled component"
    );
    Some(lines.join("\n"))
}

fn performed_behaviors<'g>(graph: &'g ModelGraph, part: &Node) -> Vec<Behavior<'g>> {
    graph
        .outgoing(part.qname(), EdgeLabel::Performs)
        .filter_map(|edge| {
            let node = graph.node(&edge.target)?;
            let action = node.data().as_action()?;
            Some(Behavior {
                usage: edge.usage().unwrap_or_else(|| node.name()),
                node,
                action,
            })
        })
        .collect()
}

// ============================================================================
// DISPATCH
// ============================================================================

fn emit_dispatch(
    lines: &mut Vec<String>,
    class: &str,
    enum_name: &str,
    machine: &StateMachineModel,
    private: bool,
) {
    let signal_type = if machine.signals.is_empty() {
        "string".to_string()
    } else {
        format!("{class}Signal")
    };
    let head = if private { "private _dispatch" } else { "dispatch" };

    lines.push(format!("  {head}(signal: {signal_type}): void {{"));
    lines.push("    const prev = this._state;".to_string());
    lines.push("    switch (this._state) {".to_string());
    for row in machine.dispatch_table() {
        lines.push(format!("      case {enum_name}.{}:", to_screaming_snake(row.state)));
        if !row.arms.is_empty() {
            lines.push("        switch (signal) {".to_string());
            for (signal, target) in &row.arms {
                lines.push(format!("          case {}:", quoted(signal)));
                lines.push(format!(
                    "            this._state = {enum_name}.{};",
                    to_screaming_snake(target)
                ));
                lines.push("            break;".to_string());
            }
            lines.push("          default:".to_string());
            lines.push("            break;".to_string());
            lines.push("        }".to_string());
        }
        lines.push("        break;".to_string());
    }
    lines.push("      default:".to_string());
    lines.push("        break;".to_string());
    lines.push("    }".to_string());
    lines.push("    if (this._state !== prev) {".to_string());
    lines.push("      this.emit('transition', { from: prev, to: this._state, signal });".to_string());
    lines.push("    }".to_string());
    lines.push("  }".to_string());

    if private {
        lines.push(String::new());
        lines.push(format!("  dispatch(signal: {signal_type}): void {{"));
        lines.push("    this._dispatch(signal);".to_string());
        lines.push("  }".to_string());
    }
}

// ============================================================================
// BEHAVIORS
// ============================================================================

/// Render one behavior, or record why it was skipped.
///
/// A `functionBody` fragment is wrapped in the derived signature; otherwise
/// the first other fragment in the language is taken as a full definition.
fn render_behavior(
    behavior: &Behavior<'_>,
    placement: Placement,
    language: &str,
    part: &Node,
    collector: &mut DiagnosticCollector,
) -> Option<String> {
    let fragments = behavior.node.data().fragments();
    let body = fragments
        .iter()
        .find(|f| f.name == FUNCTION_BODY_FRAGMENT && f.is_language(language));

    let code = if let Some(body) = body {
        let name = sanitize_identifier(behavior.usage);
        let signature = signature(&behavior.action.params);
        let body = indent(&dedent(&body.body), 2);
        match placement {
            Placement::FreeFunction => format!("export function {name}{signature} {{\n{body}\n}}"),
            Placement::Method => format!("{name}{signature} {{\n{body}\n}}"),
        }
    } else if let Some(full) = fragments
        .iter()
        .find(|f| f.name != FUNCTION_BODY_FRAGMENT && f.is_language(language))
    {
        dedent(&full.body)
    } else {
        warn!(behavior = behavior.node.qname(), part = part.qname(), "no fragment; skipped");
        collector.add(
            Diagnostic::error(format!(
                "behavior '{}' performed by '{}' has no {language} fragment; skipped",
                behavior.node.qname(),
                part.qname()
            ))
            .with_code(codes::MISSING_FRAGMENT)
            .with_element(behavior.node.qname(), behavior.node.location().clone()),
        );
        return None;
    };

    Some(match placement {
        Placement::FreeFunction => code,
        Placement::Method => indent(&code, 2),
    })
}

/// `(a: T, b?: U): R` from the parameter list, excluding `self`.
fn signature(params: &[Parameter]) -> String {
    let inputs: Vec<String> = params
        .iter()
        .filter(|p| p.name != SELF_PARAM && matches!(p.direction, Direction::In | Direction::InOut))
        .map(|p| {
            let ty = map_type(p.ty.as_deref(), UnknownType::PassThrough);
            let name = sanitize_identifier(&p.name);
            match p.cardinality {
                Cardinality::One => format!("{name}: {ty}"),
                Cardinality::Optional => format!("{name}?: {ty}"),
                Cardinality::Many => format!("{name}: {ty}[]"),
            }
        })
        .collect();
    let outputs: Vec<&Parameter> = params
        .iter()
        .filter(|p| p.direction == Direction::Out)
        .collect();
    let ret = match outputs.as_slice() {
        [out] => {
            let ty = map_type(out.ty.as_deref(), UnknownType::PassThrough);
            match out.cardinality {
                Cardinality::One => ty,
                Cardinality::Optional => format!("{ty} | undefined"),
                Cardinality::Many => format!("{ty}[]"),
            }
        }
        _ => "void".to_string(),
    };
    format!("({}): {ret}", inputs.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::discover_components;
    use crate::hir::{Severity, build_model_graph};
    use crate::project::{SourceUnit, parse_sources};
    use smol_str::SmolStr;

    fn assemble(text: &str) -> (Option<String>, Vec<Diagnostic>) {
        let index = parse_sources(&[SourceUnit::new("m.sysml", text)]).unwrap();
        let graph = build_model_graph(&index).unwrap();
        let found = discover_components(&graph).unwrap();
        let mut collector = DiagnosticCollector::new();
        let module = assemble_component(&graph, &found.components[0], "TypeScript", &mut collector);
        (module, collector.finish())
    }

    fn param(direction: Direction, name: &str, ty: &str, cardinality: Cardinality) -> Parameter {
        Parameter {
            direction,
            name: SmolStr::new(name),
            ty: Some(ty.to_string()),
            cardinality,
        }
    }

    #[test]
    fn test_signature() {
        let params = vec![
            param(Direction::In, "self", "Receiver", Cardinality::One),
            param(Direction::In, "raw", "String", Cardinality::One),
            param(Direction::In, "retries", "Integer", Cardinality::Optional),
            param(Direction::Out, "frames", "Frame", Cardinality::Many),
        ];
        assert_eq!(signature(&params), "(raw: string, retries?: number): Frame[]");

        let params = vec![param(Direction::Out, "ack", "Ack", Cardinality::Optional)];
        assert_eq!(signature(&params), "(): Ack | undefined");

        let params = vec![
            param(Direction::Out, "a", "String", Cardinality::One),
            param(Direction::Out, "b", "String", Cardinality::One),
        ];
        assert_eq!(signature(&params), "(): void");
    }

    #[test]
    fn test_idle_listening_module() {
        let (module, diags) = assemble(
            "package P {
                attribute def StartSignal;
                state def Listener {
                    entry; then Idle;
                    state Idle;
                    state Listening;
                    accept StartSignal then Listening;
                }
                part def Receiver {
                    attribute listenPort : Integer = 2575;
                    exhibit state listener : Listener;
                }
            }",
        );
        assert!(diags.is_empty());
        let expected = "\
import { EventEmitter } from 'events';

export enum ReceiverState {
  IDLE = 'Idle',
  LISTENING = 'Listening',
}

export type ReceiverSignal =
  | 'StartSignal';

export interface ReceiverConfig {
  listenPort: number;
}

export class Receiver extends EventEmitter {
  private _state: ReceiverState;
  private readonly _config: ReceiverConfig;

  constructor(config: ReceiverConfig) {
    super();
    this._config = config;
    this._state = ReceiverState.IDLE;
  }

  get state(): ReceiverState {
    return this._state;
  }

  dispatch(signal: ReceiverSignal): void {
    const prev = this._state;
    switch (this._state) {
      case ReceiverState.IDLE:
        switch (signal) {
          case 'StartSignal':
            this._state = ReceiverState.LISTENING;
            break;
          default:
            break;
        }
        break;
      case ReceiverState.LISTENING:
        break;
      default:
        break;
    }
    if (this._state !== prev) {
      this.emit('transition', { from: prev, to: this._state, signal });
    }
  }
}
";
        assert_eq!(module.as_deref(), Some(expected));
    }

    #[test]
    fn test_free_functions_and_methods() {
        let (module, diags) = assemble(
            "package P {
                state def M { entry; then A; state A; }
                action def Parse {
                    in raw : String;
                    out msg : String;
                    rep functionBody language \"TypeScript\" /*
                        return raw.trim();
                    */
                }
                action def Stop {
                    in self : Worker;
                    rep stopMethod language \"TypeScript\" /*
                        stop(): void {
                          this._dispatch('Stop');
                        }
                    */
                }
                part def Worker {
                    perform action stop : Stop;
                    perform action parse : Parse;
                    exhibit state m : M;
                    rep classMembers language \"TypeScript\" /* private busy = false; */
                }
            }",
        );
        assert!(diags.is_empty());
        let module = module.unwrap();
        assert!(module.starts_with(
            "export function parse(raw: string): string {\n  return raw.trim();\n}\n\nimport"
        ));
        assert!(module.contains("  private _state: WorkerState;\n  private busy = false;\n\n"));
        assert!(module.contains("  private _dispatch(signal: string): void {"));
        assert!(module.contains("  dispatch(signal: string): void {\n    this._dispatch(signal);\n  }"));
        assert!(module.ends_with(
            "\n\n  stop(): void {\n    this._dispatch('Stop');\n  }\n}\n"
        ));
        assert_eq!(module.matches("parse(").count(), 1);
    }

    #[test]
    fn test_behavior_without_fragment_is_skipped() {
        let (module, diags) = assemble(
            "package P {
                state def M { entry; then A; state A; }
                action def Silent { in x : String; }
                part def Worker {
                    perform action silent : Silent;
                    exhibit state m : M;
                }
            }",
        );
        let module = module.unwrap();
        assert!(!module.contains("silent"));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Error);
        assert_eq!(diags[0].code, Some(codes::MISSING_FRAGMENT));
    }

    #[test]
    fn test_enum_collision_skips_component() {
        let (module, diags) = assemble(
            "package P {
                state def M { entry; then WaitingAck; state WaitingAck; state Waiting_Ack; }
                part def Worker { exhibit state m : M; }
            }",
        );
        assert!(module.is_none());
        assert_eq!(diags[0].code, Some(codes::NAME_COLLISION));
    }
}
