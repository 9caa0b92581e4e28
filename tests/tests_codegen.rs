//! Codegen Tests - TypeScript target over whole models
//!
//! Component discovery, dispatch derivation, fragment placement and the
//! shared artifacts.

#[path = "helpers/mod.rs"]
mod helpers;

use rstest::rstest;

use helpers::fixtures::{ADAPTER_UNITS, LISTENER, PASSIVE, RECEIVER, WORKER};
use helpers::{artifact, graph_from, graph_from_units, typescript_from};
use modelgen::codegen::{
    GenerationOptions, GeneratorTarget, RegistryError, TargetRegistry, TypeScriptTarget,
    derive_state_machine, discover_components,
};
use modelgen::hir::DiagnosticCollector;

const HEADER: &str = "// Generated from SysML model. Do not edit by hand.\n// Version: undefined\n\n";

fn adapter(options: &GenerationOptions) -> modelgen::codegen::TargetOutput {
    let graph = graph_from_units(ADAPTER_UNITS);
    TypeScriptTarget.generate(&graph, options).unwrap()
}

fn position(haystack: &str, needle: &str) -> usize {
    haystack
        .find(needle)
        .unwrap_or_else(|| panic!("'{needle}' not found in:\n{haystack}"))
}

// ============================================================================
// Dispatch
// ============================================================================

#[test]
fn test_idle_listening_dispatch() {
    let output = typescript_from(LISTENER, &GenerationOptions::default());
    let module = artifact(&output, "src/listener.ts");
    assert!(module.starts_with(HEADER));
    assert!(module.contains(
        "export enum ListenerState {\n  IDLE = 'Idle',\n  LISTENING = 'Listening',\n}\n"
    ));
    assert!(module.contains("export type ListenerSignal =\n  | 'StartSignal';\n"));
    assert!(module.contains("    this._state = ListenerState.IDLE;\n"));
    assert!(module.contains(
        "    switch (this._state) {
      case ListenerState.IDLE:
        switch (signal) {
          case 'StartSignal':
            this._state = ListenerState.LISTENING;
            break;
          default:
            break;
        }
        break;
      case ListenerState.LISTENING:
        break;
      default:
        break;
    }
"
    ));
    assert_eq!(module.matches("this._state = ListenerState.LISTENING").count(), 1);
    assert!(module.contains("  dispatch(signal: ListenerSignal): void {"));
    assert!(!module.contains("_dispatch"));
    assert!(output.diagnostics.is_empty());
}

#[test]
fn test_enum_members_are_sorted_states() {
    let graph = graph_from_units(ADAPTER_UNITS);
    let found = discover_components(&graph).unwrap();
    for component in &found.components {
        let mut collector = DiagnosticCollector::new();
        let machine = derive_state_machine(&graph, component.machine, &mut collector);

        let mut expected: Vec<&str> = graph
            .states(component.machine.qname())
            .iter()
            .map(|n| n.name())
            .collect();
        expected.sort();
        let actual: Vec<&str> = machine.states.iter().map(|s| s.as_str()).collect();
        assert_eq!(actual, expected);

        let initial = graph.initial_state(component.machine.qname()).unwrap();
        assert_eq!(machine.initial, initial.name());
    }
}

#[rstest]
#[case("src/base_receiver.ts", "BaseReceiverState", 3, 5)]
#[case("src/mllp_receiver.ts", "MllpReceiverState", 3, 5)]
#[case("src/http_forwarder.ts", "HttpForwarderState", 2, 2)]
fn test_one_branch_per_state_signal_pair(
    #[case] path: &str,
    #[case] enum_name: &str,
    #[case] states: usize,
    #[case] pairs: usize,
) {
    let output = adapter(&GenerationOptions::default());
    let module = artifact(&output, path);
    let state_branches = module.matches(&format!("      case {enum_name}.")).count();
    let signal_branches = module.matches("          case '").count();
    assert_eq!(state_branches, states);
    assert_eq!(signal_branches, pairs);
}

#[test]
fn test_receiver_dispatch_rows() {
    let output = adapter(&GenerationOptions::default());
    let module = artifact(&output, "src/base_receiver.ts");
    assert!(module.contains(
        "      case BaseReceiverState.CONNECTED:
        switch (signal) {
          case 'Disconnect':
            this._state = BaseReceiverState.DISCONNECTED;
            break;
          case 'MessageReceived':
            this._state = BaseReceiverState.PROCESSING;
            break;
          default:
            break;
        }
        break;
"
    ));
    assert!(module.contains(
        "export type BaseReceiverSignal =\n  | 'AckSent'\n  | 'Connect'\n  | 'Disconnect'\n  | 'MessageReceived';\n"
    ));
}

// ============================================================================
// Fragment placement
// ============================================================================

#[test]
fn test_free_functions_and_methods_keep_perform_order() {
    let output = typescript_from(WORKER, &GenerationOptions::default());
    let module = artifact(&output, "src/worker.ts");

    let preamble = position(module, "import { createHash } from 'crypto';");
    let checksum = position(module, "export function checksum(data: string): number {");
    let describe = position(module, "export function describe(job?: string): string {");
    let skeleton = position(module, "import { EventEmitter } from 'events';");
    let class = position(module, "export class Worker extends EventEmitter {");
    let members = position(module, "  private _job: string | undefined;");
    let dispatch = position(module, "  private _dispatch(signal: WorkerSignal): void {");
    let wrapper = position(module, "  dispatch(signal: WorkerSignal): void {");
    let start = position(module, "  start(job: string): void {");
    let finish = position(module, "  finish(): void {");

    let order = [
        preamble, checksum, describe, skeleton, class, members, dispatch, wrapper, start, finish,
    ];
    assert!(order.windows(2).all(|w| w[0] < w[1]), "{order:?}");

    assert!(!module.contains("export function start"));
    assert!(!module.contains("export function finish"));
    assert!(!module.contains("  checksum("));
    assert!(module.contains(
        "export function checksum(data: string): number {
  let total = 0;
  for (const c of data) {
    total = (total + c.charCodeAt(0)) % 256;
  }
  return total;
}
"
    ));
    assert!(module.contains(
        "  start(job: string): void {\n    this._job = job;\n    this._dispatch('Begin');\n  }\n"
    ));
    assert!(module.contains(
        "  constructor(config: WorkerConfig) {\n    super();\n    this._config = config;\n    this._state = WorkerState.READY;\n  }"
    ));
    assert!(module.contains("export interface WorkerConfig {\n  retries: number;\n  verbose: boolean;\n}"));
    assert!(module.ends_with("  finish(): void {\n    this._dispatch('Finish');\n  }\n}\n"));
}

#[test]
fn test_type_preamble_precedes_functions() {
    let output = adapter(&GenerationOptions::default());
    let module = artifact(&output, "src/mllp_receiver.ts");
    let expected = format!(
        "{HEADER}export type AckCode = 'AA' | 'AE' | 'AR';

export interface Segment {{
  id: string;
  fields: string[];
}}

export interface Message {{
  header: Segment;
  body: Segment[];
}}

export function parseMessage(raw: string): Message {{
"
    );
    assert!(module.starts_with(&expected), "{module}");
    assert!(module.contains("  acknowledge(message: Message): AckCode {\n    this._dispatch('AckSent');"));
    assert!(module.contains("  private readonly _config: MllpReceiverConfig;"));
}

// ============================================================================
// Shared artifacts
// ============================================================================

#[test]
fn test_adapter_artifacts() {
    let output = adapter(&GenerationOptions::default().with_version("v2.1.0"));
    let paths: Vec<String> = output
        .artifacts
        .iter()
        .map(|a| a.path.to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        paths,
        vec![
            "src/base_receiver.ts",
            "src/http_forwarder.ts",
            "src/mllp_receiver.ts",
            "src/index.ts",
            "config.json",
        ]
    );
    assert_eq!(
        artifact(&output, "src/index.ts"),
        "// Generated from SysML model. Do not edit by hand.
// Version: v2.1.0

export { BaseReceiver } from './base_receiver';
export { HttpForwarder } from './http_forwarder';
export { MllpReceiver } from './mllp_receiver';
"
    );
    assert_eq!(
        artifact(&output, "config.json"),
        r#"{
  "httpForwarder": {
    "endpoint": "",
    "timeoutSeconds": 2.5
  },
  "mllpReceiver": {
    "host": "0.0.0.0",
    "listenPort": 2575
  }
}
"#
    );
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
}

#[test]
fn test_every_attribute_reaches_config() {
    let output = typescript_from(RECEIVER, &GenerationOptions::default());
    let module = artifact(&output, "src/receiver.ts");
    assert!(module.contains(
        "export interface ReceiverConfig {
  host: string;
  port: number;
  state: string;
  'listen port': number;
}
"
    ));
    assert_eq!(
        artifact(&output, "config.json"),
        r#"{
  "receiver": {
    "host": "localhost",
    "port": 2575,
    "state": "",
    "listen port": 1000.0
  }
}
"#
    );
    assert!(output.diagnostics.is_empty(), "{:?}", output.diagnostics);
}

#[test]
fn test_passive_part_generates_nothing() {
    let output = typescript_from(PASSIVE, &GenerationOptions::default());
    assert!(output.artifacts.is_empty());
    assert!(output.diagnostics.is_empty());
}

#[test]
fn test_regeneration_is_byte_identical() {
    let first = adapter(&GenerationOptions::default());
    let second = adapter(&GenerationOptions::default());
    let sequential = adapter(&GenerationOptions::default().with_parallel(false));
    assert_eq!(first, second);
    assert_eq!(first, sequential);
}

#[test]
fn test_language_tag_selects_fragments() {
    let options = GenerationOptions {
        language: "Python".to_string(),
        ..GenerationOptions::default()
    };
    let output = typescript_from(WORKER, &options);
    let module = artifact(&output, "src/worker.ts");
    assert!(!module.contains("createHash"));
    assert!(!module.contains("checksum"));
    // every performed behavior lacks a Python fragment
    assert_eq!(output.diagnostics.len(), 4);
    assert!(output.diagnostics.iter().all(|d| d.is_error()));
}

// ============================================================================
// Registry
// ============================================================================

#[test]
fn test_registry_resolves_builtin_target() {
    let registry = TargetRegistry::with_builtin_targets();
    let graph = graph_from(LISTENER);
    let target = registry.get("TypeScript").unwrap();
    let output = target.generate(&graph, &GenerationOptions::default()).unwrap();
    assert_eq!(output.artifacts.len(), 3);
    assert!(matches!(
        registry.get("latex"),
        Err(RegistryError::Unknown { name, .. }) if name == "latex"
    ));
}
