//! Engine Tests - model directory → output directory
//!
//! End-to-end runs over files on disk, including the failure paths that
//! must leave the output directory untouched.

#[path = "helpers/mod.rs"]
mod helpers;

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use helpers::fixtures::{ADAPTER_UNITS, LISTENER};
use helpers::init_tracing;
use modelgen::engine::{GenerationRequest, run_generation};
use modelgen::parser::ErrorCode;
use modelgen::project::LoadError;
use modelgen::GenerationError;

fn model_dir(units: &[(&str, &str)]) -> TempDir {
    init_tracing();
    let dir = TempDir::new().unwrap();
    for (path, text) in units {
        fs::write(dir.path().join(path), text).unwrap();
    }
    dir
}

/// Every file below `dir`, relative and sorted, with its contents.
fn snapshot(dir: &Path) -> Vec<(PathBuf, String)> {
    let mut files: Vec<(PathBuf, String)> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let relative = e.path().strip_prefix(dir).unwrap().to_path_buf();
            (relative, fs::read_to_string(e.path()).unwrap())
        })
        .collect();
    files.sort();
    files
}

#[test]
fn test_generates_adapter_project() {
    let models = model_dir(ADAPTER_UNITS);
    let out = TempDir::new().unwrap();
    let report = run_generation(&GenerationRequest::new(models.path(), out.path())).unwrap();

    assert_eq!(report.written.len(), 5);
    assert!(report.written.iter().all(|p| p.starts_with(out.path())));
    assert!(!report.has_errors());

    let files: Vec<PathBuf> = snapshot(out.path()).into_iter().map(|(p, _)| p).collect();
    assert_eq!(
        files,
        vec![
            PathBuf::from("config.json"),
            PathBuf::from("src/base_receiver.ts"),
            PathBuf::from("src/http_forwarder.ts"),
            PathBuf::from("src/index.ts"),
            PathBuf::from("src/mllp_receiver.ts"),
        ]
    );
    let receiver = fs::read_to_string(out.path().join("src/mllp_receiver.ts")).unwrap();
    assert!(receiver.contains("export class MllpReceiver extends EventEmitter {"));
}

#[test]
fn test_rerun_is_byte_identical() {
    let models = model_dir(ADAPTER_UNITS);
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    run_generation(&GenerationRequest::new(models.path(), first.path())).unwrap();
    run_generation(&GenerationRequest::new(models.path(), second.path())).unwrap();
    assert_eq!(snapshot(first.path()), snapshot(second.path()));
}

#[test]
fn test_nested_model_files_are_found() {
    let models = model_dir(&[]);
    fs::create_dir_all(models.path().join("nested/deeper")).unwrap();
    fs::write(models.path().join("nested/deeper/listener.sysml"), LISTENER).unwrap();
    fs::write(models.path().join("notes.txt"), "not a model").unwrap();

    let out = TempDir::new().unwrap();
    let report = run_generation(&GenerationRequest::new(models.path(), out.path())).unwrap();
    assert_eq!(report.written.len(), 3);
    assert!(out.path().join("src/listener.ts").is_file());
}

#[test]
fn test_options_file_sets_version() {
    let models = model_dir(&[("listener.sysml", LISTENER)]);
    let options = models.path().join("options.json");
    fs::write(&options, r#"{ "version": "v3.0.1", "parallel": false }"#).unwrap();

    let out = TempDir::new().unwrap();
    let request = GenerationRequest::new(models.path(), out.path())
        .with_options_file(&options)
        .unwrap();
    assert!(!request.options.parallel);
    run_generation(&request).unwrap();

    let index = fs::read_to_string(out.path().join("src/index.ts")).unwrap();
    assert!(index.starts_with("// Generated from SysML model. Do not edit by hand.\n// Version: v3.0.1\n"));
}

#[test]
fn test_bad_options_file() {
    let models = model_dir(&[("listener.sysml", LISTENER)]);
    let options = models.path().join("options.json");
    fs::write(&options, "{ \"parallel\": \"sometimes\" }").unwrap();
    let result = GenerationRequest::new(models.path(), "out").with_options_file(&options);
    assert!(matches!(result, Err(GenerationError::Config(_))));
}

// ============================================================================
// Failures leave no output
// ============================================================================

#[test]
fn test_gate_failure_writes_nothing() {
    let mut units = ADAPTER_UNITS.to_vec();
    units.push(("views.sysml", "package Views { view def Overview; }"));
    let models = model_dir(&units);
    let out = TempDir::new().unwrap();

    let err = run_generation(&GenerationRequest::new(models.path(), out.path())).unwrap_err();
    match &err {
        GenerationError::Validation(report) => {
            assert!(report.errors().any(|d| d.message.contains("Overview")));
        }
        other => panic!("expected a validation failure, got {other:?}"),
    }
    assert!(err.to_string().starts_with("validation failed"));
    assert!(snapshot(out.path()).is_empty());
}

#[test]
fn test_unresolved_reference_is_a_build_error() {
    let models = model_dir(&[(
        "broken.sysml",
        "package P { part def Car :> Vehicle; }",
    )]);
    let out = TempDir::new().unwrap();
    let err = run_generation(&GenerationRequest::new(models.path(), out.path())).unwrap_err();
    assert!(matches!(err, GenerationError::Build(_)), "{err:?}");
    assert!(err.to_string().contains("Vehicle"));
    assert!(snapshot(out.path()).is_empty());
}

#[test]
fn test_parse_error_names_the_file() {
    let models = model_dir(&[
        ("a.sysml", LISTENER),
        ("b.sysml", "package Broken {\n  part def A\n}\n"),
    ]);
    let out = TempDir::new().unwrap();
    let err = run_generation(&GenerationRequest::new(models.path(), out.path())).unwrap_err();
    let GenerationError::Load(LoadError::Parse(parse)) = &err else {
        panic!("expected a parse failure, got {err:?}");
    };
    assert_eq!(parse.code, ErrorCode::E0307);
    assert!(parse.file().ends_with("b.sysml"));
    assert!(snapshot(out.path()).is_empty());
}

#[cfg(unix)]
#[test]
fn test_unreadable_entry_aborts_the_run() {
    let models = model_dir(&[("listener.sysml", LISTENER)]);
    std::os::unix::fs::symlink(models.path().join("missing"), models.path().join("shared"))
        .unwrap();
    let out = TempDir::new().unwrap();
    let err = run_generation(&GenerationRequest::new(models.path(), out.path())).unwrap_err();
    assert!(matches!(err, GenerationError::Load(LoadError::Walk { .. })), "{err:?}");
    assert!(snapshot(out.path()).is_empty());
}

#[test]
fn test_empty_model_directory() {
    let models = model_dir(&[]);
    let out = TempDir::new().unwrap();
    let err = run_generation(&GenerationRequest::new(models.path(), out.path())).unwrap_err();
    assert!(matches!(err, GenerationError::Load(LoadError::NoModelFiles(_))));
}

#[test]
fn test_unknown_target_fails_before_loading() {
    let out = TempDir::new().unwrap();
    let request = GenerationRequest::new("/definitely/not/here", out.path()).with_target("cobol");
    let err = run_generation(&request).unwrap_err();
    assert!(matches!(err, GenerationError::UnknownTarget(_)));
    assert_eq!(err.to_string(), "unknown target 'cobol' (supported: typescript)");
}
