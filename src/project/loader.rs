//! Model directory loading.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::base::constants::SYSML_EXT;
use crate::parser::{ParseError, parse_unit};
use crate::syntax::ModelIndex;

/// One model source unit held in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub path: PathBuf,
    pub text: String,
}

impl SourceUnit {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }
}

/// Failure to load a model directory
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("model directory not found: {0}")]
    NotADirectory(PathBuf),
    #[error("no .{SYSML_EXT} files found in {0}")]
    NoModelFiles(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot scan {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Collect every model source file under `dir`, sorted by path.
pub fn collect_model_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    if !dir.is_dir() {
        return Err(LoadError::NotADirectory(dir.to_path_buf()));
    }
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(|source| LoadError::Walk {
            path: source.path().unwrap_or(dir).to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|x| x == SYSML_EXT)
        {
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    debug!(dir = %dir.display(), files = paths.len(), "collected model files");
    Ok(paths)
}

/// Read and parse every model source file under `dir` into one index.
pub fn load_model_directory(dir: &Path) -> Result<ModelIndex, LoadError> {
    let paths = collect_model_files(dir)?;
    if paths.is_empty() {
        return Err(LoadError::NoModelFiles(dir.to_path_buf()));
    }
    let units = paths
        .into_iter()
        .map(|path| {
            fs::read_to_string(&path)
                .map(|text| SourceUnit { path: path.clone(), text })
                .map_err(|source| LoadError::Io { path, source })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(parse_sources(&units)?)
}

/// Parse in-memory source units, in the order given, into one index.
pub fn parse_sources(units: &[SourceUnit]) -> Result<ModelIndex, ParseError> {
    let mut elements = Vec::new();
    for unit in units {
        elements.extend(parse_unit(&unit.path, &unit.text)?);
    }
    let files = units.iter().map(|u| u.path.clone()).collect();
    let index = ModelIndex::new(files, elements)?;
    info!(
        units = units.len(),
        elements = index.len(),
        "built model index"
    );
    Ok(index)
}
