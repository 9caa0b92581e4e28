//! Name-keyed collection of generator targets.

use indexmap::IndexMap;
use thiserror::Error;

use super::target::GeneratorTarget;
use super::typescript::TypeScriptTarget;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("target name must not be empty")]
    EmptyName,
    #[error("target '{0}' is already registered")]
    Duplicate(String),
    #[error("unknown target '{name}' (supported: {})", supported_list(.supported))]
    Unknown { name: String, supported: Vec<String> },
}

fn supported_list(names: &[String]) -> String {
    if names.is_empty() {
        "<none>".to_string()
    } else {
        names.join(", ")
    }
}

/// Targets keyed by their lowercased name
#[derive(Default)]
pub struct TargetRegistry {
    targets: IndexMap<String, Box<dyn GeneratorTarget>>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every target shipped with the crate.
    pub fn with_builtin_targets() -> Self {
        let mut registry = Self::new();
        // Built-in names are distinct, so registration cannot fail.
        let _ = registry.register(Box::new(TypeScriptTarget));
        registry
    }

    pub fn register(&mut self, target: Box<dyn GeneratorTarget>) -> Result<(), RegistryError> {
        let key = target.name().trim().to_lowercase();
        if key.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.targets.contains_key(&key) {
            return Err(RegistryError::Duplicate(key));
        }
        self.targets.insert(key, target);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&dyn GeneratorTarget, RegistryError> {
        let key = name.trim().to_lowercase();
        self.targets
            .get(&key)
            .map(|t| t.as_ref())
            .ok_or_else(|| RegistryError::Unknown {
                name: name.to_string(),
                supported: self.names(),
            })
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.targets.keys().cloned().collect();
        names.sort();
        names
    }
}
