//! Diagnostics: non-fatal findings about a model.
//!
//! Diagnostics are produced by the validation gate and by code assembly.
//! Fatal problems use the error types of each layer instead.

use std::fmt;

use crate::base::SourceLocation;

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A diagnostic message about one element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity level.
    pub severity: Severity,
    /// Diagnostic code (e.g., "E0004").
    pub code: Option<&'static str>,
    /// Qualified name of the offending element.
    pub qname: Option<String>,
    /// Where the offending element is declared.
    pub location: Option<SourceLocation>,
    /// The diagnostic message.
    pub message: String,
    /// Related locations (e.g., the other declarations of a duplicate).
    pub related: Vec<RelatedInfo>,
}

/// Related information for a diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelatedInfo {
    pub location: SourceLocation,
    pub message: String,
}

impl Diagnostic {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            qname: None,
            location: None,
            message: message.into(),
            related: Vec::new(),
        }
    }

    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Create a new informational diagnostic.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    /// Set the error code.
    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    /// Attach the offending element.
    pub fn with_element(mut self, qname: impl Into<String>, location: SourceLocation) -> Self {
        self.qname = Some(qname.into());
        self.location = Some(location);
        self
    }

    /// Add related information.
    pub fn with_related(mut self, location: SourceLocation, message: impl Into<String>) -> Self {
        self.related.push(RelatedInfo {
            location,
            message: message.into(),
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(location) = &self.location {
            write!(f, "{location}: ")?;
        }
        write!(f, "{}", self.severity)?;
        if let Some(code) = self.code {
            write!(f, "[{code}]")?;
        }
        write!(f, ": {}", self.message)
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Standard diagnostic codes.
///
/// ## Code Ranges
///
/// - **E0001-E0019**: Model validation errors
/// - **E0020-E0039**: Code assembly errors
/// - **W0001-W0099**: Warnings
/// - **I0001-I0099**: Informational notes
pub mod codes {
    // ========================================================================
    // VALIDATION ERRORS (E0001-E0019)
    // ========================================================================

    /// Stable identifier declared more than once.
    pub const DUPLICATE_STABLE_ID: &str = "E0004";
    /// Missing required documentation.
    pub const MISSING_DOCUMENTATION: &str = "E0005";

    // ========================================================================
    // ASSEMBLY ERRORS (E0020-E0039)
    // ========================================================================

    /// Performed behavior has neither a body-only nor a full fragment.
    pub const MISSING_FRAGMENT: &str = "E0020";
    /// Two generated identifiers collide after casing.
    pub const NAME_COLLISION: &str = "E0021";

    // ========================================================================
    // WARNINGS (W0001-W0099)
    // ========================================================================

    /// Requirement without documentation.
    pub const UNDOCUMENTED_REQUIREMENT: &str = "W0004";
    /// Same state and signal lead to different targets.
    pub const CONFLICTING_TRANSITION: &str = "W0005";
    /// Directly exhibited machine differs from an inherited one.
    pub const OVERRIDDEN_EXHIBIT: &str = "W0006";

    // ========================================================================
    // NOTES (I0001-I0099)
    // ========================================================================

    /// Part performs behaviors but exhibits no state machine.
    pub const NO_STATE_MACHINE: &str = "I0001";
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics during validation and assembly.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Add several diagnostics.
    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.diagnostics.extend(diagnostics);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Get all collected diagnostics.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Consume the collector.
    pub fn finish(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
