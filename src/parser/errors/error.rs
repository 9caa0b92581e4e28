//! Parse error type
//!
//! Every parse error identifies the source unit, the 1-based line and
//! column, and a categorized [`ErrorCode`].

use std::path::PathBuf;

use thiserror::Error;

use super::codes::ErrorCode;
use crate::base::SourceLocation;

/// A fatal parse error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{location}: {code}: {message}")]
pub struct ParseError {
    /// Source unit and position of the offending token
    pub location: SourceLocation,
    /// Categorized error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional suggestion for fixing the error
    pub hint: Option<String>,
}

impl ParseError {
    pub fn new(location: SourceLocation, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            location,
            code,
            message: message.into(),
            hint: None,
        }
    }

    /// Create an error with the code's default message
    pub fn from_code(location: SourceLocation, code: ErrorCode) -> Self {
        Self::new(location, code, code.default_message())
    }

    /// Add a hint to this error
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn file(&self) -> &PathBuf {
        &self.location.file
    }

    /// 1-based line of the error
    pub fn line(&self) -> usize {
        self.location.line()
    }

    /// Format the error with its hint, if any
    pub fn format(&self) -> String {
        let mut result = self.to_string();
        if let Some(hint) = &self.hint {
            result.push_str(&format!("\n  hint: {}", hint));
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Span;

    fn location() -> SourceLocation {
        SourceLocation::new("model/a.sysml", Span::from_coords(4, 2, 4, 6))
    }

    #[test]
    fn test_display_includes_file_line_and_code() {
        let err = ParseError::from_code(location(), ErrorCode::E0103);
        assert_eq!(
            err.to_string(),
            "model/a.sysml:5:3: E0103: unterminated block comment"
        );
        assert_eq!(err.line(), 5);
    }

    #[test]
    fn test_format_with_hint() {
        let err = ParseError::new(location(), ErrorCode::E0201, "expected ';'")
            .with_hint("terminate the declaration with ';'");
        assert!(err.format().contains("hint: terminate"));
    }
}
