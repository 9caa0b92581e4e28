//! Error code definitions for parser diagnostics
//!
//! Error codes follow a naming convention: E{category}{number}
//! - E01xx: Lexical errors (invalid tokens, unterminated fragments)
//! - E02xx: Structural errors (braces, semicolons)
//! - E03xx: Declaration errors (definitions, usages, members)
//! - E05xx: Namespace errors (aliases, qualified names)
//! - E07xx: Action/state machine errors
//! - E09xx: Generic/fallback errors

use std::fmt;

/// Error codes for parser diagnostics
///
/// Each error code represents a specific category of parse error,
/// enabling filtering and documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // E01xx: Lexical errors
    // =========================================================================
    /// Invalid or unexpected character in source
    E0101,
    /// Unterminated string literal
    E0102,
    /// Unterminated block comment or fragment body
    E0103,

    // =========================================================================
    // E02xx: Structural errors (braces, semicolons, delimiters)
    // =========================================================================
    /// Missing semicolon
    E0201,
    /// Unclosed brace `{`
    E0202,
    /// Unexpected closing delimiter
    E0205,

    // =========================================================================
    // E03xx: Declaration errors
    // =========================================================================
    /// Missing identifier/name
    E0301,
    /// Member statement not valid for the enclosing element kind
    E0304,
    /// Missing type annotation
    E0305,
    /// Missing body (neither `;` nor `{`)
    E0307,
    /// Duplicate qualified name
    E0308,
    /// Fragment declared without a body
    E0309,

    // =========================================================================
    // E05xx: Namespace errors
    // =========================================================================
    /// Invalid alias declaration
    E0503,

    // =========================================================================
    // E07xx: Action/state machine errors
    // =========================================================================
    /// Invalid transition syntax
    E0703,
    /// Missing `then` in transition
    E0704,
    /// More than one initial state marker in a state machine
    E0705,
    /// Transition declared outside any state context
    E0706,

    // =========================================================================
    // E09xx: Generic/fallback errors
    // =========================================================================
    /// Unexpected token in current context
    E0901,
    /// Expected a specific token
    E0902,
}

impl ErrorCode {
    /// Get the string representation of the error code (e.g., "E0201")
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::E0101 => "E0101",
            Self::E0102 => "E0102",
            Self::E0103 => "E0103",
            Self::E0201 => "E0201",
            Self::E0202 => "E0202",
            Self::E0205 => "E0205",
            Self::E0301 => "E0301",
            Self::E0304 => "E0304",
            Self::E0305 => "E0305",
            Self::E0307 => "E0307",
            Self::E0308 => "E0308",
            Self::E0309 => "E0309",
            Self::E0503 => "E0503",
            Self::E0703 => "E0703",
            Self::E0704 => "E0704",
            Self::E0705 => "E0705",
            Self::E0706 => "E0706",
            Self::E0901 => "E0901",
            Self::E0902 => "E0902",
        }
    }

    /// Get a short description of the error category
    pub fn category_description(&self) -> &'static str {
        match self {
            Self::E0101 | Self::E0102 | Self::E0103 => "lexical error",
            Self::E0201 | Self::E0202 | Self::E0205 => "structural error",
            Self::E0301 | Self::E0304 | Self::E0305 | Self::E0307 | Self::E0308 | Self::E0309 => {
                "declaration error"
            }
            Self::E0503 => "namespace error",
            Self::E0703 | Self::E0704 | Self::E0705 | Self::E0706 => "action/state error",
            Self::E0901 | Self::E0902 => "syntax error",
        }
    }

    /// Get the default message template for this error code
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::E0101 => "invalid character",
            Self::E0102 => "unterminated string literal",
            Self::E0103 => "unterminated block comment",
            Self::E0201 => "missing semicolon",
            Self::E0202 => "unclosed brace",
            Self::E0205 => "unexpected closing delimiter",
            Self::E0301 => "missing identifier",
            Self::E0304 => "member not valid here",
            Self::E0305 => "missing type annotation",
            Self::E0307 => "missing body",
            Self::E0308 => "duplicate qualified name",
            Self::E0309 => "missing fragment body",
            Self::E0503 => "invalid alias",
            Self::E0703 => "invalid transition syntax",
            Self::E0704 => "missing 'then' keyword",
            Self::E0705 => "duplicate initial state",
            Self::E0706 => "transition outside any state",
            Self::E0901 => "unexpected token",
            Self::E0902 => "expected token",
        }
    }

    /// Check if this is a structural error (delimiter-related)
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::E0201 | Self::E0202 | Self::E0205)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
