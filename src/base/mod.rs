//! Foundation types for the modelgen toolchain.
//!
//! This module provides fundamental types used throughout the pipeline:
//! - [`Position`], [`Span`] - Line/column positions for parsed elements
//! - [`LineIndex`], [`LineCol`] - Byte offset to line/column conversion
//! - Domain constants (file extension, reserved names, fragment names)
//!
//! This module has NO dependencies on other modelgen modules.

pub mod constants;
mod line_index;
mod position;

pub use line_index::{LineCol, LineIndex};
pub use position::{Position, SourceLocation, Span};

// Re-export text-size types for convenience
pub use text_size::{TextRange, TextSize};
