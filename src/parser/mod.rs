//! Element parser for the model notation
//!
//! This module turns model source text into flat, typed elements:
//! - **logos** for fast lexing
//! - a recursive-descent scanner that recognizes declaration forms and
//!   captures their members into closed per-kind payloads
//!
//! ## Architecture
//!
//! ```text
//! Source Text
//!     ↓
//! Lexer (logos) → Tokens with SyntaxKind (block comments are opaque)
//!     ↓
//! Scanner → ElementBuilder accumulators, one per declaration
//!     ↓
//! Vec<Element> (ordered by declaration offset)
//!     ↓
//! ModelIndex → ModelGraph
//! ```
//!
//! Any malformed declaration is a fatal [`ParseError`] naming the source
//! unit and line; nothing is partially processed.

pub mod errors;
mod lexer;
#[allow(clippy::module_inception)]
mod parser;
mod syntax_kind;

pub use errors::{ErrorCode, ParseError};
pub use lexer::{Lexer, Token, tokenize};
pub use parser::parse_unit;
pub use syntax_kind::SyntaxKind;
