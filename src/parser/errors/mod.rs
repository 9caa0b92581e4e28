//! Parser error handling module
//!
//! - Categorized error codes for filtering and documentation
//! - Location-carrying parse errors (source unit, line, column)

mod codes;
mod error;

pub use codes::ErrorCode;
pub use error::ParseError;
