/*!
# Rust Language Module

This Rust module provides the keyword tables and the byte scanner
that every statement and expression is read through.

*/

#[macro_use]
mod error;
mod keyword;
mod scan;

pub use error::Error;
pub use error::ErrorCode;
pub use keyword::{Command, Function, Keyword, Relop, Word};
pub use scan::{fold_case, Numeral, Scanner, NL};

/// Largest line number a program may use.
pub const MAX_LINE_NUMBER: u16 = 65534;
