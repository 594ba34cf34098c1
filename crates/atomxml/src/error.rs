//! Error types for atomxml

use std::fmt;
use thiserror::Error;

use crate::xml::name::QName;

/// Position in source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pos {
    pub offset: usize,
    pub line: u32,
    pub col: u32,
}

impl Pos {
    pub const fn new(offset: usize, line: u32, col: u32) -> Self {
        Self { offset, line, col }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.offset, self.line, self.col)
    }
}

/// Main error type for atomxml
///
/// Decoding an element tree into typed nodes never produces an error;
/// missing or malformed data degrades to absent fields. Errors come from
/// the two fallible edges: parsing XML text and encoding a node whose
/// vocabulary marks a field as required.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Malformed XML in the input stream.
    #[error("parse error at {pos}: {message}")]
    Parse { pos: Pos, message: String },

    /// The document root is not the element the caller asked for.
    #[error("expected <{expected}> document, found <{found}>")]
    RootTag { expected: QName, found: QName },

    /// A required field was unset when encoding.
    #[error("{type_name} is missing required `{field}`")]
    Incomplete {
        type_name: &'static str,
        field: &'static str,
    },
}

impl Error {
    /// Parse error at a specific position
    pub fn parse_at(message: impl Into<String>, pos: Pos) -> Self {
        Self::Parse {
            pos,
            message: message.into(),
        }
    }
}

/// Result type alias for atomxml
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pos_display() {
        let pos = Pos::new(42, 10, 5);
        assert_eq!(pos.to_string(), "42:10:5");
    }

    #[test]
    fn test_parse_display() {
        let err = Error::parse_at("unexpected token", Pos::new(3, 1, 4));
        assert_eq!(err.to_string(), "parse error at 3:1:4: unexpected token");
    }

    #[test]
    fn test_incomplete_display() {
        let err = Error::Incomplete {
            type_name: "Entry",
            field: "id",
        };
        assert_eq!(err.to_string(), "Entry is missing required `id`");
    }
}
