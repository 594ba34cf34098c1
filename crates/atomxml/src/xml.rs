//! Element tree adapter: qualified names, the element model, parsing
//! and serialization

pub mod cursor;
pub mod model;
pub mod name;
pub mod parser;
pub mod writer;

pub use model::Element;
pub use name::{register_namespace, QName};
pub use parser::Parser;

use crate::error::Result;

/// Parse one XML document from text
pub fn parse_document(source: &str) -> Result<Element> {
    Parser::new(source.as_bytes()).parse()
}

/// Parse one XML document from bytes
pub fn parse_document_bytes(source: &[u8]) -> Result<Element> {
    Parser::new(source).parse()
}
