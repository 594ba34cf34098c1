//! The binding engine: the contract between the element tree and typed
//! vocabulary nodes

pub mod dispatch;
pub mod fields;
pub mod node;

pub use dispatch::{Dispatch, InnerDecoder};
pub use fields::FieldSet;
pub use node::{
    from_bytes, from_str, require, require_some, to_bytes, to_string, Document, FromXml, ToXml,
};
