//! atomxml - object model for Atom Syndication and Atom Publishing
//! XML documents
//!
//! Typed document nodes decode from and encode to namespace-aware XML.
//! Decoding is generous: whatever the document does not provide ends up
//! as `None` or an empty list, and validation of required fields happens
//! only when a node is encoded again. Extension vocabularies hook into
//! the decode of the base types through per-type dispatch tables.
//!
//! # Quick Start
//!
//! ```
//! use atomxml::atom::Feed;
//! # fn main() -> Result<(), atomxml::Error> {
//! let feed: Feed = atomxml::from_str(
//!     r#"<feed xmlns="http://www.w3.org/2005/Atom">
//!          <id>urn:uuid:60a76c80-d399-11d9-b93c-0003939e0af6</id>
//!          <title type="text">Example Feed</title>
//!          <updated>2003-12-13T18:30:02Z</updated>
//!        </feed>"#,
//! )?;
//! assert_eq!(
//!     feed.source.meta.title.as_ref().and_then(|t| t.as_plain()),
//!     Some("Example Feed")
//! );
//! let xml = atomxml::to_string(&feed)?;
//! assert!(xml.starts_with("<?xml"));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub use error::{Error, Pos, Result};

pub mod xml;
pub use xml::{parse_document, register_namespace, Element, QName};

pub mod bind;
pub use bind::{
    from_bytes, from_str, to_bytes, to_string, Dispatch, Document, FieldSet, FromXml, ToXml,
};

pub mod timestamp;
pub mod urn;

pub mod atom;
pub use atom::HasLinks;

pub mod aconf;
pub mod ames;
pub mod app;
pub mod asoc;
pub mod thr;
