//! The bindable-node contract
//!
//! Every vocabulary type implements [`FromXml`] and [`ToXml`]. Decoding
//! runs the type's `gather` stages most-derived first over one
//! [`FieldSet`], then `build` constructs the value, each level taking its
//! own fields before handing the accumulator down. Encoding mirrors it:
//! `populate` checks the type's own required fields, delegates to the
//! parent stage (ancestor fields are written first), then writes its own.
//!
//! Decoding is infallible by design; whatever the document fails to
//! provide decodes to `None` or an empty list. Validation happens at
//! encode time only.

use crate::bind::dispatch::Dispatch;
use crate::bind::fields::FieldSet;
use crate::error::{Error, Result};
use crate::xml::{self, Element, QName};

/// Decode side of the binding contract
pub trait FromXml: Sized {
    /// The type's merged inner dispatch table
    fn dispatch() -> &'static Dispatch {
        Dispatch::empty()
    }

    /// Collect this type's fields (and, by chaining, its ancestors')
    /// from the element into the accumulator.
    ///
    /// `dispatch` is the table of the most-derived type being decoded;
    /// stages resolve child decoders through it so a subtype can
    /// substitute handlers without the stage knowing.
    fn gather(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet);

    /// Construct the value from gathered fields, taking this type's own
    /// fields before building the embedded parent portion.
    fn build(fields: &mut FieldSet) -> Self;

    /// Decode an element into a node. Never fails; missing or malformed
    /// data degrades to absent fields.
    fn from_xml(element: &Element) -> Self {
        let mut fields = FieldSet::new();
        Self::gather(element, Self::dispatch(), &mut fields);
        Self::build(&mut fields)
    }
}

/// Encode side of the binding contract
pub trait ToXml {
    /// The element name used when the caller does not supply one.
    /// Types serialized under caller-chosen tags have none.
    fn standard_tag(&self) -> Option<QName> {
        None
    }

    /// Fill in the element for this node: required-field checks first,
    /// then the parent stage, then this type's own attributes and
    /// children.
    fn populate(&self, element: &mut Element) -> Result<()>;

    /// Encode as a detached element with an explicit tag
    fn encode_with(&self, tag: QName) -> Result<Element> {
        let mut element = Element::new(tag);
        self.populate(&mut element)?;
        Ok(element)
    }

    /// Encode as a new child of `parent` with an explicit tag
    fn encode_into(&self, parent: &mut Element, tag: QName) -> Result<()> {
        let element = self.encode_with(tag)?;
        parent.children.push(element);
        Ok(())
    }

    /// Encode as a new child of `parent` under the standard tag.
    ///
    /// # Panics
    ///
    /// If the type declares no standard tag; calling this on such a type
    /// is a programming error.
    fn encode(&self, parent: &mut Element) -> Result<()> {
        self.encode_into(parent, required_standard_tag(self))
    }

    /// Encode as a detached document root under the standard tag.
    ///
    /// # Panics
    ///
    /// If the type declares no standard tag.
    fn encode_root(&self) -> Result<Element> {
        self.encode_with(required_standard_tag(self))
    }
}

#[allow(clippy::panic)]
fn required_standard_tag<T: ToXml + ?Sized>(node: &T) -> QName {
    match node.standard_tag() {
        Some(tag) => tag,
        None => panic!("type has no standard tag; use encode_into with an explicit tag"),
    }
}

/// A node type that can stand alone as a document
pub trait Document: FromXml + ToXml {
    /// Root element name of this document type
    fn document_tag() -> QName;

    /// Media type used by publishing-protocol collaborators to pick a
    /// decoder
    fn content_type() -> &'static str;
}

/// Parse a typed document, checking the root tag
pub fn from_str<T: Document>(source: &str) -> Result<T> {
    from_root(xml::parse_document(source)?)
}

/// Parse a typed document from bytes, checking the root tag
pub fn from_bytes<T: Document>(source: &[u8]) -> Result<T> {
    from_root(xml::parse_document_bytes(source)?)
}

fn from_root<T: Document>(root: Element) -> Result<T> {
    let expected = T::document_tag();
    if root.tag != expected {
        return Err(Error::RootTag {
            expected,
            found: root.tag,
        });
    }
    Ok(T::from_xml(&root))
}

/// Serialize a document node to XML text
pub fn to_string<T: ToXml>(node: &T) -> Result<String> {
    Ok(xml::writer::to_string(&node.encode_root()?))
}

/// Serialize a document node to UTF-8 XML bytes
pub fn to_bytes<T: ToXml>(node: &T) -> Result<Vec<u8>> {
    Ok(xml::writer::to_bytes(&node.encode_root()?))
}

/// Required-field check used at the top of `populate` implementations
pub fn require<T>(
    value: &Option<T>,
    type_name: &'static str,
    field: &'static str,
) -> Result<()> {
    if value.is_some() {
        Ok(())
    } else {
        Err(Error::Incomplete { type_name, field })
    }
}

/// Required-list check: at least one element
pub fn require_some<T>(
    values: &[T],
    type_name: &'static str,
    field: &'static str,
) -> Result<()> {
    if values.is_empty() {
        Err(Error::Incomplete { type_name, field })
    } else {
        Ok(())
    }
}
