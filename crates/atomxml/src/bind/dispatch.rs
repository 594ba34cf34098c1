//! Inner dispatch tables
//!
//! Every bindable type owns one merged table mapping logical child names
//! ("link", "entry", …) to decode functions. A subtype builds its table
//! from its parent's with [`Dispatch::inherit`] and overrides or adds
//! entries; merging happens once, when the table's `LazyLock` first
//! resolves, so lookup never walks an ancestry chain. The decoded value
//! is type-erased because an override may substitute any node type; the
//! consuming `build` stage restores the type.

use std::any::Any;
use std::sync::LazyLock;

use indexmap::IndexMap;

use crate::xml::Element;

/// A child-element decoder as stored in a dispatch table
pub type InnerDecoder = fn(&Element) -> Box<dyn Any>;

/// Per-type dispatch table, fully merged over the type's ancestry
#[derive(Default, Clone)]
pub struct Dispatch {
    entries: IndexMap<&'static str, InnerDecoder>,
}

static EMPTY: LazyLock<Dispatch> = LazyLock::new(Dispatch::new);

impl Dispatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared table of a type with no inner entries
    pub fn empty() -> &'static Self {
        &EMPTY
    }

    /// Start from a parent type's merged table
    pub fn inherit(parent: &Self) -> Self {
        parent.clone()
    }

    /// Add or override an entry; the most-derived entry wins
    #[must_use]
    pub fn entry(mut self, name: &'static str, decoder: InnerDecoder) -> Self {
        self.entries.insert(name, decoder);
        self
    }

    pub fn get(&self, name: &str) -> Option<InnerDecoder> {
        self.entries.get(name).copied()
    }

    /// Decode a child element through the named entry.
    ///
    /// # Panics
    ///
    /// If no entry exists for `name`. A miss means a vocabulary module
    /// scans for a child it never registered a decoder for; that is a
    /// wiring defect, not a property of the input document.
    #[allow(clippy::panic)]
    pub fn decode(&self, name: &str, element: &Element) -> Box<dyn Any> {
        match self.get(name) {
            Some(decoder) => decoder(element),
            None => panic!("no inner decoder registered for `{name}` (vocabulary wiring error)"),
        }
    }
}

impl std::fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatch")
            .field("entries", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::QName;

    fn decode_a(_: &Element) -> Box<dyn Any> {
        Box::new("a".to_string())
    }

    fn decode_b(_: &Element) -> Box<dyn Any> {
        Box::new("b".to_string())
    }

    fn probe(dispatch: &Dispatch, name: &str) -> String {
        let element = Element::new(QName::unqualified("x"));
        match dispatch.decode(name, &element).downcast::<String>() {
            Ok(value) => *value,
            Err(_) => String::new(),
        }
    }

    #[test]
    fn test_inherit_keeps_parent_entries() {
        let parent = Dispatch::new().entry("link", decode_a);
        let child = Dispatch::inherit(&parent).entry("extra", decode_b);
        assert_eq!(probe(&child, "link"), "a");
        assert_eq!(probe(&child, "extra"), "b");
    }

    #[test]
    fn test_most_derived_wins() {
        let parent = Dispatch::new().entry("link", decode_a);
        let child = Dispatch::inherit(&parent).entry("link", decode_b);
        assert_eq!(probe(&child, "link"), "b");
        // the parent table is untouched
        assert_eq!(probe(&parent, "link"), "a");
    }

    #[test]
    #[should_panic(expected = "no inner decoder registered for `absent`")]
    fn test_missing_entry_is_wiring_error() {
        let dispatch = Dispatch::new().entry("link", decode_a);
        let element = Element::new(QName::unqualified("x"));
        let _ = dispatch.decode("absent", &element);
    }
}
