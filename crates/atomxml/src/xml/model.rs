//! Element tree model

use indexmap::IndexMap;

use crate::xml::name::QName;
use crate::xml::writer;

/// A parsed or under-construction XML element.
///
/// Attributes keep insertion order, children are an ordered, exclusively
/// owned list, and `text` is the element's direct character data. The tree
/// is single-owner throughout; nothing here is shared or cyclic.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub tag: QName,
    pub attrs: IndexMap<QName, String>,
    pub children: Vec<Element>,
    pub text: Option<String>,
}

impl Element {
    /// Create a detached element, typically a document root
    pub fn new(tag: QName) -> Self {
        Self {
            tag,
            attrs: IndexMap::new(),
            children: Vec::new(),
            text: None,
        }
    }

    /// Attribute value by qualified name
    pub fn attr(&self, name: &QName) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Attribute value by unqualified name
    pub fn attr_local(&self, local: &str) -> Option<&str> {
        self.attrs.get(&QName::unqualified(local)).map(String::as_str)
    }

    pub fn set_attr(&mut self, name: QName, value: impl Into<String>) {
        self.attrs.insert(name, value.into());
    }

    /// Append a new child with the given tag and return it for filling in
    pub fn new_child(&mut self, tag: QName) -> &mut Self {
        self.children.push(Self::new(tag));
        match self.children.last_mut() {
            Some(child) => child,
            None => unreachable!(),
        }
    }

    /// First child with the given tag
    pub fn find(&self, tag: &QName) -> Option<&Self> {
        self.children.iter().find(|child| child.tag == *tag)
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    /// Append a child holding only text, the shape of `atom:id` and friends
    pub fn append_text_child(&mut self, tag: QName, text: impl Into<String>) {
        self.new_child(tag).set_text(text);
    }

    /// Direct text only, ignoring any child elements
    pub fn first_text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Flatten mixed content into one string: the direct text followed by
    /// the serialized form of every child element, in document order.
    ///
    /// This is how `type="text"` and `type="html"` constructs read their
    /// content.
    pub fn flattened(&self) -> Option<String> {
        if self.children.is_empty() {
            return self.text.clone();
        }
        let mut out = self.text.clone().unwrap_or_default();
        for child in &self.children {
            out.push_str(&writer::element_string(child));
        }
        Some(out)
    }

    /// Content wrapped in a `tag` container element.
    ///
    /// If the element's only child already is that container, return it;
    /// otherwise synthesize one around the element's text and children.
    /// This is the xhtml text-construct rule.
    pub fn wrapped(&self, tag: QName) -> Self {
        if let [only] = self.children.as_slice() {
            if only.tag == tag {
                return only.clone();
            }
        }
        Self {
            tag,
            attrs: IndexMap::new(),
            children: self.children.clone(),
            text: self.text.clone(),
        }
    }
}
