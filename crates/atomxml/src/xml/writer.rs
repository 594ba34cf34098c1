//! XML serialization
//!
//! Prefixes are assigned per document from the registry (generated
//! `nsN` prefixes fill the gaps) and every namespace declaration goes on
//! the root element. Output is UTF-8 with a standard declaration.

use indexmap::{IndexMap, IndexSet};

use crate::xml::model::Element;
use crate::xml::name::{self, QName, XML_NS};

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n";

/// Serialize a document: XML declaration plus the element tree
pub fn to_string(root: &Element) -> String {
    let mut out = String::from(XML_DECLARATION);
    out.push_str(&element_string(root));
    out
}

/// Serialize a document to UTF-8 bytes
pub fn to_bytes(root: &Element) -> Vec<u8> {
    to_string(root).into_bytes()
}

/// Serialize one element subtree without a declaration.
///
/// Also the flattening form used for mixed text/markup content.
pub fn element_string(root: &Element) -> String {
    let mut uris = IndexSet::new();
    collect_namespaces(root, &mut uris);
    let prefixes = assign_prefixes(&uris);

    let mut out = String::new();
    write_element(root, &prefixes, true, &mut out);
    out
}

/// Every namespace URI used in the subtree, in encounter order.
/// The xml namespace is bound implicitly and never declared.
fn collect_namespaces(element: &Element, uris: &mut IndexSet<String>) {
    if let Some(ns) = &element.tag.ns {
        if ns != XML_NS {
            uris.insert(ns.clone());
        }
    }
    for attr_name in element.attrs.keys() {
        if let Some(ns) = &attr_name.ns {
            if ns != XML_NS {
                uris.insert(ns.clone());
            }
        }
    }
    for child in &element.children {
        collect_namespaces(child, uris);
    }
}

fn assign_prefixes(uris: &IndexSet<String>) -> IndexMap<String, String> {
    let mut prefixes = IndexMap::new();
    let mut taken: IndexSet<String> = IndexSet::new();
    let mut next_generated = 0usize;
    for uri in uris {
        let mut prefix = name::prefix_for(uri).unwrap_or_default();
        while prefix.is_empty() || taken.contains(&prefix) {
            prefix = format!("ns{next_generated}");
            next_generated += 1;
        }
        taken.insert(prefix.clone());
        prefixes.insert(uri.clone(), prefix);
    }
    prefixes
}

fn write_element(
    element: &Element,
    prefixes: &IndexMap<String, String>,
    is_root: bool,
    out: &mut String,
) {
    let tag = prefixed(&element.tag, prefixes);
    out.push('<');
    out.push_str(&tag);

    if is_root {
        for (uri, prefix) in prefixes {
            out.push_str(" xmlns:");
            out.push_str(prefix);
            out.push_str("=\"");
            out.push_str(&escape(uri));
            out.push('"');
        }
    }

    for (attr_name, value) in &element.attrs {
        out.push(' ');
        out.push_str(&prefixed(attr_name, prefixes));
        out.push_str("=\"");
        out.push_str(&escape(value));
        out.push('"');
    }

    if element.text.is_none() && element.children.is_empty() {
        out.push_str("/>");
        return;
    }

    out.push('>');
    if let Some(text) = &element.text {
        out.push_str(&escape(text));
    }
    for child in &element.children {
        write_element(child, prefixes, false, out);
    }
    out.push_str("</");
    out.push_str(&tag);
    out.push('>');
}

fn prefixed(qname: &QName, prefixes: &IndexMap<String, String>) -> String {
    match &qname.ns {
        None => qname.local.clone(),
        Some(ns) if ns == XML_NS => format!("xml:{}", qname.local),
        Some(ns) => match prefixes.get(ns) {
            Some(prefix) => format!("{prefix}:{}", qname.local),
            // collect_namespaces visits every node first
            None => qname.local.clone(),
        },
    }
}

fn escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parser::Parser;

    const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

    #[test]
    fn test_declaration_and_empty_element() {
        let root = Element::new(QName::new(ATOM_NS, "feed"));
        assert_eq!(
            to_string(&root),
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
             <atom:feed xmlns:atom=\"http://www.w3.org/2005/Atom\"/>"
        );
    }

    #[test]
    fn test_unqualified_tree_has_no_declarations() {
        let mut root = Element::new(QName::unqualified("b"));
        root.set_text("bold");
        assert_eq!(element_string(&root), "<b>bold</b>");
    }

    #[test]
    fn test_escaping() {
        let mut root = Element::new(QName::unqualified("e"));
        root.set_attr(QName::unqualified("a"), "x\"<y");
        root.set_text("a & b < c");
        assert_eq!(
            element_string(&root),
            "<e a=\"x&quot;&lt;y\">a &amp; b &lt; c</e>"
        );
    }

    #[test]
    fn test_xml_prefix_implicit() {
        let mut root = Element::new(QName::unqualified("e"));
        root.set_attr(QName::new(XML_NS, "lang"), "en");
        assert_eq!(element_string(&root), "<e xml:lang=\"en\"/>");
    }

    #[test]
    fn test_generated_prefix_for_unknown_namespace() {
        let mut root = Element::new(QName::new("urn:example:writer", "e"));
        root.new_child(QName::new("urn:example:writer2", "f"));
        let out = element_string(&root);
        assert!(out.contains("xmlns:ns"));
        assert!(out.contains(":e"));
    }

    #[test]
    fn test_write_parse_round_trip() {
        let mut root = Element::new(QName::new(ATOM_NS, "entry"));
        root.set_attr(QName::new(XML_NS, "lang"), "de");
        root.append_text_child(QName::new(ATOM_NS, "id"), "urn:uuid:abc");
        let title = root.new_child(QName::new(ATOM_NS, "title"));
        title.set_attr(QName::unqualified("type"), "text");
        title.set_text("hi & bye");

        let text = to_string(&root);
        let reparsed = Parser::new(text.as_bytes()).parse().unwrap();
        assert_eq!(reparsed, root);
    }
}
