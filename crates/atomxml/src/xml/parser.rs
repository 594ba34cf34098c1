//! Namespace-aware XML parser
//!
//! Produces an [`Element`] tree with every tag and attribute name resolved
//! to its (namespace URI, local name) pair. Prefixes are resolved through
//! the scope stack and then discarded; they never reach the tree.

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::xml::cursor::Cursor;
use crate::xml::model::Element;
use crate::xml::name::{QName, XML_NS};

/// One xmlns binding: prefix (empty string for the default namespace)
/// to URI, or `None` for an un-declaration (`xmlns=""`).
type Binding = (String, Option<String>);

/// XML parser
#[derive(Debug)]
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    scopes: Vec<Vec<Binding>>,
}

impl<'a> Parser<'a> {
    pub const fn new(input: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(input),
            scopes: Vec::new(),
        }
    }

    /// Parse a complete document: optional prolog, one root element,
    /// nothing but whitespace after it.
    pub fn parse(&mut self) -> Result<Element> {
        self.skip_misc()?;
        let root = self.parse_element()?;
        self.skip_misc()?;

        if !self.cursor.is_eof() {
            return Err(self.error_here("content after document root"));
        }
        Ok(root)
    }

    fn parse_element(&mut self) -> Result<Element> {
        self.expect_byte(b'<')?;
        if self.cursor.current() == Some(b'/') {
            return Err(self.error_here("unexpected closing tag"));
        }

        let (open_prefix, open_local) = self.parse_name()?;
        let raw_attrs = self.parse_raw_attributes()?;

        self.push_scope(&raw_attrs);
        let tag = self.resolve_element_name(open_prefix.as_deref(), &open_local)?;
        let attrs = self.resolve_attributes(raw_attrs)?;

        if self.cursor.current() == Some(b'/') {
            self.cursor.advance();
            self.expect_byte(b'>')?;
            self.scopes.pop();
            return Ok(Element {
                tag,
                attrs,
                children: Vec::new(),
                text: None,
            });
        }
        self.expect_byte(b'>')?;

        let mut children = Vec::new();
        let mut text = String::new();
        loop {
            match self.cursor.current() {
                None => return Err(self.error_here("unterminated element")),
                Some(b'<') => {
                    if self.cursor.peek(1) == Some(b'/') {
                        self.cursor.advance_by(2);
                        let (close_prefix, close_local) = self.parse_name()?;
                        if close_prefix != open_prefix || close_local != open_local {
                            return Err(self.error_here("mismatched closing tag"));
                        }
                        self.cursor.skip_whitespace();
                        self.expect_byte(b'>')?;
                        break;
                    }
                    if self.peek_is(b"<!--") {
                        self.cursor.advance_by(4);
                        self.skip_until(b"-->")?;
                        continue;
                    }
                    if self.peek_is(b"<![CDATA[") {
                        self.cursor.advance_by(9);
                        text.push_str(&self.take_until(b"]]>")?);
                        continue;
                    }
                    if self.cursor.peek(1) == Some(b'?') {
                        self.cursor.advance_by(2);
                        self.skip_until(b"?>")?;
                        continue;
                    }
                    if self.cursor.peek(1) == Some(b'!') {
                        return Err(self.error_here("unexpected declaration"));
                    }
                    children.push(self.parse_element()?);
                }
                Some(_) => text.push_str(&self.parse_text()?),
            }
        }

        self.scopes.pop();
        Ok(Element {
            tag,
            attrs,
            children,
            text: if text.trim().is_empty() { None } else { Some(text) },
        })
    }

    /// Attributes exactly as written, xmlns declarations included
    fn parse_raw_attributes(&mut self) -> Result<Vec<(Option<String>, String, String)>> {
        let mut attrs = Vec::new();
        loop {
            self.cursor.skip_whitespace();
            match self.cursor.current() {
                Some(b'/') | Some(b'>') => break,
                Some(_) => {}
                None => return Err(self.error_here("unexpected end of input")),
            }

            let (prefix, local) = self.parse_name()?;
            self.cursor.skip_whitespace();
            self.expect_byte(b'=')?;
            self.cursor.skip_whitespace();
            let value = self.parse_attribute_value()?;
            attrs.push((prefix, local, value));
        }
        Ok(attrs)
    }

    /// Open a scope frame from this element's xmlns declarations
    fn push_scope(&mut self, raw_attrs: &[(Option<String>, String, String)]) {
        let mut frame = Vec::new();
        for (prefix, local, value) in raw_attrs {
            match prefix.as_deref() {
                None if local == "xmlns" => {
                    let uri = (!value.is_empty()).then(|| value.clone());
                    frame.push((String::new(), uri));
                }
                Some("xmlns") => {
                    frame.push((local.clone(), Some(value.clone())));
                }
                _ => {}
            }
        }
        self.scopes.push(frame);
    }

    /// Resolve a prefix against the scope stack, innermost binding first
    fn lookup(&self, prefix: &str) -> Option<Option<String>> {
        if prefix == "xml" {
            return Some(Some(XML_NS.to_string()));
        }
        for frame in self.scopes.iter().rev() {
            for (bound, uri) in frame.iter().rev() {
                if bound == prefix {
                    return Some(uri.clone());
                }
            }
        }
        None
    }

    fn resolve_element_name(&self, prefix: Option<&str>, local: &str) -> Result<QName> {
        let ns = match prefix {
            Some(prefix) => match self.lookup(prefix) {
                Some(uri) => uri,
                None => {
                    return Err(self.error_here(&format!("unbound namespace prefix `{prefix}`")))
                }
            },
            // unprefixed element names take the default namespace
            None => self.lookup("").flatten(),
        };
        Ok(QName {
            ns,
            local: local.to_string(),
        })
    }

    /// Resolve attribute names; xmlns declarations are consumed by the
    /// scope and do not appear as data. Unprefixed attributes carry no
    /// namespace.
    fn resolve_attributes(
        &self,
        raw: Vec<(Option<String>, String, String)>,
    ) -> Result<IndexMap<QName, String>> {
        let mut attrs = IndexMap::new();
        for (prefix, local, value) in raw {
            let name = match prefix.as_deref() {
                None if local == "xmlns" => continue,
                Some("xmlns") => continue,
                None => QName { ns: None, local },
                Some(prefix) => match self.lookup(prefix) {
                    Some(uri) => QName { ns: uri, local },
                    None => {
                        return Err(
                            self.error_here(&format!("unbound namespace prefix `{prefix}`"))
                        )
                    }
                },
            };
            if attrs.insert(name.clone(), value).is_some() {
                return Err(self.error_here(&format!("duplicate attribute `{name}`")));
            }
        }
        Ok(attrs)
    }

    fn parse_attribute_value(&mut self) -> Result<String> {
        let quote = match self.cursor.current() {
            Some(b @ (b'"' | b'\'')) => b,
            _ => return Err(self.error_here("expected quoted attribute value")),
        };
        self.cursor.advance();

        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == quote {
                let raw = self.cursor.slice_from(start);
                self.cursor.advance();
                let value = self.to_str(raw)?;
                return self.decode_entities(value);
            }
            if b == b'<' {
                return Err(self.error_here("`<` in attribute value"));
            }
            self.cursor.advance();
        }
        Err(self.error_here("unterminated attribute value"))
    }

    /// One run of character data, entities decoded
    fn parse_text(&mut self) -> Result<String> {
        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == b'<' {
                break;
            }
            self.cursor.advance();
        }
        let raw = self.cursor.slice_from(start);
        let text = self.to_str(raw)?;
        self.decode_entities(text)
    }

    /// Name token, split into (prefix, local) at the first colon
    fn parse_name(&mut self) -> Result<(Option<String>, String)> {
        let start = self.cursor.pos();
        match self.cursor.current() {
            Some(b) if is_name_start(b) => self.cursor.advance(),
            _ => return Err(self.error_here("expected name")),
        }
        while let Some(b) = self.cursor.current() {
            if is_name_char(b) {
                self.cursor.advance();
            } else {
                break;
            }
        }
        let name = self.to_str(self.cursor.slice_from(start))?;
        match name.split_once(':') {
            Some((prefix, local)) => {
                if prefix.is_empty() || local.is_empty() || local.contains(':') {
                    return Err(self.error_here(&format!("malformed name `{name}`")));
                }
                Ok((Some(prefix.to_string()), local.to_string()))
            }
            None => Ok((None, name.to_string())),
        }
    }

    /// Skip whitespace, comments, PIs and a doctype between elements
    fn skip_misc(&mut self) -> Result<()> {
        loop {
            self.cursor.skip_whitespace();
            if self.peek_is(b"<?") {
                self.cursor.advance_by(2);
                self.skip_until(b"?>")?;
            } else if self.peek_is(b"<!--") {
                self.cursor.advance_by(4);
                self.skip_until(b"-->")?;
            } else if self.peek_is(b"<!") {
                self.cursor.advance_by(2);
                self.skip_until(b">")?;
            } else {
                return Ok(());
            }
        }
    }

    fn peek_is(&self, pattern: &[u8]) -> bool {
        self.cursor.peek_bytes(pattern.len()) == Some(pattern)
    }

    fn skip_until(&mut self, pattern: &[u8]) -> Result<()> {
        self.take_until(pattern).map(|_| ())
    }

    fn take_until(&mut self, pattern: &[u8]) -> Result<String> {
        let start = self.cursor.pos();
        while self.cursor.current().is_some() {
            if self.peek_is(pattern) {
                let raw = self.cursor.slice_from(start);
                let taken = self.to_str(raw)?;
                self.cursor.advance_by(pattern.len());
                return Ok(taken.to_string());
            }
            self.cursor.advance();
        }
        Err(self.error_here("unterminated markup"))
    }

    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        if self.cursor.consume(expected) {
            Ok(())
        } else {
            Err(self.error_here("unexpected token"))
        }
    }

    fn to_str(&self, raw: &'a [u8]) -> Result<&'a str> {
        std::str::from_utf8(raw).map_err(|_| self.error_here("invalid utf-8"))
    }

    fn decode_entities(&self, input: &str) -> Result<String> {
        if !input.contains('&') {
            return Ok(input.to_string());
        }
        let mut result = String::with_capacity(input.len());
        let mut chars = input.chars();
        while let Some(ch) = chars.next() {
            if ch != '&' {
                result.push(ch);
                continue;
            }
            let mut entity = String::new();
            let mut terminated = false;
            for next in chars.by_ref() {
                if next == ';' {
                    terminated = true;
                    break;
                }
                entity.push(next);
            }
            if !terminated {
                return Err(self.error_here("unterminated entity reference"));
            }
            let decoded = match entity.as_str() {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => decode_numeric_entity(&entity),
            };
            match decoded {
                Some(ch) => result.push(ch),
                None => {
                    return Err(self.error_here(&format!("unknown entity `&{entity};`")));
                }
            }
        }
        Ok(result)
    }

    fn error_here(&self, message: &str) -> Error {
        Error::parse_at(message, self.cursor.position())
    }
}

fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_') || b >= 0x80
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || matches!(b, b'0'..=b'9' | b'-' | b'.' | b':')
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok().and_then(char::from_u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<Element> {
        Parser::new(input.as_bytes()).parse()
    }

    #[test]
    fn test_parse_simple_element() -> Result<()> {
        let root = parse("<root></root>")?;
        assert_eq!(root.tag, QName::unqualified("root"));
        assert!(root.children.is_empty());
        Ok(())
    }

    #[test]
    fn test_parse_default_namespace() -> Result<()> {
        let root = parse(r#"<feed xmlns="http://www.w3.org/2005/Atom"><id>x</id></feed>"#)?;
        assert_eq!(root.tag, QName::new("http://www.w3.org/2005/Atom", "feed"));
        assert_eq!(
            root.children[0].tag,
            QName::new("http://www.w3.org/2005/Atom", "id")
        );
        Ok(())
    }

    #[test]
    fn test_prefix_is_presentation_only() -> Result<()> {
        let a = parse(r#"<atom:link xmlns:atom="http://www.w3.org/2005/Atom" href="x"/>"#)?;
        let b = parse(r#"<ns0:link xmlns:ns0="http://www.w3.org/2005/Atom" href="x"/>"#)?;
        assert_eq!(a.tag, b.tag);
        assert_eq!(a, b);
        Ok(())
    }

    #[test]
    fn test_prefixed_attribute() -> Result<()> {
        let root = parse(r#"<e xml:lang="en" href="y"/>"#)?;
        assert_eq!(root.attr(&QName::new(XML_NS, "lang")), Some("en"));
        assert_eq!(root.attr_local("href"), Some("y"));
        assert_eq!(root.attrs.len(), 2);
        Ok(())
    }

    #[test]
    fn test_xmlns_not_an_attribute() -> Result<()> {
        let root = parse(r#"<e xmlns="urn:a" xmlns:b="urn:b"/>"#)?;
        assert!(root.attrs.is_empty());
        Ok(())
    }

    #[test]
    fn test_unbound_prefix_is_parse_error() {
        let err = parse("<x:e/>").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_inner_scope_shadows_outer() -> Result<()> {
        let root = parse(r#"<a xmlns:p="urn:outer"><p:b xmlns:p="urn:inner"/></a>"#)?;
        assert_eq!(root.children[0].tag, QName::new("urn:inner", "b"));
        Ok(())
    }

    #[test]
    fn test_text_and_entities() -> Result<()> {
        let root = parse("<e>a &amp; b &#x41;</e>")?;
        assert_eq!(root.first_text(), Some("a & b A"));
        Ok(())
    }

    #[test]
    fn test_cdata_folds_into_text() -> Result<()> {
        let root = parse("<e><![CDATA[<raw> & text]]></e>")?;
        assert_eq!(root.first_text(), Some("<raw> & text"));
        Ok(())
    }

    #[test]
    fn test_whitespace_only_text_dropped() -> Result<()> {
        let root = parse("<e>\n  <f/>\n</e>")?;
        assert_eq!(root.text, None);
        assert_eq!(root.children.len(), 1);
        Ok(())
    }

    #[test]
    fn test_prolog_and_comments_skipped() -> Result<()> {
        let root = parse("<?xml version=\"1.0\"?><!-- hi --><e><!-- there --></e>")?;
        assert_eq!(root.tag, QName::unqualified("e"));
        Ok(())
    }

    #[test]
    fn test_mismatched_closing_tag() {
        assert!(parse("<a></b>").is_err());
    }

    #[test]
    fn test_trailing_garbage() {
        assert!(parse("<a/><b/>").is_err());
    }

    #[test]
    fn test_duplicate_attribute() {
        assert!(parse(r#"<e a="1" a="2"/>"#).is_err());
    }
}
