//! Atom Threading Extensions
//!
//! The document you are looking for is RFC 4685: in-reply-to elements,
//! reply-count decoration on links, and reply totals.

use std::sync::LazyLock;

use time::OffsetDateTime;

use crate::app;
use crate::atom;
use crate::bind::{Dispatch, Document, FieldSet, FromXml, ToXml};
use crate::error::Result;
use crate::timestamp;
use crate::xml::name::QName;
use crate::xml::Element;

/// The threading namespace
pub const NS: &str = "http://purl.org/syndication/thread/1.0";

/// Qualified name in the threading namespace
pub fn qname(local: &str) -> QName {
    QName::new(NS, local)
}

/// 3. The `thr:in-reply-to` element
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InReplyTo {
    pub common: atom::Common,
    /// The `ref` attribute: id of the resource being replied to
    pub reference: Option<String>,
    pub href: Option<String>,
    pub source: Option<String>,
    pub media_type: Option<String>,
}

impl FromXml for InReplyTo {
    fn gather(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        if let Some(reference) = element.attr_local("ref") {
            fields.set("reference", reference.to_string());
        }
        if let Some(href) = element.attr_local("href") {
            fields.set("href", href.to_string());
        }
        if let Some(source) = element.attr_local("source") {
            fields.set("source", source.to_string());
        }
        if let Some(media_type) = element.attr_local("type") {
            fields.set("media_type", media_type.to_string());
        }
        atom::Common::gather(element, dispatch, fields);
    }

    fn build(fields: &mut FieldSet) -> Self {
        Self {
            reference: fields.take("reference"),
            href: fields.take("href"),
            source: fields.take("source"),
            media_type: fields.take("media_type"),
            common: atom::Common::build(fields),
        }
    }
}

impl ToXml for InReplyTo {
    fn standard_tag(&self) -> Option<QName> {
        Some(qname("in-reply-to"))
    }

    fn populate(&self, element: &mut Element) -> Result<()> {
        self.common.populate(element);
        if let Some(reference) = &self.reference {
            element.set_attr(QName::unqualified("ref"), reference);
        }
        if let Some(href) = &self.href {
            element.set_attr(QName::unqualified("href"), href);
        }
        if let Some(source) = &self.source {
            element.set_attr(QName::unqualified("source"), source);
        }
        if let Some(media_type) = &self.media_type {
            element.set_attr(QName::unqualified("type"), media_type);
        }
        Ok(())
    }
}

/// 4. An `atom:link` decorated with the `replies` relation attributes:
/// `thr:count` and `thr:updated`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Link {
    pub link: atom::Link,
    pub count: Option<u64>,
    pub updated: Option<OffsetDateTime>,
}

impl FromXml for Link {
    fn gather(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        if let Some(count) = element
            .attr(&qname("count"))
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            fields.set("count", count);
        }
        if let Some(updated) = element.attr(&qname("updated")).and_then(timestamp::parse) {
            fields.set("updated", updated);
        }
        atom::Link::gather(element, dispatch, fields);
    }

    fn build(fields: &mut FieldSet) -> Self {
        Self {
            count: fields.take("count"),
            updated: fields.take("updated"),
            link: atom::Link::build(fields),
        }
    }
}

impl ToXml for Link {
    fn standard_tag(&self) -> Option<QName> {
        Some(atom::qname("link"))
    }

    fn populate(&self, element: &mut Element) -> Result<()> {
        self.link.populate(element)?;
        if let Some(count) = self.count {
            element.set_attr(qname("count"), count.to_string());
        }
        if let Some(updated) = self.updated {
            element.set_attr(qname("updated"), timestamp::format(updated));
        }
        Ok(())
    }
}

/// 5. The `thr:total` element plus in-reply-to list, as a component for
/// thread-aware document types to compose in
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Threading {
    pub total: Option<atom::Text>,
    pub in_reply_to: Vec<InReplyTo>,
}

static THREADING_DISPATCH: LazyLock<Dispatch> =
    LazyLock::new(|| Threading::extend_dispatch(Dispatch::new()));

impl Threading {
    /// Merge the threading entries over a parent table. The `link`
    /// entry is overridden so reply links decode with their thr
    /// attributes.
    pub fn extend_dispatch(parent: Dispatch) -> Dispatch {
        parent
            .entry("total", |e| Box::new(atom::Text::from_xml(e)))
            .entry("link", |e| Box::new(Link::from_xml(e)))
            .entry("in-reply-to", |e| Box::new(InReplyTo::from_xml(e)))
    }

    /// Gather stage for composing types; scans only the thr children
    pub fn gather_threading(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        for child in &element.children {
            if child.tag == qname("total") {
                fields.set_boxed("total", dispatch.decode("total", child));
            } else if child.tag == qname("in-reply-to") {
                fields.push_boxed("in_reply_to", dispatch.decode("in-reply-to", child));
            }
        }
    }

    /// Populate stage for composing types
    pub fn populate_threading(&self, element: &mut Element) -> Result<()> {
        if let Some(total) = &self.total {
            total.encode_into(element, qname("total"))?;
        }
        for in_reply_to in &self.in_reply_to {
            in_reply_to.encode(element)?;
        }
        Ok(())
    }
}

impl FromXml for Threading {
    fn dispatch() -> &'static Dispatch {
        &THREADING_DISPATCH
    }

    fn gather(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        Self::gather_threading(element, dispatch, fields);
    }

    fn build(fields: &mut FieldSet) -> Self {
        Self {
            total: fields.take("total"),
            in_reply_to: fields.take_vec("in_reply_to"),
        }
    }
}

/// An app entry composed with threading: its links carry the thr
/// attributes and the entry itself may state what it replies to.
///
/// The thread-aware links supersede the plain link list, which stays
/// empty on decoded entries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Entry {
    pub entry: app::Entry,
    pub links: Vec<Link>,
    pub threading: Threading,
}

static ENTRY_DISPATCH: LazyLock<Dispatch> =
    LazyLock::new(|| Threading::extend_dispatch(Dispatch::inherit(app::Entry::dispatch())));

impl Entry {
    /// The first `replies` link, the usual entry point into a thread
    pub fn replies_link(&self) -> Option<&Link> {
        self.links
            .iter()
            .find(|link| link.link.rel.as_deref() == Some("replies"))
    }
}

impl FromXml for Entry {
    fn dispatch() -> &'static Dispatch {
        &ENTRY_DISPATCH
    }

    fn gather(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        Threading::gather_threading(element, dispatch, fields);
        app::Entry::gather(element, dispatch, fields);
    }

    fn build(fields: &mut FieldSet) -> Self {
        Self {
            links: fields.take_vec("links"),
            threading: Threading::build(fields),
            entry: app::Entry::build(fields),
        }
    }
}

impl ToXml for Entry {
    fn standard_tag(&self) -> Option<QName> {
        Some(atom::qname("entry"))
    }

    fn populate(&self, element: &mut Element) -> Result<()> {
        self.entry.check_required("thr::Entry")?;
        self.entry.populate_entry(element)?;
        for link in &self.links {
            link.encode(element)?;
        }
        self.threading.populate_threading(element)
    }
}

impl Document for Entry {
    fn document_tag() -> QName {
        atom::qname("entry")
    }

    fn content_type() -> &'static str {
        "application/atom+xml;type=entry"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_document;
    use time::macros::datetime;

    const THREADED_ENTRY: &str = r#"
        <entry xmlns="http://www.w3.org/2005/Atom"
               xmlns:thr="http://purl.org/syndication/thread/1.0">
          <id>tag:example.org,2012:comment-1</id>
          <thr:in-reply-to ref="tag:example.org,2012:post-1"
                           href="http://example.org/post/1"/>
          <link rel="replies" href="http://example.org/comment/1/replies"
                thr:count="10" thr:updated="2012-12-13T18:30:02Z"/>
          <thr:total>10</thr:total>
        </entry>"#;

    #[test]
    fn test_threaded_entry_decodes_thr_links() {
        let element = parse_document(THREADED_ENTRY).unwrap();
        let entry = Entry::from_xml(&element);

        // the override routed the link through the thr decoder
        assert_eq!(entry.links.len(), 1);
        assert!(entry.entry.meta.links.is_empty());
        let replies = entry.replies_link().expect("replies link");
        assert_eq!(replies.count, Some(10));
        assert_eq!(replies.updated, Some(datetime!(2012-12-13 18:30:02 UTC)));
        assert_eq!(
            replies.link.href.as_deref(),
            Some("http://example.org/comment/1/replies")
        );

        assert_eq!(
            entry.threading.in_reply_to[0].reference.as_deref(),
            Some("tag:example.org,2012:post-1")
        );
        assert_eq!(
            entry.threading.total.as_ref().and_then(atom::Text::as_plain),
            Some("10")
        );
    }

    #[test]
    fn test_plain_entry_still_uses_plain_links() {
        let element = parse_document(
            r#"<entry xmlns="http://www.w3.org/2005/Atom">
                 <link rel="self" href="http://example.org/e/1"/>
               </entry>"#,
        )
        .unwrap();
        let entry = atom::Entry::from_xml(&element);
        assert_eq!(entry.meta.links.len(), 1);
    }

    #[test]
    fn test_count_tolerates_garbage() {
        let element = parse_document(
            r#"<link xmlns="http://www.w3.org/2005/Atom"
                     xmlns:thr="http://purl.org/syndication/thread/1.0"
                     href="x" thr:count="lots"/>"#,
        )
        .unwrap();
        let link = Link::from_xml(&element);
        assert_eq!(link.count, None);
        assert_eq!(link.link.href.as_deref(), Some("x"));
    }
}
