//! Atom for messaging
//!
//! A small extension that lets Atom and AtomPub carry messages: posts
//! are entries without the ceremony, so a title is not required, and
//! they travel under their own element name.

use std::sync::LazyLock;

use crate::app;
use crate::atom;
use crate::bind::{require, Dispatch, Document, FieldSet, FromXml, ToXml};
use crate::error::Result;
use crate::xml::name::QName;
use crate::xml::Element;

/// The messaging namespace
pub const NS: &str = "http://www.alipedis.com/2012/ames";

/// Qualified name in the messaging namespace
pub fn qname(local: &str) -> QName {
    QName::new(NS, local)
}

/// A message: an app entry serialized as `ames:post`.
///
/// Unlike a regular entry a post needs no title; id and updated are
/// still required when encoding.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Post {
    pub entry: app::Entry,
}

impl FromXml for Post {
    fn dispatch() -> &'static Dispatch {
        app::Entry::dispatch()
    }

    fn gather(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        app::Entry::gather(element, dispatch, fields);
    }

    fn build(fields: &mut FieldSet) -> Self {
        Self {
            entry: app::Entry::build(fields),
        }
    }
}

impl ToXml for Post {
    fn standard_tag(&self) -> Option<QName> {
        Some(qname("post"))
    }

    fn populate(&self, element: &mut Element) -> Result<()> {
        require(&self.entry.meta.id, "ames::Post", "id")?;
        require(&self.entry.meta.updated, "ames::Post", "updated")?;
        self.entry.populate_entry(element)
    }
}

impl Document for Post {
    fn document_tag() -> QName {
        qname("post")
    }

    fn content_type() -> &'static str {
        "application/x-ames+xml;type=post"
    }
}

impl atom::HasLinks for Post {
    fn links(&self) -> &[atom::Link] {
        &self.entry.meta.links
    }

    fn links_mut(&mut self) -> &mut Vec<atom::Link> {
        &mut self.entry.meta.links
    }
}

/// An app feed that also carries `ames:post` children
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Feed {
    pub feed: app::Feed,
    pub posts: Vec<Post>,
}

static FEED_DISPATCH: LazyLock<Dispatch> = LazyLock::new(|| {
    Dispatch::inherit(app::Feed::dispatch()).entry("post", |e| Box::new(Post::from_xml(e)))
});

impl FromXml for Feed {
    fn dispatch() -> &'static Dispatch {
        &FEED_DISPATCH
    }

    fn gather(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        for child in &element.children {
            if child.tag == qname("post") {
                fields.push_boxed("posts", dispatch.decode("post", child));
            }
        }
        app::Feed::gather_app_feed(element, dispatch, fields);
    }

    fn build(fields: &mut FieldSet) -> Self {
        Self {
            posts: fields.take_vec("posts"),
            feed: app::Feed::build(fields),
        }
    }
}

impl ToXml for Feed {
    fn standard_tag(&self) -> Option<QName> {
        Some(atom::qname("feed"))
    }

    fn populate(&self, element: &mut Element) -> Result<()> {
        self.feed.check_required("ames::Feed")?;
        self.feed.populate_feed(element)?;
        for post in &self.posts {
            post.encode_into(element, qname("post"))?;
        }
        Ok(())
    }
}

impl Document for Feed {
    fn document_tag() -> QName {
        atom::qname("feed")
    }

    fn content_type() -> &'static str {
        "application/atom+xml"
    }
}
