//! Atom extensions for social networking
//!
//! Access information describing a social graph: posts, peers and their
//! certificates, anchored in an extended app:service document. Work in
//! progress upstream; the vocabulary here follows the documents as they
//! exist.

use std::sync::LazyLock;

use crate::app;
use crate::atom::{self, HasLinks};
use crate::bind::{Dispatch, Document, FieldSet, FromXml, ToXml};
use crate::error::Result;
use crate::xml::name::QName;
use crate::xml::Element;

/// The social-graph namespace
pub const NS: &str = "http://www.alipedis.com/2012/asoc";

/// Qualified name in the social-graph namespace
pub fn qname(local: &str) -> QName {
    QName::new(NS, local)
}

/// A message post: like an entry but with no required title or summary,
/// and its content is a plain text construct under `asoc:content`.
///
/// Nothing is required at encode time; a bare post is a valid fragment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Post {
    pub common: atom::Common,
    pub authors: Vec<atom::Person>,
    pub categories: Vec<atom::Category>,
    pub content: Option<atom::Text>,
    pub id: Option<String>,
    pub links: Vec<atom::Link>,
    pub published: Option<atom::Date>,
    pub rights: Option<atom::Text>,
    pub updated: Option<atom::Date>,
}

static POST_DISPATCH: LazyLock<Dispatch> = LazyLock::new(|| {
    Dispatch::new()
        .entry("author", |e| Box::new(atom::Person::from_xml(e)))
        .entry("category", |e| Box::new(atom::Category::from_xml(e)))
        .entry("content", |e| Box::new(atom::Text::from_xml(e)))
        .entry("link", |e| Box::new(atom::Link::from_xml(e)))
        .entry("published", |e| Box::new(atom::Date::from_xml(e)))
        .entry("rights", |e| Box::new(atom::Text::from_xml(e)))
        .entry("updated", |e| Box::new(atom::Date::from_xml(e)))
});

impl FromXml for Post {
    fn dispatch() -> &'static Dispatch {
        &POST_DISPATCH
    }

    fn gather(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        for child in &element.children {
            if child.tag == atom::qname("author") {
                fields.push_boxed("authors", dispatch.decode("author", child));
            } else if child.tag == atom::qname("category") {
                fields.push_boxed("categories", dispatch.decode("category", child));
            } else if child.tag == qname("content") {
                fields.set_boxed("content", dispatch.decode("content", child));
            } else if child.tag == atom::qname("id") {
                if let Some(id) = child.first_text() {
                    fields.set("id", id.to_string());
                }
            } else if child.tag == atom::qname("link") {
                fields.push_boxed("links", dispatch.decode("link", child));
            } else if child.tag == atom::qname("published") {
                fields.set_boxed("published", dispatch.decode("published", child));
            } else if child.tag == atom::qname("rights") {
                fields.set_boxed("rights", dispatch.decode("rights", child));
            } else if child.tag == atom::qname("updated") {
                fields.set_boxed("updated", dispatch.decode("updated", child));
            }
        }
        atom::Common::gather(element, dispatch, fields);
    }

    fn build(fields: &mut FieldSet) -> Self {
        Self {
            authors: fields.take_vec("authors"),
            categories: fields.take_vec("categories"),
            content: fields.take("content"),
            id: fields.take("id"),
            links: fields.take_vec("links"),
            published: fields.take("published"),
            rights: fields.take("rights"),
            updated: fields.take("updated"),
            common: atom::Common::build(fields),
        }
    }
}

impl ToXml for Post {
    fn standard_tag(&self) -> Option<QName> {
        Some(qname("post"))
    }

    fn populate(&self, element: &mut Element) -> Result<()> {
        self.common.populate(element);
        for author in &self.authors {
            author.encode_into(element, atom::qname("author"))?;
        }
        for category in &self.categories {
            category.encode_into(element, atom::qname("category"))?;
        }
        if let Some(content) = &self.content {
            content.encode_into(element, qname("content"))?;
        }
        if let Some(id) = &self.id {
            element.append_text_child(atom::qname("id"), id);
        }
        for link in &self.links {
            link.encode_into(element, atom::qname("link"))?;
        }
        if let Some(published) = &self.published {
            published.encode_into(element, atom::qname("published"))?;
        }
        if let Some(rights) = &self.rights {
            rights.encode_into(element, atom::qname("rights"))?;
        }
        if let Some(updated) = &self.updated {
            updated.encode_into(element, atom::qname("updated"))?;
        }
        Ok(())
    }
}

impl Document for Post {
    fn document_tag() -> QName {
        qname("post")
    }

    fn content_type() -> &'static str {
        "application/asoc+xml"
    }
}

impl HasLinks for Post {
    fn links(&self) -> &[atom::Link] {
        &self.links
    }

    fn links_mut(&mut self) -> &mut Vec<atom::Link> {
        &mut self.links
    }
}

/// An app feed that also carries `asoc:post` children
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
        self.feed.check_required("asoc::Feed")?;
        self.feed.populate_feed(element)?;
        for post in &self.posts {
            post.encode(element)?;
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

/// The `asoc:peer` element: one node of the social graph
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Peer {
    pub id: Option<String>,
    pub uri: Option<String>,
    pub name: Option<String>,
    pub categories: Vec<atom::Category>,
    pub links: Vec<atom::Link>,
}

static PEER_DISPATCH: LazyLock<Dispatch> = LazyLock::new(|| {
    Dispatch::new()
        .entry("category", |e| Box::new(atom::Category::from_xml(e)))
        .entry("link", |e| Box::new(atom::Link::from_xml(e)))
});

impl FromXml for Peer {
    fn dispatch() -> &'static Dispatch {
        &PEER_DISPATCH
    }

    fn gather(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        for child in &element.children {
            if child.tag == atom::qname("id") {
                if let Some(id) = child.first_text() {
                    fields.set("id", id.to_string());
                }
            } else if child.tag == qname("uri") {
                if let Some(uri) = child.first_text() {
                    fields.set("uri", uri.to_string());
                }
            } else if child.tag == qname("name") {
                if let Some(name) = child.first_text() {
                    fields.set("name", name.to_string());
                }
            } else if child.tag == atom::qname("category") {
                fields.push_boxed("categories", dispatch.decode("category", child));
            } else if child.tag == atom::qname("link") {
                fields.push_boxed("links", dispatch.decode("link", child));
            }
        }
    }

    fn build(fields: &mut FieldSet) -> Self {
        Self {
            id: fields.take("id"),
            uri: fields.take("uri"),
            name: fields.take("name"),
            categories: fields.take_vec("categories"),
            links: fields.take_vec("links"),
        }
    }
}

impl ToXml for Peer {
    fn standard_tag(&self) -> Option<QName> {
        Some(qname("peer"))
    }

    fn populate(&self, element: &mut Element) -> Result<()> {
        if let Some(id) = &self.id {
            element.append_text_child(atom::qname("id"), id);
        }
        if let Some(uri) = &self.uri {
            element.append_text_child(qname("uri"), uri);
        }
        if let Some(name) = &self.name {
            element.append_text_child(qname("name"), name);
        }
        for category in &self.categories {
            category.encode(element)?;
        }
        for link in &self.links {
            link.encode(element)?;
        }
        Ok(())
    }
}

impl Document for Peer {
    fn document_tag() -> QName {
        qname("peer")
    }

    fn content_type() -> &'static str {
        "application/asoc+xml"
    }
}

impl HasLinks for Peer {
    fn links(&self) -> &[atom::Link] {
        &self.links
    }

    fn links_mut(&mut self) -> &mut Vec<atom::Link> {
        &mut self.links
    }
}

/// The `asoc:peers` element and document
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Peers {
    pub peers: Vec<Peer>,
}

static PEERS_DISPATCH: LazyLock<Dispatch> =
    LazyLock::new(|| Dispatch::new().entry("peer", |e| Box::new(Peer::from_xml(e))));

impl FromXml for Peers {
    fn dispatch() -> &'static Dispatch {
        &PEERS_DISPATCH
    }

    fn gather(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        for child in &element.children {
            if child.tag == qname("peer") {
                fields.push_boxed("peers", dispatch.decode("peer", child));
            }
        }
    }

    fn build(fields: &mut FieldSet) -> Self {
        Self {
            peers: fields.take_vec("peers"),
        }
    }
}

impl ToXml for Peers {
    fn standard_tag(&self) -> Option<QName> {
        Some(qname("peers"))
    }

    fn populate(&self, element: &mut Element) -> Result<()> {
        for peer in &self.peers {
            peer.encode(element)?;
        }
        Ok(())
    }
}

impl Document for Peers {
    fn document_tag() -> QName {
        qname("peers")
    }

    fn content_type() -> &'static str {
        "application/asoc+xml"
    }
}

/// The `asoc:certificate` element
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Certificate {
    pub href: Option<String>,
    pub name: Option<String>,
    pub certificate: Option<String>,
}

impl FromXml for Certificate {
    fn gather(element: &Element, _dispatch: &Dispatch, fields: &mut FieldSet) {
        if let Some(href) = element.attr_local("href") {
            fields.set("href", href.to_string());
        }
        if let Some(name) = element.attr_local("name") {
            fields.set("name", name.to_string());
        }
        if let Some(certificate) = element.first_text() {
            fields.set("certificate", certificate.to_string());
        }
    }

    fn build(fields: &mut FieldSet) -> Self {
        Self {
            href: fields.take("href"),
            name: fields.take("name"),
            certificate: fields.take("certificate"),
        }
    }
}

impl ToXml for Certificate {
    fn standard_tag(&self) -> Option<QName> {
        Some(qname("certificate"))
    }

    fn populate(&self, element: &mut Element) -> Result<()> {
        if let Some(href) = &self.href {
            element.set_attr(QName::unqualified("href"), href);
        }
        if let Some(name) = &self.name {
            element.set_attr(QName::unqualified("name"), name);
        }
        if let Some(certificate) = &self.certificate {
            element.set_text(certificate);
        }
        Ok(())
    }
}

/// The `asoc:certificates` element; can be its own document
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Certificates {
    pub certificates: Vec<Certificate>,
}

static CERTIFICATES_DISPATCH: LazyLock<Dispatch> =
    LazyLock::new(|| Dispatch::new().entry("certificate", |e| Box::new(Certificate::from_xml(e))));

impl FromXml for Certificates {
    fn dispatch() -> &'static Dispatch {
        &CERTIFICATES_DISPATCH
    }

    fn gather(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        for child in &element.children {
            if child.tag == qname("certificate") {
                fields.push_boxed("certificates", dispatch.decode("certificate", child));
            }
        }
    }

    fn build(fields: &mut FieldSet) -> Self {
        Self {
            certificates: fields.take_vec("certificates"),
        }
    }
}

impl ToXml for Certificates {
    fn standard_tag(&self) -> Option<QName> {
        Some(qname("certificates"))
    }

    fn populate(&self, element: &mut Element) -> Result<()> {
        for certificate in &self.certificates {
            certificate.encode(element)?;
        }
        Ok(())
    }
}

impl Document for Certificates {
    fn document_tag() -> QName {
        qname("certificates")
    }

    fn content_type() -> &'static str {
        "application/asoc+xml"
    }
}

/// An app:service document with the social-graph links of an account
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Service {
    pub service: app::Service,
    pub links: Vec<atom::Link>,
}

static SERVICE_DISPATCH: LazyLock<Dispatch> = LazyLock::new(|| {
    Dispatch::inherit(app::Service::dispatch()).entry("link", |e| Box::new(atom::Link::from_xml(e)))
});

impl FromXml for Service {
    fn dispatch() -> &'static Dispatch {
        &SERVICE_DISPATCH
    }

    fn gather(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        for child in &element.children {
            if child.tag == atom::qname("link") {
                fields.push_boxed("links", dispatch.decode("link", child));
            }
        }
        app::Service::gather_service(element, dispatch, fields);
    }

    fn build(fields: &mut FieldSet) -> Self {
        Self {
            links: fields.take_vec("links"),
            service: app::Service::build(fields),
        }
    }
}

impl ToXml for Service {
    fn standard_tag(&self) -> Option<QName> {
        Some(app::qname("service"))
    }

    fn populate(&self, element: &mut Element) -> Result<()> {
        self.service.check_required("asoc::Service")?;
        self.service.populate_service(element)?;
        for link in &self.links {
            link.encode(element)?;
        }
        Ok(())
    }
}

impl Document for Service {
    fn document_tag() -> QName {
        app::qname("service")
    }

    fn content_type() -> &'static str {
        "application/atomsvc+xml"
    }
}

impl HasLinks for Service {
    fn links(&self) -> &[atom::Link] {
        &self.links
    }

    fn links_mut(&mut self) -> &mut Vec<atom::Link> {
        &mut self.links
    }
}
