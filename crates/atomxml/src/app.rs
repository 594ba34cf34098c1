//! Atom Publishing Protocol constructs
//!
//! The document you are looking for is RFC 5023: category and service
//! documents, plus the feed/entry variants that carry an app:collection.

use std::sync::LazyLock;

use crate::atom;
use crate::bind::{require, require_some, Dispatch, Document, FieldSet, FromXml, ToXml};
use crate::error::Result;
use crate::xml::name::QName;
use crate::xml::Element;

/// The AtomPub namespace
pub const NS: &str = "http://www.w3.org/2007/app";

/// Qualified name in the AtomPub namespace
pub fn qname(local: &str) -> QName {
    QName::new(NS, local)
}

/// 7. Category documents
///
/// Either an inline category list (optionally fixed, optionally scoped
/// to a scheme) or, with `href` set, a pointer to a category document
/// kept elsewhere; `href` suppresses the inline form entirely.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Categories {
    pub common: atom::Common,
    pub fixed: bool,
    pub scheme: Option<String>,
    pub href: Option<String>,
    pub categories: Vec<atom::Category>,
}

static CATEGORIES_DISPATCH: LazyLock<Dispatch> = LazyLock::new(|| {
    Dispatch::new().entry("category", |e| Box::new(atom::Category::from_xml(e)))
});

impl FromXml for Categories {
    fn dispatch() -> &'static Dispatch {
        &CATEGORIES_DISPATCH
    }

    fn gather(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        if let Some(href) = element.attr_local("href") {
            fields.set("href", href.to_string());
        } else {
            let fixed = element
                .attr_local("fixed")
                .is_some_and(|v| v.eq_ignore_ascii_case("yes"));
            fields.set("fixed", fixed);
            if let Some(scheme) = element.attr_local("scheme") {
                fields.set("scheme", scheme.to_string());
            }
            for child in &element.children {
                if child.tag == atom::qname("category") {
                    fields.push_boxed("categories", dispatch.decode("category", child));
                }
            }
        }
        atom::Common::gather(element, dispatch, fields);
    }

    fn build(fields: &mut FieldSet) -> Self {
        Self {
            fixed: fields.take("fixed").unwrap_or(false),
            scheme: fields.take("scheme"),
            href: fields.take("href"),
            categories: fields.take_vec("categories"),
            common: atom::Common::build(fields),
        }
    }
}

impl ToXml for Categories {
    fn standard_tag(&self) -> Option<QName> {
        Some(qname("categories"))
    }

    fn populate(&self, element: &mut Element) -> Result<()> {
        self.common.populate(element);
        if let Some(href) = &self.href {
            element.set_attr(QName::unqualified("href"), href);
            return Ok(());
        }
        if self.fixed {
            element.set_attr(QName::unqualified("fixed"), "yes");
        }
        if let Some(scheme) = &self.scheme {
            element.set_attr(QName::unqualified("scheme"), scheme);
        }
        for category in &self.categories {
            category.encode_into(element, atom::qname("category"))?;
        }
        Ok(())
    }
}

impl Document for Categories {
    fn document_tag() -> QName {
        qname("categories")
    }

    fn content_type() -> &'static str {
        "application/atomcat+xml"
    }
}

/// 8.3.4. The `app:accept` element
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Accept {
    pub common: atom::Common,
    pub media_range: Option<String>,
}

impl Accept {
    pub fn media_range(media_range: impl Into<String>) -> Self {
        Self {
            media_range: Some(media_range.into()),
            ..Self::default()
        }
    }
}

impl FromXml for Accept {
    fn gather(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        if let Some(media_range) = element.first_text() {
            fields.set("media_range", media_range.to_string());
        }
        atom::Common::gather(element, dispatch, fields);
    }

    fn build(fields: &mut FieldSet) -> Self {
        Self {
            media_range: fields.take("media_range"),
            common: atom::Common::build(fields),
        }
    }
}

impl ToXml for Accept {
    fn standard_tag(&self) -> Option<QName> {
        Some(qname("accept"))
    }

    fn populate(&self, element: &mut Element) -> Result<()> {
        self.common.populate(element);
        if let Some(media_range) = &self.media_range {
            element.set_text(media_range);
        }
        Ok(())
    }
}

/// 8.3.3. The `app:collection` element
///
/// Requires href and title when encoded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Collection {
    pub common: atom::Common,
    pub href: Option<String>,
    pub title: Option<atom::Text>,
    pub accept: Vec<Accept>,
    pub categories: Vec<Categories>,
}

static COLLECTION_DISPATCH: LazyLock<Dispatch> = LazyLock::new(|| {
    Dispatch::new()
        .entry("title", |e| Box::new(atom::Text::from_xml(e)))
        .entry("accept", |e| Box::new(Accept::from_xml(e)))
        .entry("categories", |e| Box::new(Categories::from_xml(e)))
});

impl FromXml for Collection {
    fn dispatch() -> &'static Dispatch {
        &COLLECTION_DISPATCH
    }

    fn gather(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        if let Some(href) = element.attr_local("href") {
            fields.set("href", href.to_string());
        }
        for child in &element.children {
            if child.tag == atom::qname("title") {
                fields.set_boxed("title", dispatch.decode("title", child));
            } else if child.tag == qname("accept") {
                fields.push_boxed("accept", dispatch.decode("accept", child));
            } else if child.tag == qname("categories") {
                fields.push_boxed("categories", dispatch.decode("categories", child));
            }
        }
        atom::Common::gather(element, dispatch, fields);
    }

    fn build(fields: &mut FieldSet) -> Self {
        Self {
            href: fields.take("href"),
            title: fields.take("title"),
            accept: fields.take_vec("accept"),
            categories: fields.take_vec("categories"),
            common: atom::Common::build(fields),
        }
    }
}

impl ToXml for Collection {
    fn standard_tag(&self) -> Option<QName> {
        Some(qname("collection"))
    }

    fn populate(&self, element: &mut Element) -> Result<()> {
        require(&self.href, "app::Collection", "href")?;
        require(&self.title, "app::Collection", "title")?;
        self.common.populate(element);
        if let Some(href) = &self.href {
            element.set_attr(QName::unqualified("href"), href);
        }
        if let Some(title) = &self.title {
            title.encode_into(element, atom::qname("title"))?;
        }
        for accept in &self.accept {
            accept.encode_into(element, qname("accept"))?;
        }
        for categories in &self.categories {
            categories.encode_into(element, qname("categories"))?;
        }
        Ok(())
    }
}

/// 8.3.2. The `app:workspace` element
///
/// Requires a title when encoded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Workspace {
    pub common: atom::Common,
    pub title: Option<atom::Text>,
    pub collections: Vec<Collection>,
}

static WORKSPACE_DISPATCH: LazyLock<Dispatch> = LazyLock::new(|| {
    Dispatch::new()
        .entry("title", |e| Box::new(atom::Text::from_xml(e)))
        .entry("collection", |e| Box::new(Collection::from_xml(e)))
});

impl FromXml for Workspace {
    fn dispatch() -> &'static Dispatch {
        &WORKSPACE_DISPATCH
    }

    fn gather(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        for child in &element.children {
            if child.tag == atom::qname("title") {
                fields.set_boxed("title", dispatch.decode("title", child));
            } else if child.tag == qname("collection") {
                fields.push_boxed("collections", dispatch.decode("collection", child));
            }
        }
        atom::Common::gather(element, dispatch, fields);
    }

    fn build(fields: &mut FieldSet) -> Self {
        Self {
            title: fields.take("title"),
            collections: fields.take_vec("collections"),
            common: atom::Common::build(fields),
        }
    }
}

impl ToXml for Workspace {
    fn standard_tag(&self) -> Option<QName> {
        Some(qname("workspace"))
    }

    fn populate(&self, element: &mut Element) -> Result<()> {
        require(&self.title, "app::Workspace", "title")?;
        self.common.populate(element);
        if let Some(title) = &self.title {
            title.encode_into(element, atom::qname("title"))?;
        }
        for collection in &self.collections {
            collection.encode_into(element, qname("collection"))?;
        }
        Ok(())
    }
}

/// 8.3.1. The `app:service` element and document
///
/// Requires at least one workspace when encoded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Service {
    pub common: atom::Common,
    pub workspaces: Vec<Workspace>,
}

static SERVICE_DISPATCH: LazyLock<Dispatch> = LazyLock::new(|| {
    Dispatch::new().entry("workspace", |e| Box::new(Workspace::from_xml(e)))
});

impl Service {
    /// Gather stage shared with the service types that extend this one
    pub fn gather_service(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        for child in &element.children {
            if child.tag == qname("workspace") {
                fields.push_boxed("workspaces", dispatch.decode("workspace", child));
            }
        }
        atom::Common::gather(element, dispatch, fields);
    }

    /// Populate stage below the required-field check, shared with
    /// extending service types
    pub fn populate_service(&self, element: &mut Element) -> Result<()> {
        self.common.populate(element);
        for workspace in &self.workspaces {
            workspace.encode_into(element, qname("workspace"))?;
        }
        Ok(())
    }

    pub(crate) fn check_required(&self, type_name: &'static str) -> Result<()> {
        require_some(&self.workspaces, type_name, "workspaces")
    }
}

impl FromXml for Service {
    fn dispatch() -> &'static Dispatch {
        &SERVICE_DISPATCH
    }

    fn gather(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        Self::gather_service(element, dispatch, fields);
    }

    fn build(fields: &mut FieldSet) -> Self {
        Self {
            workspaces: fields.take_vec("workspaces"),
            common: atom::Common::build(fields),
        }
    }
}

impl ToXml for Service {
    fn standard_tag(&self) -> Option<QName> {
        Some(qname("service"))
    }

    fn populate(&self, element: &mut Element) -> Result<()> {
        self.check_required("app::Service")?;
        self.populate_service(element)
    }
}

impl Document for Service {
    fn document_tag() -> QName {
        qname("service")
    }

    fn content_type() -> &'static str {
        "application/atomsvc+xml"
    }
}

/// 8.3.5. An `atom:source` carrying the app:collection it came from
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Source {
    pub source: atom::Source,
    pub collection: Option<Collection>,
}

static SOURCE_DISPATCH: LazyLock<Dispatch> = LazyLock::new(|| {
    Dispatch::inherit(atom::Source::dispatch())
        .entry("collection", |e| Box::new(Collection::from_xml(e)))
});

impl FromXml for Source {
    fn dispatch() -> &'static Dispatch {
        &SOURCE_DISPATCH
    }

    fn gather(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        for child in &element.children {
            if child.tag == qname("collection") {
                fields.set_boxed("collection", dispatch.decode("collection", child));
            }
        }
        atom::Source::gather(element, dispatch, fields);
    }

    fn build(fields: &mut FieldSet) -> Self {
        Self {
            collection: fields.take("collection"),
            source: atom::Source::build(fields),
        }
    }
}

impl ToXml for Source {
    fn standard_tag(&self) -> Option<QName> {
        Some(atom::qname("source"))
    }

    fn populate(&self, element: &mut Element) -> Result<()> {
        self.source.populate(element)?;
        if let Some(collection) = &self.collection {
            collection.encode_into(element, qname("collection"))?;
        }
        Ok(())
    }
}

/// An `atom:entry` whose source element is the app-extended one
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Entry {
    pub meta: atom::Meta,
    pub content: Option<atom::Content>,
    pub published: Option<atom::Date>,
    pub source: Option<Source>,
    pub summary: Option<atom::Text>,
}

static ENTRY_DISPATCH: LazyLock<Dispatch> = LazyLock::new(|| {
    Dispatch::inherit(atom::Entry::dispatch()).entry("source", |e| Box::new(Source::from_xml(e)))
});

impl Entry {
    pub(crate) fn check_required(&self, type_name: &'static str) -> Result<()> {
        require(&self.meta.id, type_name, "id")?;
        require(&self.meta.title, type_name, "title")?;
        require(&self.meta.updated, type_name, "updated")?;
        Ok(())
    }

    /// Populate stage below the required-field check, shared with
    /// extending entry types
    pub fn populate_entry(&self, element: &mut Element) -> Result<()> {
        self.meta.populate(element)?;
        if let Some(content) = &self.content {
            content.encode_into(element, atom::qname("content"))?;
        }
        if let Some(published) = &self.published {
            published.encode_into(element, atom::qname("published"))?;
        }
        if let Some(source) = &self.source {
            source.encode_into(element, atom::qname("source"))?;
        }
        if let Some(summary) = &self.summary {
            summary.encode_into(element, atom::qname("summary"))?;
        }
        Ok(())
    }
}

impl FromXml for Entry {
    fn dispatch() -> &'static Dispatch {
        &ENTRY_DISPATCH
    }

    fn gather(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        atom::Entry::gather_entry(element, dispatch, fields);
    }

    fn build(fields: &mut FieldSet) -> Self {
        Self {
            content: fields.take("content"),
            published: fields.take("published"),
            source: fields.take("source"),
            summary: fields.take("summary"),
            meta: atom::Meta::build(fields),
        }
    }
}

impl ToXml for Entry {
    fn standard_tag(&self) -> Option<QName> {
        Some(atom::qname("entry"))
    }

    fn populate(&self, element: &mut Element) -> Result<()> {
        self.check_required("app::Entry")?;
        self.populate_entry(element)
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

impl atom::HasLinks for Entry {
    fn links(&self) -> &[atom::Link] {
        &self.meta.links
    }

    fn links_mut(&mut self) -> &mut Vec<atom::Link> {
        &mut self.meta.links
    }
}

/// An `atom:feed` with app-extended entries and its app:collection
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Feed {
    pub source: atom::Source,
    pub collection: Option<Collection>,
    pub entries: Vec<Entry>,
}

static FEED_DISPATCH: LazyLock<Dispatch> = LazyLock::new(|| {
    Dispatch::inherit(atom::Feed::dispatch())
        .entry("entry", |e| Box::new(Entry::from_xml(e)))
        .entry("collection", |e| Box::new(Collection::from_xml(e)))
});

impl Feed {
    /// Gather stage shared with the feed types that extend this one
    pub fn gather_app_feed(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        for child in &element.children {
            if child.tag == qname("collection") {
                fields.set_boxed("collection", dispatch.decode("collection", child));
            }
        }
        atom::Feed::gather_feed(element, dispatch, fields);
    }

    pub(crate) fn check_required(&self, type_name: &'static str) -> Result<()> {
        require(&self.source.meta.id, type_name, "id")?;
        require(&self.source.meta.title, type_name, "title")?;
        require(&self.source.meta.updated, type_name, "updated")?;
        Ok(())
    }

    /// Populate stage below the required-field check, shared with
    /// extending feed types
    pub fn populate_feed(&self, element: &mut Element) -> Result<()> {
        self.source.populate(element)?;
        for entry in &self.entries {
            entry.encode_into(element, atom::qname("entry"))?;
        }
        if let Some(collection) = &self.collection {
            collection.encode_into(element, qname("collection"))?;
        }
        Ok(())
    }
}

impl FromXml for Feed {
    fn dispatch() -> &'static Dispatch {
        &FEED_DISPATCH
    }

    fn gather(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        Self::gather_app_feed(element, dispatch, fields);
    }

    fn build(fields: &mut FieldSet) -> Self {
        Self {
            collection: fields.take("collection"),
            entries: fields.take_vec("entries"),
            source: atom::Source::build(fields),
        }
    }
}

impl ToXml for Feed {
    fn standard_tag(&self) -> Option<QName> {
        Some(atom::qname("feed"))
    }

    fn populate(&self, element: &mut Element) -> Result<()> {
        self.check_required("app::Feed")?;
        self.populate_feed(element)
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

impl atom::HasLinks for Feed {
    fn links(&self) -> &[atom::Link] {
        &self.source.meta.links
    }

    fn links_mut(&mut self) -> &mut Vec<atom::Link> {
        &mut self.source.meta.links
    }
}
