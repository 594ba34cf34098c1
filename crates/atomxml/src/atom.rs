//! Atom Syndication Format constructs
//!
//! The document you are looking for is RFC 4287. Every construct decodes
//! generously (missing pieces become `None`/empty) and checks its
//! vocabulary-required fields only when encoding.

use std::sync::LazyLock;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use time::OffsetDateTime;

use crate::bind::{require, Dispatch, Document, FieldSet, FromXml, ToXml};
use crate::error::Result;
use crate::timestamp;
use crate::xml::name::{QName, XHTML_NS, XML_NS};
use crate::xml::{writer, Element};

/// The Atom namespace
pub const NS: &str = "http://www.w3.org/2005/Atom";

/// Qualified name in the Atom namespace
pub fn qname(local: &str) -> QName {
    QName::new(NS, local)
}

fn xhtml_div() -> QName {
    QName::new(XHTML_NS, "div")
}

/// Attributes common to every Atom construct: xml:base and xml:lang
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Common {
    pub base: Option<String>,
    pub lang: Option<String>,
}

impl Common {
    /// Write the common attributes; the first step of every populate
    /// chain.
    pub fn populate(&self, element: &mut Element) {
        if let Some(base) = &self.base {
            element.set_attr(QName::new(XML_NS, "base"), base);
        }
        if let Some(lang) = &self.lang {
            element.set_attr(QName::new(XML_NS, "lang"), lang);
        }
    }
}

impl FromXml for Common {
    fn gather(element: &Element, _dispatch: &Dispatch, fields: &mut FieldSet) {
        if let Some(base) = element.attr(&QName::new(XML_NS, "base")) {
            fields.set("base", base.to_string());
        }
        if let Some(lang) = element.attr(&QName::new(XML_NS, "lang")) {
            fields.set("lang", lang.to_string());
        }
    }

    fn build(fields: &mut FieldSet) -> Self {
        Self {
            base: fields.take("base"),
            lang: fields.take("lang"),
        }
    }
}

/// Discriminator of a text construct
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextKind {
    #[default]
    Text,
    Html,
    Xhtml,
}

impl TextKind {
    /// Read the `type` attribute; unrecognized labels read as plain text
    fn from_attr(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("html") => Self::Html,
            Some("xhtml") => Self::Xhtml,
            _ => Self::Text,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Html => "html",
            Self::Xhtml => "xhtml",
        }
    }
}

/// Content of a text construct: a flat string or an xhtml:div subtree
#[derive(Clone, Debug, PartialEq)]
pub enum TextContent {
    Plain(String),
    Markup(Element),
}

/// 3.1. Text constructs
///
/// For `text` and `html` the content is one flat string (direct text
/// plus any serialized child markup). For `xhtml` it is the xhtml:div
/// container, unwrapped on decode and re-emitted on encode.
///
/// The text is never sanitized; check it yourself before doing anything
/// dangerous with it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Text {
    pub common: Common,
    pub kind: TextKind,
    pub content: Option<TextContent>,
}

impl Text {
    /// Plain-text construct
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            kind: TextKind::Text,
            content: Some(TextContent::Plain(text.into())),
            ..Self::default()
        }
    }

    /// The content as a flat string, if it is one
    pub fn as_plain(&self) -> Option<&str> {
        match &self.content {
            Some(TextContent::Plain(text)) => Some(text),
            _ => None,
        }
    }
}

impl FromXml for Text {
    fn gather(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        let kind = TextKind::from_attr(element.attr_local("type"));
        fields.set("kind", kind);
        let content = match kind {
            TextKind::Text | TextKind::Html => element.flattened().map(TextContent::Plain),
            TextKind::Xhtml => Some(TextContent::Markup(element.wrapped(xhtml_div()))),
        };
        if let Some(content) = content {
            fields.set("content", content);
        }
        Common::gather(element, dispatch, fields);
    }

    fn build(fields: &mut FieldSet) -> Self {
        Self {
            kind: fields.take("kind").unwrap_or_default(),
            content: fields.take("content"),
            common: Common::build(fields),
        }
    }
}

impl ToXml for Text {
    fn populate(&self, element: &mut Element) -> Result<()> {
        self.common.populate(element);
        element.set_attr(QName::unqualified("type"), self.kind.as_str());
        match (self.kind, &self.content) {
            (TextKind::Xhtml, Some(TextContent::Markup(div))) => {
                element.children.push(div.clone());
            }
            (TextKind::Xhtml, Some(TextContent::Plain(text))) => {
                element.new_child(xhtml_div()).set_text(text);
            }
            (TextKind::Xhtml, None) => {
                element.new_child(xhtml_div());
            }
            (_, Some(TextContent::Plain(text))) => {
                if !text.is_empty() {
                    element.set_text(text);
                }
            }
            (_, Some(TextContent::Markup(markup))) => {
                element.set_text(writer::element_string(markup));
            }
            (_, None) => {}
        }
        Ok(())
    }
}

/// 3.2. Person constructs
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Person {
    pub common: Common,
    pub name: Option<String>,
    pub uri: Option<String>,
    pub email: Option<String>,
}

impl Person {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

impl FromXml for Person {
    fn gather(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        for child in &element.children {
            if child.tag == qname("name") {
                if let Some(name) = child.first_text() {
                    fields.set("name", name.to_string());
                }
            } else if child.tag == qname("uri") {
                if let Some(uri) = child.first_text() {
                    fields.set("uri", uri.to_string());
                }
            } else if child.tag == qname("email") {
                if let Some(email) = child.first_text() {
                    fields.set("email", email.to_string());
                }
            }
        }
        Common::gather(element, dispatch, fields);
    }

    fn build(fields: &mut FieldSet) -> Self {
        Self {
            name: fields.take("name"),
            uri: fields.take("uri"),
            email: fields.take("email"),
            common: Common::build(fields),
        }
    }
}

impl ToXml for Person {
    fn populate(&self, element: &mut Element) -> Result<()> {
        require(&self.name, "atom::Person", "name")?;
        self.common.populate(element);
        if let Some(name) = &self.name {
            element.append_text_child(qname("name"), name);
        }
        if let Some(uri) = &self.uri {
            element.append_text_child(qname("uri"), uri);
        }
        if let Some(email) = &self.email {
            element.append_text_child(qname("email"), email);
        }
        Ok(())
    }
}

/// 3.3. Date constructs
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Date {
    pub common: Common,
    pub timestamp: Option<OffsetDateTime>,
}

impl Date {
    pub fn now() -> Self {
        OffsetDateTime::now_utc().into()
    }
}

impl From<OffsetDateTime> for Date {
    fn from(timestamp: OffsetDateTime) -> Self {
        Self {
            common: Common::default(),
            timestamp: Some(timestamp),
        }
    }
}

impl FromXml for Date {
    fn gather(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        if let Some(ts) = element.first_text().and_then(timestamp::parse) {
            fields.set("timestamp", ts);
        }
        Common::gather(element, dispatch, fields);
    }

    fn build(fields: &mut FieldSet) -> Self {
        Self {
            timestamp: fields.take("timestamp"),
            common: Common::build(fields),
        }
    }
}

impl ToXml for Date {
    fn populate(&self, element: &mut Element) -> Result<()> {
        require(&self.timestamp, "atom::Date", "timestamp")?;
        self.common.populate(element);
        if let Some(ts) = self.timestamp {
            element.set_text(timestamp::format(ts));
        }
        Ok(())
    }
}

/// Content of an `atom:content` element
#[derive(Clone, Debug, PartialEq)]
pub enum ContentValue {
    Plain(String),
    Markup(Element),
    Binary(Vec<u8>),
}

const XML_MEDIA_TYPES: [&str; 5] = [
    "text/xml",
    "application/xml",
    "text/xml-external-parsed-entity",
    "application/xml-external-parsed-entity",
    "application/xml-dtd",
];

fn is_xml_media_type(kind: &str) -> bool {
    XML_MEDIA_TYPES.contains(&kind) || kind.ends_with("+xml") || kind.ends_with("/xml")
}

/// 4.1.3. The `atom:content` element
///
/// Either inline content of some media type or, with `src` set, a
/// pointer to the content living elsewhere. `kind` is the `type`
/// attribute: `text`/`html`/`xhtml` or a media type. Textual content is
/// a flat string, XML content is an element subtree, anything else is
/// raw bytes carried base64-encoded on the wire.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Content {
    pub common: Common,
    pub kind: Option<String>,
    pub src: Option<String>,
    pub value: Option<ContentValue>,
}

impl Content {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            kind: Some("text".to_string()),
            value: Some(ContentValue::Plain(text.into())),
            ..Self::default()
        }
    }

    /// Does the content need base-64 encoding on the wire?
    pub fn is_binary(&self) -> bool {
        let Some(kind) = self.kind.as_deref() else {
            return false;
        };
        self.src.is_none()
            && !matches!(kind, "text" | "html" | "xhtml")
            && !is_xml_media_type(kind)
            && !kind.starts_with("text/")
    }
}

impl FromXml for Content {
    fn gather(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        let kind = element
            .attr_local("type")
            .map_or_else(|| "text".to_string(), str::to_ascii_lowercase);
        let src = element.attr_local("src").map(str::to_string);
        let value = if src.is_some() {
            None
        } else if matches!(kind.as_str(), "text" | "html") {
            element.flattened().map(ContentValue::Plain)
        } else if kind == "xhtml" {
            Some(ContentValue::Markup(element.wrapped(xhtml_div())))
        } else if is_xml_media_type(&kind) {
            // a single child is the content; anything more complex is
            // captured as the content element itself
            match (element.children.as_slice(), &element.text) {
                ([only], None) => Some(ContentValue::Markup(only.clone())),
                _ => Some(ContentValue::Markup(element.clone())),
            }
        } else if kind.starts_with("text/") {
            element.flattened().map(ContentValue::Plain)
        } else {
            element
                .first_text()
                .and_then(|text| {
                    let compact: String = text.split_whitespace().collect();
                    BASE64.decode(compact).ok()
                })
                .map(ContentValue::Binary)
        };

        fields.set("kind", kind);
        if let Some(src) = src {
            fields.set("src", src);
        }
        if let Some(value) = value {
            fields.set("value", value);
        }
        Common::gather(element, dispatch, fields);
    }

    fn build(fields: &mut FieldSet) -> Self {
        Self {
            kind: fields.take("kind"),
            src: fields.take("src"),
            value: fields.take("value"),
            common: Common::build(fields),
        }
    }
}

impl ToXml for Content {
    fn standard_tag(&self) -> Option<QName> {
        Some(qname("content"))
    }

    fn populate(&self, element: &mut Element) -> Result<()> {
        self.common.populate(element);
        if let Some(kind) = &self.kind {
            element.set_attr(QName::unqualified("type"), kind);
        }
        if let Some(src) = &self.src {
            element.set_attr(QName::unqualified("src"), src);
            return Ok(());
        }

        let kind = self.kind.as_deref().unwrap_or("text");
        if kind == "xhtml" || is_xml_media_type(kind) {
            match &self.value {
                Some(ContentValue::Markup(markup)) => {
                    if markup.tag == element.tag {
                        element.text = markup.text.clone();
                        element.children.extend(markup.children.iter().cloned());
                    } else {
                        element.children.push(markup.clone());
                    }
                }
                Some(ContentValue::Plain(text)) => element.set_text(text),
                Some(ContentValue::Binary(_)) | None => {}
            }
        } else if matches!(kind, "text" | "html") || kind.starts_with("text/") {
            match &self.value {
                Some(ContentValue::Plain(text)) => element.set_text(text),
                Some(ContentValue::Markup(markup)) => {
                    element.set_text(writer::element_string(markup));
                }
                Some(ContentValue::Binary(_)) | None => {}
            }
        } else {
            match &self.value {
                Some(ContentValue::Binary(bytes)) => element.set_text(BASE64.encode(bytes)),
                Some(ContentValue::Plain(text)) => element.set_text(text),
                Some(ContentValue::Markup(_)) | None => {}
            }
        }
        Ok(())
    }
}

/// 4.2.2. The `atom:category` element
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Category {
    pub common: Common,
    pub term: Option<String>,
    pub scheme: Option<String>,
    pub label: Option<String>,
}

impl Category {
    pub fn term(term: impl Into<String>) -> Self {
        Self {
            term: Some(term.into()),
            ..Self::default()
        }
    }
}

impl FromXml for Category {
    fn gather(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        if let Some(term) = element.attr_local("term") {
            fields.set("term", term.to_string());
        }
        if let Some(scheme) = element.attr_local("scheme") {
            fields.set("scheme", scheme.to_string());
        }
        if let Some(label) = element.attr_local("label") {
            fields.set("label", label.to_string());
        }
        Common::gather(element, dispatch, fields);
    }

    fn build(fields: &mut FieldSet) -> Self {
        Self {
            term: fields.take("term"),
            scheme: fields.take("scheme"),
            label: fields.take("label"),
            common: Common::build(fields),
        }
    }
}

impl ToXml for Category {
    fn standard_tag(&self) -> Option<QName> {
        Some(qname("category"))
    }

    fn populate(&self, element: &mut Element) -> Result<()> {
        self.common.populate(element);
        element.set_attr(
            QName::unqualified("term"),
            self.term.clone().unwrap_or_default(),
        );
        if let Some(scheme) = &self.scheme {
            element.set_attr(QName::unqualified("scheme"), scheme);
        }
        if let Some(label) = &self.label {
            element.set_attr(QName::unqualified("label"), label);
        }
        Ok(())
    }
}

/// 4.2.4. The `atom:generator` element
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Generator {
    pub common: Common,
    pub text: Option<String>,
    pub uri: Option<String>,
    pub version: Option<String>,
}

impl FromXml for Generator {
    fn gather(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        if let Some(text) = element.flattened() {
            fields.set("text", text);
        }
        if let Some(uri) = element.attr_local("uri") {
            fields.set("uri", uri.to_string());
        }
        if let Some(version) = element.attr_local("version") {
            fields.set("version", version.to_string());
        }
        Common::gather(element, dispatch, fields);
    }

    fn build(fields: &mut FieldSet) -> Self {
        Self {
            text: fields.take("text"),
            uri: fields.take("uri"),
            version: fields.take("version"),
            common: Common::build(fields),
        }
    }
}

impl ToXml for Generator {
    fn standard_tag(&self) -> Option<QName> {
        Some(qname("generator"))
    }

    fn populate(&self, element: &mut Element) -> Result<()> {
        self.common.populate(element);
        if let Some(text) = &self.text {
            element.set_text(text);
        }
        if let Some(uri) = &self.uri {
            element.set_attr(QName::unqualified("uri"), uri);
        }
        if let Some(version) = &self.version {
            element.set_attr(QName::unqualified("version"), version);
        }
        Ok(())
    }
}

/// 4.2.7. The `atom:link` element
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Link {
    pub common: Common,
    pub href: Option<String>,
    pub rel: Option<String>,
    pub media_type: Option<String>,
    pub hreflang: Option<String>,
    pub title: Option<String>,
    pub length: Option<u64>,
}

impl Link {
    pub fn new(href: impl Into<String>, rel: impl Into<String>) -> Self {
        Self {
            href: Some(href.into()),
            rel: Some(rel.into()),
            ..Self::default()
        }
    }
}

impl FromXml for Link {
    fn gather(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        if let Some(href) = element.attr_local("href") {
            fields.set("href", href.to_string());
        }
        if let Some(rel) = element.attr_local("rel") {
            fields.set("rel", rel.to_string());
        }
        if let Some(media_type) = element.attr_local("type") {
            fields.set("media_type", media_type.to_string());
        }
        if let Some(hreflang) = element.attr_local("hreflang") {
            fields.set("hreflang", hreflang.to_string());
        }
        if let Some(title) = element.attr_local("title") {
            fields.set("title", title.to_string());
        }
        if let Some(length) = element.attr_local("length").and_then(|v| v.parse::<u64>().ok()) {
            fields.set("length", length);
        }
        Common::gather(element, dispatch, fields);
    }

    fn build(fields: &mut FieldSet) -> Self {
        Self {
            href: fields.take("href"),
            rel: fields.take("rel"),
            media_type: fields.take("media_type"),
            hreflang: fields.take("hreflang"),
            title: fields.take("title"),
            length: fields.take("length"),
            common: Common::build(fields),
        }
    }
}

impl ToXml for Link {
    fn standard_tag(&self) -> Option<QName> {
        Some(qname("link"))
    }

    fn populate(&self, element: &mut Element) -> Result<()> {
        self.common.populate(element);
        element.set_attr(
            QName::unqualified("href"),
            self.href.clone().unwrap_or_default(),
        );
        if let Some(rel) = &self.rel {
            element.set_attr(QName::unqualified("rel"), rel);
        }
        if let Some(media_type) = &self.media_type {
            element.set_attr(QName::unqualified("type"), media_type);
        }
        if let Some(hreflang) = &self.hreflang {
            element.set_attr(QName::unqualified("hreflang"), hreflang);
        }
        if let Some(title) = &self.title {
            element.set_attr(QName::unqualified("title"), title);
        }
        if let Some(length) = self.length {
            element.set_attr(QName::unqualified("length"), length.to_string());
        }
        Ok(())
    }
}

/// The link-collection protocol shared by everything that carries a
/// `links` list. Lookup is by relation type; insertion order is
/// preserved except where documented.
pub trait HasLinks {
    fn links(&self) -> &[Link];
    fn links_mut(&mut self) -> &mut Vec<Link>;

    /// The href of the first link with this relation
    fn get_link(&self, rel: &str) -> Option<&str> {
        self.links()
            .iter()
            .find(|link| link.rel.as_deref() == Some(rel))
            .and_then(|link| link.href.as_deref())
    }

    /// Alias of [`get_link`](Self::get_link)
    fn get_first_link(&self, rel: &str) -> Option<&str> {
        self.get_link(rel)
    }

    /// The hrefs of every link with this relation, in original order
    fn get_links(&self, rel: &str) -> Vec<&str> {
        self.links()
            .iter()
            .filter(|link| link.rel.as_deref() == Some(rel))
            .filter_map(|link| link.href.as_deref())
            .collect()
    }

    /// Drop every link with this relation and append one replacement at
    /// the end of the list
    fn replace_link(&mut self, rel: &str, href: &str) {
        self.remove_links(rel);
        self.links_mut().push(Link::new(href, rel));
    }

    /// Remove every link with this relation, keeping the rest in order
    fn remove_links(&mut self, rel: &str) {
        self.links_mut()
            .retain(|link| link.rel.as_deref() != Some(rel));
    }
}

/// Metadata shared by `atom:feed`, `atom:source` and `atom:entry`
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Meta {
    pub common: Common,
    pub authors: Vec<Person>,
    pub categories: Vec<Category>,
    pub contributors: Vec<Person>,
    pub id: Option<String>,
    pub links: Vec<Link>,
    pub rights: Option<Text>,
    pub title: Option<Text>,
    pub updated: Option<Date>,
}

static META_DISPATCH: LazyLock<Dispatch> = LazyLock::new(|| {
    Dispatch::new()
        .entry("author", |e| Box::new(Person::from_xml(e)))
        .entry("category", |e| Box::new(Category::from_xml(e)))
        .entry("contributor", |e| Box::new(Person::from_xml(e)))
        .entry("link", |e| Box::new(Link::from_xml(e)))
        .entry("rights", |e| Box::new(Text::from_xml(e)))
        .entry("title", |e| Box::new(Text::from_xml(e)))
        .entry("updated", |e| Box::new(Date::from_xml(e)))
});

impl Meta {
    /// Write the shared metadata children, after the common attributes
    pub fn populate(&self, element: &mut Element) -> Result<()> {
        self.common.populate(element);
        for author in &self.authors {
            author.encode_into(element, qname("author"))?;
        }
        for category in &self.categories {
            category.encode_into(element, qname("category"))?;
        }
        for contributor in &self.contributors {
            contributor.encode_into(element, qname("contributor"))?;
        }
        if let Some(id) = &self.id {
            element.append_text_child(qname("id"), id);
        }
        for link in &self.links {
            link.encode_into(element, qname("link"))?;
        }
        if let Some(rights) = &self.rights {
            rights.encode_into(element, qname("rights"))?;
        }
        if let Some(title) = &self.title {
            title.encode_into(element, qname("title"))?;
        }
        if let Some(updated) = &self.updated {
            updated.encode_into(element, qname("updated"))?;
        }
        Ok(())
    }
}

impl FromXml for Meta {
    fn dispatch() -> &'static Dispatch {
        &META_DISPATCH
    }

    fn gather(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        for child in &element.children {
            if child.tag == qname("author") {
                fields.push_boxed("authors", dispatch.decode("author", child));
            } else if child.tag == qname("category") {
                fields.push_boxed("categories", dispatch.decode("category", child));
            } else if child.tag == qname("contributor") {
                fields.push_boxed("contributors", dispatch.decode("contributor", child));
            } else if child.tag == qname("id") {
                if let Some(id) = child.first_text() {
                    fields.set("id", id.to_string());
                }
            } else if child.tag == qname("link") {
                fields.push_boxed("links", dispatch.decode("link", child));
            } else if child.tag == qname("rights") {
                fields.set_boxed("rights", dispatch.decode("rights", child));
            } else if child.tag == qname("title") {
                fields.set_boxed("title", dispatch.decode("title", child));
            } else if child.tag == qname("updated") {
                fields.set_boxed("updated", dispatch.decode("updated", child));
            }
        }
        Common::gather(element, dispatch, fields);
    }

    fn build(fields: &mut FieldSet) -> Self {
        Self {
            authors: fields.take_vec("authors"),
            categories: fields.take_vec("categories"),
            contributors: fields.take_vec("contributors"),
            id: fields.take("id"),
            links: fields.take_vec("links"),
            rights: fields.take("rights"),
            title: fields.take("title"),
            updated: fields.take("updated"),
            common: Common::build(fields),
        }
    }
}

impl HasLinks for Meta {
    fn links(&self) -> &[Link] {
        &self.links
    }

    fn links_mut(&mut self) -> &mut Vec<Link> {
        &mut self.links
    }
}

/// 4.2.11. The `atom:source` element
///
/// The feed metadata an entry keeps when it is copied out of its feed;
/// also the base of [`Feed`] itself.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Source {
    pub meta: Meta,
    pub generator: Option<Generator>,
    pub icon: Option<String>,
    pub logo: Option<String>,
    pub subtitle: Option<Text>,
}

static SOURCE_DISPATCH: LazyLock<Dispatch> = LazyLock::new(|| {
    Dispatch::inherit(Meta::dispatch())
        .entry("generator", |e| Box::new(Generator::from_xml(e)))
        .entry("subtitle", |e| Box::new(Text::from_xml(e)))
});

impl FromXml for Source {
    fn dispatch() -> &'static Dispatch {
        &SOURCE_DISPATCH
    }

    fn gather(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        for child in &element.children {
            if child.tag == qname("generator") {
                fields.set_boxed("generator", dispatch.decode("generator", child));
            } else if child.tag == qname("icon") {
                if let Some(icon) = child.first_text() {
                    fields.set("icon", icon.to_string());
                }
            } else if child.tag == qname("logo") {
                if let Some(logo) = child.first_text() {
                    fields.set("logo", logo.to_string());
                }
            } else if child.tag == qname("subtitle") {
                fields.set_boxed("subtitle", dispatch.decode("subtitle", child));
            }
        }
        Meta::gather(element, dispatch, fields);
    }

    fn build(fields: &mut FieldSet) -> Self {
        Self {
            generator: fields.take("generator"),
            icon: fields.take("icon"),
            logo: fields.take("logo"),
            subtitle: fields.take("subtitle"),
            meta: Meta::build(fields),
        }
    }
}

impl ToXml for Source {
    fn standard_tag(&self) -> Option<QName> {
        Some(qname("source"))
    }

    fn populate(&self, element: &mut Element) -> Result<()> {
        self.meta.populate(element)?;
        if let Some(generator) = &self.generator {
            generator.encode_into(element, qname("generator"))?;
        }
        if let Some(icon) = &self.icon {
            element.append_text_child(qname("icon"), icon);
        }
        if let Some(logo) = &self.logo {
            element.append_text_child(qname("logo"), logo);
        }
        if let Some(subtitle) = &self.subtitle {
            subtitle.encode_into(element, qname("subtitle"))?;
        }
        Ok(())
    }
}

impl HasLinks for Source {
    fn links(&self) -> &[Link] {
        &self.meta.links
    }

    fn links_mut(&mut self) -> &mut Vec<Link> {
        &mut self.meta.links
    }
}

/// 4.1.2. The `atom:entry` element
///
/// Requires id, title and updated when encoded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Entry {
    pub meta: Meta,
    pub content: Option<Content>,
    pub published: Option<Date>,
    pub source: Option<Source>,
    pub summary: Option<Text>,
}

static ENTRY_DISPATCH: LazyLock<Dispatch> = LazyLock::new(|| {
    Dispatch::inherit(Meta::dispatch())
        .entry("content", |e| Box::new(Content::from_xml(e)))
        .entry("published", |e| Box::new(Date::from_xml(e)))
        .entry("source", |e| Box::new(Source::from_xml(e)))
        .entry("summary", |e| Box::new(Text::from_xml(e)))
});

impl Entry {
    /// Gather stage shared with the entry types that extend this one
    pub fn gather_entry(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        for child in &element.children {
            if child.tag == qname("content") {
                fields.set_boxed("content", dispatch.decode("content", child));
            } else if child.tag == qname("published") {
                fields.set_boxed("published", dispatch.decode("published", child));
            } else if child.tag == qname("source") {
                fields.set_boxed("source", dispatch.decode("source", child));
            } else if child.tag == qname("summary") {
                fields.set_boxed("summary", dispatch.decode("summary", child));
            }
        }
        Meta::gather(element, dispatch, fields);
    }

    /// All authors, the entry's own first, then the source's
    pub fn authors(&self) -> Vec<&Person> {
        let mut authors: Vec<&Person> = self.meta.authors.iter().collect();
        if let Some(source) = &self.source {
            authors.extend(source.meta.authors.iter());
        }
        authors
    }

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
            content.encode_into(element, qname("content"))?;
        }
        if let Some(published) = &self.published {
            published.encode_into(element, qname("published"))?;
        }
        if let Some(source) = &self.source {
            source.encode_into(element, qname("source"))?;
        }
        if let Some(summary) = &self.summary {
            summary.encode_into(element, qname("summary"))?;
        }
        Ok(())
    }
}

impl FromXml for Entry {
    fn dispatch() -> &'static Dispatch {
        &ENTRY_DISPATCH
    }

    fn gather(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        Self::gather_entry(element, dispatch, fields);
    }

    fn build(fields: &mut FieldSet) -> Self {
        Self {
            content: fields.take("content"),
            published: fields.take("published"),
            source: fields.take("source"),
            summary: fields.take("summary"),
            meta: Meta::build(fields),
        }
    }
}

impl ToXml for Entry {
    fn standard_tag(&self) -> Option<QName> {
        Some(qname("entry"))
    }

    fn populate(&self, element: &mut Element) -> Result<()> {
        self.check_required("atom::Entry")?;
        self.populate_entry(element)
    }
}

impl Document for Entry {
    fn document_tag() -> QName {
        qname("entry")
    }

    fn content_type() -> &'static str {
        "application/atom+xml;type=entry"
    }
}

impl HasLinks for Entry {
    fn links(&self) -> &[Link] {
        &self.meta.links
    }

    fn links_mut(&mut self) -> &mut Vec<Link> {
        &mut self.meta.links
    }
}

/// 4.1.1. The `atom:feed` element
///
/// A [`Source`] with entries. Requires id, title and updated when
/// encoded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Feed {
    pub source: Source,
    pub entries: Vec<Entry>,
}

static FEED_DISPATCH: LazyLock<Dispatch> = LazyLock::new(|| {
    Dispatch::inherit(Source::dispatch()).entry("entry", |e| Box::new(Entry::from_xml(e)))
});

impl Feed {
    /// Gather stage shared with the feed types that extend this one
    pub fn gather_feed(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        for child in &element.children {
            if child.tag == qname("entry") {
                fields.push_boxed("entries", dispatch.decode("entry", child));
            }
        }
        Source::gather(element, dispatch, fields);
    }

    pub(crate) fn check_required(&self, type_name: &'static str) -> Result<()> {
        require(&self.source.meta.id, type_name, "id")?;
        require(&self.source.meta.title, type_name, "title")?;
        require(&self.source.meta.updated, type_name, "updated")?;
        Ok(())
    }
}

impl FromXml for Feed {
    fn dispatch() -> &'static Dispatch {
        &FEED_DISPATCH
    }

    fn gather(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        Self::gather_feed(element, dispatch, fields);
    }

    fn build(fields: &mut FieldSet) -> Self {
        Self {
            entries: fields.take_vec("entries"),
            source: Source::build(fields),
        }
    }
}

impl ToXml for Feed {
    fn standard_tag(&self) -> Option<QName> {
        Some(qname("feed"))
    }

    fn populate(&self, element: &mut Element) -> Result<()> {
        self.check_required("atom::Feed")?;
        self.source.populate(element)?;
        for entry in &self.entries {
            entry.encode_into(element, qname("entry"))?;
        }
        Ok(())
    }
}

impl Document for Feed {
    fn document_tag() -> QName {
        qname("feed")
    }

    fn content_type() -> &'static str {
        "application/atom+xml"
    }
}

impl HasLinks for Feed {
    fn links(&self) -> &[Link] {
        &self.source.meta.links
    }

    fn links_mut(&mut self) -> &mut Vec<Link> {
        &mut self.source.meta.links
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_document;

    fn links(pairs: &[(&str, &str)]) -> Vec<Link> {
        pairs.iter().map(|(href, rel)| Link::new(*href, *rel)).collect()
    }

    fn meta_with_links() -> Meta {
        Meta {
            links: links(&[("a", "self"), ("b", "alt"), ("c", "self")]),
            ..Meta::default()
        }
    }

    #[test]
    fn test_get_links_in_order() {
        let meta = meta_with_links();
        assert_eq!(meta.get_links("self"), ["a", "c"]);
        assert_eq!(meta.get_link("self"), Some("a"));
        assert_eq!(meta.get_first_link("alt"), Some("b"));
        assert_eq!(meta.get_link("missing"), None);
    }

    #[test]
    fn test_replace_link_appends_at_end() {
        let mut meta = meta_with_links();
        meta.replace_link("self", "z");
        assert_eq!(meta.links, links(&[("b", "alt"), ("z", "self")]));
    }

    #[test]
    fn test_remove_links_keeps_order() {
        let mut meta = meta_with_links();
        meta.remove_links("alt");
        assert_eq!(meta.links, links(&[("a", "self"), ("c", "self")]));
    }

    #[test]
    fn test_text_flattens_mixed_content() {
        let element = parse_document(
            r#"<title xmlns="http://www.w3.org/2005/Atom" type="text">one <b>two</b><i>three</i></title>"#,
        )
        .unwrap();
        let text = Text::from_xml(&element);
        assert_eq!(text.kind, TextKind::Text);
        assert_eq!(text.as_plain(), Some("one <b>two</b><i>three</i>"));
    }

    #[test]
    fn test_text_xhtml_unwraps_div() {
        let element = parse_document(
            r#"<title type="xhtml"><div xmlns="http://www.w3.org/1999/xhtml">hi</div></title>"#,
        )
        .unwrap();
        let text = Text::from_xml(&element);
        match &text.content {
            Some(TextContent::Markup(div)) => {
                assert_eq!(div.tag, QName::new(XHTML_NS, "div"));
                assert_eq!(div.first_text(), Some("hi"));
            }
            other => panic!("expected markup content, got {other:?}"),
        }
    }

    #[test]
    fn test_text_unknown_kind_reads_as_plain() {
        let element = parse_document(r#"<title type="markdown">*hi*</title>"#).unwrap();
        let text = Text::from_xml(&element);
        assert_eq!(text.kind, TextKind::Text);
        assert_eq!(text.as_plain(), Some("*hi*"));
    }

    #[test]
    fn test_person_decode_generous() {
        let element = parse_document(r#"<author xmlns="http://www.w3.org/2005/Atom"/>"#).unwrap();
        let person = Person::from_xml(&element);
        assert_eq!(person, Person::default());
    }

    #[test]
    fn test_person_encode_requires_name() {
        let person = Person::default();
        let err = person
            .encode_with(qname("author"))
            .unwrap_err();
        assert_eq!(
            err,
            crate::error::Error::Incomplete {
                type_name: "atom::Person",
                field: "name"
            }
        );
    }

    #[test]
    fn test_date_malformed_is_none() {
        let element = parse_document("<updated>not a date</updated>").unwrap();
        assert_eq!(Date::from_xml(&element).timestamp, None);
    }

    #[test]
    fn test_content_binary_round_trip() {
        let content = Content {
            kind: Some("image/png".to_string()),
            value: Some(ContentValue::Binary(vec![1, 2, 3, 254])),
            ..Content::default()
        };
        assert!(content.is_binary());
        let element = content.encode_with(qname("content")).unwrap();
        assert_eq!(Content::from_xml(&element), content);
    }

    #[test]
    fn test_content_src_suppresses_inline() {
        let element = parse_document(
            r#"<content type="image/png" src="http://example.com/i.png">ignored</content>"#,
        )
        .unwrap();
        let content = Content::from_xml(&element);
        assert_eq!(content.src.as_deref(), Some("http://example.com/i.png"));
        assert_eq!(content.value, None);
    }

    #[test]
    fn test_entry_ignores_unknown_children() {
        let element = parse_document(
            r#"<entry xmlns="http://www.w3.org/2005/Atom" xmlns:x="urn:x">
                 <id>urn:1</id>
                 <x:mystery>?</x:mystery>
               </entry>"#,
        )
        .unwrap();
        let entry = Entry::from_xml(&element);
        assert_eq!(entry.meta.id.as_deref(), Some("urn:1"));
    }

    #[test]
    fn test_entry_requires_most_derived_first() {
        // id missing fires before anything else is checked or written
        let entry = Entry::default();
        let err = entry.encode_root().unwrap_err();
        assert_eq!(
            err,
            crate::error::Error::Incomplete {
                type_name: "atom::Entry",
                field: "id"
            }
        );
    }
}
