//! Account configuration
//!
//! Lives here because it is anchored in app:service documents: a set of
//! `aconf:link` pointers to the configuration services of an account,
//! plus certificate lists.

use std::sync::LazyLock;

use crate::app;
use crate::bind::{Dispatch, Document, FieldSet, FromXml, ToXml};
use crate::error::Result;
use crate::xml::name::{QName, XML_NS};
use crate::xml::Element;

/// The account-configuration namespace
pub const NS: &str = "http://www.alipedis.com/2012/aconf";

/// Qualified name in the account-configuration namespace
pub fn qname(local: &str) -> QName {
    QName::new(NS, local)
}

/// The `aconf:link` element.
///
/// A slimmed-down link: the rel attribute defines the expectations, so
/// only href, rel and an optional xml:base survive here.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Link {
    pub href: Option<String>,
    pub rel: Option<String>,
    pub base: Option<String>,
}

impl FromXml for Link {
    fn gather(element: &Element, _dispatch: &Dispatch, fields: &mut FieldSet) {
        if let Some(href) = element.attr_local("href") {
            fields.set("href", href.to_string());
        }
        if let Some(rel) = element.attr_local("rel") {
            fields.set("rel", rel.to_string());
        }
        if let Some(base) = element.attr(&QName::new(XML_NS, "base")) {
            fields.set("base", base.to_string());
        }
    }

    fn build(fields: &mut FieldSet) -> Self {
        Self {
            href: fields.take("href"),
            rel: fields.take("rel"),
            base: fields.take("base"),
        }
    }
}

impl ToXml for Link {
    fn standard_tag(&self) -> Option<QName> {
        Some(qname("link"))
    }

    fn populate(&self, element: &mut Element) -> Result<()> {
        if let Some(href) = &self.href {
            element.set_attr(QName::unqualified("href"), href);
        }
        if let Some(rel) = &self.rel {
            element.set_attr(QName::unqualified("rel"), rel);
        }
        if let Some(base) = &self.base {
            element.set_attr(QName::new(XML_NS, "base"), base);
        }
        Ok(())
    }
}

/// The `aconf:certificate` element
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

/// The `aconf:certificates` element; can be its own document
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
        "application/x-aconf+xml;type=certificates"
    }
}

/// An app:service document with account-configuration links
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Service {
    pub service: app::Service,
    pub links: Vec<Link>,
}

static SERVICE_DISPATCH: LazyLock<Dispatch> = LazyLock::new(|| {
    Dispatch::inherit(app::Service::dispatch()).entry("link", |e| Box::new(Link::from_xml(e)))
});

impl Service {
    /// The href of the first configuration link with this rel
    pub fn get_link(&self, rel: &str) -> Option<&str> {
        self.links
            .iter()
            .find(|link| link.rel.as_deref() == Some(rel))
            .and_then(|link| link.href.as_deref())
    }
}

impl FromXml for Service {
    fn dispatch() -> &'static Dispatch {
        &SERVICE_DISPATCH
    }

    fn gather(element: &Element, dispatch: &Dispatch, fields: &mut FieldSet) {
        for child in &element.children {
            if child.tag == qname("link") {
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
        self.service.check_required("aconf::Service")?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_document;

    #[test]
    fn test_link_keeps_xml_base() {
        let element = parse_document(
            r#"<link xmlns="http://www.alipedis.com/2012/aconf"
                     href="settings" rel="urn:aconf:settings"
                     xml:base="http://example.com/conf/"/>"#,
        )
        .unwrap();
        let link = Link::from_xml(&element);
        assert_eq!(link.base.as_deref(), Some("http://example.com/conf/"));

        let encoded = link.encode_root().unwrap();
        assert_eq!(Link::from_xml(&encoded), link);
    }

    #[test]
    fn test_service_collects_aconf_links_only() {
        let element = parse_document(
            r#"<service xmlns="http://www.w3.org/2007/app"
                        xmlns:atom="http://www.w3.org/2005/Atom"
                        xmlns:aconf="http://www.alipedis.com/2012/aconf">
                 <aconf:link rel="urn:aconf:settings" href="http://example.com/s"/>
                 <atom:link rel="self" href="http://example.com/ignored"/>
               </service>"#,
        )
        .unwrap();
        let service = Service::from_xml(&element);
        assert_eq!(service.links.len(), 1);
        assert_eq!(
            service.get_link("urn:aconf:settings"),
            Some("http://example.com/s")
        );
    }
}
