//! Namespace-qualified names and the prefix registry

use std::fmt;
use std::sync::{LazyLock, Mutex};

use indexmap::IndexMap;

/// The xml: namespace, bound implicitly in every document
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// The XHTML namespace, container for xhtml text constructs
pub const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";

/// A namespace-qualified name: (namespace URI, local name).
///
/// This pair is the sole basis for tag and attribute equality. Prefixes
/// are presentation-only; they are resolved away during parsing and
/// assigned fresh during serialization, so two names compare equal
/// whenever URI and local part match, whatever prefixes the documents
/// used.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QName {
    pub ns: Option<String>,
    pub local: String,
}

impl QName {
    /// Name qualified by a namespace URI
    pub fn new(ns: &str, local: &str) -> Self {
        Self {
            ns: Some(ns.to_string()),
            local: local.to_string(),
        }
    }

    /// Name with no namespace (plain attributes, mostly)
    pub fn unqualified(local: &str) -> Self {
        Self {
            ns: None,
            local: local.to_string(),
        }
    }
}

impl fmt::Display for QName {
    /// Clark notation: `{uri}local`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ns {
            Some(ns) => write!(f, "{{{ns}}}{}", self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

/// Process-wide prefix registry, URI -> preferred prefix.
///
/// Write-once per namespace: the first registration for a URI wins and
/// later calls are ignored, so re-registering the same pair is idempotent.
static PREFIXES: LazyLock<Mutex<IndexMap<String, String>>> =
    LazyLock::new(|| Mutex::new(IndexMap::new()));

/// Register a serialization prefix for a namespace URI.
///
/// Affects output only; parsing accepts any prefix the document declares.
pub fn register_namespace(prefix: &str, uri: &str) {
    let mut map = match PREFIXES.lock() {
        Ok(map) => map,
        Err(poisoned) => poisoned.into_inner(),
    };
    map.entry(uri.to_string())
        .or_insert_with(|| prefix.to_string());
}

/// Preferred prefix for a URI: explicit registration first, then the
/// well-known table. `None` means the writer generates one.
pub(crate) fn prefix_for(uri: &str) -> Option<String> {
    let map = match PREFIXES.lock() {
        Ok(map) => map,
        Err(poisoned) => poisoned.into_inner(),
    };
    if let Some(prefix) = map.get(uri) {
        return Some(prefix.clone());
    }
    well_known(uri).map(str::to_string)
}

/// Default prefixes for the namespaces this crate speaks, in the spirit
/// of the stdlib element-tree table of well-known namespaces.
fn well_known(uri: &str) -> Option<&'static str> {
    match uri {
        XML_NS => Some("xml"),
        XHTML_NS => Some("xhtml"),
        "http://www.w3.org/2005/Atom" => Some("atom"),
        "http://www.w3.org/2007/app" => Some("app"),
        "http://purl.org/syndication/thread/1.0" => Some("thr"),
        "http://www.alipedis.com/2012/ames" => Some("ames"),
        "http://www.alipedis.com/2012/asoc" => Some("asoc"),
        "http://www.alipedis.com/2012/aconf" => Some("aconf"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_everything_but_parts() {
        let a = QName::new("http://www.w3.org/2005/Atom", "link");
        let b = QName::new("http://www.w3.org/2005/Atom", "link");
        let c = QName::new("http://www.w3.org/2007/app", "link");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, QName::unqualified("link"));
    }

    #[test]
    fn test_clark_display() {
        let name = QName::new("urn:example", "tag");
        assert_eq!(name.to_string(), "{urn:example}tag");
        assert_eq!(QName::unqualified("href").to_string(), "href");
    }

    #[test]
    fn test_well_known_prefixes() {
        assert_eq!(prefix_for("http://www.w3.org/2005/Atom").as_deref(), Some("atom"));
        assert_eq!(prefix_for(XML_NS).as_deref(), Some("xml"));
        assert_eq!(prefix_for("urn:example:unknown"), None);
    }

    #[test]
    fn test_register_is_first_wins() {
        register_namespace("ex", "urn:example:registered");
        register_namespace("other", "urn:example:registered");
        assert_eq!(
            prefix_for("urn:example:registered").as_deref(),
            Some("ex")
        );
    }
}
