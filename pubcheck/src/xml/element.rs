use crate::messages::MessageLocation;

/// XHTML namespace.
pub const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";

/// EPUB structural semantics namespace (`epub:type`).
pub const OPS_NS: &str = "http://www.idpf.org/2007/ops";

/// An attribute with its namespace resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub namespace: Option<String>,
    pub local: String,
    pub value: String,
}

/// A start tag with namespaces resolved and its source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub namespace: Option<String>,
    pub prefix: Option<String>,
    pub local: String,
    pub attributes: Vec<XmlAttribute>,
    /// 1-based line of the `<`.
    pub line: usize,
    /// 1-based column of the `<`.
    pub column: usize,
}

impl XmlElement {
    /// Whether this is the XHTML element `local`.
    #[must_use]
    pub fn is_xhtml(&self, local: &str) -> bool {
        self.local == local && self.namespace.as_deref() == Some(XHTML_NS)
    }

    /// Whether this element is in the XHTML namespace.
    #[must_use]
    pub fn in_xhtml(&self) -> bool {
        self.namespace.as_deref() == Some(XHTML_NS)
    }

    /// Value of the attribute `local` in `namespace` (`None` for no namespace).
    #[must_use]
    pub fn attribute(&self, namespace: Option<&str>, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.local == local && a.namespace.as_deref() == namespace)
            .map(|a| a.value.as_str())
    }

    /// The whitespace-separated tokens of `epub:type`.
    pub fn epub_types(&self) -> impl Iterator<Item = &str> {
        self.attribute(Some(OPS_NS), "type")
            .unwrap_or_default()
            .split_ascii_whitespace()
    }

    #[must_use]
    pub fn has_epub_type(&self, token: &str) -> bool {
        self.epub_types().any(|t| t == token)
    }

    /// The name as written in the source, e.g. `epub:switch` or `nav`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.local),
            None => self.local.clone(),
        }
    }

    /// Message location of this element inside the document at `path`.
    #[must_use]
    pub fn location(&self, path: &str) -> MessageLocation {
        MessageLocation::at(path, self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nav(epub_type: &str) -> XmlElement {
        XmlElement {
            namespace: Some(XHTML_NS.to_owned()),
            prefix: None,
            local: "nav".to_owned(),
            attributes: vec![
                XmlAttribute {
                    namespace: Some(OPS_NS.to_owned()),
                    local: "type".to_owned(),
                    value: epub_type.to_owned(),
                },
                XmlAttribute {
                    namespace: None,
                    local: "id".to_owned(),
                    value: "toc".to_owned(),
                },
            ],
            line: 4,
            column: 3,
        }
    }

    #[test]
    fn test_epub_types() {
        let el = nav("  toc   landmarks ");
        assert_eq!(el.epub_types().collect::<Vec<_>>(), vec!["toc", "landmarks"]);
        assert!(el.has_epub_type("toc"));
        assert!(!el.has_epub_type("page-list"));
    }

    #[test]
    fn test_attribute_lookup_respects_namespace() {
        let el = nav("toc");
        assert_eq!(el.attribute(None, "id"), Some("toc"));
        assert_eq!(el.attribute(None, "type"), None);
        assert_eq!(el.attribute(Some(OPS_NS), "type"), Some("toc"));
    }

    #[test]
    fn test_names_and_location() {
        let el = nav("toc");
        assert!(el.is_xhtml("nav"));
        assert!(el.in_xhtml());
        assert_eq!(el.qualified_name(), "nav");
        assert_eq!(el.location("nav.xhtml").to_string(), "nav.xhtml(4,3)");
    }
}
