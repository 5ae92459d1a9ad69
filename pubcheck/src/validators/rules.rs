//! Rule sets evaluated over element facts.
//!
//! Element rules run when an element closes and see its children, its
//! descendant text and its ancestors. Document rules run once after the
//! last element closed and see the facts of every element in document order.

use super::ValidatorId;
use crate::context::ValidationContext;
use crate::messages::{MessageId, MessageLocation};
use crate::xml::{XmlElement, XmlHandler};

/// Severity class of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleLevel {
    /// Reported as RSC-005.
    Error,
    /// Reported as RSC-017.
    Warning,
}

impl RuleLevel {
    const fn message_id(self) -> MessageId {
        match self {
            Self::Error => MessageId::Rsc005,
            Self::Warning => MessageId::Rsc017,
        }
    }
}

/// What a rule knows about one closed element.
///
/// Everything is borrowed from the session, so building facts costs the same
/// at any nesting depth.
#[derive(Debug, Clone, Copy)]
pub struct ElementFacts<'a> {
    pub element: &'a XmlElement,
    /// Local names of the XHTML child elements, in order.
    pub children: &'a [String],
    /// Concatenated descendant text.
    pub text: &'a str,
    /// Enclosing elements, outermost first.
    pub ancestors: &'a [XmlElement],
}

impl<'a> ElementFacts<'a> {
    /// Whether this is the XHTML element `local`.
    #[must_use]
    pub fn is(&self, local: &str) -> bool {
        self.element.is_xhtml(local)
    }

    #[must_use]
    pub fn parent(&self) -> Option<&'a XmlElement> {
        self.ancestors.last()
    }

    #[must_use]
    pub fn has_ancestor(&self, local: &str) -> bool {
        self.ancestors.iter().any(|a| a.is_xhtml(local))
    }

    /// The innermost enclosing `nav`.
    #[must_use]
    pub fn enclosing_nav(&self) -> Option<&'a XmlElement> {
        self.ancestors.iter().rev().find(|a| a.is_xhtml("nav"))
    }

    /// Whether this element sits inside a `nav` with `epub:type` `nav_type`.
    #[must_use]
    pub fn in_nav_of_type(&self, nav_type: &str) -> bool {
        self.enclosing_nav()
            .is_some_and(|nav| nav.has_epub_type(nav_type))
    }
}

#[derive(Debug, Clone)]
struct DocumentElement {
    element: XmlElement,
    /// Position of the innermost enclosing `nav`.
    nav: Option<usize>,
}

/// Every element of a document, in document order.
#[derive(Debug, Clone, Default)]
pub struct DocumentFacts {
    elements: Vec<DocumentElement>,
}

impl DocumentFacts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `element` as a child of the element at position `parent` and
    /// return its own position.
    pub fn push(&mut self, element: XmlElement, parent: Option<usize>) -> usize {
        let nav = parent.and_then(|index| {
            let parent = self.elements.get(index)?;
            if parent.element.is_xhtml("nav") {
                Some(index)
            } else {
                parent.nav
            }
        });
        self.elements.push(DocumentElement { element, nav });
        self.elements.len() - 1
    }

    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.elements.iter().map(|e| &e.element)
    }

    /// The document element.
    #[must_use]
    pub fn root(&self) -> Option<&XmlElement> {
        self.elements.first().map(|e| &e.element)
    }

    /// `nav` elements with `epub:type` `nav_type`.
    pub fn navs_of_type<'a>(&'a self, nav_type: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements()
            .filter(move |e| e.is_xhtml("nav") && e.has_epub_type(nav_type))
    }

    /// Elements whose innermost enclosing `nav` has `epub:type` `nav_type`.
    pub fn within_nav_of_type<'a>(
        &'a self,
        nav_type: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> {
        self.elements
            .iter()
            .filter(move |e| {
                e.nav
                    .and_then(|index| self.elements.get(index))
                    .is_some_and(|nav| nav.element.has_epub_type(nav_type))
            })
            .map(|e| &e.element)
    }
}

/// A document rule violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl Finding {
    #[must_use]
    pub fn at(element: &XmlElement, message: impl Into<String>) -> Self {
        Self {
            line: element.line,
            column: element.column,
            message: message.into(),
        }
    }
}

/// A check over a single element.
#[derive(Debug, Clone, Copy)]
pub struct ElementRule {
    pub level: RuleLevel,
    pub check: fn(&ElementFacts<'_>) -> Option<String>,
}

/// A check over the whole document.
#[derive(Debug, Clone, Copy)]
pub struct DocumentRule {
    pub level: RuleLevel,
    pub check: fn(&DocumentFacts) -> Vec<Finding>,
}

/// A named collection of rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    id: ValidatorId,
    element_rules: Vec<ElementRule>,
    document_rules: Vec<DocumentRule>,
}

impl RuleSet {
    #[must_use]
    pub fn new(id: ValidatorId) -> Self {
        Self {
            id,
            element_rules: Vec::new(),
            document_rules: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_element_rule(
        mut self,
        level: RuleLevel,
        check: fn(&ElementFacts<'_>) -> Option<String>,
    ) -> Self {
        self.element_rules.push(ElementRule { level, check });
        self
    }

    #[must_use]
    pub fn with_document_rule(
        mut self,
        level: RuleLevel,
        check: fn(&DocumentFacts) -> Vec<Finding>,
    ) -> Self {
        self.document_rules.push(DocumentRule { level, check });
        self
    }

    #[must_use]
    pub fn id(&self) -> ValidatorId {
        self.id
    }

    #[must_use]
    pub fn session(&self) -> RuleSession<'_> {
        RuleSession {
            rules: self,
            open: Vec::new(),
            frames: Vec::new(),
            text: String::new(),
            document: DocumentFacts::new(),
        }
    }
}

/// Bookkeeping for one open element, parallel to `RuleSession::open`.
struct Frame {
    children: Vec<String>,
    /// Length of the text buffer when the element opened.
    text_start: usize,
    /// Position in the document facts, when they are collected.
    position: Option<usize>,
}

/// Per-pass state of a [`RuleSet`].
pub struct RuleSession<'r> {
    rules: &'r RuleSet,
    /// Open elements, outermost first.
    open: Vec<XmlElement>,
    frames: Vec<Frame>,
    /// Text of the open elements; each frame owns the tail from its start.
    text: String,
    document: DocumentFacts,
}

impl XmlHandler for RuleSession<'_> {
    fn start_element(&mut self, _context: &ValidationContext, element: &XmlElement) {
        let parent = self.frames.last_mut();
        let parent_position = parent.as_ref().and_then(|p| p.position);
        if let Some(parent) = parent
            && element.in_xhtml()
        {
            parent.children.push(element.local.clone());
        }

        let position = if self.rules.document_rules.is_empty() {
            None
        } else {
            Some(self.document.push(element.clone(), parent_position))
        };
        self.frames.push(Frame {
            children: Vec::new(),
            text_start: self.text.len(),
            position,
        });
        self.open.push(element.clone());
    }

    fn characters(&mut self, _context: &ValidationContext, text: &str) {
        if !self.open.is_empty() {
            self.text.push_str(text);
        }
    }

    fn end_element(&mut self, context: &ValidationContext, _element: &XmlElement) {
        let (Some(element), Some(frame)) = (self.open.pop(), self.frames.pop()) else {
            return;
        };
        let facts = ElementFacts {
            element: &element,
            children: &frame.children,
            text: self.text.get(frame.text_start..).unwrap_or_default(),
            ancestors: &self.open,
        };

        for rule in &self.rules.element_rules {
            if let Some(message) = (rule.check)(&facts) {
                context.report().message(
                    rule.level.message_id(),
                    element.location(context.path()),
                    &[message.as_str()],
                );
            }
        }

        if self.open.is_empty() {
            self.text.clear();
        }
    }

    fn end_document(&mut self, context: &ValidationContext) {
        for rule in &self.rules.document_rules {
            for finding in (rule.check)(&self.document) {
                context.report().message(
                    rule.level.message_id(),
                    MessageLocation::at(context.path(), finding.line, finding.column),
                    &[finding.message.as_str()],
                );
            }
        }
        self.document = DocumentFacts::new();
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::MemoryContainer;
    use crate::report::{MemoryReport, Report};
    use crate::xml::{OPS_NS, XHTML_NS, XmlAttribute, XmlParser};
    use std::sync::Arc;

    fn no_bold(facts: &ElementFacts<'_>) -> Option<String> {
        facts.is("b").then(|| "no bold".to_owned())
    }

    fn no_text_in_list(facts: &ElementFacts<'_>) -> Option<String> {
        (facts.is("li") && !facts.text.trim().is_empty()).then(|| "text in li".to_owned())
    }

    fn first_two(all: &DocumentFacts) -> Vec<Finding> {
        all.elements()
            .take(2)
            .map(|e| Finding::at(e, e.local.clone()))
            .collect()
    }

    fn run(rules: &RuleSet, doc: &str) -> Arc<MemoryReport> {
        let report = Arc::new(MemoryReport::new());
        let ctx = ValidationContext::builder(
            "doc.xhtml",
            "application/xhtml+xml",
            Arc::new(MemoryContainer::new("book").with_entry("doc.xhtml", doc)),
            report.clone(),
        )
        .build();
        let validator = crate::validators::Validator::Rules(rules.clone());
        let mut handler = NoopHandler;
        let mut parser = XmlParser::new(&ctx, &mut handler);
        parser.add_validator(&validator);
        parser.process();
        report
    }

    struct NoopHandler;
    impl XmlHandler for NoopHandler {}

    fn element(local: &str, epub_type: Option<&str>) -> XmlElement {
        XmlElement {
            namespace: Some(XHTML_NS.to_owned()),
            prefix: None,
            local: local.to_owned(),
            attributes: epub_type
                .map(|t| XmlAttribute {
                    namespace: Some(OPS_NS.to_owned()),
                    local: "type".to_owned(),
                    value: t.to_owned(),
                })
                .into_iter()
                .collect(),
            line: 1,
            column: 1,
        }
    }

    const DOC: &str = "<html xmlns=\"http://www.w3.org/1999/xhtml\"><body>\
                       <ol><li><b>x</b></li></ol><p/></body></html>";

    #[test]
    fn test_element_rule_levels() {
        let rules = RuleSet::new(ValidatorId::Xhtml30Rules)
            .with_element_rule(RuleLevel::Error, no_bold)
            .with_element_rule(RuleLevel::Warning, no_text_in_list);
        let report = run(&rules, DOC);

        assert_eq!(report.count_of(MessageId::Rsc005), 1);
        assert_eq!(report.count_of(MessageId::Rsc017), 1);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 1);
    }

    #[test]
    fn test_document_rules_see_document_order() {
        let rules =
            RuleSet::new(ValidatorId::Nav30Rules).with_document_rule(RuleLevel::Error, first_two);
        let report = run(&rules, DOC);

        let texts: Vec<_> = report.messages().into_iter().map(|m| m.text).collect();
        assert_eq!(texts.len(), 2);
        assert!(texts[0].contains("html"));
        assert!(texts[1].contains("body"));
    }

    #[test]
    fn test_facts_helpers() {
        let a = element("a", None);
        let ancestors = [
            element("nav", Some("landmarks")),
            element("ol", None),
            element("li", None),
        ];
        let facts = ElementFacts {
            element: &a,
            children: &[],
            text: "Chapter",
            ancestors: &ancestors,
        };

        assert!(facts.is("a"));
        assert!(facts.has_ancestor("ol"));
        assert!(!facts.has_ancestor("body"));
        assert!(facts.parent().is_some_and(|p| p.is_xhtml("li")));
        assert!(facts.in_nav_of_type("landmarks"));
        assert!(!facts.in_nav_of_type("toc"));
    }

    #[test]
    fn test_document_facts_track_enclosing_nav() {
        let mut doc = DocumentFacts::new();
        let body = doc.push(element("body", None), None);
        let toc = doc.push(element("nav", Some("toc")), Some(body));
        let ol = doc.push(element("ol", None), Some(toc));
        doc.push(element("li", None), Some(ol));
        let landmarks = doc.push(element("nav", Some("landmarks")), Some(body));
        doc.push(element("a", None), Some(landmarks));
        doc.push(element("p", None), Some(body));

        assert!(doc.root().is_some_and(|r| r.is_xhtml("body")));
        assert_eq!(doc.navs_of_type("toc").count(), 1);
        let in_toc: Vec<_> = doc.within_nav_of_type("toc").map(|e| e.local.as_str()).collect();
        assert_eq!(in_toc, vec!["ol", "li"]);
        let in_landmarks: Vec<_> = doc
            .within_nav_of_type("landmarks")
            .map(|e| e.local.as_str())
            .collect();
        assert_eq!(in_landmarks, vec!["a"]);
    }

    fn outer_text(facts: &ElementFacts<'_>) -> Option<String> {
        (facts.is("div") && facts.ancestors.len() == 1).then(|| facts.text.len().to_string())
    }

    #[test]
    fn test_deep_nesting_keeps_descendant_text() {
        let depth = 10_000;
        let doc = format!(
            "<html xmlns=\"http://www.w3.org/1999/xhtml\">{}{}</html>",
            "<div>t".repeat(depth),
            "</div>".repeat(depth)
        );
        let rules = RuleSet::new(ValidatorId::Xhtml30Rules)
            .with_element_rule(RuleLevel::Warning, outer_text)
            .with_document_rule(RuleLevel::Error, first_two);
        let report = run(&rules, &doc);

        let texts: Vec<_> = report.messages().into_iter().map(|m| m.text).collect();
        assert_eq!(texts.len(), 3, "{texts:?}");
        assert!(texts.iter().any(|t| t.ends_with(&depth.to_string())));
    }
}
