//! The shipped grammar and rule content.

use std::collections::{BTreeMap, BTreeSet};

use super::grammar::{ElementModel, Grammar, Particle};
use super::rules::{DocumentFacts, ElementFacts, Finding, RuleLevel, RuleSet};
use super::ValidatorId;
use crate::xml::OPS_NS;

const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];
const NAV_HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6", "hgroup"];
const OL: &[&str] = &["ol"];
const LI: &[&str] = &["li"];
const LABEL: &[&str] = &["a", "span"];

/// Nav types whose structure is fixed by the navigation document model.
const RESERVED_NAV_TYPES: [&str; 3] = ["toc", "page-list", "landmarks"];

fn starts_with_heading(facts: &ElementFacts<'_>) -> bool {
    facts
        .children
        .first()
        .is_some_and(|first| NAV_HEADINGS.contains(&first.as_str()))
}

pub(super) fn nav_30_grammar() -> Grammar {
    Grammar::new(ValidatorId::Nav30Grammar, "html")
        .scoped_to("nav")
        .element(
            "nav",
            ElementModel::children(vec![Particle::optional(NAV_HEADINGS), Particle::one(OL)]),
        )
        .element("ol", ElementModel::children(vec![Particle::one_or_more(LI)]))
        .element(
            "li",
            ElementModel::children(vec![Particle::one(LABEL), Particle::optional(OL)]),
        )
        .element("a", ElementModel::mixed().requires(&["href"]))
        .element(
            "hgroup",
            ElementModel::children(vec![Particle::one_or_more(HEADINGS)]),
        )
}

// xhtml-30

fn nested_anchor(facts: &ElementFacts<'_>) -> Option<String> {
    (facts.is("a") && facts.has_ancestor("a"))
        .then(|| "The a element must not appear inside a elements".to_owned())
}

fn nested_dfn(facts: &ElementFacts<'_>) -> Option<String> {
    (facts.is("dfn") && facts.has_ancestor("dfn"))
        .then(|| "The dfn element must not appear inside dfn elements".to_owned())
}

fn duplicate_ids(all: &DocumentFacts) -> Vec<Finding> {
    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
    for element in all.elements() {
        if let Some(id) = element.attribute(None, "id") {
            *seen.entry(id).or_default() += 1;
        }
    }
    all.elements()
        .filter_map(|element| {
            let id = element.attribute(None, "id")?;
            (seen.get(id).copied().unwrap_or_default() > 1)
                .then(|| Finding::at(element, format!("Duplicate ID \"{id}\"")))
        })
        .collect()
}

pub(super) fn xhtml_30_rules() -> RuleSet {
    RuleSet::new(ValidatorId::Xhtml30Rules)
        .with_element_rule(RuleLevel::Error, nested_anchor)
        .with_element_rule(RuleLevel::Error, nested_dfn)
        .with_document_rule(RuleLevel::Error, duplicate_ids)
}

// nav-30

fn exactly_one_toc(all: &DocumentFacts) -> Vec<Finding> {
    let tocs: Vec<_> = all.navs_of_type("toc").collect();
    match tocs.as_slice() {
        [_] => Vec::new(),
        [] => all
            .root()
            .map(|root| Finding::at(root, "Exactly one \"toc\" nav element must be present"))
            .into_iter()
            .collect(),
        [_, extra @ ..] => extra
            .iter()
            .map(|nav| Finding::at(nav, "Multiple occurrences of the \"toc\" nav element"))
            .collect(),
    }
}

fn at_most_one(all: &DocumentFacts, nav_type: &str) -> Vec<Finding> {
    all.navs_of_type(nav_type)
        .skip(1)
        .map(|nav| {
            Finding::at(
                nav,
                format!("Multiple occurrences of the \"{nav_type}\" nav element"),
            )
        })
        .collect()
}

fn at_most_one_page_list(all: &DocumentFacts) -> Vec<Finding> {
    at_most_one(all, "page-list")
}

fn at_most_one_landmarks(all: &DocumentFacts) -> Vec<Finding> {
    at_most_one(all, "landmarks")
}

fn span_without_sublist(facts: &ElementFacts<'_>) -> Option<String> {
    let li = facts.is("li")
        && facts.has_ancestor("nav")
        && facts.children.first().is_some_and(|c| c == "span")
        && !facts.children.iter().any(|c| c == "ol");
    li.then(|| {
        "The span element must only be used as the heading for a nested list".to_owned()
    })
}

fn empty_label(facts: &ElementFacts<'_>) -> Option<String> {
    let label = (facts.is("a") || facts.is("span"))
        && facts.has_ancestor("nav")
        && facts.text.trim().is_empty();
    label.then(|| {
        format!(
            "Anchors within nav elements must contain text (empty {} element)",
            facts.element.local
        )
    })
}

fn nav_without_heading(facts: &ElementFacts<'_>) -> Option<String> {
    if !facts.is("nav") || RESERVED_NAV_TYPES.iter().any(|t| facts.element.has_epub_type(t)) {
        return None;
    }
    (!starts_with_heading(facts)).then(|| {
        "nav elements other than \"toc\", \"page-list\" and \"landmarks\" must have a heading \
         as their first child"
            .to_owned()
    })
}

fn untyped_landmark(facts: &ElementFacts<'_>) -> Option<String> {
    let untyped = facts.is("a")
        && facts.in_nav_of_type("landmarks")
        && facts.element.epub_types().next().is_none();
    untyped.then(|| "Missing epub:type attribute on a element in \"landmarks\" nav".to_owned())
}

fn duplicate_landmarks(all: &DocumentFacts) -> Vec<Finding> {
    let mut seen = BTreeSet::new();
    let mut findings = Vec::new();
    for anchor in all
        .within_nav_of_type("landmarks")
        .filter(|e| e.is_xhtml("a"))
    {
        let Some(href) = anchor.attribute(None, "href") else {
            continue;
        };
        for epub_type in anchor.epub_types() {
            if !seen.insert((epub_type, href)) {
                findings.push(Finding::at(
                    anchor,
                    format!(
                        "Another landmark was found with the same epub:type \"{epub_type}\" \
                         and same reference to \"{href}\""
                    ),
                ));
            }
        }
    }
    findings
}

pub(super) fn nav_30_rules() -> RuleSet {
    RuleSet::new(ValidatorId::Nav30Rules)
        .with_document_rule(RuleLevel::Error, exactly_one_toc)
        .with_document_rule(RuleLevel::Error, at_most_one_page_list)
        .with_document_rule(RuleLevel::Error, at_most_one_landmarks)
        .with_element_rule(RuleLevel::Error, span_without_sublist)
        .with_element_rule(RuleLevel::Error, empty_label)
        .with_element_rule(RuleLevel::Error, nav_without_heading)
        .with_element_rule(RuleLevel::Error, untyped_landmark)
        .with_document_rule(RuleLevel::Error, duplicate_landmarks)
}

// edupub

fn hidden_toc(facts: &ElementFacts<'_>) -> Option<String> {
    let hidden = facts.is("nav")
        && facts.element.has_epub_type("toc")
        && facts.element.attribute(None, "hidden").is_some();
    hidden.then(|| "The \"toc\" nav element must not be hidden".to_owned())
}

fn untitled_section(facts: &ElementFacts<'_>) -> Option<String> {
    let untitled = facts.is("section")
        && facts.parent().is_some_and(|p| p.is_xhtml("body"))
        && !starts_with_heading(facts);
    untitled.then(|| "A body-level section should start with a heading".to_owned())
}

pub(super) fn edupub_structure_rules() -> RuleSet {
    RuleSet::new(ValidatorId::EdupubStructureRules)
        .with_element_rule(RuleLevel::Error, hidden_toc)
        .with_element_rule(RuleLevel::Warning, untitled_section)
}

fn missing_page_list(all: &DocumentFacts) -> Vec<Finding> {
    if all.navs_of_type("page-list").next().is_some() {
        return Vec::new();
    }
    all.root()
        .map(|root| {
            Finding::at(
                root,
                "A \"page-list\" nav element is expected in the navigation document",
            )
        })
        .into_iter()
        .collect()
}

fn empty_epub_type(facts: &ElementFacts<'_>) -> Option<String> {
    facts
        .element
        .attribute(Some(OPS_NS), "type")
        .is_some_and(|value| value.trim().is_empty())
        .then(|| {
            format!(
                "The epub:type attribute of element \"{}\" must not be empty",
                facts.element.local
            )
        })
}

pub(super) fn edupub_semantics_rules() -> RuleSet {
    RuleSet::new(ValidatorId::EdupubSemanticsRules)
        .with_document_rule(RuleLevel::Warning, missing_page_list)
        .with_element_rule(RuleLevel::Error, empty_epub_type)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::{XHTML_NS, XmlAttribute, XmlElement};

    fn element(local: &str, attrs: &[(Option<&str>, &str, &str)]) -> XmlElement {
        XmlElement {
            namespace: Some(XHTML_NS.to_owned()),
            prefix: None,
            local: local.to_owned(),
            attributes: attrs
                .iter()
                .map(|(ns, name, value)| XmlAttribute {
                    namespace: ns.map(str::to_owned),
                    local: (*name).to_owned(),
                    value: (*value).to_owned(),
                })
                .collect(),
            line: 1,
            column: 1,
        }
    }

    fn nav(epub_type: &str) -> XmlElement {
        element("nav", &[(Some(OPS_NS), "type", epub_type)])
    }

    fn check(
        rule: fn(&ElementFacts<'_>) -> Option<String>,
        element: &XmlElement,
        children: &[&str],
        ancestors: &[XmlElement],
    ) -> Option<String> {
        let children: Vec<String> = children.iter().map(|c| (*c).to_owned()).collect();
        rule(&ElementFacts {
            element,
            children: &children,
            text: "x",
            ancestors,
        })
    }

    /// Top-level siblings under one `body`.
    fn document(elements: Vec<XmlElement>) -> DocumentFacts {
        let mut doc = DocumentFacts::new();
        let body = doc.push(element("body", &[]), None);
        for el in elements {
            doc.push(el, Some(body));
        }
        doc
    }

    #[test]
    fn test_toc_cardinality() {
        assert!(exactly_one_toc(&document(vec![nav("toc")])).is_empty());

        let none = exactly_one_toc(&document(vec![element("p", &[])]));
        assert_eq!(none.len(), 1);
        assert!(none[0].message.contains("Exactly one"));

        let two = exactly_one_toc(&document(vec![nav("toc"), nav("toc")]));
        assert_eq!(two.len(), 1);
        assert!(two[0].message.contains("Multiple"));
    }

    #[test]
    fn test_span_needs_sublist() {
        let li = element("li", &[]);
        let ancestors = [nav("toc")];
        assert!(check(span_without_sublist, &li, &["span"], &ancestors).is_some());
        assert!(check(span_without_sublist, &li, &["span", "ol"], &ancestors).is_none());
        assert!(check(span_without_sublist, &li, &["a"], &ancestors).is_none());
    }

    #[test]
    fn test_other_nav_needs_heading() {
        assert!(check(nav_without_heading, &nav("lot"), &["ol"], &[]).is_some());
        assert!(check(nav_without_heading, &nav("lot"), &["h2", "ol"], &[]).is_none());
        assert!(check(nav_without_heading, &nav("landmarks"), &["ol"], &[]).is_none());
    }

    #[test]
    fn test_duplicate_landmarks() {
        let mut doc = DocumentFacts::new();
        let landmarks = doc.push(nav("landmarks"), None);
        let ol = doc.push(element("ol", &[]), Some(landmarks));
        for (ty, href) in [
            ("bodymatter", "c1.xhtml"),
            ("toc", "c1.xhtml"),
            ("bodymatter", "c1.xhtml"),
        ] {
            let li = doc.push(element("li", &[]), Some(ol));
            doc.push(
                element("a", &[(Some(OPS_NS), "type", ty), (None, "href", href)]),
                Some(li),
            );
        }
        assert_eq!(duplicate_landmarks(&doc).len(), 1);
    }

    #[test]
    fn test_duplicate_landmarks_ignore_other_navs() {
        let anchor = element("a", &[(Some(OPS_NS), "type", "toc"), (None, "href", "c1.xhtml")]);
        let mut doc = DocumentFacts::new();
        let toc = doc.push(nav("toc"), None);
        doc.push(anchor.clone(), Some(toc));
        doc.push(anchor, Some(toc));
        assert!(duplicate_landmarks(&doc).is_empty());
    }

    #[test]
    fn test_duplicate_ids_flag_every_occurrence() {
        let doc = document(vec![
            element("p", &[(None, "id", "a")]),
            element("p", &[(None, "id", "b")]),
            element("p", &[(None, "id", "a")]),
        ]);
        assert_eq!(duplicate_ids(&doc).len(), 2);
    }

    #[test]
    fn test_missing_page_list() {
        assert_eq!(missing_page_list(&document(vec![nav("toc")])).len(), 1);
        assert!(missing_page_list(&document(vec![nav("toc"), nav("page-list")])).is_empty());
    }

    #[test]
    fn test_empty_epub_type() {
        let empty = element("section", &[(Some(OPS_NS), "type", "  ")]);
        assert!(check(empty_epub_type, &empty, &[], &[]).is_some());
        assert!(check(empty_epub_type, &element("section", &[]), &[], &[]).is_none());
    }

    #[test]
    fn test_catalog_ids() {
        assert_eq!(nav_30_grammar().id(), ValidatorId::Nav30Grammar);
        assert_eq!(xhtml_30_rules().id(), ValidatorId::Xhtml30Rules);
        assert_eq!(nav_30_rules().id(), ValidatorId::Nav30Rules);
        assert_eq!(edupub_structure_rules().id(), ValidatorId::EdupubStructureRules);
        assert_eq!(edupub_semantics_rules().id(), ValidatorId::EdupubSemanticsRules);
    }
}
