//! Content-model grammars.
//!
//! A grammar constrains XHTML elements by local name: which child elements
//! may appear and in what order, which attributes are required, and whether
//! non-whitespace text is allowed. Elements without a model are unconstrained.

use std::collections::BTreeMap;

use super::ValidatorId;
use crate::context::ValidationContext;
use crate::messages::{MessageId, MessageLocation};
use crate::xml::{XmlElement, XmlHandler};

/// `min..=max` consecutive children whose names are in `names`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Particle {
    names: &'static [&'static str],
    min: usize,
    max: Option<usize>,
}

impl Particle {
    #[must_use]
    pub const fn one(names: &'static [&'static str]) -> Self {
        Self {
            names,
            min: 1,
            max: Some(1),
        }
    }

    #[must_use]
    pub const fn optional(names: &'static [&'static str]) -> Self {
        Self {
            names,
            min: 0,
            max: Some(1),
        }
    }

    #[must_use]
    pub const fn one_or_more(names: &'static [&'static str]) -> Self {
        Self {
            names,
            min: 1,
            max: None,
        }
    }

    fn accepts(&self, name: &str) -> bool {
        self.names.contains(&name)
    }

    fn describe(&self) -> String {
        self.names
            .iter()
            .map(|n| format!("\"{n}\""))
            .collect::<Vec<_>>()
            .join(" or ")
    }
}

/// Constraints on one element.
#[derive(Debug, Clone, Default)]
pub struct ElementModel {
    /// Ordered child particles; `None` leaves children unconstrained.
    content: Option<Vec<Particle>>,
    required_attributes: &'static [&'static str],
    text: bool,
}

impl ElementModel {
    /// Element-only content matching `content` in order.
    #[must_use]
    pub fn children(content: Vec<Particle>) -> Self {
        Self {
            content: Some(content),
            ..Self::default()
        }
    }

    /// Unconstrained mixed content.
    #[must_use]
    pub fn mixed() -> Self {
        Self {
            text: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn requires(mut self, attributes: &'static [&'static str]) -> Self {
        self.required_attributes = attributes;
        self
    }

    /// Check `children` against the content model.
    fn match_children(&self, parent: &str, children: &[String]) -> Result<(), String> {
        let Some(content) = &self.content else {
            return Ok(());
        };

        let mut i = 0;
        for particle in content {
            let mut matched = 0;
            while i < children.len()
                && particle.accepts(&children[i])
                && particle.max.is_none_or(|max| matched < max)
            {
                i += 1;
                matched += 1;
            }
            if matched < particle.min {
                return Err(match children.get(i) {
                    Some(child) => format!(
                        "element \"{child}\" not allowed here; expected element {}",
                        particle.describe()
                    ),
                    None => format!(
                        "element \"{parent}\" incomplete; missing required element {}",
                        particle.describe()
                    ),
                });
            }
        }

        match children.get(i) {
            Some(child) => Err(format!(
                "element \"{child}\" not allowed here in element \"{parent}\""
            )),
            None => Ok(()),
        }
    }
}

/// A structural grammar over XHTML documents.
#[derive(Debug, Clone)]
pub struct Grammar {
    id: ValidatorId,
    root: &'static str,
    scope: Option<&'static str>,
    models: BTreeMap<&'static str, ElementModel>,
}

impl Grammar {
    /// A grammar whose document element must be the XHTML element `root`.
    #[must_use]
    pub fn new(id: ValidatorId, root: &'static str) -> Self {
        Self {
            id,
            root,
            scope: None,
            models: BTreeMap::new(),
        }
    }

    /// Only enforce element models inside `element` (inclusive).
    #[must_use]
    pub fn scoped_to(mut self, element: &'static str) -> Self {
        self.scope = Some(element);
        self
    }

    #[must_use]
    pub fn element(mut self, name: &'static str, model: ElementModel) -> Self {
        self.models.insert(name, model);
        self
    }

    #[must_use]
    pub fn id(&self) -> ValidatorId {
        self.id
    }

    #[must_use]
    pub fn session(&self) -> GrammarSession<'_> {
        GrammarSession {
            grammar: self,
            open: Vec::new(),
            scope_depth: 0,
            seen_root: false,
        }
    }
}

struct Frame<'g> {
    name: String,
    line: usize,
    column: usize,
    model: Option<&'g ElementModel>,
    children: Vec<String>,
    has_text: bool,
    opens_scope: bool,
}

/// Per-pass state of a [`Grammar`].
pub struct GrammarSession<'g> {
    grammar: &'g Grammar,
    open: Vec<Frame<'g>>,
    scope_depth: usize,
    seen_root: bool,
}

fn child_name(element: &XmlElement) -> String {
    if element.in_xhtml() {
        element.local.clone()
    } else {
        element.qualified_name()
    }
}

fn report(context: &ValidationContext, line: usize, column: usize, message: &str) {
    context.report().message(
        MessageId::Rsc005,
        MessageLocation::at(context.path(), line, column),
        &[message],
    );
}

impl XmlHandler for GrammarSession<'_> {
    fn start_element(&mut self, context: &ValidationContext, element: &XmlElement) {
        let grammar = self.grammar;

        if !self.seen_root {
            self.seen_root = true;
            if !element.is_xhtml(grammar.root) {
                report(
                    context,
                    element.line,
                    element.column,
                    &format!(
                        "document element \"{}\" not allowed; expected the XHTML element \"{}\"",
                        element.qualified_name(),
                        grammar.root
                    ),
                );
            }
        }

        let name = child_name(element);
        if let Some(parent) = self.open.last_mut() {
            parent.children.push(name.clone());
        }

        let opens_scope = grammar.scope.is_some_and(|scope| element.is_xhtml(scope));
        if opens_scope {
            self.scope_depth += 1;
        }
        let in_scope = grammar.scope.is_none() || self.scope_depth > 0;
        let model = if in_scope && element.in_xhtml() {
            grammar.models.get(element.local.as_str())
        } else {
            None
        };

        if let Some(model) = model {
            for attribute in model.required_attributes {
                if element.attribute(None, attribute).is_none() {
                    report(
                        context,
                        element.line,
                        element.column,
                        &format!(
                            "element \"{}\" missing required attribute \"{attribute}\"",
                            element.local
                        ),
                    );
                }
            }
        }

        self.open.push(Frame {
            name,
            line: element.line,
            column: element.column,
            model,
            children: Vec::new(),
            has_text: false,
            opens_scope,
        });
    }

    fn characters(&mut self, _context: &ValidationContext, text: &str) {
        if let Some(frame) = self.open.last_mut()
            && !text.trim().is_empty()
        {
            frame.has_text = true;
        }
    }

    fn end_element(&mut self, context: &ValidationContext, _element: &XmlElement) {
        let Some(frame) = self.open.pop() else {
            return;
        };
        if frame.opens_scope {
            self.scope_depth -= 1;
        }
        let Some(model) = frame.model else {
            return;
        };

        if frame.has_text && !model.text {
            report(
                context,
                frame.line,
                frame.column,
                &format!("text not allowed here in element \"{}\"", frame.name),
            );
        }
        if let Err(message) = model.match_children(&frame.name, &frame.children) {
            report(context, frame.line, frame.column, &message);
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const LI: &[&str] = &["li"];
    const A_OR_SPAN: &[&str] = &["a", "span"];
    const OL: &[&str] = &["ol"];

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_sequence_matches() {
        let model = ElementModel::children(vec![Particle::one(A_OR_SPAN), Particle::optional(OL)]);
        assert!(model.match_children("li", &names(&["a"])).is_ok());
        assert!(model.match_children("li", &names(&["span", "ol"])).is_ok());
    }

    #[test]
    fn test_missing_required_child() {
        let model = ElementModel::children(vec![Particle::one_or_more(LI)]);
        let err = model.match_children("ol", &[]).unwrap_err();
        assert_eq!(err, "element \"ol\" incomplete; missing required element \"li\"");
    }

    #[test]
    fn test_unexpected_child() {
        let model = ElementModel::children(vec![Particle::one(A_OR_SPAN), Particle::optional(OL)]);
        let err = model.match_children("li", &names(&["p"])).unwrap_err();
        assert!(err.starts_with("element \"p\" not allowed here"));

        let err = model.match_children("li", &names(&["a", "ol", "ol"])).unwrap_err();
        assert_eq!(err, "element \"ol\" not allowed here in element \"li\"");
    }

    #[test]
    fn test_unconstrained_model() {
        let model = ElementModel::mixed().requires(&["href"]);
        assert!(model.match_children("a", &names(&["b", "i", "img"])).is_ok());
        assert!(model.text);
    }
}
