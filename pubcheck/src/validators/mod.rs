//! Reusable validators and their registry.
//!
//! A [`Validator`] is immutable and shared across checks; each parse pass
//! asks it for a fresh session holding the per-document state.

mod catalog;
mod grammar;
pub mod registry;
mod rules;

use std::fmt;

use serde::Serialize;

pub use grammar::{ElementModel, Grammar, Particle};
pub use rules::{
    DocumentFacts, DocumentRule, ElementFacts, ElementRule, Finding, RuleLevel, RuleSet,
};

use crate::xml::XmlHandler;

/// Stable identifiers of the registered validators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ValidatorId {
    /// Navigation document grammar.
    Nav30Grammar,
    /// XHTML content rules.
    Xhtml30Rules,
    /// Navigation document rules.
    Nav30Rules,
    /// EDUPUB structure rules.
    EdupubStructureRules,
    /// EDUPUB semantics rules.
    EdupubSemanticsRules,
}

impl ValidatorId {
    pub const ALL: [Self; 5] = [
        Self::Nav30Grammar,
        Self::Xhtml30Rules,
        Self::Nav30Rules,
        Self::EdupubStructureRules,
        Self::EdupubSemanticsRules,
    ];

    /// The stable key of the rule set.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Nav30Grammar => "nav-30.rnc",
            Self::Xhtml30Rules => "xhtml-30.sch",
            Self::Nav30Rules => "nav-30.sch",
            Self::EdupubStructureRules => "xhtml-edupub-structure.sch",
            Self::EdupubSemanticsRules => "xhtml-edupub-semantics.sch",
        }
    }
}

impl fmt::Display for ValidatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A stateless validator bound to one rule set.
#[derive(Debug)]
pub enum Validator {
    /// Structural content-model checks.
    Grammar(Grammar),
    /// Semantic rules over element facts.
    Rules(RuleSet),
}

impl Validator {
    #[must_use]
    pub fn id(&self) -> ValidatorId {
        match self {
            Self::Grammar(grammar) => grammar.id(),
            Self::Rules(rules) => rules.id(),
        }
    }

    /// Per-pass state observing one document.
    #[must_use]
    pub fn start_session(&self) -> Box<dyn XmlHandler + '_> {
        match self {
            Self::Grammar(grammar) => Box::new(grammar.session()),
            Self::Rules(rules) => Box::new(rules.session()),
        }
    }
}
