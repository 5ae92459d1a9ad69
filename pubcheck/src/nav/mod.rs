//! Navigation document checker.
//!
//! [`NavChecker`] is the composition root for one navigation document: it
//! settles the context-dependent decisions once at construction, then runs
//! the resource checks and a single parse-and-validate pass per call.

mod handler;

pub use handler::{NavHandler, NavLink};

use pubcheck_vocab::{EpubCheckProperty, PropertyFlagSet, parse_property_list};
use serde::Serialize;

use crate::checker::{ContentChecker, DocumentValidator};
use crate::context::{DC_TYPE_EDUPUB, FormatVersion, Profile, ValidationContext};
use crate::error::ContextError;
use crate::messages::{MessageId, MessageLocation};
use crate::validators::{ValidatorId, registry};
use crate::xml::{ParseOutcome, XmlParser};

/// The only media type a navigation document may have.
pub const NAV_MEDIA_TYPE: &str = "application/xhtml+xml";

const BASE_VALIDATORS: [ValidatorId; 3] = [
    ValidatorId::Nav30Grammar,
    ValidatorId::Xhtml30Rules,
    ValidatorId::Nav30Rules,
];

const EDUPUB_VALIDATORS: [ValidatorId; 2] = [
    ValidatorId::EdupubStructureRules,
    ValidatorId::EdupubSemanticsRules,
];

/// The validators a pass over the document described by `context` runs, in
/// attachment order.
///
/// EDUPUB rules apply when the publication is EDUPUB (by profile or by a
/// declared publication type) and the document is in the linear reading
/// order.
#[must_use]
pub fn select_validators(
    context: &ValidationContext,
    flags: &PropertyFlagSet<EpubCheckProperty>,
) -> Vec<ValidatorId> {
    let mut ids = BASE_VALIDATORS.to_vec();
    let edupub = context.profile() == Profile::Edupub
        || context.publication_types().contains(DC_TYPE_EDUPUB);
    if edupub && !flags.contains(&EpubCheckProperty::NonLinear) {
        ids.extend(EDUPUB_VALIDATORS);
    }
    ids
}

/// Result of one pass, with the links the document declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavOutcome {
    /// No fatal error, error or warning was added during the pass.
    pub valid: bool,
    pub links: Vec<NavLink>,
    #[serde(skip)]
    pub parse: ParseOutcome,
}

/// Checker for one EPUB 3 navigation document.
#[derive(Debug)]
pub struct NavChecker {
    context: ValidationContext,
    properties: PropertyFlagSet<EpubCheckProperty>,
}

impl NavChecker {
    /// Bind a checker to `context`.
    ///
    /// Navigation documents do not exist in EPUB 2, so a V2 context gets an
    /// informational `NAV-001` here, before any parsing.
    ///
    /// # Errors
    /// Returns [`ContextError::MediaTypeMismatch`] if the context's media type
    /// is not [`NAV_MEDIA_TYPE`].
    pub fn new(context: ValidationContext) -> Result<Self, ContextError> {
        context.expect_media_type(NAV_MEDIA_TYPE)?;

        if context.version() == FormatVersion::V2 {
            context.report().message(
                MessageId::Nav001,
                MessageLocation::new(context.path(), 0, 0),
                &[],
            );
        }

        let properties = parse_property_list(context.properties(), EpubCheckProperty::vocab_map());
        tracing::debug!(
            path = context.path(),
            version = %context.version(),
            profile = %context.profile(),
            flags = properties.len(),
            "nav checker ready"
        );

        Ok(Self {
            context,
            properties,
        })
    }

    #[must_use]
    pub fn context(&self) -> &ValidationContext {
        &self.context
    }

    #[must_use]
    pub fn properties(&self) -> &PropertyFlagSet<EpubCheckProperty> {
        &self.properties
    }

    #[must_use]
    pub fn selected_validators(&self) -> Vec<ValidatorId> {
        select_validators(&self.context, &self.properties)
    }

    /// Run one parse-and-validate pass and keep the links it found.
    #[must_use]
    pub fn validate_outline(&self) -> NavOutcome {
        let report = self.context.report();
        let before = report.counts();

        let ids = self.selected_validators();
        tracing::debug!(path = self.context.path(), validators = ?ids, "validating");

        let mut handler = NavHandler::new();
        let mut parser = XmlParser::new(&self.context, &mut handler);
        for id in ids {
            parser.add_validator(registry::get(id));
        }
        let parse = parser.process();

        let valid = report.counts() == before;
        tracing::info!(path = self.context.path(), valid, "navigation document checked");

        NavOutcome {
            valid,
            links: handler.into_links(),
            parse,
        }
    }
}

impl DocumentValidator for NavChecker {
    fn validate(&self) -> bool {
        self.validate_outline().valid
    }
}

impl ContentChecker for NavChecker {
    fn run_checks(&self) {
        let path = self.context.path();
        let container = self.context.container();

        if !container.has_entry(path) {
            self.context.report().message(
                MessageId::Rsc001,
                MessageLocation::new(container.name(), -1, -1),
                &[path],
            );
        } else if container.can_decrypt(path) {
            self.validate();
        } else {
            self.context.report().message(
                MessageId::Rsc004,
                MessageLocation::new(path, 0, 0),
                &[path],
            );
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::MemoryContainer;
    use crate::report::{MemoryReport, Report};
    use std::sync::Arc;

    fn context(profile: Profile, pub_types: &[&str], properties: &str) -> ValidationContext {
        ValidationContext::builder(
            "nav.xhtml",
            NAV_MEDIA_TYPE,
            Arc::new(MemoryContainer::new("book")),
            Arc::new(MemoryReport::new()),
        )
        .profile(profile)
        .publication_types(pub_types.iter().copied())
        .properties(properties)
        .build()
    }

    fn flags(ctx: &ValidationContext) -> PropertyFlagSet<EpubCheckProperty> {
        parse_property_list(ctx.properties(), EpubCheckProperty::vocab_map())
    }

    #[test]
    fn test_default_selection() {
        let ctx = context(Profile::Default, &[], "");
        assert_eq!(select_validators(&ctx, &flags(&ctx)), BASE_VALIDATORS.to_vec());
    }

    #[test]
    fn test_edupub_selection() {
        for ctx in [
            context(Profile::Edupub, &[], ""),
            context(Profile::Default, &["edupub"], ""),
        ] {
            let ids = select_validators(&ctx, &flags(&ctx));
            assert_eq!(ids.len(), 5);
            assert_eq!(&ids[3..], &EDUPUB_VALIDATORS);
        }
    }

    #[test]
    fn test_non_linear_skips_edupub() {
        let ctx = context(Profile::Edupub, &["edupub"], "epubcheck:non-linear");
        assert_eq!(select_validators(&ctx, &flags(&ctx)), BASE_VALIDATORS.to_vec());
    }

    #[test]
    fn test_media_type_precondition() {
        let report = Arc::new(MemoryReport::new());
        let ctx = ValidationContext::builder(
            "nav.xhtml",
            "text/html",
            Arc::new(MemoryContainer::new("book")),
            report.clone(),
        )
        .build();
        let err = NavChecker::new(ctx).unwrap_err();
        assert!(matches!(err, ContextError::MediaTypeMismatch { .. }));
        assert!(report.messages().is_empty());
        assert_eq!(report.counts(), crate::report::ReportCounts::default());
    }
}
