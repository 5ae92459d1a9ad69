//! Process-wide validator instances, built on first use.

use std::sync::LazyLock;

use super::{Validator, ValidatorId, catalog};

static NAV_30_GRAMMAR: LazyLock<Validator> =
    LazyLock::new(|| Validator::Grammar(catalog::nav_30_grammar()));

static XHTML_30_RULES: LazyLock<Validator> =
    LazyLock::new(|| Validator::Rules(catalog::xhtml_30_rules()));

static NAV_30_RULES: LazyLock<Validator> =
    LazyLock::new(|| Validator::Rules(catalog::nav_30_rules()));

static EDUPUB_STRUCTURE_RULES: LazyLock<Validator> =
    LazyLock::new(|| Validator::Rules(catalog::edupub_structure_rules()));

static EDUPUB_SEMANTICS_RULES: LazyLock<Validator> =
    LazyLock::new(|| Validator::Rules(catalog::edupub_semantics_rules()));

/// The shared validator registered under `id`.
#[must_use]
pub fn get(id: ValidatorId) -> &'static Validator {
    match id {
        ValidatorId::Nav30Grammar => &NAV_30_GRAMMAR,
        ValidatorId::Xhtml30Rules => &XHTML_30_RULES,
        ValidatorId::Nav30Rules => &NAV_30_RULES,
        ValidatorId::EdupubStructureRules => &EDUPUB_STRUCTURE_RULES,
        ValidatorId::EdupubSemanticsRules => &EDUPUB_SEMANTICS_RULES,
    }
}
