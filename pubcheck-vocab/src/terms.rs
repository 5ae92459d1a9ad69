//! Built-in vocabularies.

use std::sync::LazyLock;

use crate::{Vocab, VocabMap, VocabTerm};

/// Prefix of the checker's private vocabulary.
pub const EPUBCHECK_PREFIX: &str = "epubcheck";

/// Base URI of the checker's private vocabulary.
pub const EPUBCHECK_VOCAB_URI: &str = "http://epubcheck.idpf.org/vocab#";

/// Base URI of the package item-properties vocabulary.
pub const ITEM_VOCAB_URI: &str = "http://idpf.org/epub/vocab/package/item/#";

/// Checker-internal properties appended to an item's `properties` so that
/// per-document facts (e.g. spine linearity) reach the document checkers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EpubCheckProperty {
    /// The document is a non-linear spine item.
    NonLinear,
}

impl VocabTerm for EpubCheckProperty {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "non-linear" => Some(Self::NonLinear),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::NonLinear => "non-linear",
        }
    }
}

static EPUBCHECK_MAP: LazyLock<VocabMap<EpubCheckProperty>> = LazyLock::new(|| {
    VocabMap::new().with(EPUBCHECK_PREFIX, Vocab::enumerated(EPUBCHECK_VOCAB_URI))
});

impl EpubCheckProperty {
    /// The map binding `epubcheck:` to this vocabulary.
    #[must_use]
    pub fn vocab_map() -> &'static VocabMap<Self> {
        &EPUBCHECK_MAP
    }
}

/// Manifest item properties (default vocabulary of the `properties` attribute).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ItemProperty {
    CoverImage,
    Mathml,
    Nav,
    RemoteResources,
    Scripted,
    Svg,
    Switch,
}

impl VocabTerm for ItemProperty {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "cover-image" => Self::CoverImage,
            "mathml" => Self::Mathml,
            "nav" => Self::Nav,
            "remote-resources" => Self::RemoteResources,
            "scripted" => Self::Scripted,
            "svg" => Self::Svg,
            "switch" => Self::Switch,
            _ => return None,
        })
    }

    fn name(self) -> &'static str {
        match self {
            Self::CoverImage => "cover-image",
            Self::Mathml => "mathml",
            Self::Nav => "nav",
            Self::RemoteResources => "remote-resources",
            Self::Scripted => "scripted",
            Self::Svg => "svg",
            Self::Switch => "switch",
        }
    }
}

static ITEM_MAP: LazyLock<VocabMap<ItemProperty>> =
    LazyLock::new(|| VocabMap::new().with("", Vocab::enumerated(ITEM_VOCAB_URI)));

impl ItemProperty {
    /// The map binding the default (un-prefixed) vocabulary to item properties.
    #[must_use]
    pub fn vocab_map() -> &'static VocabMap<Self> {
        &ITEM_MAP
    }
}
