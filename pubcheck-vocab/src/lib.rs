//! Property vocabularies and property-list resolution.
//!
//! A `properties` attribute holds whitespace-separated tokens, each either a
//! bare reference (`nav`) resolved against the default vocabulary, or a
//! prefixed reference (`epubcheck:non-linear`) resolved against the vocabulary
//! bound to that prefix. [`parse_property_list`] turns such a string into a
//! typed [`PropertyFlagSet`], keeping only the tokens it recognizes.

mod terms;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

pub use terms::{EPUBCHECK_PREFIX, EPUBCHECK_VOCAB_URI, EpubCheckProperty, ITEM_VOCAB_URI, ItemProperty};

/// Prefixes follow the XML `NCName` production (ASCII subset).
static PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| match Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$") {
        Ok(regex) => regex,
        Err(err) => panic!("Invalid prefix regex: {err}"),
    });

/// Errors from parsing a single property token.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum PropertyError {
    /// The token is empty.
    #[error("Empty property token")]
    Empty,

    /// The part before `:` is not a valid prefix.
    #[error("Invalid property prefix '{prefix}'")]
    InvalidPrefix {
        /// The raw prefix.
        prefix: String,
    },

    /// Nothing follows the `:` separator.
    #[error("Property '{token}' has an empty reference")]
    EmptyReference {
        /// The raw token.
        token: String,
    },

    /// The reference contains whitespace.
    #[error("Property reference '{reference}' contains whitespace")]
    InvalidReference {
        /// The raw reference.
        reference: String,
    },
}

/// One parsed property token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    prefix: Option<String>,
    reference: String,
}

impl Property {
    /// Parse a single token of the form `prefix:reference` or `reference`.
    ///
    /// # Errors
    /// Returns a [`PropertyError`] if the token is empty, the prefix is not a
    /// valid name, or the reference is empty or contains whitespace.
    pub fn parse(token: &str) -> Result<Self, PropertyError> {
        if token.is_empty() {
            return Err(PropertyError::Empty);
        }

        let (prefix, reference) = match token.split_once(':') {
            Some((prefix, reference)) => {
                if !PREFIX_RE.is_match(prefix) {
                    return Err(PropertyError::InvalidPrefix {
                        prefix: prefix.to_owned(),
                    });
                }
                (Some(prefix.to_owned()), reference)
            }
            None => (None, token),
        };

        if reference.is_empty() {
            return Err(PropertyError::EmptyReference {
                token: token.to_owned(),
            });
        }
        if reference.chars().any(char::is_whitespace) {
            return Err(PropertyError::InvalidReference {
                reference: reference.to_owned(),
            });
        }

        Ok(Self {
            prefix,
            reference: reference.to_owned(),
        })
    }

    /// The declared prefix, if any.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// The reference part (the term name).
    #[must_use]
    pub fn reference(&self) -> &str {
        &self.reference
    }
}

/// A closed set of terms belonging to one vocabulary.
pub trait VocabTerm: Copy + Ord + 'static {
    /// Look up a term by its textual name.
    fn from_name(name: &str) -> Option<Self>;

    /// The textual name of the term.
    fn name(self) -> &'static str;
}

/// A vocabulary: a base URI plus a lookup from reference to term.
#[derive(Clone, Copy)]
pub struct Vocab<T> {
    uri: &'static str,
    lookup: fn(&str) -> Option<T>,
}

impl<T: VocabTerm> Vocab<T> {
    /// A vocabulary whose terms are exactly the variants of `T`.
    #[must_use]
    pub fn enumerated(uri: &'static str) -> Self {
        Self {
            uri,
            lookup: T::from_name,
        }
    }
}

impl<T> Vocab<T> {
    /// A vocabulary with a custom lookup function.
    #[must_use]
    pub const fn with_lookup(uri: &'static str, lookup: fn(&str) -> Option<T>) -> Self {
        Self { uri, lookup }
    }

    /// The vocabulary base URI.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        self.uri
    }

    /// Resolve a reference against this vocabulary.
    #[must_use]
    pub fn lookup(&self, reference: &str) -> Option<T> {
        (self.lookup)(reference)
    }
}

impl<T> std::fmt::Debug for Vocab<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vocab")
            .field("uri", &self.uri)
            .finish_non_exhaustive()
    }
}

/// Prefix-to-vocabulary bindings. The empty prefix is the default vocabulary.
#[derive(Debug, Clone)]
pub struct VocabMap<T> {
    vocabs: BTreeMap<&'static str, Vocab<T>>,
}

impl<T> Default for VocabMap<T> {
    fn default() -> Self {
        Self {
            vocabs: BTreeMap::new(),
        }
    }
}

impl<T> VocabMap<T> {
    /// An empty map: every token resolves to nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `prefix` to `vocab`. Use `""` for the default vocabulary.
    #[must_use]
    pub fn with(mut self, prefix: &'static str, vocab: Vocab<T>) -> Self {
        self.vocabs.insert(prefix, vocab);
        self
    }

    /// The vocabulary bound to `prefix`.
    #[must_use]
    pub fn get(&self, prefix: &str) -> Option<&Vocab<T>> {
        self.vocabs.get(prefix)
    }

    /// Resolve one parsed property.
    #[must_use]
    pub fn resolve(&self, property: &Property) -> Option<T> {
        self.get(property.prefix().unwrap_or(""))
            .and_then(|vocab| vocab.lookup(property.reference()))
    }
}

/// The set of recognized terms declared on a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyFlagSet<T: Ord> {
    flags: BTreeSet<T>,
}

impl<T: Ord> Default for PropertyFlagSet<T> {
    fn default() -> Self {
        Self {
            flags: BTreeSet::new(),
        }
    }
}

impl<T: Ord> PropertyFlagSet<T> {
    /// Whether `flag` was declared.
    #[must_use]
    pub fn contains(&self, flag: &T) -> bool {
        self.flags.contains(flag)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Iterate the flags in their natural order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.flags.iter()
    }
}

impl<T: Ord> FromIterator<T> for PropertyFlagSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            flags: iter.into_iter().collect(),
        }
    }
}

impl<'a, T: Ord> IntoIterator for &'a PropertyFlagSet<T> {
    type Item = &'a T;
    type IntoIter = std::collections::btree_set::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.flags.iter()
    }
}

/// Resolve a whitespace-separated property list against `vocabs`.
///
/// Tokens that are malformed, carry an unbound prefix, or name an unknown term
/// are dropped without error: documents may freely use foreign vocabularies.
/// Duplicates collapse.
#[must_use]
pub fn parse_property_list<T: Ord>(raw: &str, vocabs: &VocabMap<T>) -> PropertyFlagSet<T> {
    raw.split_ascii_whitespace()
        .filter_map(|token| Property::parse(token).ok())
        .filter_map(|property| vocabs.resolve(&property))
        .collect()
}
