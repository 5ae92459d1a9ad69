//! Per-document validation context.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::container::Container;
use crate::error::ContextError;
use crate::report::Report;

/// `dc:type` value marking an EDUPUB publication.
pub const DC_TYPE_EDUPUB: &str = "edupub";

/// Publication format version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FormatVersion {
    V2,
    #[default]
    V3,
}

impl FormatVersion {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V2 => "2.0",
            Self::V3 => "3.0",
        }
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatVersion {
    type Err = ContextError;

    /// Accepts `2`, `2.0`, `2.0.1`, `3`, `3.0`, `3.3`, …: only the major
    /// number selects the version.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let major = s.trim().split('.').next().unwrap_or_default();
        match major {
            "2" => Ok(Self::V2),
            "3" => Ok(Self::V3),
            _ => Err(ContextError::UnknownVersion(s.to_owned())),
        }
    }
}

impl Serialize for FormatVersion {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

struct VersionVisitor;

impl Visitor<'_> for VersionVisitor {
    type Value = FormatVersion;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a format version such as 3 or \"3.0\"")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        self.visit_str(&v.to_string())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        self.visit_str(&v.to_string())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        self.visit_str(&v.to_string())
    }
}

impl<'de> Deserialize<'de> for FormatVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(VersionVisitor)
    }
}

/// Conformance profile selecting additional rule sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    #[default]
    Default,
    /// Accessible educational publications.
    Edupub,
    Idx,
    Dict,
    Preview,
}

impl Profile {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Edupub => "edupub",
            Self::Idx => "idx",
            Self::Dict => "dict",
            Self::Preview => "preview",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = ContextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" | "none" => Ok(Self::Default),
            "edupub" => Ok(Self::Edupub),
            "idx" => Ok(Self::Idx),
            "dict" => Ok(Self::Dict),
            "preview" => Ok(Self::Preview),
            _ => Err(ContextError::UnknownProfile(s.to_owned())),
        }
    }
}

/// Publication types declared in the package metadata (`dc:type`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublicationTypes(BTreeSet<String>);

impl PublicationTypes {
    #[must_use]
    pub fn contains(&self, pub_type: &str) -> bool {
        self.0.contains(pub_type)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for PublicationTypes {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Everything a checker needs to know about the document it validates.
///
/// Immutable once built. Cloning is cheap: the container and the report are
/// shared handles, so every clone feeds the same report.
#[derive(Clone)]
pub struct ValidationContext {
    path: String,
    media_type: String,
    version: FormatVersion,
    profile: Profile,
    publication_types: PublicationTypes,
    properties: String,
    container: Arc<dyn Container>,
    report: Arc<dyn Report>,
}

impl ValidationContext {
    /// Start building a context for the entry at `path`.
    #[must_use]
    pub fn builder(
        path: impl Into<String>,
        media_type: impl Into<String>,
        container: Arc<dyn Container>,
        report: Arc<dyn Report>,
    ) -> ValidationContextBuilder {
        ValidationContextBuilder {
            path: path.into(),
            media_type: media_type.into(),
            version: FormatVersion::default(),
            profile: Profile::default(),
            publication_types: PublicationTypes::default(),
            properties: String::new(),
            container,
            report,
        }
    }

    /// Path of the document inside the container.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    #[must_use]
    pub fn version(&self) -> FormatVersion {
        self.version
    }

    #[must_use]
    pub fn profile(&self) -> Profile {
        self.profile
    }

    #[must_use]
    pub fn publication_types(&self) -> &PublicationTypes {
        &self.publication_types
    }

    /// The raw `properties` string declared for the document.
    #[must_use]
    pub fn properties(&self) -> &str {
        &self.properties
    }

    #[must_use]
    pub fn container(&self) -> &dyn Container {
        self.container.as_ref()
    }

    #[must_use]
    pub fn report(&self) -> &dyn Report {
        self.report.as_ref()
    }

    /// Check that the declared media type is the one a checker handles.
    ///
    /// # Errors
    /// Returns [`ContextError::MediaTypeMismatch`] when the types differ.
    pub fn expect_media_type(&self, expected: &'static str) -> Result<(), ContextError> {
        if self.media_type == expected {
            Ok(())
        } else {
            Err(ContextError::MediaTypeMismatch {
                expected,
                found: self.media_type.clone(),
            })
        }
    }
}

impl fmt::Debug for ValidationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationContext")
            .field("path", &self.path)
            .field("media_type", &self.media_type)
            .field("version", &self.version)
            .field("profile", &self.profile)
            .field("publication_types", &self.publication_types)
            .field("properties", &self.properties)
            .field("container", &self.container.name())
            .finish_non_exhaustive()
    }
}

/// Builder for [`ValidationContext`].
pub struct ValidationContextBuilder {
    path: String,
    media_type: String,
    version: FormatVersion,
    profile: Profile,
    publication_types: PublicationTypes,
    properties: String,
    container: Arc<dyn Container>,
    report: Arc<dyn Report>,
}

impl ValidationContextBuilder {
    #[must_use]
    pub fn version(mut self, version: FormatVersion) -> Self {
        self.version = version;
        self
    }

    #[must_use]
    pub fn profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    #[must_use]
    pub fn publication_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.publication_types = types.into_iter().collect();
        self
    }

    #[must_use]
    pub fn properties(mut self, properties: impl Into<String>) -> Self {
        self.properties = properties.into();
        self
    }

    #[must_use]
    pub fn build(self) -> ValidationContext {
        ValidationContext {
            path: self.path,
            media_type: self.media_type,
            version: self.version,
            profile: self.profile,
            publication_types: self.publication_types,
            properties: self.properties,
            container: self.container,
            report: self.report,
        }
    }
}
