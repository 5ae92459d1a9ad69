//! Check configuration files.
//!
//! A configuration describes the publication-level facts a check needs but
//! cannot read from the navigation document itself: format version, profile,
//! declared publication types, the item's `properties`, which entries are
//! encrypted, and which documents are navigation documents.
//!
//! ```yaml
//! version: 3
//! profile: edupub
//! publication_types: [edupub]
//! properties: "nav"
//! encrypted: ["fonts/*.otf"]
//! nav: [OEBPS/nav.xhtml]
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::container::Container;
use crate::context::{FormatVersion, Profile, ValidationContext, ValidationContextBuilder};
use crate::error::ConfigError;
use crate::nav::NAV_MEDIA_TYPE;
use crate::report::Report;

/// Default navigation document path when none is configured.
pub const DEFAULT_NAV_PATH: &str = "nav.xhtml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[non_exhaustive]
pub struct CheckConfig {
    pub version: FormatVersion,
    pub profile: Profile,
    /// `dc:type` values declared by the publication.
    pub publication_types: Vec<String>,
    /// Raw `properties` of the navigation document's manifest item.
    pub properties: String,
    /// Glob patterns of entries that cannot be decrypted.
    pub encrypted: Vec<String>,
    /// Navigation document paths inside the container.
    pub nav: Vec<String>,
}

impl CheckConfig {
    /// Load a configuration, picking the format from the file extension
    /// (`.yaml`/`.yml` or `.json`).
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the file cannot be read, has an unsupported
    /// extension, or does not parse.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let extension = path
            .extension()
            .and_then(std::ffi::OsStr::to_str)
            .map(str::to_ascii_lowercase);
        let read = || {
            std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        };

        let config = match extension.as_deref() {
            Some("yaml" | "yml") => Self::from_yaml_str(&read()?)?,
            Some("json") => Self::from_json_str(&read()?)?,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };
        tracing::debug!(path = %path.display(), "loaded check config");
        Ok(config)
    }

    /// # Errors
    /// Returns [`ConfigError::Yaml`] on malformed or unknown fields.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_saphyr::from_str(content).map_err(|e| ConfigError::Yaml(e.to_string()))
    }

    /// # Errors
    /// Returns [`ConfigError::Json`] on malformed or unknown fields.
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Configured navigation documents, or [`DEFAULT_NAV_PATH`].
    #[must_use]
    pub fn nav_paths(&self) -> Vec<String> {
        if self.nav.is_empty() {
            vec![DEFAULT_NAV_PATH.to_owned()]
        } else {
            self.nav.clone()
        }
    }

    /// A context builder for the navigation document at `path`.
    #[must_use]
    pub fn context_builder(
        &self,
        path: &str,
        container: Arc<dyn Container>,
        report: Arc<dyn Report>,
    ) -> ValidationContextBuilder {
        ValidationContext::builder(path, NAV_MEDIA_TYPE, container, report)
            .version(self.version)
            .profile(self.profile)
            .publication_types(self.publication_types.iter().cloned())
            .properties(self.properties.clone())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::MemoryContainer;
    use crate::report::MemoryReport;
    use std::io::Write;

    #[test]
    fn test_yaml_config() {
        let config = CheckConfig::from_yaml_str(
            "version: 2\nprofile: edupub\npublication_types: [edupub]\n\
             properties: \"epubcheck:non-linear\"\nnav: [OEBPS/nav.xhtml]\n",
        )
        .unwrap();
        assert_eq!(config.version, FormatVersion::V2);
        assert_eq!(config.profile, Profile::Edupub);
        assert_eq!(config.publication_types, vec!["edupub"]);
        assert_eq!(config.properties, "epubcheck:non-linear");
        assert_eq!(config.nav_paths(), vec!["OEBPS/nav.xhtml"]);
    }

    #[test]
    fn test_json_config_defaults() {
        let config = CheckConfig::from_json_str(r#"{"encrypted": ["*.otf"]}"#).unwrap();
        assert_eq!(config.version, FormatVersion::V3);
        assert_eq!(config.profile, Profile::Default);
        assert_eq!(config.encrypted, vec!["*.otf"]);
        assert_eq!(config.nav_paths(), vec![DEFAULT_NAV_PATH]);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(matches!(
            CheckConfig::from_json_str(r#"{"verbose": true}"#),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            CheckConfig::from_yaml_str("verbose: true\n"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_from_path_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let yaml = dir.path().join("check.yml");
        std::fs::File::create(&yaml)
            .unwrap()
            .write_all(b"profile: edupub\n")
            .unwrap();
        assert_eq!(CheckConfig::from_path(&yaml).unwrap().profile, Profile::Edupub);

        let toml = dir.path().join("check.toml");
        std::fs::write(&toml, "profile = 'edupub'").unwrap();
        assert!(matches!(
            CheckConfig::from_path(&toml),
            Err(ConfigError::UnsupportedFormat(_))
        ));

        let missing = dir.path().join("missing.json");
        assert!(matches!(
            CheckConfig::from_path(&missing),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_context_builder_carries_settings() {
        let config = CheckConfig::from_yaml_str("version: 2\nprofile: idx\n").unwrap();
        let ctx = config
            .context_builder(
                "nav.xhtml",
                Arc::new(MemoryContainer::new("book")),
                Arc::new(MemoryReport::new()),
            )
            .build();
        assert_eq!(ctx.version(), FormatVersion::V2);
        assert_eq!(ctx.profile(), Profile::Idx);
        assert_eq!(ctx.media_type(), NAV_MEDIA_TYPE);
    }
}
