//! Message identifiers, severities and locations.

use std::fmt;

use serde::{Serialize, Serializer};

/// Severity of a reported finding. Only `Fatal`, `Error` and `Warning` are
/// counted by a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Fatal,
    Error,
    Warning,
    Info,
    Usage,
}

impl Severity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fatal => "FATAL",
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
            Self::Usage => "USAGE",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifiers of the messages emitted by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[non_exhaustive]
pub enum MessageId {
    /// Navigation document found in an EPUB 2 publication.
    Nav001,
    /// Remote link in a toc, page-list or landmarks nav.
    Nav010,
    /// A container entry could not be read.
    Pkg008,
    /// A container entry is missing.
    Rsc001,
    /// A container entry cannot be decrypted.
    Rsc004,
    /// Grammar or rule error.
    Rsc005,
    /// A referenced local resource is missing.
    Rsc007,
    /// Fatal well-formedness error.
    Rsc016,
    /// Grammar or rule warning.
    Rsc017,
}

impl MessageId {
    /// The stable textual code, e.g. `NAV-001`.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Nav001 => "NAV-001",
            Self::Nav010 => "NAV-010",
            Self::Pkg008 => "PKG-008",
            Self::Rsc001 => "RSC-001",
            Self::Rsc004 => "RSC-004",
            Self::Rsc005 => "RSC-005",
            Self::Rsc007 => "RSC-007",
            Self::Rsc016 => "RSC-016",
            Self::Rsc017 => "RSC-017",
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> Severity {
        match self {
            Self::Nav001 => Severity::Info,
            Self::Rsc017 => Severity::Warning,
            Self::Pkg008 | Self::Rsc016 => Severity::Fatal,
            Self::Nav010 | Self::Rsc001 | Self::Rsc004 | Self::Rsc005 | Self::Rsc007 => {
                Severity::Error
            }
        }
    }

    const fn template(self) -> &'static str {
        match self {
            Self::Nav001 => "The navigation document is not supported in EPUB 2 publications.",
            Self::Nav010 => "\"{0}\" nav must not link to remote resources; found link to \"{1}\".",
            Self::Pkg008 => "Unable to read file \"{0}\": {1}",
            Self::Rsc001 => "File \"{0}\" could not be found.",
            Self::Rsc004 => "File \"{0}\" could not be decrypted.",
            Self::Rsc005 => "Error while parsing file: {0}",
            Self::Rsc007 => "Referenced resource \"{0}\" could not be found in the publication.",
            Self::Rsc016 => "Fatal Error while parsing file: {0}",
            Self::Rsc017 => "Warning while parsing file: {0}",
        }
    }

    /// Render the message text, substituting `{0}`, `{1}`, … with `args`.
    ///
    /// The template is scanned once, so placeholders inside arguments stay
    /// literal. Placeholders without an argument are kept as is.
    #[must_use]
    pub fn format(self, args: &[&str]) -> String {
        let mut text = String::new();
        let mut rest = self.template();
        while let Some(open) = rest.find('{') {
            let (before, tail) = rest.split_at(open);
            text.push_str(before);
            let arg = tail.find('}').and_then(|close| {
                let index = tail.get(1..close)?.parse::<usize>().ok()?;
                Some((*args.get(index)?, close))
            });
            if let Some((arg, close)) = arg {
                text.push_str(arg);
                rest = tail.get(close + 1..).unwrap_or_default();
            } else {
                text.push('{');
                rest = tail.get(1..).unwrap_or_default();
            }
        }
        text.push_str(rest);
        text
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for MessageId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// Where a message applies. Line and column are 1-based; `-1` means unknown
/// and `0` means "the resource as a whole".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageLocation {
    pub path: String,
    pub line: i64,
    pub column: i64,
}

impl MessageLocation {
    #[must_use]
    pub fn new(path: impl Into<String>, line: i64, column: i64) -> Self {
        Self {
            path: path.into(),
            line,
            column,
        }
    }

    /// A location at a 1-based line/column pair coming from the tokenizer.
    #[must_use]
    pub fn at(path: impl Into<String>, line: usize, column: usize) -> Self {
        Self::new(
            path,
            i64::try_from(line).unwrap_or(i64::MAX),
            i64::try_from(column).unwrap_or(i64::MAX),
        )
    }
}

impl fmt::Display for MessageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line > 0 {
            write!(f, "{}({},{})", self.path, self.line, self.column)
        } else {
            f.write_str(&self.path)
        }
    }
}

/// One reported finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: MessageId,
    pub severity: Severity,
    pub location: MessageLocation,
    pub text: String,
}

impl Message {
    /// Format the message for human-readable output:
    /// `{SEVERITY}({CODE}): {location}: {text}`.
    #[must_use]
    pub fn format_human_readable(&self) -> String {
        format!(
            "{}({}): {}: {}",
            self.severity, self.id, self.location, self.text
        )
    }
}
