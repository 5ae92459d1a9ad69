//! Unpacked publication directory as a container.
//!
//! The directory is indexed once at open time. Safety properties:
//! - Symlinks are not followed
//! - Maximum directory depth is enforced
//! - Only indexed regular files can be read, so `..` paths never escape the root
//! - Reads are bounded to prevent memory `DoS`

use std::collections::BTreeSet;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use glob::Pattern;
use walkdir::WalkDir;

use super::Container;
use crate::error::ContainerError;

/// Maximum directory traversal depth.
pub const MAX_DEPTH: usize = 64;

/// Maximum size of a single entry in bytes (64 MB).
pub const MAX_ENTRY_SIZE: u64 = 67_108_864;

/// A container backed by a directory on disk.
#[derive(Debug)]
pub struct DirContainer {
    root: PathBuf,
    name: String,
    entries: BTreeSet<String>,
    encrypted: Vec<Pattern>,
}

impl DirContainer {
    /// Index `root`. Entries matching any of the `encrypted` glob patterns are
    /// treated as encrypted with an unavailable key.
    ///
    /// # Errors
    /// Returns an error if `root` is not a directory, a pattern is invalid,
    /// or the directory cannot be traversed.
    pub fn open(root: &Path, encrypted: &[String]) -> Result<Self, ContainerError> {
        if !root.is_dir() {
            return Err(ContainerError::NotADirectory(root.to_path_buf()));
        }

        let encrypted = encrypted
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|source| ContainerError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut entries = BTreeSet::new();
        for entry in WalkDir::new(root).follow_links(false).max_depth(MAX_DEPTH) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(root) {
                entries.insert(entry_name(relative));
            }
        }

        let name = root
            .file_name()
            .map_or_else(|| root.display().to_string(), |n| n.to_string_lossy().into_owned());

        tracing::debug!(root = %root.display(), entries = entries.len(), "indexed container");

        Ok(Self {
            root: root.to_path_buf(),
            name,
            entries,
            encrypted,
        })
    }

    /// All entry paths, sorted.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

/// Join path components with `/` regardless of platform.
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

impl Container for DirContainer {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_entry(&self, path: &str) -> bool {
        self.entries.contains(path)
    }

    fn can_decrypt(&self, path: &str) -> bool {
        !self.encrypted.iter().any(|p| p.matches(path))
    }

    fn read_entry(&self, path: &str) -> io::Result<Vec<u8>> {
        if !self.has_entry(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no entry '{path}'"),
            ));
        }
        if !self.can_decrypt(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("entry '{path}' is encrypted"),
            ));
        }

        // Read at most MAX_ENTRY_SIZE + 1 bytes to detect oversized entries
        let file = std::fs::File::open(self.root.join(path))?;
        let mut buffer = Vec::new();
        file.take(MAX_ENTRY_SIZE + 1).read_to_end(&mut buffer)?;
        if buffer.len() as u64 > MAX_ENTRY_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("entry exceeds maximum size of {MAX_ENTRY_SIZE} bytes"),
            ));
        }
        Ok(buffer)
    }
}
