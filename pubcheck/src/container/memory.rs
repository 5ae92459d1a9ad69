use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::Container;

/// A container held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryContainer {
    name: String,
    entries: BTreeMap<String, Vec<u8>>,
    encrypted: BTreeSet<String>,
    unreadable: BTreeSet<String>,
    reads: AtomicUsize,
}

impl MemoryContainer {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_entry(mut self, path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.entries.insert(path.into(), content.into());
        self
    }

    /// Add an entry that is encrypted with a key this container does not hold.
    #[must_use]
    pub fn with_encrypted_entry(
        mut self,
        path: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        let path = path.into();
        self.encrypted.insert(path.clone());
        self.entries.insert(path, content.into());
        self
    }

    /// Add an entry that exists and is decryptable but fails to read.
    #[must_use]
    pub fn with_unreadable_entry(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.unreadable.insert(path.clone());
        self.entries.insert(path, Vec::new());
        self
    }

    /// Number of `read_entry` calls so far.
    #[must_use]
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl Container for MemoryContainer {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_entry(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    fn can_decrypt(&self, path: &str) -> bool {
        !self.encrypted.contains(path)
    }

    fn read_entry(&self, path: &str) -> io::Result<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.encrypted.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("entry '{path}' is encrypted"),
            ));
        }
        if self.unreadable.contains(path) {
            return Err(io::Error::other(format!("entry '{path}' is corrupted")));
        }
        self.entries.get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no entry '{path}'"))
        })
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_and_reads() {
        let container = MemoryContainer::new("book.epub")
            .with_entry("EPUB/nav.xhtml", "<html/>")
            .with_encrypted_entry("EPUB/secret.xhtml", "xx");

        assert_eq!(container.name(), "book.epub");
        assert!(container.has_entry("EPUB/nav.xhtml"));
        assert!(container.has_entry("EPUB/secret.xhtml"));
        assert!(!container.has_entry("EPUB/other.xhtml"));
        assert!(container.can_decrypt("EPUB/nav.xhtml"));
        assert!(!container.can_decrypt("EPUB/secret.xhtml"));

        assert_eq!(container.read_entry("EPUB/nav.xhtml").unwrap(), b"<html/>");
        assert!(container.read_entry("EPUB/secret.xhtml").is_err());
        assert!(container.read_entry("EPUB/other.xhtml").is_err());
        assert_eq!(container.read_count(), 3);
    }

    #[test]
    fn test_unreadable_entry() {
        let container = MemoryContainer::new("c").with_unreadable_entry("a.xhtml");
        assert!(container.has_entry("a.xhtml"));
        assert!(container.can_decrypt("a.xhtml"));
        let err = container.read_entry("a.xhtml").unwrap_err();
        assert!(err.to_string().contains("corrupted"));
    }
}
