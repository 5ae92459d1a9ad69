//! Packaged-container access.
//!
//! Checkers only ask a container whether an entry exists and whether it can
//! be decrypted. Entry bytes are read by the XML driver, never by validators.

mod dir;
mod memory;

pub use dir::DirContainer;
pub use memory::MemoryContainer;

/// A publication container holding entries addressed by `/`-separated paths.
pub trait Container: Send + Sync {
    /// Name used to locate container-level messages (e.g. the archive name).
    fn name(&self) -> &str;

    fn has_entry(&self, path: &str) -> bool;

    /// Whether the entry is readable in clear text. Entries without
    /// encryption are always decryptable.
    fn can_decrypt(&self, path: &str) -> bool;

    /// Read the full entry.
    ///
    /// # Errors
    /// Returns an I/O error if the entry is missing, encrypted, or unreadable.
    fn read_entry(&self, path: &str) -> std::io::Result<Vec<u8>>;
}
