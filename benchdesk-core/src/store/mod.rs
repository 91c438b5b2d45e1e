//! Document store abstraction
//!
//! The console reads and writes plain text documents grouped into
//! [`Collection`]s. All editing goes through the [`DocumentStore`] trait so
//! the draft overlay never cares where documents live.
//!
//! ## Design Principles
//!
//! 1. **Text in, text out**: the store never parses documents
//! 2. **Explicit absence**: reading or deleting a missing document is
//!    [`Error::DocumentNotFound`](crate::Error::DocumentNotFound)
//! 3. **Create or overwrite**: `write` never fails because a document exists

mod fs;

pub use fs::FsStore;

use crate::error::{Error, Result};
use crate::types::Collection;

/// Trait implemented by document stores.
pub trait DocumentStore: Send + Sync {
    /// Document names in a collection, sorted.
    fn list(&self, collection: Collection) -> Result<Vec<String>>;

    /// Full text of a document.
    fn read(&self, collection: Collection, name: &str) -> Result<String>;

    /// Create or overwrite a document.
    fn write(&self, collection: Collection, name: &str, content: &str) -> Result<()>;

    /// Remove a document.
    fn delete(&self, collection: Collection, name: &str) -> Result<()>;
}

/// Reject names that would escape their collection directory.
pub fn validate_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name == "."
        || name.contains("..")
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');

    if invalid {
        return Err(Error::InvalidDocumentName(name.to_string()));
    }
    Ok(())
}
