//! Draft overlay: unsaved edits across open documents
//!
//! The [`DraftOverlay`] is the single source of truth for "what has the
//! user changed but not saved". Every editing surface writes through it,
//! whether it edits raw text or a structured form, and whichever panel has
//! the document open.
//!
//! ## Lifecycle of an entry
//!
//! - Created by the first edit that diverges from the loaded text
//! - Overwritten on every later edit (last write wins, no versioning)
//! - Removed only after the document was written to the store, or when the
//!   user discards the edit
//!
//! The overlay does not decide whether a document is modified; it only keeps
//! the latest edited text. [`DocumentSession`] compares that text against
//! what was last read from or written to the store.

mod session;

pub use session::{save_all, DocumentSession, SaveReport};

use std::collections::BTreeMap;

use crate::types::Collection;

/// Keyed store of unsaved document text.
///
/// Owned by the application and passed by reference to every editing
/// surface. Keys are independent: there is no cross-document invariant.
#[derive(Debug, Clone, Default)]
pub struct DraftOverlay {
    drafts: BTreeMap<Collection, BTreeMap<String, String>>,
}

impl DraftOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// The draft for a document, or `None` to read from the store instead.
    pub fn get(&self, collection: Collection, name: &str) -> Option<&str> {
        self.drafts
            .get(&collection)
            .and_then(|docs| docs.get(name))
            .map(String::as_str)
    }

    /// Create or overwrite the draft for a document.
    pub fn set(&mut self, collection: Collection, name: &str, content: impl Into<String>) {
        let content = content.into();
        tracing::trace!(collection = %collection, name = %name, bytes = content.len(), "Draft updated");
        self.drafts
            .entry(collection)
            .or_default()
            .insert(name.to_string(), content);
    }

    /// Remove the draft for a document. Returns the removed text, if any.
    pub fn clear(&mut self, collection: Collection, name: &str) -> Option<String> {
        let docs = self.drafts.get_mut(&collection)?;
        let removed = docs.remove(name);
        if docs.is_empty() {
            self.drafts.remove(&collection);
        }
        removed
    }

    /// Remove the draft only if it still holds exactly `saved`.
    ///
    /// Used after a save completes: an edit made while the save was in
    /// flight must stay dirty. Returns true if the entry was removed.
    pub fn clear_if(&mut self, collection: Collection, name: &str, saved: &str) -> bool {
        if self.get(collection, name) == Some(saved) {
            self.clear(collection, name);
            true
        } else {
            false
        }
    }

    /// Names of documents with a draft in `collection`, sorted.
    pub fn list_dirty(&self, collection: Collection) -> Vec<String> {
        self.drafts
            .get(&collection)
            .map(|docs| docs.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, collection: Collection, name: &str) -> bool {
        self.get(collection, name).is_some()
    }

    /// Total number of drafts across collections.
    pub fn len(&self) -> usize {
        self.drafts.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }
}
