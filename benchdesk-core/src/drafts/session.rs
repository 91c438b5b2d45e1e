//! Editing sessions over the draft overlay.

use super::DraftOverlay;
use crate::error::{Error, Result};
use crate::store::DocumentStore;
use crate::types::Collection;

/// One open document as seen by an editing surface.
///
/// Holds the baseline (text last read from or written to the store) and
/// the text currently shown. Dirty state is never cached here: it is derived
/// from the overlay on demand.
#[derive(Debug, Clone)]
pub struct DocumentSession {
    collection: Collection,
    name: String,
    baseline: String,
    content: String,
}

impl DocumentSession {
    /// Open a document, preferring its draft over the stored text.
    ///
    /// A document missing from the store opens with an empty baseline if it
    /// has a draft; otherwise the not-found error is returned.
    pub fn open(
        store: &dyn DocumentStore,
        overlay: &DraftOverlay,
        collection: Collection,
        name: &str,
    ) -> Result<Self> {
        let draft = overlay.get(collection, name);

        let baseline = match store.read(collection, name) {
            Ok(text) => text,
            Err(e) if e.is_not_found() && draft.is_some() => String::new(),
            Err(e) => return Err(e),
        };

        let content = draft.map(str::to_string).unwrap_or_else(|| baseline.clone());
        tracing::debug!(
            collection = %collection,
            name = %name,
            from_draft = draft.is_some(),
            "Opened document"
        );

        Ok(Self {
            collection,
            name: name.to_string(),
            baseline,
            content,
        })
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Text currently shown by this surface.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Text last read from or written to the store.
    pub fn baseline(&self) -> &str {
        &self.baseline
    }

    /// Apply an edit and write it through to the overlay.
    ///
    /// An edit that matches the baseline does not create a draft, but it
    /// does overwrite an existing one.
    pub fn edit(&mut self, overlay: &mut DraftOverlay, text: impl Into<String>) {
        self.content = text.into();
        if self.content != self.baseline || overlay.contains(self.collection, &self.name) {
            overlay.set(self.collection, &self.name, self.content.clone());
        }
    }

    /// Pick up an edit made by another surface on the same document.
    pub fn sync_from(&mut self, overlay: &DraftOverlay) {
        if let Some(draft) = overlay.get(self.collection, &self.name) {
            self.content = draft.to_string();
        }
    }

    /// True when the overlay holds text different from the baseline.
    pub fn is_modified(&self, overlay: &DraftOverlay) -> bool {
        overlay
            .get(self.collection, &self.name)
            .map_or(false, |draft| draft != self.baseline)
    }

    /// Write the overlay's current text to the store.
    ///
    /// The draft is cleared only after the write succeeds, and only if no
    /// newer edit replaced it meanwhile. A failed write leaves the draft and
    /// the baseline untouched. Without a draft, a session showing its
    /// baseline has nothing to write and the store is left alone.
    pub fn save(&mut self, store: &dyn DocumentStore, overlay: &mut DraftOverlay) -> Result<()> {
        let content = match overlay.get(self.collection, &self.name) {
            Some(draft) => draft.to_string(),
            None if self.content == self.baseline => {
                tracing::debug!(
                    collection = %self.collection,
                    name = %self.name,
                    "Nothing to save"
                );
                return Ok(());
            }
            None => self.content.clone(),
        };

        if let Err(e) = store.write(self.collection, &self.name, &content) {
            tracing::warn!(
                collection = %self.collection,
                name = %self.name,
                error = %e,
                "Save failed, keeping draft"
            );
            return Err(e);
        }

        self.baseline = content.clone();
        if !overlay.clear_if(self.collection, &self.name, &content) {
            tracing::debug!(
                collection = %self.collection,
                name = %self.name,
                "Draft changed during save, leaving it dirty"
            );
        }
        self.content = overlay
            .get(self.collection, &self.name)
            .map(str::to_string)
            .unwrap_or(content);
        Ok(())
    }

    /// Drop the draft and show the baseline again.
    pub fn discard(&mut self, overlay: &mut DraftOverlay) {
        overlay.clear(self.collection, &self.name);
        self.content = self.baseline.clone();
    }

    /// Re-read the baseline from the store, keeping any draft.
    pub fn reload(&mut self, store: &dyn DocumentStore, overlay: &DraftOverlay) -> Result<()> {
        self.baseline = store.read(self.collection, &self.name)?;
        self.content = overlay
            .get(self.collection, &self.name)
            .map(str::to_string)
            .unwrap_or_else(|| self.baseline.clone());
        Ok(())
    }
}

/// Outcome of flushing every draft in a collection.
#[derive(Debug, Default)]
pub struct SaveReport {
    /// Documents written and cleared
    pub saved: Vec<String>,
    /// Documents whose write failed; their drafts are kept
    pub failed: Vec<(String, Error)>,
}

impl SaveReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Write every draft of `collection` to the store.
///
/// Failures are collected per document and never abort the batch.
pub fn save_all(
    store: &dyn DocumentStore,
    overlay: &mut DraftOverlay,
    collection: Collection,
) -> SaveReport {
    let mut report = SaveReport::default();

    for name in overlay.list_dirty(collection) {
        let content = match overlay.get(collection, &name) {
            Some(text) => text.to_string(),
            None => continue,
        };

        match store.write(collection, &name, &content) {
            Ok(()) => {
                overlay.clear_if(collection, &name, &content);
                report.saved.push(name);
            }
            Err(e) => {
                tracing::warn!(collection = %collection, name = %name, error = %e, "Save failed, keeping draft");
                report.failed.push((name, e));
            }
        }
    }

    tracing::info!(
        collection = %collection,
        saved = report.saved.len(),
        failed = report.failed.len(),
        "Saved drafts"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FsStore;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Store whose writes fail for selected documents.
    struct FlakyStore {
        inner: FsStore,
        failing: HashSet<String>,
    }

    impl DocumentStore for FlakyStore {
        fn list(&self, collection: Collection) -> Result<Vec<String>> {
            self.inner.list(collection)
        }

        fn read(&self, collection: Collection, name: &str) -> Result<String> {
            self.inner.read(collection, name)
        }

        fn write(&self, collection: Collection, name: &str, content: &str) -> Result<()> {
            if self.failing.contains(name) {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "read-only",
                )));
            }
            self.inner.write(collection, name, content)
        }

        fn delete(&self, collection: Collection, name: &str) -> Result<()> {
            self.inner.delete(collection, name)
        }
    }

    /// Store that counts writes.
    struct CountingStore {
        inner: FsStore,
        writes: AtomicUsize,
    }

    impl DocumentStore for CountingStore {
        fn list(&self, collection: Collection) -> Result<Vec<String>> {
            self.inner.list(collection)
        }

        fn read(&self, collection: Collection, name: &str) -> Result<String> {
            self.inner.read(collection, name)
        }

        fn write(&self, collection: Collection, name: &str, content: &str) -> Result<()> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.write(collection, name, content)
        }

        fn delete(&self, collection: Collection, name: &str) -> Result<()> {
            self.inner.delete(collection, name)
        }
    }

    fn seeded_store() -> (TempDir, FsStore) {
        let dir = TempDir::new().unwrap();
        let store = FsStore::new(dir.path());
        store
            .write(Collection::ExecConfigs, "a.yaml", "languages: [java]\n")
            .unwrap();
        store
            .write(Collection::ExecConfigs, "b.yaml", "languages: [go]\n")
            .unwrap();
        (dir, store)
    }

    #[test]
    fn test_edit_marks_modified_and_save_clears() {
        let (_dir, store) = seeded_store();
        let mut overlay = DraftOverlay::new();
        let mut session =
            DocumentSession::open(&store, &overlay, Collection::ExecConfigs, "a.yaml").unwrap();
        assert!(!session.is_modified(&overlay));

        session.edit(&mut overlay, "languages: [java, python]\n");
        assert!(session.is_modified(&overlay));

        session.save(&store, &mut overlay).unwrap();
        assert!(!session.is_modified(&overlay));
        assert!(!overlay.contains(Collection::ExecConfigs, "a.yaml"));
        assert_eq!(
            store.read(Collection::ExecConfigs, "a.yaml").unwrap(),
            "languages: [java, python]\n"
        );
    }

    #[test]
    fn test_save_without_draft_skips_write() {
        let (dir, inner) = seeded_store();
        let store = CountingStore {
            inner,
            writes: AtomicUsize::new(0),
        };
        let mut overlay = DraftOverlay::new();
        let mut session =
            DocumentSession::open(&store, &overlay, Collection::ExecConfigs, "a.yaml").unwrap();

        session.save(&store, &mut overlay).unwrap();
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
        assert!(!dir.path().join("exec_configs_backups").exists());

        session.edit(&mut overlay, "languages: [scala]\n");
        session.save(&store, &mut overlay).unwrap();
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);

        // Saved text is the new baseline, so a second save is a no-op again
        session.save(&store, &mut overlay).unwrap();
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_edit_back_to_baseline_is_unmodified() {
        let (_dir, store) = seeded_store();
        let mut overlay = DraftOverlay::new();
        let mut session =
            DocumentSession::open(&store, &overlay, Collection::ExecConfigs, "a.yaml").unwrap();

        session.edit(&mut overlay, "languages: []\n");
        session.edit(&mut overlay, "languages: [java]\n");
        assert!(!session.is_modified(&overlay));

        let mut untouched =
            DocumentSession::open(&store, &overlay, Collection::ExecConfigs, "b.yaml").unwrap();
        untouched.edit(&mut overlay, "languages: [go]\n");
        assert!(!overlay.contains(Collection::ExecConfigs, "b.yaml"));
    }

    #[test]
    fn test_reselecting_document_shows_draft() {
        let (_dir, store) = seeded_store();
        let mut overlay = DraftOverlay::new();

        let mut first =
            DocumentSession::open(&store, &overlay, Collection::ExecConfigs, "a.yaml").unwrap();
        first.edit(&mut overlay, "languages: [rust]\n");

        let other =
            DocumentSession::open(&store, &overlay, Collection::ExecConfigs, "b.yaml").unwrap();
        assert_eq!(other.content(), "languages: [go]\n");

        let reopened =
            DocumentSession::open(&store, &overlay, Collection::ExecConfigs, "a.yaml").unwrap();
        assert_eq!(reopened.content(), "languages: [rust]\n");
        assert_eq!(reopened.baseline(), "languages: [java]\n");
        assert!(reopened.is_modified(&overlay));
    }

    #[test]
    fn test_failed_save_keeps_draft() {
        let (_dir, inner) = seeded_store();
        let store = FlakyStore {
            inner,
            failing: ["a.yaml".to_string()].into_iter().collect(),
        };
        let mut overlay = DraftOverlay::new();
        let mut session =
            DocumentSession::open(&store, &overlay, Collection::ExecConfigs, "a.yaml").unwrap();
        session.edit(&mut overlay, "languages: [kotlin]\n");

        assert!(session.save(&store, &mut overlay).is_err());
        assert_eq!(
            overlay.get(Collection::ExecConfigs, "a.yaml"),
            Some("languages: [kotlin]\n")
        );
        assert!(session.is_modified(&overlay));
        assert_eq!(session.baseline(), "languages: [java]\n");
    }

    #[test]
    fn test_two_surfaces_share_one_draft() {
        let (_dir, store) = seeded_store();
        let mut overlay = DraftOverlay::new();
        let mut form =
            DocumentSession::open(&store, &overlay, Collection::ExecConfigs, "a.yaml").unwrap();
        let mut raw =
            DocumentSession::open(&store, &overlay, Collection::ExecConfigs, "a.yaml").unwrap();

        form.edit(&mut overlay, "languages: [java, c]\n");
        raw.sync_from(&overlay);
        assert_eq!(raw.content(), "languages: [java, c]\n");

        raw.edit(&mut overlay, "languages: [c]\n");
        form.save(&store, &mut overlay).unwrap();
        assert_eq!(store.read(Collection::ExecConfigs, "a.yaml").unwrap(), "languages: [c]\n");
        assert!(!raw.is_modified(&overlay));
    }

    #[test]
    fn test_discard_reverts_to_baseline() {
        let (_dir, store) = seeded_store();
        let mut overlay = DraftOverlay::new();
        let mut session =
            DocumentSession::open(&store, &overlay, Collection::ExecConfigs, "a.yaml").unwrap();
        session.edit(&mut overlay, "junk");

        session.discard(&mut overlay);
        assert_eq!(session.content(), "languages: [java]\n");
        assert!(overlay.is_empty());
    }

    #[test]
    fn test_open_missing_document() {
        let (_dir, store) = seeded_store();
        let mut overlay = DraftOverlay::new();

        let err = DocumentSession::open(&store, &overlay, Collection::ExecConfigs, "new.yaml")
            .unwrap_err();
        assert!(err.is_not_found());

        overlay.set(Collection::ExecConfigs, "new.yaml", "languages: []\n");
        let session =
            DocumentSession::open(&store, &overlay, Collection::ExecConfigs, "new.yaml").unwrap();
        assert_eq!(session.baseline(), "");
        assert!(session.is_modified(&overlay));
    }

    #[test]
    fn test_save_all_reports_failures() {
        let (_dir, inner) = seeded_store();
        let store = FlakyStore {
            inner,
            failing: ["b.yaml".to_string()].into_iter().collect(),
        };
        let mut overlay = DraftOverlay::new();
        overlay.set(Collection::ExecConfigs, "a.yaml", "a2");
        overlay.set(Collection::ExecConfigs, "b.yaml", "b2");
        overlay.set(Collection::TaskSources, "t.yaml", "t2");

        let report = save_all(&store, &mut overlay, Collection::ExecConfigs);
        assert_eq!(report.saved, vec!["a.yaml"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "b.yaml");
        assert!(!report.is_success());

        assert_eq!(overlay.list_dirty(Collection::ExecConfigs), vec!["b.yaml"]);
        assert_eq!(overlay.get(Collection::TaskSources, "t.yaml"), Some("t2"));
        assert_eq!(store.read(Collection::ExecConfigs, "a.yaml").unwrap(), "a2");
    }

    #[test]
    fn test_reload_keeps_draft() {
        let (_dir, store) = seeded_store();
        let mut overlay = DraftOverlay::new();
        let mut session =
            DocumentSession::open(&store, &overlay, Collection::ExecConfigs, "a.yaml").unwrap();
        session.edit(&mut overlay, "draft");

        store
            .write(Collection::ExecConfigs, "a.yaml", "changed elsewhere")
            .unwrap();
        session.reload(&store, &overlay).unwrap();
        assert_eq!(session.baseline(), "changed elsewhere");
        assert_eq!(session.content(), "draft");
    }
}
