//! Filesystem document store.
//!
//! Layout under the store root:
//!
//! ```text
//! <root>/exec_configs/default.yaml
//! <root>/task_sources/humaneval.yaml
//! <root>/bench_results/run-01.yaml
//! <root>/exec_configs_backups/default/1735689600_default.yaml
//! ```
//!
//! Overwriting a document first copies the previous version into the
//! collection's backup directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;

use super::{validate_name, DocumentStore};
use crate::error::{Error, Result};
use crate::types::Collection;

/// File extensions listed as documents.
const DOCUMENT_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

/// Document store backed by one directory per collection.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Create a store rooted at `root`. Directories are created on demand.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding a collection's documents.
    pub fn collection_dir(&self, collection: Collection) -> PathBuf {
        self.root.join(collection.as_str())
    }

    /// Directory holding previous versions of one document.
    pub fn backup_dir(&self, collection: Collection, name: &str) -> PathBuf {
        let stem = Path::new(name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string());
        self.root
            .join(format!("{}_backups", collection.as_str()))
            .join(stem)
    }

    fn document_path(&self, collection: Collection, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.collection_dir(collection).join(name))
    }

    fn not_found(collection: Collection, name: &str) -> Error {
        Error::DocumentNotFound {
            collection,
            name: name.to_string(),
        }
    }

    /// Copy the current version of a document into its backup directory.
    fn backup(&self, collection: Collection, name: &str, path: &Path) -> Result<PathBuf> {
        let backup_dir = self.backup_dir(collection, name);
        std::fs::create_dir_all(&backup_dir)?;

        let backup_path = backup_dir.join(format!("{}_{}", Utc::now().timestamp(), name));
        std::fs::copy(path, &backup_path)?;
        Ok(backup_path)
    }
}

impl DocumentStore for FsStore {
    fn list(&self, collection: Collection) -> Result<Vec<String>> {
        let dir = self.collection_dir(collection);
        std::fs::create_dir_all(&dir)?;

        let escaped_dir = glob::Pattern::escape(&dir.to_string_lossy());
        let mut names = Vec::new();

        for extension in DOCUMENT_EXTENSIONS {
            let pattern = format!("{}/*.{}", escaped_dir, extension);
            let entries = glob::glob(&pattern).map_err(|e| {
                Error::Io(std::io::Error::new(
                    ErrorKind::InvalidInput,
                    format!("invalid document pattern {}: {}", pattern, e),
                ))
            })?;

            for entry in entries.flatten() {
                if !entry.is_file() {
                    continue;
                }
                if let Some(name) = entry.file_name().and_then(|n| n.to_str()) {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        tracing::debug!(collection = %collection, count = names.len(), "Listed documents");
        Ok(names)
    }

    fn read(&self, collection: Collection, name: &str) -> Result<String> {
        let path = self.document_path(collection, name)?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(Self::not_found(collection, name)),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, collection: Collection, name: &str, content: &str) -> Result<()> {
        let path = self.document_path(collection, name)?;
        std::fs::create_dir_all(self.collection_dir(collection))?;

        if path.is_file() {
            let backup_path = self.backup(collection, name, &path)?;
            tracing::debug!(
                collection = %collection,
                name = %name,
                backup = %backup_path.display(),
                "Backed up document before overwrite"
            );
        }

        std::fs::write(&path, content)?;
        tracing::info!(collection = %collection, name = %name, bytes = content.len(), "Wrote document");
        Ok(())
    }

    fn delete(&self, collection: Collection, name: &str) -> Result<()> {
        let path = self.document_path(collection, name)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(collection = %collection, name = %name, "Deleted document");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(Self::not_found(collection, name)),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, FsStore) {
        let dir = TempDir::new().unwrap();
        let store = FsStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_write_then_read() {
        let (_dir, store) = store();
        store
            .write(Collection::ExecConfigs, "default.yaml", "languages: [java]\n")
            .unwrap();
        assert_eq!(
            store.read(Collection::ExecConfigs, "default.yaml").unwrap(),
            "languages: [java]\n"
        );
    }

    #[test]
    fn test_list_only_yaml_sorted() {
        let (_dir, store) = store();
        store.write(Collection::TaskSources, "b.yml", "").unwrap();
        store.write(Collection::TaskSources, "a.yaml", "").unwrap();
        store.write(Collection::TaskSources, "notes.txt", "").unwrap();

        assert_eq!(
            store.list(Collection::TaskSources).unwrap(),
            vec!["a.yaml", "b.yml"]
        );
        assert!(store.list(Collection::BenchResults).unwrap().is_empty());
    }

    #[test]
    fn test_missing_document_is_not_found() {
        let (_dir, store) = store();
        let err = store.read(Collection::BenchResults, "nope.yaml").unwrap_err();
        assert!(err.is_not_found());

        let err = store.delete(Collection::BenchResults, "nope.yaml").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_overwrite_creates_backup() {
        let (_dir, store) = store();
        store.write(Collection::ExecConfigs, "default.yaml", "v1").unwrap();
        store.write(Collection::ExecConfigs, "default.yaml", "v2").unwrap();

        let backup_dir = store.backup_dir(Collection::ExecConfigs, "default.yaml");
        let backups: Vec<_> = std::fs::read_dir(&backup_dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(backups.len(), 1);
        assert_eq!(std::fs::read_to_string(&backups[0]).unwrap(), "v1");
        assert!(backups[0]
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with("_default.yaml"));

        assert_eq!(store.read(Collection::ExecConfigs, "default.yaml").unwrap(), "v2");
    }

    #[test]
    fn test_delete_removes_document() {
        let (_dir, store) = store();
        store.write(Collection::BenchResults, "run.yaml", "[]").unwrap();
        store.delete(Collection::BenchResults, "run.yaml").unwrap();
        assert!(store.list(Collection::BenchResults).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_path_traversal() {
        let (_dir, store) = store();
        let err = store
            .write(Collection::ExecConfigs, "../escape.yaml", "x")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDocumentName(_)));
    }
}
