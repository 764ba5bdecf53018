//! Database lifecycle: a root directory holding one config record and the
//! `<name>.idx` / `<name>.data` stream pairs of its collections.

use crate::config::{DatabaseOptions, DbConfig, CONFIG_FILE};
use crate::error::{Result, StoreError};
use crate::store::{Collection, FileStorage, MemoryStorage, StorageKind};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

pub const INDEX_EXTENSION: &str = "idx";
pub const DATA_EXTENSION: &str = "data";

#[derive(Debug, Clone)]
pub struct Database {
    path: Option<PathBuf>,
    config: DbConfig,
    storage: StorageKind,
}

impl Database {
    /// Creates a new database. File-backed databases get their root
    /// directory and config written here.
    #[instrument]
    pub fn create(options: DatabaseOptions) -> Result<Self> {
        let config = DbConfig::new(options.vector_dim)?;

        let path = match options.storage {
            StorageKind::Memory => None,
            StorageKind::FileSystem => {
                let root = options.path.ok_or(StoreError::MissingPath)?;
                ensure_dir(&root)?;

                let config_path = root.join(CONFIG_FILE);
                if config_path.exists() {
                    return Err(StoreError::AlreadyInitialized(root));
                }
                config.save(&config_path)?;
                Some(root)
            }
        };

        info!(vector_dim = config.vector_dim, storage = ?options.storage, "database created");
        Ok(Self {
            path,
            config,
            storage: options.storage,
        })
    }

    /// Opens an existing file-backed database.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let root = path.as_ref().to_path_buf();
        let config = DbConfig::load(root.join(CONFIG_FILE))?;

        info!(vector_dim = config.vector_dim, "database opened");
        Ok(Self {
            path: Some(root),
            config,
            storage: StorageKind::FileSystem,
        })
    }

    /// Opens collection `name`, creating it if absent.
    ///
    /// Memory-backed databases hand out a fresh, empty collection on every
    /// call.
    #[instrument(skip(self))]
    pub fn open_collection(&self, name: &str) -> Result<Collection> {
        match (&self.storage, &self.path) {
            (StorageKind::FileSystem, Some(root)) => {
                let index = FileStorage::open(root.join(format!("{name}.{INDEX_EXTENSION}")))?;
                let data = FileStorage::open(root.join(format!("{name}.{DATA_EXTENSION}")))?;
                Collection::open(index, data, self.config.vector_dim)
            }
            (StorageKind::FileSystem, None) => Err(StoreError::MissingPath),
            (StorageKind::Memory, _) => Collection::open(
                MemoryStorage::new(),
                MemoryStorage::new(),
                self.config.vector_dim,
            ),
        }
    }

    pub fn vector_dim(&self) -> usize {
        self.config.vector_dim
    }

    pub fn storage_kind(&self) -> StorageKind {
        self.storage
    }

    /// Root directory of a file-backed database.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn ensure_dir(path: &Path) -> Result<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(StoreError::PathIsFile(path.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(path).map_err(|e| StoreError::file("create directory", path, e))
        }
        Err(e) => Err(StoreError::file("stat", path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SortOrder;
    use tempfile::tempdir;

    #[test]
    fn create_memory_database() {
        let db = Database::create(DatabaseOptions::new(16)).unwrap();
        assert_eq!(db.vector_dim(), 16);
        assert_eq!(db.storage_kind(), StorageKind::Memory);
        assert!(db.path().is_none());
        assert!(db.open_collection("foo").unwrap().is_empty());
    }

    #[test]
    fn create_rejects_zero_dimension() {
        assert!(matches!(
            Database::create(DatabaseOptions::new(0)),
            Err(StoreError::InvalidVectorDim(0))
        ));
    }

    #[test]
    fn create_file_database_requires_path() {
        let options = DatabaseOptions::new(4).storage(StorageKind::FileSystem);
        assert!(matches!(
            Database::create(options),
            Err(StoreError::MissingPath)
        ));
    }

    #[test]
    fn create_and_open_file_database() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("testdb");

        let db = Database::create(DatabaseOptions::new(16).path(&root)).unwrap();
        assert!(root.join(CONFIG_FILE).is_file());
        assert_eq!(db.path(), Some(root.as_path()));

        let reopened = Database::open(&root).unwrap();
        assert_eq!(reopened.vector_dim(), 16);
        assert_eq!(reopened.storage_kind(), StorageKind::FileSystem);
    }

    #[test]
    fn create_twice_fails() {
        let dir = tempdir().unwrap();
        Database::create(DatabaseOptions::new(4).path(dir.path())).unwrap();
        assert!(matches!(
            Database::create(DatabaseOptions::new(8).path(dir.path())),
            Err(StoreError::AlreadyInitialized(_))
        ));
        assert_eq!(Database::open(dir.path()).unwrap().vector_dim(), 4);
    }

    #[test]
    fn create_rejects_file_root() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("plain");
        std::fs::write(&file, b"x").unwrap();
        assert!(matches!(
            Database::create(DatabaseOptions::new(4).path(&file)),
            Err(StoreError::PathIsFile(_))
        ));
    }

    #[test]
    fn open_without_config_fails() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            Database::open(dir.path()),
            Err(StoreError::ConfigAbsent(_))
        ));
    }

    #[test]
    fn collection_files_survive_reopen() {
        let dir = tempdir().unwrap();
        let db = Database::create(DatabaseOptions::new(2).path(dir.path())).unwrap();

        let mut collection = db.open_collection("notes").unwrap();
        collection.append(&[1.0, 0.0], b"east").unwrap();
        collection.append(&[0.0, 1.0], b"north").unwrap();
        collection.close().unwrap();
        drop(collection);
        assert!(dir.path().join("notes.idx").is_file());
        assert!(dir.path().join("notes.data").is_file());

        let db = Database::open(dir.path()).unwrap();
        let mut collection = db.open_collection("notes").unwrap();
        assert_eq!(collection.len(), 2);

        let best = collection
            .cosine_similarity(&[0.1, 0.9], SortOrder::Descending, 1)
            .unwrap();
        assert_eq!(best.len(), 1);
        assert_eq!(
            collection.data(best[0].position, best[0].size).unwrap(),
            b"north"
        );
    }

    #[test]
    fn collection_path_that_is_a_directory() {
        let dir = tempdir().unwrap();
        let db = Database::create(DatabaseOptions::new(2).path(dir.path())).unwrap();
        std::fs::create_dir(dir.path().join("bad.idx")).unwrap();
        assert!(matches!(
            db.open_collection("bad"),
            Err(StoreError::PathIsDir(_))
        ));
    }
}
