use crate::error::{Result, StoreError};
use crate::store::StorageKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File name of the persisted config inside a database root.
pub const CONFIG_FILE: &str = "vecstash.toml";

/// Record persisted next to file-backed collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbConfig {
    /// Dimensionality shared by every collection in the database.
    pub vector_dim: usize,
}

impl DbConfig {
    pub fn new(vector_dim: usize) -> Result<Self> {
        let config = Self { vector_dim };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.vector_dim == 0 {
            return Err(StoreError::InvalidVectorDim(self.vector_dim));
        }
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StoreError::ConfigAbsent(path.to_path_buf()),
            _ => StoreError::ConfigRead {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
        })?;

        let config: Self = toml::from_str(&text).map_err(|e| StoreError::ConfigRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let write_error = |reason: String| StoreError::ConfigWrite {
            path: path.to_path_buf(),
            reason,
        };

        let text = toml::to_string(self).map_err(|e| write_error(e.to_string()))?;
        fs::write(path, text).map_err(|e| write_error(e.to_string()))
    }
}

/// Options for [`crate::Database::create`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseOptions {
    pub vector_dim: usize,
    pub storage: StorageKind,
    /// Root directory; required for [`StorageKind::FileSystem`].
    pub path: Option<PathBuf>,
}

impl DatabaseOptions {
    pub fn new(vector_dim: usize) -> Self {
        Self {
            vector_dim,
            ..Default::default()
        }
    }

    pub fn storage(mut self, storage: StorageKind) -> Self {
        self.storage = storage;
        self
    }

    /// Selects file-backed storage rooted at `path`.
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self.storage = StorageKind::FileSystem;
        self
    }
}
