//! Append-only byte streams: a pair of lazily opened OS file handles, or a
//! growable in-memory buffer. Neither variant ever truncates or overwrites.

use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Which backend a database hands to its collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StorageKind {
    FileSystem,
    #[default]
    Memory,
}

/// Uniform append / positioned read / size primitive.
///
/// `reader` never succeeds at or past the current size, and `size` only
/// counts bytes already handed to the OS (no user-space write buffering).
pub trait Storage: Send {
    fn kind(&self) -> StorageKind;

    /// Bytes appended so far.
    fn size(&self) -> u64;

    fn writer(&mut self) -> Result<&mut dyn Write>;

    /// Releases the write handle. Idempotent.
    fn close_writer(&mut self) -> Result<()>;

    /// A reader positioned at `position`, running to the current end.
    fn reader(&mut self, position: u64) -> Result<Box<dyn Read + '_>>;

    /// Releases the read handle. Idempotent.
    fn close_reader(&mut self) -> Result<()>;

    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer()?.write_all(bytes)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// File-backed stream. Write and read handles are opened on first use and
/// share one path.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    reader: Option<File>,
    writer: Option<File>,
}

impl FileStorage {
    /// Opens the stream at `path`, creating an empty file if none exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        match fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => return Err(StoreError::PathIsDir(path)),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .map_err(|e| StoreError::file("create", &path, e))?;
            }
            Err(e) => return Err(StoreError::file("stat", &path, e)),
        }

        Ok(Self {
            path,
            reader: None,
            writer: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_writer(&self) -> Result<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::file("open for append", &self.path, e))
    }
}

impl Storage for FileStorage {
    fn kind(&self) -> StorageKind {
        StorageKind::FileSystem
    }

    fn size(&self) -> u64 {
        fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }

    fn writer(&mut self) -> Result<&mut dyn Write> {
        let file = match self.writer.take() {
            Some(file) => file,
            None => self.open_writer()?,
        };
        Ok(self.writer.insert(file))
    }

    fn close_writer(&mut self) -> Result<()> {
        if let Some(file) = self.writer.take() {
            file.sync_all()
                .map_err(|e| StoreError::file("sync", &self.path, e))?;
        }
        Ok(())
    }

    fn reader(&mut self, position: u64) -> Result<Box<dyn Read + '_>> {
        let size = self.size();
        if position >= size {
            return Err(StoreError::Seek { position, size });
        }

        let mut file = match self.reader.take() {
            Some(file) => file,
            None => File::open(&self.path)
                .map_err(|e| StoreError::file("open for read", &self.path, e))?,
        };
        if let Err(e) = file.seek(SeekFrom::Start(position)) {
            return Err(StoreError::file("seek", &self.path, e));
        }
        Ok(Box::new(self.reader.insert(file)))
    }

    fn close_reader(&mut self) -> Result<()> {
        self.reader = None;
        Ok(())
    }

    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        let file = match self.writer.take() {
            Some(file) => file,
            None => self.open_writer()?,
        };
        self.writer
            .insert(file)
            .write_all(bytes)
            .map_err(|e| StoreError::file("write", &self.path, e))
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(file) = self.writer.as_mut() {
            file.sync_data()
                .map_err(|e| StoreError::file("sync", &self.path, e))?;
        }
        Ok(())
    }
}

/// In-memory stream; close operations are no-ops.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    data: Vec<u8>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

impl Storage for MemoryStorage {
    fn kind(&self) -> StorageKind {
        StorageKind::Memory
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn writer(&mut self) -> Result<&mut dyn Write> {
        Ok(&mut self.data)
    }

    fn close_writer(&mut self) -> Result<()> {
        Ok(())
    }

    fn reader(&mut self, position: u64) -> Result<Box<dyn Read + '_>> {
        let size = self.size();
        if position >= size {
            return Err(StoreError::Seek { position, size });
        }
        Ok(Box::new(&self.data[position as usize..]))
    }

    fn close_reader(&mut self) -> Result<()> {
        Ok(())
    }

    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.data.extend_from_slice(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn read_all(storage: &mut dyn Storage, position: u64) -> Vec<u8> {
        let mut out = Vec::new();
        storage.reader(position).unwrap().read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn memory_append_and_read() {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.size(), 0);

        storage.append(b"hello").unwrap();
        storage.writer().unwrap().write_all(b" world").unwrap();

        assert_eq!(storage.size(), 11);
        assert_eq!(storage.as_bytes(), b"hello world");
        assert_eq!(read_all(&mut storage, 0), b"hello world");
        assert_eq!(read_all(&mut storage, 6), b"world");
    }

    #[test]
    fn memory_reader_rejects_end_position() {
        let mut storage = MemoryStorage::from_bytes(vec![1, 2, 3]);
        assert!(matches!(
            storage.reader(3),
            Err(StoreError::Seek { position: 3, size: 3 })
        ));
        assert!(matches!(
            MemoryStorage::new().reader(0),
            Err(StoreError::Seek { position: 0, size: 0 })
        ));
    }

    #[test]
    fn file_open_creates_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stream.data");

        let storage = FileStorage::open(&path).unwrap();
        assert!(path.is_file());
        assert_eq!(storage.path(), path.as_path());
        assert_eq!(storage.size(), 0);
        assert_eq!(storage.kind(), StorageKind::FileSystem);
    }

    #[test]
    fn file_open_rejects_directory() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            FileStorage::open(dir.path()),
            Err(StoreError::PathIsDir(_))
        ));
    }

    #[test]
    fn file_append_is_visible_without_flush() {
        let dir = tempdir().unwrap();
        let mut storage = FileStorage::open(dir.path().join("stream.data")).unwrap();

        storage.append(b"abc").unwrap();
        assert_eq!(storage.size(), 3);
        storage.append(b"defg").unwrap();
        assert_eq!(storage.size(), 7);

        assert_eq!(read_all(&mut storage, 0), b"abcdefg");
        assert_eq!(read_all(&mut storage, 3), b"defg");
        assert!(matches!(storage.reader(7), Err(StoreError::Seek { .. })));
    }

    #[test]
    fn file_flush_then_read_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stream.data");
        let mut storage = FileStorage::open(&path).unwrap();

        // Nothing open yet.
        storage.flush().unwrap();

        storage.append(b"synced").unwrap();
        storage.flush().unwrap();
        assert_eq!(storage.size(), 6);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 6);
        assert_eq!(read_all(&mut storage, 0), b"synced");

        storage.close_writer().unwrap();
        storage.flush().unwrap();
        assert_eq!(read_all(&mut storage, 2), b"nced");
    }

    #[test]
    fn file_reopen_appends_after_existing_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stream.data");

        let mut storage = FileStorage::open(&path).unwrap();
        storage.append(b"first").unwrap();
        storage.close_writer().unwrap();
        storage.close_reader().unwrap();
        drop(storage);

        let mut storage = FileStorage::open(&path).unwrap();
        assert_eq!(storage.size(), 5);
        storage.append(b"second").unwrap();
        assert_eq!(read_all(&mut storage, 0), b"firstsecond");
    }

    #[test]
    fn file_close_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut storage = FileStorage::open(dir.path().join("stream.data")).unwrap();

        storage.close_writer().unwrap();
        storage.close_reader().unwrap();
        storage.append(b"x").unwrap();
        let _ = read_all(&mut storage, 0);
        storage.close_writer().unwrap();
        storage.close_writer().unwrap();
        storage.close_reader().unwrap();
        storage.close_reader().unwrap();
    }
}
