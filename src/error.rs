use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Corrupted database: index stream holds {actual} bytes, expected {expected}")]
    CorruptedDatabase { expected: u64, actual: u64 },
    #[error("Index out of range: {index} (collection holds {len} records)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Invalid data position: {size} bytes at {position} (data stream holds {available})")]
    DataPosition {
        position: u64,
        size: u64,
        available: u64,
    },
    #[error("Short read: expected {expected} bytes, got {actual}")]
    Read { expected: u64, actual: u64 },
    #[error("Seek error: position {position} is not below storage size {size}")]
    Seek { position: u64, size: u64 },
    #[error("Invalid vector dimensions: expected {expected}, got {actual}")]
    VectorSizeMismatch { expected: usize, actual: usize },
    #[error("Vector dimension must be greater than zero, got {0}")]
    InvalidVectorDim(usize),
    #[error("Failed to {op} {}: {source}", .path.display())]
    File {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("Path is expected to be a directory, but points to a file: {}", .0.display())]
    PathIsFile(PathBuf),
    #[error("Path is expected to be a file, but points to a directory: {}", .0.display())]
    PathIsDir(PathBuf),
    #[error("File-backed database requires a root path")]
    MissingPath,
    #[error("Database config does not exist: {}", .0.display())]
    ConfigAbsent(PathBuf),
    #[error("Failed to read database config {}: {reason}", .path.display())]
    ConfigRead { path: PathBuf, reason: String },
    #[error("Failed to write database config {}: {reason}", .path.display())]
    ConfigWrite { path: PathBuf, reason: String },
    #[error("Database is already initialized at {}", .0.display())]
    AlreadyInitialized(PathBuf),
    #[error("Failed to close storage: {}", join_errors(.0))]
    Close(Vec<StoreError>),
    #[error("Blocking storage task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl StoreError {
    pub(crate) fn file(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::File {
            op,
            path: path.into(),
            source,
        }
    }
}

fn join_errors(errors: &[StoreError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, StoreError>;
