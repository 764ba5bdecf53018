//! Embedded vector store: fixed-dimension `f32` vectors with opaque payloads,
//! kept in memory or in append-only `.idx` / `.data` file pairs, searched by
//! exact cosine similarity.

pub mod config;
pub mod db;
pub mod error;
pub mod shared;
pub mod store;

pub use config::{DatabaseOptions, DbConfig};
pub use db::Database;
pub use error::{Result, StoreError};
pub use shared::SharedCollection;
pub use store::{
    Collection, Distance, FileStorage, IndexRecord, MemoryStorage, SortOrder, Storage,
    StorageKind,
};
