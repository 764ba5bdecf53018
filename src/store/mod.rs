//! Persistent, append-only vector collections.
//! Receives pre-computed embeddings; only storage + exact cosine search.

pub mod backend;
pub mod codec;
pub mod collection;
pub mod record;
pub mod search;


pub use backend::{FileStorage, MemoryStorage, Storage, StorageKind};
pub use collection::Collection;
pub use record::{IndexRecord, RecordRef};
pub use search::{cosine, cosine_similarity, Distance, SortOrder};
