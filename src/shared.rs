//! Async access to one collection through a single exclusive permit.
//!
//! Every call waits for the permit, then runs the blocking storage work on
//! tokio's blocking pool so the async executor never performs file I/O.

use crate::error::Result;
use crate::store::{Collection, Distance, IndexRecord, SortOrder};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task;

#[derive(Clone, Debug)]
pub struct SharedCollection {
    inner: Arc<Mutex<Collection>>,
}

impl SharedCollection {
    pub fn new(collection: Collection) -> Self {
        Self {
            inner: Arc::new(Mutex::new(collection)),
        }
    }

    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Collection) -> Result<T> + Send + 'static,
    {
        let mut guard = Arc::clone(&self.inner).lock_owned().await;
        task::spawn_blocking(move || op(&mut *guard)).await?
    }

    pub async fn append(&self, vector: Vec<f32>, payload: Vec<u8>) -> Result<usize> {
        self.run(move |c| c.append(&vector, &payload)).await
    }

    pub async fn index(&self, n: usize) -> Result<IndexRecord> {
        self.run(move |c| c.index(n)).await
    }

    pub async fn data(&self, position: u64, size: u64) -> Result<Vec<u8>> {
        self.run(move |c| c.data(position, size)).await
    }

    pub async fn payload(&self, n: usize) -> Result<Vec<u8>> {
        self.run(move |c| c.payload(n)).await
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }

    pub async fn cosine_similarity(
        &self,
        query: Vec<f32>,
        order: SortOrder,
        limit: usize,
    ) -> Result<Vec<Distance>> {
        self.run(move |c| c.cosine_similarity(&query, order, limit))
            .await
    }

    pub async fn close(&self) -> Result<()> {
        self.run(|c| c.close()).await
    }
}

impl From<Collection> for SharedCollection {
    fn from(collection: Collection) -> Self {
        Self::new(collection)
    }
}
