//! Brute-force cosine similarity over every vector in a collection.

use crate::error::{Result, StoreError};
use crate::store::collection::Collection;
use crate::store::record::RecordRef;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// One scored record. Not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distance {
    /// Record ordinal.
    pub ordinal: usize,
    pub value: f32,
    /// Payload position in the data stream.
    pub position: u64,
    /// Payload size in bytes.
    pub size: u64,
}

/// cos(a, b) = dot(a, b) / (|a| * |b|), or 0 when either norm is zero.
///
/// Sums accumulate in f32; the norm product is taken in f64. Rounding
/// between the two can overshoot by an ulp, so the result is clamped.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut a_norm = 0.0f32;
    let mut b_norm = 0.0f32;
    for (&x, &y) in a.iter().zip(b) {
        dot += x * y;
        a_norm += x * x;
        b_norm += y * y;
    }

    let denom = ((a_norm as f64).sqrt() * (b_norm as f64).sqrt()) as f32;
    if denom == 0.0 {
        return 0.0;
    }
    (dot / denom).clamp(-1.0, 1.0)
}

/// Scores every record against `query`, ranks by `order` and keeps the first
/// `limit` entries (`0` keeps all).
pub fn cosine_similarity(
    collection: &Collection,
    query: &[f32],
    order: SortOrder,
    limit: usize,
) -> Result<Vec<Distance>> {
    if query.len() != collection.vector_dim() {
        return Err(StoreError::VectorSizeMismatch {
            expected: collection.vector_dim(),
            actual: query.len(),
        });
    }

    let mut results = score_all(collection, query);
    rank(&mut results, order);
    if limit > 0 {
        results.truncate(limit);
    }
    Ok(results)
}

fn score(ordinal: usize, record: RecordRef<'_>, query: &[f32]) -> Distance {
    Distance {
        ordinal,
        value: cosine(query, &record.vector),
        position: record.position,
        size: record.size,
    }
}

#[cfg(not(feature = "parallel"))]
fn score_all(collection: &Collection, query: &[f32]) -> Vec<Distance> {
    collection
        .iter()
        .enumerate()
        .map(|(ordinal, record)| score(ordinal, record, query))
        .collect()
}

#[cfg(feature = "parallel")]
fn score_all(collection: &Collection, query: &[f32]) -> Vec<Distance> {
    use rayon::prelude::*;

    collection
        .image()
        .par_chunks_exact(collection.record_size())
        .enumerate()
        .map(|(ordinal, bytes)| score(ordinal, crate::store::record::decode(bytes), query))
        .collect()
}

fn compare(order: SortOrder) -> impl Fn(&Distance, &Distance) -> Ordering {
    move |a, b| match order {
        SortOrder::Ascending => a.value.total_cmp(&b.value),
        SortOrder::Descending => b.value.total_cmp(&a.value),
    }
}

#[cfg(not(feature = "parallel"))]
fn rank(results: &mut [Distance], order: SortOrder) {
    results.sort_unstable_by(compare(order));
}

#[cfg(feature = "parallel")]
fn rank(results: &mut [Distance], order: SortOrder) {
    use rayon::slice::ParallelSliceMut;

    results.par_sort_unstable_by(compare(order));
}

impl Collection {
    /// See [`cosine_similarity`].
    pub fn cosine_similarity(
        &self,
        query: &[f32],
        order: SortOrder,
        limit: usize,
    ) -> Result<Vec<Distance>> {
        cosine_similarity(self, query, order, limit)
    }
}
