//! Defines `IndexRecord`, its encoding and decoding.

use crate::store::codec::{self, HEADER_WIDTH};
use bytes::BufMut;
use std::borrow::Cow;

/// One decoded index record: where the payload lives and its vector.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexRecord {
    /// Byte offset of the payload in the data stream.
    pub position: u64,
    /// Payload length in bytes.
    pub size: u64,
    pub vector: Vec<f32>,
}

/// Index record decoded in place from the index image.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordRef<'a> {
    pub position: u64,
    pub size: u64,
    pub vector: Cow<'a, [f32]>,
}

impl RecordRef<'_> {
    pub fn to_record(&self) -> IndexRecord {
        IndexRecord {
            position: self.position,
            size: self.size,
            vector: self.vector.to_vec(),
        }
    }
}

impl From<RecordRef<'_>> for IndexRecord {
    fn from(record: RecordRef<'_>) -> Self {
        IndexRecord {
            position: record.position,
            size: record.size,
            vector: record.vector.into_owned(),
        }
    }
}

/// Appends the encoded record `[position][size][vector]` to `dst`.
pub fn encode_into<B: BufMut>(dst: &mut B, position: u64, size: u64, vector: &[f32]) {
    codec::put_offset(dst, position);
    codec::put_offset(dst, size);
    dst.put_slice(codec::vector_bytes(vector));
}

/// Decodes one record from exactly `record_size` bytes.
///
/// Callers guarantee `bytes.len() >= HEADER_WIDTH`.
pub fn decode(bytes: &[u8]) -> RecordRef<'_> {
    let mut header = &bytes[..HEADER_WIDTH];
    let position = codec::get_offset(&mut header);
    let size = codec::get_offset(&mut header);
    RecordRef {
        position,
        size,
        vector: codec::bytes_vector(&bytes[HEADER_WIDTH..]),
    }
}
