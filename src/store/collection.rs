//! Core writer / reader logic: append, lookup, reopen.
//!
//! A collection keeps the whole index stream in memory as one contiguous
//! image, mirrored byte-for-byte to the index backend. Payloads live only in
//! the data backend and are fetched by `(position, size)`.

use crate::error::{Result, StoreError};
use crate::store::backend::Storage;
use crate::store::codec;
use crate::store::record::{self, IndexRecord, RecordRef};
use bytes::{BufMut, BytesMut};
use std::fmt;
use std::io::{self, Read};
use tracing::{debug, info, instrument, warn};

pub struct Collection {
    index_storage: Box<dyn Storage>,
    data_storage: Box<dyn Storage>,
    vector_dim: usize,
    record_size: usize,
    data_size: u64,
    index: BytesMut,
}

impl Collection {
    /// Opens a collection over two backends, loading the full index image.
    pub fn open<I, D>(index_storage: I, data_storage: D, vector_dim: usize) -> Result<Self>
    where
        I: Storage + 'static,
        D: Storage + 'static,
    {
        Self::open_boxed(Box::new(index_storage), Box::new(data_storage), vector_dim)
    }

    #[instrument(skip(index_storage, data_storage))]
    pub fn open_boxed(
        mut index_storage: Box<dyn Storage>,
        data_storage: Box<dyn Storage>,
        vector_dim: usize,
    ) -> Result<Self> {
        if vector_dim == 0 {
            return Err(StoreError::InvalidVectorDim(vector_dim));
        }
        let record_size = codec::record_size(vector_dim);

        let expected = index_storage.size();
        let mut index = BytesMut::with_capacity(expected as usize);
        if expected > 0 {
            let read = {
                let reader = index_storage.reader(0)?;
                io::copy(&mut reader.take(expected), &mut (&mut index).writer())?
            };
            index_storage.close_reader()?;
            if read != expected {
                return Err(StoreError::CorruptedDatabase {
                    expected,
                    actual: read,
                });
            }
        }

        let misaligned = index.len() % record_size;
        if misaligned != 0 {
            return Err(StoreError::CorruptedDatabase {
                expected: (index.len() - misaligned) as u64,
                actual: index.len() as u64,
            });
        }

        let collection = Self {
            data_size: data_storage.size(),
            index_storage,
            data_storage,
            vector_dim,
            record_size,
            index,
        };
        info!(
            records = collection.len(),
            data_size = collection.data_size,
            "collection opened"
        );
        Ok(collection)
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.index.len() / self.record_size
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn vector_dim(&self) -> usize {
        self.vector_dim
    }

    pub fn record_size(&self) -> usize {
        self.record_size
    }

    /// Running payload offset; the next payload lands here.
    pub fn data_size(&self) -> u64 {
        self.data_size
    }

    /// Appends one `(vector, payload)` pair and returns its ordinal.
    ///
    /// The index record is written before the payload. If the payload write
    /// fails, the index image and index stream are left one record ahead of
    /// the data stream.
    pub fn append(&mut self, vector: &[f32], payload: &[u8]) -> Result<usize> {
        if vector.len() != self.vector_dim {
            return Err(StoreError::VectorSizeMismatch {
                expected: self.vector_dim,
                actual: vector.len(),
            });
        }

        let start = self.index.len();
        let position = self.data_size;
        let size = payload.len() as u64;

        // Grows geometrically; a no-op while spare capacity remains.
        self.index.reserve(self.record_size);
        record::encode_into(&mut self.index, position, size, vector);

        if let Err(e) = self.index_storage.append(&self.index[start..]) {
            self.index.truncate(start);
            return Err(e);
        }
        self.data_storage.append(payload)?;
        self.data_size += size;

        let ordinal = self.len() - 1;
        debug!(ordinal, position, size, "record appended");
        Ok(ordinal)
    }

    /// Decodes record `n` in place.
    pub fn record(&self, n: usize) -> Result<RecordRef<'_>> {
        let out_of_range = || StoreError::IndexOutOfRange {
            index: n,
            len: self.len(),
        };
        let end = n
            .checked_add(1)
            .and_then(|count| count.checked_mul(self.record_size))
            .filter(|&end| end <= self.index.len())
            .ok_or_else(out_of_range)?;
        Ok(record::decode(&self.index[end - self.record_size..end]))
    }

    /// Position, size and vector of record `n`.
    pub fn index(&self, n: usize) -> Result<IndexRecord> {
        self.record(n).map(IndexRecord::from)
    }

    /// All records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = RecordRef<'_>> + '_ {
        self.index.chunks_exact(self.record_size).map(record::decode)
    }

    #[cfg(feature = "parallel")]
    pub(crate) fn image(&self) -> &[u8] {
        &self.index
    }

    /// Reads `size` payload bytes starting at `position`.
    pub fn data(&mut self, position: u64, size: u64) -> Result<Vec<u8>> {
        let available = self.data_storage.size();
        let in_bounds = position
            .checked_add(size)
            .map_or(false, |end| end <= available);
        if size == 0 || !in_bounds {
            return Err(StoreError::DataPosition {
                position,
                size,
                available,
            });
        }

        let reader = self.data_storage.reader(position)?;
        let mut out = Vec::with_capacity(size as usize);
        reader.take(size).read_to_end(&mut out)?;
        if out.len() as u64 != size {
            return Err(StoreError::Read {
                expected: size,
                actual: out.len() as u64,
            });
        }
        Ok(out)
    }

    /// Payload of record `n`.
    pub fn payload(&mut self, n: usize) -> Result<Vec<u8>> {
        let (position, size) = {
            let record = self.record(n)?;
            (record.position, record.size)
        };
        self.data(position, size)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.index_storage.flush()?;
        self.data_storage.flush()
    }

    /// Releases every read and write handle, attempting all four even when
    /// some fail.
    pub fn close(&mut self) -> Result<()> {
        let results = [
            self.index_storage.close_reader(),
            self.index_storage.close_writer(),
            self.data_storage.close_reader(),
            self.data_storage.close_writer(),
        ];

        let errors: Vec<StoreError> = results.into_iter().filter_map(|r| r.err()).collect();
        if errors.is_empty() {
            return Ok(());
        }
        for e in &errors {
            warn!(error = %e, "failed to close collection handle");
        }
        Err(StoreError::Close(errors))
    }

    /// Closes the collection and hands back its `(index, data)` backends.
    pub fn into_storage(mut self) -> Result<(Box<dyn Storage>, Box<dyn Storage>)> {
        self.close()?;
        Ok((self.index_storage, self.data_storage))
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("storage", &self.index_storage.kind())
            .field("vector_dim", &self.vector_dim)
            .field("len", &self.len())
            .field("data_size", &self.data_size)
            .finish()
    }
}
