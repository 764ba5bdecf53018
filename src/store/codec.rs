//! Index-record field encodings.
//!
//! Offsets and sizes are 8-byte big-endian. Vectors are stored in host-native
//! f32 layout and reinterpreted in place, so the format is only portable
//! between hosts that agree on float endianness.

use bytes::{Buf, BufMut};
use std::borrow::Cow;

/// Width of an encoded offset or size.
pub const OFFSET_WIDTH: usize = 8;

/// Width of one encoded vector component.
pub const FLOAT_WIDTH: usize = std::mem::size_of::<f32>();

/// Position + size header preceding the vector in each index record.
pub const HEADER_WIDTH: usize = 2 * OFFSET_WIDTH;

/// Bytes occupied by one index record for vectors of `vector_dim` floats.
#[inline]
pub const fn record_size(vector_dim: usize) -> usize {
    vector_dim * FLOAT_WIDTH + HEADER_WIDTH
}

#[inline]
pub fn put_offset<B: BufMut>(dst: &mut B, value: u64) {
    dst.put_u64(value);
}

/// Reads a big-endian offset from the front of `src`.
///
/// Callers guarantee at least [`OFFSET_WIDTH`] bytes remain.
#[inline]
pub fn get_offset<B: Buf>(src: &mut B) -> u64 {
    src.get_u64()
}

/// Raw bytes of `vector`, without copying.
#[inline]
pub fn vector_bytes(vector: &[f32]) -> &[u8] {
    bytemuck::cast_slice(vector)
}

/// Floats stored in `bytes`.
///
/// Borrows when `bytes` happens to be f32-aligned; otherwise falls back to an
/// unaligned copy. A trailing partial float is ignored.
pub fn bytes_vector(bytes: &[u8]) -> Cow<'_, [f32]> {
    let whole = &bytes[..bytes.len() - bytes.len() % FLOAT_WIDTH];
    match bytemuck::try_cast_slice(whole) {
        Ok(floats) => Cow::Borrowed(floats),
        Err(_) => Cow::Owned(
            whole
                .chunks_exact(FLOAT_WIDTH)
                .map(bytemuck::pod_read_unaligned::<f32>)
                .collect(),
        ),
    }
}
