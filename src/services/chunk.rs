//! Fixed-size grouping of identifier lists for batched writes.

use std::num::NonZeroUsize;

/// Ids per write batch, below the store's per-batch limit.
pub const BATCH_CHUNK_SIZE: NonZeroUsize = match NonZeroUsize::new(400) {
    Some(size) => size,
    None => unreachable!(),
};

/// Lazily split `items` into contiguous groups of at most `size`, in order.
///
/// Empty input yields no groups at all.
pub fn chunked<T>(items: &[T], size: NonZeroUsize) -> std::slice::Chunks<'_, T> {
    items.chunks(size.get())
}

/// Number of groups `chunked` yields for `len` items.
pub fn chunk_count(len: usize, size: NonZeroUsize) -> usize {
    len.div_ceil(size.get())
}
