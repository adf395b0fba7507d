//! Key store (component C): a hash-bucketed set with byte-identity semantics.

use dyn_size_of::GetSize;

use crate::error::CdbwError;
use crate::hash::VectorHash;

/// Largest `key_counter` accepted.
pub(crate) const MAX_KEY_COUNTER: u32 = 0xCCCC_CCCC;

const INITIAL_BUCKETS: usize = 1024;

/// A resident key: its bytes, the data index it is bound to, and its
/// hash triple computed with seed `0` (cached, used only for dedup
/// bucketing — the graph builder recomputes the triple with the
/// attempt's own seed).
pub(crate) struct KeyEntry {
    pub bytes: Box<[u8]>,
    pub hash0: (u32, u32, u32),
    pub idx: u32,
}

/// Holds the keys of a [`crate::Writer`], deduplicated by byte content.
///
/// Chained (bucket-of-`Vec`) hashing, matching the original tool's
/// singly-linked-chain buckets; the one architectural requirement
/// carried over verbatim is that a failed rehash is non-fatal — the
/// store just keeps operating at a lower load factor.
pub struct KeySet {
    buckets: Vec<Vec<KeyEntry>>,
    len: u32,
}

impl GetSize for KeySet {
    fn size_bytes_dyn(&self) -> usize {
        self.buckets.capacity() * std::mem::size_of::<Vec<KeyEntry>>()
            + self
                .buckets
                .iter()
                .map(|b| {
                    b.capacity() * std::mem::size_of::<KeyEntry>()
                        + b.iter().map(|e| e.bytes.len()).sum::<usize>()
                })
                .sum::<usize>()
    }
    const USES_DYN_MEM: bool = true;
}

impl Default for KeySet {
    fn default() -> Self {
        Self::new()
    }
}

impl KeySet {
    /// Constructs an empty store with the default initial bucket count.
    pub fn new() -> Self {
        Self {
            buckets: (0..INITIAL_BUCKETS).map(|_| Vec::new()).collect(),
            len: 0,
        }
    }

    /// Number of resident keys (`key_counter` of the spec).
    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }

    /// `true` if no key was added yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    fn bucket_index(&self, hash0: u32) -> usize {
        (hash0 as usize) & (self.buckets.len() - 1)
    }

    /// Binds `bytes` to the existing record `idx`.
    ///
    /// Fails if `idx` is not a currently valid record index, if the
    /// store is full, if a byte-identical key is already resident, or
    /// if memory cannot be acquired.
    pub fn add_key<H: VectorHash>(
        &mut self,
        hasher: &H,
        bytes: &[u8],
        idx: u32,
        records_len: u32,
    ) -> Result<(), CdbwError> {
        if idx >= records_len {
            return Err(CdbwError::KeyOutOfRange);
        }
        if self.len == MAX_KEY_COUNTER {
            return Err(CdbwError::TooManyKeys);
        }
        let hash0 = hasher.hash3(bytes, 0);
        let bucket_i = self.bucket_index(hash0.0);
        if self.buckets[bucket_i]
            .iter()
            .any(|e| e.bytes.len() == bytes.len() && e.hash0 == hash0 && &*e.bytes == bytes)
        {
            return Err(CdbwError::DuplicateKey);
        }
        self.buckets[bucket_i]
            .try_reserve(1)
            .map_err(|_| CdbwError::OutOfMemory)?;
        let mut owned = Vec::new();
        owned
            .try_reserve_exact(bytes.len())
            .map_err(|_| CdbwError::OutOfMemory)?;
        owned.extend_from_slice(bytes);
        self.buckets[bucket_i].push(KeyEntry {
            bytes: owned.into_boxed_slice(),
            hash0,
            idx,
        });
        self.len += 1;

        if self.len as usize > self.buckets.len() {
            self.try_grow();
        }
        Ok(())
    }

    /// Attempts to double the bucket count. A failure to allocate is
    /// swallowed — the store keeps working at a lower load factor.
    fn try_grow(&mut self) {
        let new_count = self.buckets.len() * 2;
        let mut new_buckets: Vec<Vec<KeyEntry>> = Vec::new();
        if new_buckets.try_reserve_exact(new_count).is_err() {
            return;
        }
        new_buckets.resize_with(new_count, Vec::new);
        for old_bucket in self.buckets.drain(..) {
            for entry in old_bucket {
                let i = (entry.hash0.0 as usize) & (new_count - 1);
                new_buckets[i].push(entry);
            }
        }
        self.buckets = new_buckets;
    }

    /// Iterates over all resident keys, in no particular order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &KeyEntry> {
        self.buckets.iter().flat_map(|b| b.iter())
    }
}
