//! The seeded, 3-word hash primitive consumed by the graph builder.
//!
//! The format (§6.3) and the construction algorithm (§4.D) are
//! reader-agnostic: any function that is deterministic and mixes the
//! seed uniformly into all three outputs works. The original NetBSD
//! tool uses `mi_vector_hash`; its source is not available to this
//! port, so [`DefaultVectorHash`] is an independent implementation
//! (a splitmix64-derived avalanche mixer). Swap in a different
//! [`VectorHash`] if byte-for-byte compatibility with a `mi_vector_hash`
//! reader is required.

/// A deterministic function from `(bytes, seed)` to a triple of `u32` hash words.
///
/// Implementations must be pure (no mutable state) and must mix `seed`
/// into all three returned words; otherwise peeling degenerates because
/// retried seeds would keep producing the same vertex triple for a key.
pub trait VectorHash {
    /// Returns the three hash words used to derive a key's vertex triple.
    fn hash3(&self, bytes: &[u8], seed: u32) -> (u32, u32, u32);
}

/// Default [`VectorHash`]: a splitmix64-derived avalanche mixer.
///
/// Not bit-compatible with NetBSD's `mi_vector_hash` (see module docs).
#[derive(Clone, Copy, Default)]
pub struct DefaultVectorHash;

impl DefaultVectorHash {
    /// splitmix64 finalizer.
    #[inline(always)]
    fn mix(mut x: u64) -> u64 {
        x ^= x >> 30;
        x = x.wrapping_mul(0xbf58_476d_1ce4_e5b9);
        x ^= x >> 27;
        x = x.wrapping_mul(0x94d0_49bb_1331_11eb);
        x ^= x >> 31;
        x
    }

    /// Folds `bytes` and `seed` into a single 64-bit state.
    fn absorb(bytes: &[u8], seed: u64) -> u64 {
        let mut h = seed ^ (bytes.len() as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        let mut chunks = bytes.chunks_exact(8);
        for c in &mut chunks {
            let w = u64::from_le_bytes(c.try_into().unwrap());
            h ^= Self::mix(w ^ h);
            h = h.rotate_left(27).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        }
        let rem = chunks.remainder();
        if !rem.is_empty() {
            let mut buf = [0u8; 8];
            buf[..rem.len()].copy_from_slice(rem);
            let w = u64::from_le_bytes(buf);
            h ^= Self::mix(w ^ h);
            h = h.rotate_left(27).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        }
        Self::mix(h)
    }
}

impl VectorHash for DefaultVectorHash {
    fn hash3(&self, bytes: &[u8], seed: u32) -> (u32, u32, u32) {
        let base = Self::absorb(bytes, seed as u64);
        let h0 = Self::mix(base ^ 0x1111_1111_1111_1111);
        let h1 = Self::mix(base.rotate_left(21) ^ 0x2222_2222_2222_2222);
        let h2 = Self::mix(base.rotate_left(43) ^ 0x3333_3333_3333_3333);
        (
            (h0 ^ (h0 >> 32)) as u32,
            (h1 ^ (h1 >> 32)) as u32,
            (h2 ^ (h2 >> 32)) as u32,
        )
    }
}
