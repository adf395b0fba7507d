//! Builder for a static, read-only, perfect-hash-indexed constant database.
//!
//! A [`Writer`] accumulates records and the keys that point at them,
//! then [`Writer::write_to`] derives a minimal perfect hash function
//! over the resident keys (3-uniform hypergraph peeling, see
//! [`graph`]) and serializes a single self-contained index file (see
//! [`format`]) that a reader can use to map any resident key straight
//! to its record's byte range without holding the keys themselves in
//! memory.

mod error;
mod graph;
mod assign;
mod format;
mod hash;
mod keyset;
mod record;

pub use dyn_size_of::GetSize;

pub use error::CdbwError;
pub use hash::{DefaultVectorHash, VectorHash};

use std::io::Write;

use format::{pack_descr, DESCR_LEN};
use keyset::KeySet;
use record::RecordStore;

/// Smallest vertex count the graph builder will ever attempt, matching
/// the original tool's floor (peeling a handful of keys over fewer than
/// 10 vertices retries far too often to be worth the smaller file).
const MIN_ENTRIES: u32 = 10;

/// Selects how [`Writer::write_to`] picks the seed of each peeling attempt.
///
/// The original tool told the two policies apart by comparing a
/// function pointer against a sentinel (`seedgen == cdbw_stable_seeder`);
/// an enum says the same thing without the comparison. The random arm
/// holds a boxed closure rather than a bare type parameter so that
/// `Seeder::Stable` can be written without turbofishing an unused
/// generic at every call site.
pub enum Seeder<'a> {
    /// Tries `1, 2, 3, ...` in order. Two writers fed the same sequence
    /// of `put`/`put_data`/`put_key` calls and written with `Stable`
    /// produce byte-identical files.
    Stable,
    /// Draws each attempt's seed from the closure. Pass one that
    /// returns a fresh seed every call (not a counter) — [`Seeder::random`]
    /// wires this to `rand`.
    Random(Box<dyn FnMut() -> u32 + 'a>),
}

impl Seeder<'static> {
    /// A [`Seeder::Random`] backed by the thread-local RNG.
    pub fn random() -> Self {
        Seeder::Random(Box::new(|| rand::random::<u32>()))
    }
}

/// Accumulates records and keys, then writes a perfect-hash-indexed constant database.
///
/// Generic over the vertex hash `H` (see [`VectorHash`]); defaults to
/// [`DefaultVectorHash`], which is not bit-compatible with the NetBSD
/// `mi_vector_hash` reader — see that type's docs.
pub struct Writer<H: VectorHash = DefaultVectorHash> {
    records: RecordStore,
    keys: KeySet,
    hasher: H,
}

impl Default for Writer<DefaultVectorHash> {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer<DefaultVectorHash> {
    /// Constructs an empty writer using the default vertex hash.
    pub fn new() -> Self {
        Self::with_hasher(DefaultVectorHash)
    }
}

impl<H: VectorHash> Writer<H> {
    /// Constructs an empty writer using a caller-supplied vertex hash.
    pub fn with_hasher(hasher: H) -> Self {
        Self {
            records: RecordStore::new(),
            keys: KeySet::new(),
            hasher,
        }
    }

    /// Number of resident records.
    pub fn data_counter(&self) -> u32 {
        self.records.len()
    }

    /// Number of resident keys.
    pub fn key_counter(&self) -> u32 {
        self.keys.len()
    }

    /// Appends `data` as a new record and returns its index.
    pub fn put_data(&mut self, data: &[u8]) -> Result<u32, CdbwError> {
        self.records.add_record(data)
    }

    /// Binds `key` to the record at `idx`.
    ///
    /// `idx` must be a record index returned earlier by [`Writer::put_data`]
    /// or [`Writer::put`]. `key` must not be byte-identical to a key
    /// already resident.
    pub fn put_key(&mut self, key: &[u8], idx: u32) -> Result<(), CdbwError> {
        self.keys
            .add_key(&self.hasher, key, idx, self.records.len())
    }

    /// Appends `data` as a new record and binds `key` to it in one step.
    ///
    /// If binding the key fails, the record is removed again, leaving
    /// the writer exactly as it was before the call.
    pub fn put(&mut self, key: &[u8], data: &[u8]) -> Result<u32, CdbwError> {
        let idx = self.put_data(data)?;
        if let Err(e) = self.put_key(key, idx) {
            self.records.remove_last_record();
            return Err(e);
        }
        Ok(idx)
    }

    /// Builds the minimal perfect hash function over the resident keys
    /// and writes the complete index file to `out`.
    ///
    /// `descr` is a free-form 16-byte description stamped into the
    /// header (truncated or zero-padded to fit). `seeder` selects how
    /// successive peeling attempts pick their seed; see [`Seeder`].
    ///
    /// If there are no records or no keys, writes the degenerate empty
    /// file and returns without attempting to build a graph.
    pub fn write_to<W: Write + ?Sized>(
        &self,
        out: &mut W,
        descr: &[u8],
        mut seeder: Seeder<'_>,
    ) -> Result<(), CdbwError> {
        let descr = pack_descr(descr);

        if self.records.is_empty() || self.keys.is_empty() {
            format::write_empty(out, &descr, &self.records)?;
            return Ok(());
        }

        let n_keys = self.keys.len();
        let entries = (n_keys + (n_keys + 3) / 4).max(MIN_ENTRIES);

        let mut seed = 0u32;
        let peeled = loop {
            seed = match &mut seeder {
                Seeder::Stable => seed.wrapping_add(1),
                Seeder::Random(f) => f(),
            };
            if let Some(p) = graph::try_peel(&self.hasher, &self.keys, entries, seed) {
                break p;
            }
        };

        let g = assign::assign(entries, self.records.len(), &peeled.edges, &peeled.output_order);

        format::write_full(out, &descr, seed, entries, &g, &self.records)?;
        Ok(())
    }
}

impl<H: VectorHash> GetSize for Writer<H> {
    fn size_bytes_dyn(&self) -> usize {
        self.records.size_bytes_dyn() + self.keys.size_bytes_dyn()
    }
    const USES_DYN_MEM: bool = true;
}

/// `descr` length accepted by [`Writer::write_to`] without truncation.
pub const DESCR_MAX_LEN: usize = DESCR_LEN;

#[cfg(test)]
mod tests {
    use super::*;

    fn read_header(buf: &[u8]) -> (u32, u32, u32, u32) {
        let data_size = u32::from_le_bytes(buf[24..28].try_into().unwrap());
        let data_counter = u32::from_le_bytes(buf[28..32].try_into().unwrap());
        let entries = u32::from_le_bytes(buf[32..36].try_into().unwrap());
        let seed = u32::from_le_bytes(buf[36..40].try_into().unwrap());
        (data_size, data_counter, entries, seed)
    }

    #[test]
    fn empty_writer_produces_degenerate_file() {
        let w = Writer::new();
        let mut buf = Vec::new();
        w.write_to(&mut buf, b"empty", Seeder::Stable).unwrap();
        // header + the single zero-width trailing offset entry (scenario 1 of §8: 41 bytes).
        assert_eq!(buf.len(), format::HEADER_LEN + 1);
        assert_eq!(buf[format::HEADER_LEN], 0);
        let (data_size, data_counter, entries, seed) = read_header(&buf);
        assert_eq!((data_size, data_counter, entries, seed), (0, 0, 0, 0));
    }

    #[test]
    fn singleton_round_trips() {
        let mut w = Writer::new();
        w.put(b"the-key", b"the-value").unwrap();
        let mut buf = Vec::new();
        w.write_to(&mut buf, b"one", Seeder::Stable).unwrap();
        let (data_size, data_counter, entries, _seed) = read_header(&buf);
        assert_eq!(data_size, 9);
        assert_eq!(data_counter, 1);
        assert!(entries >= MIN_ENTRIES);
    }

    #[test]
    fn single_key_value_scenario_matches_expected_file_size() {
        // §8 scenario 2: put("a", "1") under the stable seeder is a
        // 53-byte file (40-byte header + 10x1-byte g table + no padding
        // + 2x1-byte offsets + 1 value byte).
        let mut w = Writer::new();
        w.put(b"a", b"1").unwrap();
        let mut buf = Vec::new();
        w.write_to(&mut buf, b"test", Seeder::Stable).unwrap();
        let (data_size, data_counter, entries, _seed) = read_header(&buf);
        assert_eq!(data_size, 1);
        assert_eq!(data_counter, 1);
        assert_eq!(entries, MIN_ENTRIES);
        assert_eq!(buf.len(), 53);
    }

    #[test]
    fn duplicate_key_is_rejected_and_state_is_unchanged() {
        let mut w = Writer::new();
        w.put(b"k", b"v1").unwrap();
        let before = w.key_counter();
        assert!(matches!(w.put(b"k", b"v2"), Err(CdbwError::DuplicateKey)));
        assert_eq!(w.key_counter(), before);
        assert_eq!(w.data_counter(), 1);
    }

    #[test]
    fn three_keys_sharing_a_value_peel_and_write() {
        let mut w = Writer::new();
        let idx = w.put_data(b"shared").unwrap();
        w.put_key(b"a", idx).unwrap();
        w.put_key(b"b", idx).unwrap();
        w.put_key(b"c", idx).unwrap();
        let mut buf = Vec::new();
        w.write_to(&mut buf, b"shared", Seeder::Stable).unwrap();
        assert!(buf.len() > format::HEADER_LEN);
    }

    #[test]
    fn distinct_records_for_identical_value_bytes_no_dedup() {
        // §8 scenario 3: put("x","v"); put("y","v"); put("z","v") creates
        // a fresh record for every `put`, even though the value bytes are
        // identical every time — the record store never deduplicates by
        // value content, only the key store dedups by key bytes. Each key
        // must still resolve back to its own record index.
        let mut w = Writer::new();
        let ix = w.put(b"x", b"v").unwrap();
        let iy = w.put(b"y", b"v").unwrap();
        let iz = w.put(b"z", b"v").unwrap();
        assert_eq!(w.data_counter(), 3);
        assert_eq!((ix, iy, iz), (0, 1, 2));

        let n_keys = w.key_counter();
        let entries = (n_keys + (n_keys + 3) / 4).max(MIN_ENTRIES);
        let (seed, peeled) = (1..10_000u32)
            .find_map(|s| crate::graph::try_peel(&w.hasher, &w.keys, entries, s).map(|p| (s, p)))
            .expect("a seed should peel this tiny graph");
        let g = crate::assign::assign(entries, w.data_counter(), &peeled.edges, &peeled.output_order);

        for key in w.keys.iter() {
            let (h0, h1, h2) = w.hasher.hash3(&key.bytes, seed);
            let (l, m, r) = (h0 % entries, h1 % entries, h2 % entries);
            assert_eq!(crate::assign::evaluate(&g, w.data_counter(), l, m, r), key.idx);
        }
    }

    #[test]
    fn stable_seeder_is_reproducible() {
        let mut w = Writer::new();
        for i in 0..40u32 {
            w.put(format!("key-{i}").as_bytes(), &i.to_le_bytes())
                .unwrap();
        }
        let mut a = Vec::new();
        let mut b = Vec::new();
        w.write_to(&mut a, b"repro", Seeder::Stable).unwrap();
        w.write_to(&mut b, b"repro", Seeder::Stable).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rollback_on_combined_put_failure_keeps_data_size_consistent() {
        let mut w = Writer::new();
        w.put(b"k", b"v").unwrap();
        let before_size = w.records.data_size();
        assert!(matches!(w.put(b"k", b"v2"), Err(CdbwError::DuplicateKey)));
        assert_eq!(w.records.data_size(), before_size);
    }
}
