use std::fmt;
use std::io;

/// Failure modes of the [`crate::Writer`] operations.
///
/// Every fallible constructor or mutator of [`crate::Writer`] returns
/// `Result<_, CdbwError>` rather than the ok/invariant-violation/
/// resource-exhaustion/io-error taxonomy of the original tool, which
/// funnels everything into a single boolean-style failure signal.
#[derive(Debug)]
pub enum CdbwError {
    /// The record store already holds the maximum number of records
    /// (`0xCCCCCCCC`) that keeps the index size within 32 bits.
    TooManyRecords,
    /// The key store already holds the maximum number of keys.
    TooManyKeys,
    /// Adding a record would make `data_size` exceed `0xFFFFFFFF`.
    RecordTooLarge,
    /// A key byte-equal to one already resident was rejected.
    DuplicateKey,
    /// `put_key` was given an `idx` that is not below the current
    /// record count.
    KeyOutOfRange,
    /// Memory could not be acquired for a required allocation.
    OutOfMemory,
    /// The sink returned a short write or failed.
    Io(io::Error),
}

impl fmt::Display for CdbwError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyRecords => write!(f, "record store is full (0xCCCCCCCC records)"),
            Self::TooManyKeys => write!(f, "key store is full (0xCCCCCCCC keys)"),
            Self::RecordTooLarge => write!(f, "adding the record would overflow data_size past 32 bits"),
            Self::DuplicateKey => write!(f, "a byte-identical key is already resident"),
            Self::KeyOutOfRange => write!(f, "key points at a record index that does not exist"),
            Self::OutOfMemory => write!(f, "allocation failure"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for CdbwError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for CdbwError {
    fn from(e: io::Error) -> Self { Self::Io(e) }
}
