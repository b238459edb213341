//! Storage error types

use thiserror::Error;

/// Storage errors
///
/// Absence of a record is not an error; reads return `Ok(None)`. An error
/// means the store holds bytes the codec cannot interpret, which indicates
/// a prior bug or out-of-band mutation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A stored value failed to decode
    #[error("corrupt {kind} record at key {key}")]
    Corrupt {
        /// Record class (user, account, ...)
        kind: &'static str,
        /// Printable form of the store key
        key: String,
    },
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;
