//! # clear-core
//!
//! The transaction execution engine of ClearLedger.
//!
//! Two entry points mirror the host's delivery model:
//! - [`exec_tx`] for mutating transactions, with a dry-run mode used during
//!   mempool admission
//! - [`exec_query`] for read-only, signature-authenticated queries
//!
//! The engine is single-threaded and synchronous: the host delivers
//! transactions one at a time in consensus order, and every store access
//! completes before the call returns. Given the same transaction sequence
//! and initial state, every replica reaches byte-identical state.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod executor;
mod query;

pub use executor::exec_tx;
pub use query::exec_query;
