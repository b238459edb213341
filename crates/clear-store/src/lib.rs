//! # clear-store
//!
//! Storage layer for ClearLedger.
//!
//! This crate provides:
//! - The byte key-value abstraction the engine requires of its host
//! - An in-memory store used by tests and scratch execution
//! - The typed `Store` facade owning the key schema
//! - `StateReader` / `StateWriter` capability traits
//! - The write-discarding dry-run guard

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod kv;
mod state;
mod traits;

pub use error::{StoreError, StoreResult};
pub use kv::{KvStore, MemStore};
pub use state::{DryRun, Store};
pub use traits::{StateReader, StateWriter};
