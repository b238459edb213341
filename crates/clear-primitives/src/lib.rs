//! # clear-primitives
//!
//! Primitive types for the ClearLedger clearing engine.
//!
//! This crate provides the fundamental identifier types shared by every
//! other crate in the workspace.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;

pub use address::{Address, AddressError};

/// Per-wallet transfer sequence number
pub type Sequence = u64;

/// Signed wallet balance in minor units
pub type Balance = i64;
