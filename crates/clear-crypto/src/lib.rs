//! # clear-crypto
//!
//! Cryptographic primitives for ClearLedger.
//!
//! - Keccak-256 hashing
//! - Ed25519 signing/verification
//! - Address derivation

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod hash;
mod keys;

pub use error::CryptoError;
pub use hash::keccak256;
pub use keys::{
    generate_keypair, keypair_from_seed, public_key_to_address, sign, verify, Keypair, PrivateKey,
    PublicKey, Signature,
};
