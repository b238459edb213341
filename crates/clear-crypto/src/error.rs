//! Cryptographic errors

use thiserror::Error;

/// Cryptographic operation error
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Invalid public key bytes
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Invalid private key bytes
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// Invalid signature bytes
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// Signing key does not match the expected address
    #[error("signer address mismatch: key derives {derived}, expected {expected}")]
    AddressMismatch {
        /// Address derived from the signing key
        derived: String,
        /// Address the caller expected to sign for
        expected: String,
    },
}
