//! Ed25519 key handling and address derivation

use crate::{keccak256, CryptoError};
use clear_primitives::Address;
use ed25519_dalek::{Signer, Verifier};
use rand::rngs::OsRng;

/// Ed25519 public key (32 bytes)
pub type PublicKey = ed25519_dalek::PublicKey;

/// Ed25519 private key (32 bytes)
pub type PrivateKey = ed25519_dalek::SecretKey;

/// Ed25519 signature (64 bytes)
pub type Signature = ed25519_dalek::Signature;

/// Ed25519 keypair
pub type Keypair = ed25519_dalek::Keypair;

/// Generate a fresh random keypair
pub fn generate_keypair() -> Keypair {
    Keypair::generate(&mut OsRng)
}

/// Build a keypair from a fixed 32-byte seed
///
/// Deterministic; used by tests and tooling that need reproducible keys.
pub fn keypair_from_seed(seed: &[u8; 32]) -> Result<Keypair, CryptoError> {
    let secret = PrivateKey::from_bytes(seed)
        .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;
    let public = PublicKey::from(&secret);
    Ok(Keypair { secret, public })
}

/// Sign a message with a keypair
pub fn sign(keypair: &Keypair, message: &[u8]) -> Signature {
    keypair.sign(message)
}

/// Verify a signature against a message and public key
pub fn verify(public_key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
    public_key.verify(message, signature).is_ok()
}

/// Derive the ledger address of a public key
///
/// The address is the tail 20 bytes of the Keccak-256 hash of the 32-byte
/// public key. Stable across replicas and deployments.
pub fn public_key_to_address(public_key: &PublicKey) -> Address {
    let hash = keccak256(public_key.as_bytes());
    let mut addr_bytes = [0u8; 20];
    addr_bytes.copy_from_slice(&hash[12..]);
    Address::from_bytes(addr_bytes)
}
