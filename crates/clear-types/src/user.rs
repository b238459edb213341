//! Users: the identity and authorisation unit of the ledger

use crate::permissions::{Perm, Permissioned};
use clear_crypto::{public_key_to_address, verify, PublicKey, Signature};
use clear_primitives::Address;
use std::fmt;

/// A user of the ledger
///
/// Users are created by `CreateUser` transactions, never mutated and never
/// deleted. Their stable identity is the address derived from the public
/// key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    /// Ed25519 public key
    pub pub_key: PublicKey,
    /// Display name
    pub name: String,
    /// Identifier of the owning legal entity
    pub entity_id: String,
    /// Permission mask
    pub permissions: Perm,
}

impl User {
    /// Create a new user
    pub fn new(pub_key: PublicKey, name: String, entity_id: String, permissions: Perm) -> Self {
        User {
            pub_key,
            name,
            entity_id,
            permissions,
        }
    }

    /// Address derived from the user's public key
    pub fn address(&self) -> Address {
        public_key_to_address(&self.pub_key)
    }

    /// Verify a signature over `message` under the user's public key
    pub fn verify_signature(&self, message: &[u8], signature: &Signature) -> bool {
        verify(&self.pub_key, message, signature)
    }
}

impl Permissioned for User {
    fn permissions(&self) -> Perm {
        self.permissions
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "User{{{} {} entity:{}}}",
            self.address(),
            self.name,
            self.entity_id
        )
    }
}
