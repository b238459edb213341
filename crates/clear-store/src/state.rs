//! Typed store facade and the dry-run guard

use crate::{KvStore, StateReader, StateWriter, StoreError, StoreResult};
use clear_primitives::Address;
use clear_types::codec;
use clear_types::{Account, AccountIndex, LegalEntity, LegalEntityIndex, User};
use std::cell::RefCell;

/// Key schema of the ledger state
///
/// Each entity class gets a disjoint prefix so the underlying byte store
/// sees no collisions. This module is the only place that knows the schema.
mod key {
    use clear_primitives::Address;

    const USER: &[u8] = b"user/";
    const ENTITY: &[u8] = b"entity/";
    const ACCOUNT: &[u8] = b"account/";
    pub const ACCOUNT_INDEX: &[u8] = b"index/account";
    pub const ENTITY_INDEX: &[u8] = b"index/entity";
    pub const CHAIN_ID: &[u8] = b"meta/chain_id";

    pub fn user(address: &Address) -> Vec<u8> {
        let mut key = Vec::with_capacity(USER.len() + Address::LEN);
        key.extend_from_slice(USER);
        key.extend_from_slice(address.as_bytes());
        key
    }

    pub fn entity(id: &str) -> Vec<u8> {
        [ENTITY, id.as_bytes()].concat()
    }

    pub fn account(id: &str) -> Vec<u8> {
        [ACCOUNT, id.as_bytes()].concat()
    }
}

/// Typed view over an opaque byte store
///
/// The facade routes each entity class to its key namespace, encodes values
/// with the deterministic binary codec and caches the chain id after the
/// first read. It holds the only handle to the underlying store while the
/// engine runs.
pub struct Store<S: KvStore> {
    kv: S,
    chain_id: RefCell<Option<String>>,
}

impl<S: KvStore> Store<S> {
    /// Wrap a byte store
    pub fn new(kv: S) -> Self {
        Store {
            kv,
            chain_id: RefCell::new(None),
        }
    }

    /// Borrow the underlying byte store
    pub fn inner(&self) -> &S {
        &self.kv
    }

    /// Unwrap the underlying byte store
    pub fn into_inner(self) -> S {
        self.kv
    }
}

impl<S: KvStore> StateReader for Store<S> {
    fn get_user(&self, address: &Address) -> StoreResult<Option<User>> {
        let key = key::user(address);
        match self.kv.get(&key) {
            None => Ok(None),
            Some(bytes) => codec::decode_user(&bytes)
                .map(Some)
                .ok_or_else(|| StoreError::Corrupt {
                    kind: "user",
                    key: address.to_hex(),
                }),
        }
    }

    fn get_legal_entity(&self, id: &str) -> StoreResult<Option<LegalEntity>> {
        match self.kv.get(&key::entity(id)) {
            None => Ok(None),
            Some(bytes) => codec::decode_legal_entity(&bytes)
                .map(Some)
                .ok_or_else(|| StoreError::Corrupt {
                    kind: "legal entity",
                    key: id.to_string(),
                }),
        }
    }

    fn get_account(&self, id: &str) -> StoreResult<Option<Account>> {
        match self.kv.get(&key::account(id)) {
            None => Ok(None),
            Some(bytes) => codec::decode_account(&bytes)
                .map(Some)
                .ok_or_else(|| StoreError::Corrupt {
                    kind: "account",
                    key: id.to_string(),
                }),
        }
    }

    fn get_account_index(&self) -> StoreResult<Option<AccountIndex>> {
        match self.kv.get(key::ACCOUNT_INDEX) {
            None => Ok(None),
            Some(bytes) => codec::decode_account_index(&bytes)
                .map(Some)
                .ok_or_else(|| StoreError::Corrupt {
                    kind: "account index",
                    key: "index/account".to_string(),
                }),
        }
    }

    fn get_legal_entity_index(&self) -> StoreResult<Option<LegalEntityIndex>> {
        match self.kv.get(key::ENTITY_INDEX) {
            None => Ok(None),
            Some(bytes) => codec::decode_legal_entity_index(&bytes)
                .map(Some)
                .ok_or_else(|| StoreError::Corrupt {
                    kind: "legal entity index",
                    key: "index/entity".to_string(),
                }),
        }
    }

    fn chain_id(&self) -> String {
        if let Some(cached) = self.chain_id.borrow().as_ref() {
            return cached.clone();
        }
        let loaded = self
            .kv
            .get(key::CHAIN_ID)
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .unwrap_or_default();
        *self.chain_id.borrow_mut() = Some(loaded.clone());
        loaded
    }
}

impl<S: KvStore> StateWriter for Store<S> {
    fn set_user(&mut self, user: &User) {
        self.kv
            .set(&key::user(&user.address()), &codec::encode_user(user));
    }

    fn set_legal_entity(&mut self, entity: &LegalEntity) {
        self.kv
            .set(&key::entity(&entity.id), &codec::encode_legal_entity(entity));
    }

    fn set_account(&mut self, account: &Account) {
        self.kv
            .set(&key::account(&account.id), &codec::encode_account(account));
    }

    fn set_account_index(&mut self, index: &AccountIndex) {
        self.kv
            .set(key::ACCOUNT_INDEX, &codec::encode_account_index(index));
    }

    fn set_legal_entity_index(&mut self, index: &LegalEntityIndex) {
        self.kv.set(
            key::ENTITY_INDEX,
            &codec::encode_legal_entity_index(index),
        );
    }

    fn set_chain_id(&mut self, chain_id: &str) {
        self.kv.set(key::CHAIN_ID, chain_id.as_bytes());
        *self.chain_id.borrow_mut() = Some(chain_id.to_string());
    }
}

/// Write-discarding guard for dry-run execution
///
/// Reads delegate to the wrapped state; writes are dropped. Routing every
/// check-mode execution through this wrapper lets commit handlers stay
/// branch-free while guaranteeing the store is untouched.
pub struct DryRun<'a, S: StateReader> {
    inner: &'a S,
}

impl<'a, S: StateReader> DryRun<'a, S> {
    /// Wrap a readable state
    pub fn new(inner: &'a S) -> Self {
        DryRun { inner }
    }
}

impl<S: StateReader> StateReader for DryRun<'_, S> {
    fn get_user(&self, address: &Address) -> StoreResult<Option<User>> {
        self.inner.get_user(address)
    }

    fn get_legal_entity(&self, id: &str) -> StoreResult<Option<LegalEntity>> {
        self.inner.get_legal_entity(id)
    }

    fn get_account(&self, id: &str) -> StoreResult<Option<Account>> {
        self.inner.get_account(id)
    }

    fn get_account_index(&self) -> StoreResult<Option<AccountIndex>> {
        self.inner.get_account_index()
    }

    fn get_legal_entity_index(&self) -> StoreResult<Option<LegalEntityIndex>> {
        self.inner.get_legal_entity_index()
    }

    fn chain_id(&self) -> String {
        self.inner.chain_id()
    }
}

impl<S: StateReader> StateWriter for DryRun<'_, S> {
    fn set_user(&mut self, _user: &User) {}

    fn set_legal_entity(&mut self, _entity: &LegalEntity) {}

    fn set_account(&mut self, _account: &Account) {}

    fn set_account_index(&mut self, _index: &AccountIndex) {}

    fn set_legal_entity_index(&mut self, _index: &LegalEntityIndex) {}

    fn set_chain_id(&mut self, _chain_id: &str) {}
}
