//! Capability traits at the storage seam
//!
//! Validators take a [`StateReader`]; only commit handlers take a
//! [`StateWriter`]. Narrowing signatures to the minimum capability makes
//! dry-run enforcement structural and keeps handlers mockable.

use crate::StoreResult;
use clear_primitives::Address;
use clear_types::{Account, AccountIndex, LegalEntity, LegalEntityIndex, User};

/// Read access to ledger state
pub trait StateReader {
    /// Look up a user by address
    fn get_user(&self, address: &Address) -> StoreResult<Option<User>>;

    /// Look up a legal entity by id
    fn get_legal_entity(&self, id: &str) -> StoreResult<Option<LegalEntity>>;

    /// Look up an account by id
    fn get_account(&self, id: &str) -> StoreResult<Option<Account>>;

    /// Read the account index; `None` until the first account is created
    fn get_account_index(&self) -> StoreResult<Option<AccountIndex>>;

    /// Read the legal entity index; `None` until the first entity is created
    fn get_legal_entity_index(&self) -> StoreResult<Option<LegalEntityIndex>>;

    /// Chain identifier mixed into every sign-bytes; empty if unset
    fn chain_id(&self) -> String;
}

/// Write access to ledger state
pub trait StateWriter: StateReader {
    /// Store a user under its derived address
    fn set_user(&mut self, user: &User);

    /// Store a legal entity under its id
    fn set_legal_entity(&mut self, entity: &LegalEntity);

    /// Store an account under its id
    fn set_account(&mut self, account: &Account);

    /// Replace the account index
    fn set_account_index(&mut self, index: &AccountIndex);

    /// Replace the legal entity index
    fn set_legal_entity_index(&mut self, index: &LegalEntityIndex);

    /// Set the chain identifier
    fn set_chain_id(&mut self, chain_id: &str);
}
