//! # clear-types
//!
//! Domain model and transaction set for ClearLedger.
//!
//! This crate provides:
//! - Permission bitmasks and the tx-kind → permission mapping
//! - Users, legal entities, accounts, wallets and the id indices
//! - The closed transaction union with shape validation and sign-bytes
//! - The deterministic binary codec for stored values
//! - Result codes shared with the host

#![warn(missing_docs)]
#![warn(clippy::all)]

mod account;
pub mod codec;
mod entity;
mod index;
mod permissions;
mod result;
mod transaction;
mod user;

pub use account::{Account, AccountsReturned, Wallet};
pub use entity::{EntityKind, LegalEntitiesReturned, LegalEntity};
pub use index::{AccountIndex, LegalEntityIndex};
pub use permissions::{can_exec_tx, Perm, Permissioned};
pub use result::{Code, Response};
pub use transaction::{
    tx_type, AccountIndexQueryTx, AccountQueryTx, CounterSigner, CreateAccountTx,
    CreateLegalEntityTx, CreateUserTx, LegalEntityIndexQueryTx, LegalEntityQueryTx, TransferRecipient,
    TransferSender, TransferTx, Tx,
};
pub use user::User;
