//! Accounts and per-currency wallets

use clear_primitives::{Balance, Sequence};
use serde::Serialize;
use std::fmt;

/// A per-currency balance inside an account
///
/// The sequence counter equals the number of transfers applied to this
/// (account, currency) pair and gates replay: the next accepted transfer
/// must carry `sequence + 1`.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize)]
pub struct Wallet {
    /// Currency code, free-form short string ("USD")
    pub currency: String,
    /// Signed balance; clearing balances may go negative
    pub balance: Balance,
    /// Monotonic transfer counter, 1 after the first transfer
    pub sequence: Sequence,
}

/// A container of wallets owned by one legal entity
///
/// Wallets are kept in insertion order with at most one wallet per
/// currency; lookup is a linear scan (wallet counts per account are small).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Account {
    /// Identifier (UUID string)
    pub id: String,
    /// Identifier of the owning legal entity
    pub entity_id: String,
    /// Wallets in insertion order
    pub wallets: Vec<Wallet>,
}

impl Account {
    /// Create a new account with no wallets
    pub fn new(id: String, entity_id: String) -> Self {
        Account {
            id,
            entity_id,
            wallets: Vec::new(),
        }
    }

    /// Look up the wallet for a currency
    pub fn wallet(&self, currency: &str) -> Option<&Wallet> {
        self.wallets.iter().find(|w| w.currency == currency)
    }

    /// Insert or replace the wallet for its currency
    pub fn set_wallet(&mut self, wallet: Wallet) {
        match self.wallets.iter_mut().find(|w| w.currency == wallet.currency) {
            Some(existing) => *existing = wallet,
            None => self.wallets.push(wallet),
        }
    }

    /// Check whether the account is owned by the given entity
    pub fn belongs_to(&self, entity_id: &str) -> bool {
        self.entity_id == entity_id
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Account{{{} entity:{} wallets:{}}}",
            self.id,
            self.entity_id,
            self.wallets.len()
        )
    }
}

/// Query payload wrapper for account lookups
#[derive(Debug, Serialize)]
pub struct AccountsReturned {
    /// Accounts in request order
    pub accounts: Vec<Account>,
}
