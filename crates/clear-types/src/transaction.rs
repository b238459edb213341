//! The transaction set: a closed union of mutating and query kinds
//!
//! Each kind knows its discriminator byte, its shape validation, and its
//! canonical sign-bytes. Sign-bytes cover every field except signatures,
//! prefixed with the chain id so signatures cannot be replayed across
//! deployments.

use crate::codec::{put_count, put_i64, put_str, put_u64};
use crate::{Code, EntityKind, Response};
use clear_crypto::{public_key_to_address, CryptoError, Keypair, PublicKey, Signature};
use clear_primitives::Address;

/// Stable transaction discriminator bytes
pub mod tx_type {
    /// Transfer between two accounts
    pub const TRANSFER: u8 = 0x01;
    /// Create a new account
    pub const CREATE_ACCOUNT: u8 = 0x02;
    /// Create a new legal entity
    pub const CREATE_LEGAL_ENTITY: u8 = 0x03;
    /// Create a new user
    pub const CREATE_USER: u8 = 0x04;
    /// Fetch accounts by id
    pub const ACCOUNT_QUERY: u8 = 0x11;
    /// Fetch the account index
    pub const ACCOUNT_INDEX_QUERY: u8 = 0x12;
    /// Fetch legal entities by id
    pub const LEGAL_ENTITY_QUERY: u8 = 0x13;
    /// Fetch the legal entity index
    pub const LEGAL_ENTITY_INDEX_QUERY: u8 = 0x14;
}

fn sign_bytes_prefix(chain_id: &str, tx_type_byte: u8) -> Vec<u8> {
    let mut buf = Vec::new();
    put_str(&mut buf, chain_id);
    buf.push(tx_type_byte);
    buf
}

fn check_signer(keypair: &Keypair, expected: &Address) -> Result<(), CryptoError> {
    let derived = public_key_to_address(&keypair.public);
    if derived != *expected {
        return Err(CryptoError::AddressMismatch {
            derived: derived.to_hex(),
            expected: expected.to_hex(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Transfer
// ---------------------------------------------------------------------------

/// Sender block of a transfer
#[derive(Clone, Debug, PartialEq)]
pub struct TransferSender {
    /// Address of the sending user
    pub address: Address,
    /// Account debited
    pub account_id: String,
    /// Currency moved
    pub currency: String,
    /// Amount moved, strictly positive
    pub amount: i64,
    /// Expected wallet sequence (current + 1)
    pub sequence: u64,
    /// Sender's signature over the transfer sign-bytes
    pub signature: Option<Signature>,
}

/// Additional authorising signer of a transfer
#[derive(Clone, Debug, PartialEq)]
pub struct CounterSigner {
    /// Address of the counter-signing user
    pub address: Address,
    /// Signature over the counter-signer's own sign-bytes
    pub signature: Option<Signature>,
}

impl CounterSigner {
    /// Sign-bytes of the counter-signer block: chain id, transfer
    /// discriminator and the signer's address only
    pub fn sign_bytes(&self, chain_id: &str) -> Vec<u8> {
        let mut buf = sign_bytes_prefix(chain_id, tx_type::TRANSFER);
        buf.extend_from_slice(self.address.as_bytes());
        buf
    }

    /// Fill the signature using `keypair`, which must derive this address
    pub fn sign(&mut self, keypair: &Keypair, chain_id: &str) -> Result<(), CryptoError> {
        check_signer(keypair, &self.address)?;
        self.signature = Some(clear_crypto::sign(keypair, &self.sign_bytes(chain_id)));
        Ok(())
    }

    fn validate_basic(&self) -> Response {
        if self.address.is_zero() {
            return Response::err(Code::InvalidInput, "counter-signer address is empty");
        }
        if self.signature.is_none() {
            return Response::err(Code::InvalidSignature, "counter-signer signature is missing");
        }
        Response::ok()
    }
}

/// Recipient block of a transfer
#[derive(Clone, Debug, PartialEq)]
pub struct TransferRecipient {
    /// Account credited
    pub account_id: String,
}

/// Move `amount` of `currency` from the sender account to the recipient
/// account, authorised by the sender and zero or more counter-signers
#[derive(Clone, Debug, PartialEq)]
pub struct TransferTx {
    /// Sender block
    pub sender: TransferSender,
    /// Counter-signers, validated in input order
    pub counter_signers: Vec<CounterSigner>,
    /// Recipient block
    pub recipient: TransferRecipient,
}

impl TransferTx {
    /// Discriminator byte
    pub fn tx_type(&self) -> u8 {
        tx_type::TRANSFER
    }

    /// Shape-only validation; no state is consulted
    pub fn validate_basic(&self) -> Response {
        if self.sender.address.is_zero() {
            return Response::err(Code::InvalidInput, "sender address is empty");
        }
        if self.sender.account_id.is_empty() {
            return Response::err(Code::InvalidInput, "sender account id is empty");
        }
        if self.sender.currency.is_empty() {
            return Response::err(Code::InvalidInput, "currency is empty");
        }
        if self.sender.amount <= 0 {
            return Response::err(
                Code::InvalidInput,
                format!("amount must be positive, got {}", self.sender.amount),
            );
        }
        if self.sender.sequence == 0 {
            return Response::err(Code::InvalidInput, "sequence must not be zero");
        }
        if self.sender.signature.is_none() {
            return Response::err(Code::InvalidSignature, "sender signature is missing");
        }
        for cs in &self.counter_signers {
            let res = cs.validate_basic();
            if res.is_err() {
                return res;
            }
        }
        if self.recipient.account_id.is_empty() {
            return Response::err(Code::InvalidInput, "recipient account id is empty");
        }
        Response::ok()
    }

    /// Canonical sign-bytes over all fields except signatures
    pub fn sign_bytes(&self, chain_id: &str) -> Vec<u8> {
        let mut buf = sign_bytes_prefix(chain_id, tx_type::TRANSFER);
        buf.extend_from_slice(self.sender.address.as_bytes());
        put_str(&mut buf, &self.sender.account_id);
        put_str(&mut buf, &self.sender.currency);
        put_i64(&mut buf, self.sender.amount);
        put_u64(&mut buf, self.sender.sequence);
        put_count(&mut buf, self.counter_signers.len());
        for cs in &self.counter_signers {
            buf.extend_from_slice(cs.address.as_bytes());
        }
        put_str(&mut buf, &self.recipient.account_id);
        buf
    }

    /// Fill the sender signature using `keypair`
    pub fn sign(&mut self, keypair: &Keypair, chain_id: &str) -> Result<(), CryptoError> {
        check_signer(keypair, &self.sender.address)?;
        self.sender.signature = Some(clear_crypto::sign(keypair, &self.sign_bytes(chain_id)));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Creation transactions
// ---------------------------------------------------------------------------

/// Create a new, empty account owned by the issuer's legal entity
#[derive(Clone, Debug, PartialEq)]
pub struct CreateAccountTx {
    /// Address of the issuing user
    pub address: Address,
    /// Identifier of the account to create (UUID string)
    pub account_id: String,
    /// Issuer's signature
    pub signature: Option<Signature>,
}

impl CreateAccountTx {
    /// Discriminator byte
    pub fn tx_type(&self) -> u8 {
        tx_type::CREATE_ACCOUNT
    }

    /// Shape-only validation
    pub fn validate_basic(&self) -> Response {
        if self.address.is_zero() {
            return Response::err(Code::InvalidInput, "issuer address is empty");
        }
        if self.signature.is_none() {
            return Response::err(Code::InvalidSignature, "signature is missing");
        }
        if self.account_id.is_empty() {
            return Response::err(Code::InvalidInput, "account id is empty");
        }
        Response::ok()
    }

    /// Canonical sign-bytes
    pub fn sign_bytes(&self, chain_id: &str) -> Vec<u8> {
        let mut buf = sign_bytes_prefix(chain_id, tx_type::CREATE_ACCOUNT);
        buf.extend_from_slice(self.address.as_bytes());
        put_str(&mut buf, &self.account_id);
        buf
    }

    /// Fill the issuer signature using `keypair`
    pub fn sign(&mut self, keypair: &Keypair, chain_id: &str) -> Result<(), CryptoError> {
        check_signer(keypair, &self.address)?;
        self.signature = Some(clear_crypto::sign(keypair, &self.sign_bytes(chain_id)));
        Ok(())
    }
}

/// Create a new legal entity of a given kind
#[derive(Clone, Debug, PartialEq)]
pub struct CreateLegalEntityTx {
    /// Address of the issuing user
    pub address: Address,
    /// Identifier of the entity to create (UUID string)
    pub entity_id: String,
    /// Kind of the new entity; selects its permission mask
    pub kind: EntityKind,
    /// Display name of the new entity
    pub name: String,
    /// Identifier of the parent entity (may be empty)
    pub parent_id: String,
    /// Issuer's signature
    pub signature: Option<Signature>,
}

impl CreateLegalEntityTx {
    /// Discriminator byte
    pub fn tx_type(&self) -> u8 {
        tx_type::CREATE_LEGAL_ENTITY
    }

    /// Shape-only validation
    pub fn validate_basic(&self) -> Response {
        if self.address.is_zero() {
            return Response::err(Code::InvalidInput, "issuer address is empty");
        }
        if self.signature.is_none() {
            return Response::err(Code::InvalidSignature, "signature is missing");
        }
        if self.entity_id.is_empty() {
            return Response::err(Code::InvalidInput, "entity id is empty");
        }
        if self.name.is_empty() {
            return Response::err(Code::InvalidInput, "entity name is empty");
        }
        Response::ok()
    }

    /// Canonical sign-bytes
    pub fn sign_bytes(&self, chain_id: &str) -> Vec<u8> {
        let mut buf = sign_bytes_prefix(chain_id, tx_type::CREATE_LEGAL_ENTITY);
        buf.extend_from_slice(self.address.as_bytes());
        put_str(&mut buf, &self.entity_id);
        buf.push(self.kind.as_byte());
        put_str(&mut buf, &self.name);
        put_str(&mut buf, &self.parent_id);
        buf
    }

    /// Fill the issuer signature using `keypair`
    pub fn sign(&mut self, keypair: &Keypair, chain_id: &str) -> Result<(), CryptoError> {
        check_signer(keypair, &self.address)?;
        self.signature = Some(clear_crypto::sign(keypair, &self.sign_bytes(chain_id)));
        Ok(())
    }
}

/// Create a new user owned by the issuer's legal entity
#[derive(Clone, Debug, PartialEq)]
pub struct CreateUserTx {
    /// Address of the issuing user
    pub address: Address,
    /// Public key of the new user
    pub pub_key: PublicKey,
    /// Display name of the new user
    pub name: String,
    /// Whether the new user keeps the creator's create permissions
    pub can_create: bool,
    /// Issuer's signature
    pub signature: Option<Signature>,
}

impl CreateUserTx {
    /// Discriminator byte
    pub fn tx_type(&self) -> u8 {
        tx_type::CREATE_USER
    }

    /// Shape-only validation
    pub fn validate_basic(&self) -> Response {
        if self.address.is_zero() {
            return Response::err(Code::InvalidInput, "issuer address is empty");
        }
        if self.signature.is_none() {
            return Response::err(Code::InvalidSignature, "signature is missing");
        }
        if self.name.is_empty() {
            return Response::err(Code::InvalidInput, "user name is empty");
        }
        Response::ok()
    }

    /// Canonical sign-bytes
    pub fn sign_bytes(&self, chain_id: &str) -> Vec<u8> {
        let mut buf = sign_bytes_prefix(chain_id, tx_type::CREATE_USER);
        buf.extend_from_slice(self.address.as_bytes());
        buf.extend_from_slice(self.pub_key.as_bytes());
        put_str(&mut buf, &self.name);
        buf.push(self.can_create as u8);
        buf
    }

    /// Fill the issuer signature using `keypair`
    pub fn sign(&mut self, keypair: &Keypair, chain_id: &str) -> Result<(), CryptoError> {
        check_signer(keypair, &self.address)?;
        self.signature = Some(clear_crypto::sign(keypair, &self.sign_bytes(chain_id)));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Query transactions
// ---------------------------------------------------------------------------

/// Fetch a list of accounts by id
#[derive(Clone, Debug, PartialEq)]
pub struct AccountQueryTx {
    /// Address of the querying user
    pub address: Address,
    /// Account ids to fetch; all must exist
    pub account_ids: Vec<String>,
    /// Issuer's signature
    pub signature: Option<Signature>,
}

impl AccountQueryTx {
    /// Discriminator byte
    pub fn tx_type(&self) -> u8 {
        tx_type::ACCOUNT_QUERY
    }

    /// Shape-only validation
    pub fn validate_basic(&self) -> Response {
        if self.address.is_zero() {
            return Response::err(Code::InvalidInput, "issuer address is empty");
        }
        if self.signature.is_none() {
            return Response::err(Code::InvalidSignature, "signature is missing");
        }
        if self.account_ids.is_empty() {
            return Response::err(Code::InvalidInput, "account id list is empty");
        }
        if self.account_ids.iter().any(|id| id.is_empty()) {
            return Response::err(Code::InvalidInput, "account id is empty");
        }
        Response::ok()
    }

    /// Canonical sign-bytes
    pub fn sign_bytes(&self, chain_id: &str) -> Vec<u8> {
        let mut buf = sign_bytes_prefix(chain_id, tx_type::ACCOUNT_QUERY);
        buf.extend_from_slice(self.address.as_bytes());
        put_count(&mut buf, self.account_ids.len());
        for id in &self.account_ids {
            put_str(&mut buf, id);
        }
        buf
    }

    /// Fill the issuer signature using `keypair`
    pub fn sign(&mut self, keypair: &Keypair, chain_id: &str) -> Result<(), CryptoError> {
        check_signer(keypair, &self.address)?;
        self.signature = Some(clear_crypto::sign(keypair, &self.sign_bytes(chain_id)));
        Ok(())
    }
}

/// Fetch the whole account index
#[derive(Clone, Debug, PartialEq)]
pub struct AccountIndexQueryTx {
    /// Address of the querying user
    pub address: Address,
    /// Issuer's signature
    pub signature: Option<Signature>,
}

impl AccountIndexQueryTx {
    /// Discriminator byte
    pub fn tx_type(&self) -> u8 {
        tx_type::ACCOUNT_INDEX_QUERY
    }

    /// Shape-only validation
    pub fn validate_basic(&self) -> Response {
        if self.address.is_zero() {
            return Response::err(Code::InvalidInput, "issuer address is empty");
        }
        if self.signature.is_none() {
            return Response::err(Code::InvalidSignature, "signature is missing");
        }
        Response::ok()
    }

    /// Canonical sign-bytes
    pub fn sign_bytes(&self, chain_id: &str) -> Vec<u8> {
        let mut buf = sign_bytes_prefix(chain_id, tx_type::ACCOUNT_INDEX_QUERY);
        buf.extend_from_slice(self.address.as_bytes());
        buf
    }

    /// Fill the issuer signature using `keypair`
    pub fn sign(&mut self, keypair: &Keypair, chain_id: &str) -> Result<(), CryptoError> {
        check_signer(keypair, &self.address)?;
        self.signature = Some(clear_crypto::sign(keypair, &self.sign_bytes(chain_id)));
        Ok(())
    }
}

/// Fetch a list of legal entities by id
#[derive(Clone, Debug, PartialEq)]
pub struct LegalEntityQueryTx {
    /// Address of the querying user
    pub address: Address,
    /// Entity ids to fetch; all must exist
    pub entity_ids: Vec<String>,
    /// Issuer's signature
    pub signature: Option<Signature>,
}

impl LegalEntityQueryTx {
    /// Discriminator byte
    pub fn tx_type(&self) -> u8 {
        tx_type::LEGAL_ENTITY_QUERY
    }

    /// Shape-only validation
    pub fn validate_basic(&self) -> Response {
        if self.address.is_zero() {
            return Response::err(Code::InvalidInput, "issuer address is empty");
        }
        if self.signature.is_none() {
            return Response::err(Code::InvalidSignature, "signature is missing");
        }
        if self.entity_ids.is_empty() {
            return Response::err(Code::InvalidInput, "entity id list is empty");
        }
        if self.entity_ids.iter().any(|id| id.is_empty()) {
            return Response::err(Code::InvalidInput, "entity id is empty");
        }
        Response::ok()
    }

    /// Canonical sign-bytes
    pub fn sign_bytes(&self, chain_id: &str) -> Vec<u8> {
        let mut buf = sign_bytes_prefix(chain_id, tx_type::LEGAL_ENTITY_QUERY);
        buf.extend_from_slice(self.address.as_bytes());
        put_count(&mut buf, self.entity_ids.len());
        for id in &self.entity_ids {
            put_str(&mut buf, id);
        }
        buf
    }

    /// Fill the issuer signature using `keypair`
    pub fn sign(&mut self, keypair: &Keypair, chain_id: &str) -> Result<(), CryptoError> {
        check_signer(keypair, &self.address)?;
        self.signature = Some(clear_crypto::sign(keypair, &self.sign_bytes(chain_id)));
        Ok(())
    }
}

/// Fetch the whole legal entity index
#[derive(Clone, Debug, PartialEq)]
pub struct LegalEntityIndexQueryTx {
    /// Address of the querying user
    pub address: Address,
    /// Issuer's signature
    pub signature: Option<Signature>,
}

impl LegalEntityIndexQueryTx {
    /// Discriminator byte
    pub fn tx_type(&self) -> u8 {
        tx_type::LEGAL_ENTITY_INDEX_QUERY
    }

    /// Shape-only validation
    pub fn validate_basic(&self) -> Response {
        if self.address.is_zero() {
            return Response::err(Code::InvalidInput, "issuer address is empty");
        }
        if self.signature.is_none() {
            return Response::err(Code::InvalidSignature, "signature is missing");
        }
        Response::ok()
    }

    /// Canonical sign-bytes
    pub fn sign_bytes(&self, chain_id: &str) -> Vec<u8> {
        let mut buf = sign_bytes_prefix(chain_id, tx_type::LEGAL_ENTITY_INDEX_QUERY);
        buf.extend_from_slice(self.address.as_bytes());
        buf
    }

    /// Fill the issuer signature using `keypair`
    pub fn sign(&mut self, keypair: &Keypair, chain_id: &str) -> Result<(), CryptoError> {
        check_signer(keypair, &self.address)?;
        self.signature = Some(clear_crypto::sign(keypair, &self.sign_bytes(chain_id)));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Closed union
// ---------------------------------------------------------------------------

/// The closed union of all transaction kinds
#[derive(Clone, Debug, PartialEq)]
#[allow(clippy::large_enum_variant)]
pub enum Tx {
    /// Transfer between two accounts
    Transfer(TransferTx),
    /// Create a new account
    CreateAccount(CreateAccountTx),
    /// Create a new legal entity
    CreateLegalEntity(CreateLegalEntityTx),
    /// Create a new user
    CreateUser(CreateUserTx),
    /// Fetch accounts by id
    AccountQuery(AccountQueryTx),
    /// Fetch the account index
    AccountIndexQuery(AccountIndexQueryTx),
    /// Fetch legal entities by id
    LegalEntityQuery(LegalEntityQueryTx),
    /// Fetch the legal entity index
    LegalEntityIndexQuery(LegalEntityIndexQueryTx),
}

impl Tx {
    /// Discriminator byte of the wrapped kind
    pub fn tx_type(&self) -> u8 {
        match self {
            Tx::Transfer(tx) => tx.tx_type(),
            Tx::CreateAccount(tx) => tx.tx_type(),
            Tx::CreateLegalEntity(tx) => tx.tx_type(),
            Tx::CreateUser(tx) => tx.tx_type(),
            Tx::AccountQuery(tx) => tx.tx_type(),
            Tx::AccountIndexQuery(tx) => tx.tx_type(),
            Tx::LegalEntityQuery(tx) => tx.tx_type(),
            Tx::LegalEntityIndexQuery(tx) => tx.tx_type(),
        }
    }

    /// Shape-only validation of the wrapped kind
    pub fn validate_basic(&self) -> Response {
        match self {
            Tx::Transfer(tx) => tx.validate_basic(),
            Tx::CreateAccount(tx) => tx.validate_basic(),
            Tx::CreateLegalEntity(tx) => tx.validate_basic(),
            Tx::CreateUser(tx) => tx.validate_basic(),
            Tx::AccountQuery(tx) => tx.validate_basic(),
            Tx::AccountIndexQuery(tx) => tx.validate_basic(),
            Tx::LegalEntityQuery(tx) => tx.validate_basic(),
            Tx::LegalEntityIndexQuery(tx) => tx.validate_basic(),
        }
    }

    /// Canonical sign-bytes of the wrapped kind
    pub fn sign_bytes(&self, chain_id: &str) -> Vec<u8> {
        match self {
            Tx::Transfer(tx) => tx.sign_bytes(chain_id),
            Tx::CreateAccount(tx) => tx.sign_bytes(chain_id),
            Tx::CreateLegalEntity(tx) => tx.sign_bytes(chain_id),
            Tx::CreateUser(tx) => tx.sign_bytes(chain_id),
            Tx::AccountQuery(tx) => tx.sign_bytes(chain_id),
            Tx::AccountIndexQuery(tx) => tx.sign_bytes(chain_id),
            Tx::LegalEntityQuery(tx) => tx.sign_bytes(chain_id),
            Tx::LegalEntityIndexQuery(tx) => tx.sign_bytes(chain_id),
        }
    }

    /// Check whether the wrapped kind is a read-only query
    pub fn is_query(&self) -> bool {
        matches!(
            self,
            Tx::AccountQuery(_)
                | Tx::AccountIndexQuery(_)
                | Tx::LegalEntityQuery(_)
                | Tx::LegalEntityIndexQuery(_)
        )
    }
}
