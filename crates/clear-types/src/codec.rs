//! Deterministic binary encoding for stored values and sign-bytes
//!
//! All encodings are little-endian with fixed field order: strings and
//! lists carry a `u32` length prefix, addresses and public keys are raw
//! fixed-width bytes. Decoding returns `None` on any structural mismatch;
//! callers decide whether absence of meaning is an error.

use crate::{Account, AccountIndex, EntityKind, LegalEntity, LegalEntityIndex, Perm, User, Wallet};
use clear_crypto::PublicKey;
use clear_primitives::Address;

/// Append a length-prefixed UTF-8 string
pub fn put_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}

/// Append a `u32` count prefix for a list
pub fn put_count(buf: &mut Vec<u8>, count: usize) {
    buf.extend_from_slice(&(count as u32).to_le_bytes());
}

/// Append a `u64`
pub fn put_u64(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// Append an `i64`
pub fn put_i64(buf: &mut Vec<u8>, v: i64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// Cursor over an encoded value
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Reader { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        if end > self.bytes.len() {
            return None;
        }
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Some(slice)
    }

    fn u8(&mut self) -> Option<u8> {
        Some(self.take(1)?[0])
    }

    fn u32(&mut self) -> Option<u32> {
        Some(u32::from_le_bytes(self.take(4)?.try_into().ok()?))
    }

    fn u64(&mut self) -> Option<u64> {
        Some(u64::from_le_bytes(self.take(8)?.try_into().ok()?))
    }

    fn i64(&mut self) -> Option<i64> {
        Some(i64::from_le_bytes(self.take(8)?.try_into().ok()?))
    }

    fn str(&mut self) -> Option<String> {
        let len = self.u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).ok()
    }

    fn address(&mut self) -> Option<Address> {
        Address::from_slice(self.take(Address::LEN)?).ok()
    }

    fn done(&self) -> bool {
        self.pos == self.bytes.len()
    }
}

/// Encode a user record
pub fn encode_user(user: &User) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(user.pub_key.as_bytes());
    put_str(&mut buf, &user.name);
    put_str(&mut buf, &user.entity_id);
    put_u64(&mut buf, user.permissions.0);
    buf
}

/// Decode a user record
pub fn decode_user(bytes: &[u8]) -> Option<User> {
    let mut r = Reader::new(bytes);
    let pub_key = PublicKey::from_bytes(r.take(32)?).ok()?;
    let name = r.str()?;
    let entity_id = r.str()?;
    let permissions = Perm(r.u64()?);
    if !r.done() {
        return None;
    }
    Some(User::new(pub_key, name, entity_id, permissions))
}

/// Encode a legal entity record
pub fn encode_legal_entity(entity: &LegalEntity) -> Vec<u8> {
    let mut buf = Vec::new();
    put_str(&mut buf, &entity.id);
    buf.push(entity.kind.as_byte());
    put_str(&mut buf, &entity.name);
    buf.extend_from_slice(entity.creator.as_bytes());
    put_str(&mut buf, &entity.parent_id);
    put_u64(&mut buf, entity.permissions.0);
    buf
}

/// Decode a legal entity record
pub fn decode_legal_entity(bytes: &[u8]) -> Option<LegalEntity> {
    let mut r = Reader::new(bytes);
    let id = r.str()?;
    let kind = EntityKind::from_byte(r.u8()?)?;
    let name = r.str()?;
    let creator = r.address()?;
    let parent_id = r.str()?;
    let permissions = Perm(r.u64()?);
    if !r.done() {
        return None;
    }
    Some(LegalEntity {
        id,
        kind,
        name,
        creator,
        parent_id,
        permissions,
    })
}

/// Encode an account record with its wallets
pub fn encode_account(account: &Account) -> Vec<u8> {
    let mut buf = Vec::new();
    put_str(&mut buf, &account.id);
    put_str(&mut buf, &account.entity_id);
    put_count(&mut buf, account.wallets.len());
    for wallet in &account.wallets {
        put_str(&mut buf, &wallet.currency);
        put_i64(&mut buf, wallet.balance);
        put_u64(&mut buf, wallet.sequence);
    }
    buf
}

/// Decode an account record
pub fn decode_account(bytes: &[u8]) -> Option<Account> {
    let mut r = Reader::new(bytes);
    let id = r.str()?;
    let entity_id = r.str()?;
    let count = r.u32()? as usize;
    let mut wallets = Vec::with_capacity(count);
    for _ in 0..count {
        wallets.push(Wallet {
            currency: r.str()?,
            balance: r.i64()?,
            sequence: r.u64()?,
        });
    }
    if !r.done() {
        return None;
    }
    Some(Account {
        id,
        entity_id,
        wallets,
    })
}

fn encode_ids(ids: &[String]) -> Vec<u8> {
    let mut buf = Vec::new();
    put_count(&mut buf, ids.len());
    for id in ids {
        put_str(&mut buf, id);
    }
    buf
}

fn decode_ids(bytes: &[u8]) -> Option<Vec<String>> {
    let mut r = Reader::new(bytes);
    let count = r.u32()? as usize;
    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        ids.push(r.str()?);
    }
    if !r.done() {
        return None;
    }
    Some(ids)
}

/// Encode the account index
pub fn encode_account_index(index: &AccountIndex) -> Vec<u8> {
    encode_ids(&index.ids)
}

/// Decode the account index
pub fn decode_account_index(bytes: &[u8]) -> Option<AccountIndex> {
    Some(AccountIndex {
        ids: decode_ids(bytes)?,
    })
}

/// Encode the legal entity index
pub fn encode_legal_entity_index(index: &LegalEntityIndex) -> Vec<u8> {
    encode_ids(&index.ids)
}

/// Decode the legal entity index
pub fn decode_legal_entity_index(bytes: &[u8]) -> Option<LegalEntityIndex> {
    Some(LegalEntityIndex {
        ids: decode_ids(bytes)?,
    })
}
