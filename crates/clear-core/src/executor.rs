//! Execution dispatcher for mutating transactions

use clear_crypto::public_key_to_address;
use clear_store::{DryRun, StateReader, StateWriter, StoreResult};
use clear_types::{
    can_exec_tx, Account, AccountIndex, Code, LegalEntity, LegalEntityIndex, Perm, Response,
    TransferSender, TransferTx, Tx, User,
};
use std::collections::HashSet;

/// Execute a mutating transaction against the state
///
/// With `is_check = true` the transaction runs through the full validation
/// and commit path against a write-discarding guard: the verdict equals the
/// commit verdict, and the store is left bytewise unchanged. With
/// `is_check = false` the mutation is applied.
pub fn exec_tx<S: StateWriter>(state: &mut S, tx: &Tx, is_check: bool) -> Response {
    let result = if is_check {
        let mut guard = DryRun::new(&*state);
        dispatch(&mut guard, tx)
    } else {
        dispatch(state, tx)
    };
    match result {
        Ok(response) => {
            if !is_check && response.is_ok() {
                tracing::debug!(tx_type = tx.tx_type(), "transaction applied");
            }
            response
        }
        Err(err) => {
            tracing::error!(error = %err, tx_type = tx.tx_type(), "store failure during execution");
            Response::err(Code::InternalError, err.to_string())
        }
    }
}

fn dispatch<S: StateWriter>(state: &mut S, tx: &Tx) -> StoreResult<Response> {
    match tx {
        Tx::Transfer(tx) => transfer(state, tx),
        Tx::CreateAccount(tx) => create_account(state, tx),
        Tx::CreateLegalEntity(tx) => create_legal_entity(state, tx),
        Tx::CreateUser(tx) => create_user(state, tx),
        _ => Ok(Response::err(
            Code::EncodingError,
            format!("tx type {:#04x} is not executable", tx.tx_type()),
        )),
    }
}

fn transfer<S: StateWriter>(state: &mut S, tx: &TransferTx) -> StoreResult<Response> {
    let res = tx.validate_basic();
    if res.is_err() {
        return Ok(res.prepend_log("in validate_basic"));
    }

    let Some(user) = state.get_user(&tx.sender.address)? else {
        return Ok(Response::err(Code::UnknownAddress, "sender's user is unknown"));
    };
    let Some(entity) = state.get_legal_entity(&user.entity_id)? else {
        return Ok(Response::err(
            Code::Unauthorized,
            "user does not belong to any legal entity",
        ));
    };

    let Some(mut sender_account) = state.get_account(&tx.sender.account_id)? else {
        return Ok(Response::err(Code::UnknownAddress, "sender's account is unknown"));
    };
    let Some(mut recipient_account) = state.get_account(&tx.recipient.account_id)? else {
        return Ok(Response::err(Code::UnknownAddress, "unknown recipient account"));
    };

    let res = validate_wallet_sequence(&sender_account, &tx.sender);
    if res.is_err() {
        return Ok(res.prepend_log("in validate_wallet_sequence"));
    }

    let sign_bytes = tx.sign_bytes(&state.chain_id());
    let res = validate_sender(&sender_account, &entity, &user, &sign_bytes, tx);
    if res.is_err() {
        return Ok(res.prepend_log("in validate_sender"));
    }
    let res = validate_counter_signers(state, &sender_account, &entity, tx)?;
    if res.is_err() {
        return Ok(res.prepend_log("in validate_counter_signers"));
    }

    // Sender first, recipient second; the host delivers serially, so no
    // further ordering is needed.
    apply_changes(&mut sender_account, &tx.sender.currency, tx.sender.amount, false);
    state.set_account(&sender_account);
    apply_changes(
        &mut recipient_account,
        &tx.sender.currency,
        tx.sender.amount,
        true,
    );
    state.set_account(&recipient_account);

    Ok(Response::ok())
}

fn create_account<S: StateWriter>(
    state: &mut S,
    tx: &clear_types::CreateAccountTx,
) -> StoreResult<Response> {
    let res = tx.validate_basic();
    if res.is_err() {
        return Ok(res.prepend_log("in validate_basic"));
    }

    let Some(user) = state.get_user(&tx.address)? else {
        return Ok(Response::err(Code::UnknownAddress, "user is unknown"));
    };
    let Some(entity) = state.get_legal_entity(&user.entity_id)? else {
        return Ok(Response::err(
            Code::Unauthorized,
            "user does not belong to any legal entity",
        ));
    };

    if !can_exec_tx(&user, tx.tx_type()) {
        return Ok(Response::err(
            Code::Unauthorized,
            format!("user is not authorized to execute the tx: {user}"),
        ));
    }
    if !can_exec_tx(&entity, tx.tx_type()) {
        return Ok(Response::err(
            Code::Unauthorized,
            format!("legal entity is not authorized to execute the tx: {entity}"),
        ));
    }

    let sign_bytes = tx.sign_bytes(&state.chain_id());
    if !verify_issuer(&user, &sign_bytes, tx.signature.as_ref()) {
        return Ok(Response::err(
            Code::InvalidSignature,
            "user's signature doesn't match",
        ));
    }

    if state.get_account(&tx.account_id)?.is_some() {
        return Ok(Response::err(
            Code::InvalidInput,
            format!("account already exists: {:?}", tx.account_id),
        ));
    }

    let account = Account::new(tx.account_id.clone(), entity.id.clone());
    state.set_account(&account);
    set_account_in_index(state, &account)
}

fn create_legal_entity<S: StateWriter>(
    state: &mut S,
    tx: &clear_types::CreateLegalEntityTx,
) -> StoreResult<Response> {
    let res = tx.validate_basic();
    if res.is_err() {
        return Ok(res.prepend_log("in validate_basic"));
    }

    let Some(user) = state.get_user(&tx.address)? else {
        return Ok(Response::err(Code::UnknownAddress, "user is unknown"));
    };
    let Some(entity) = state.get_legal_entity(&user.entity_id)? else {
        return Ok(Response::err(
            Code::Unauthorized,
            "user does not belong to any legal entity",
        ));
    };

    if !can_exec_tx(&user, tx.tx_type()) {
        return Ok(Response::err(
            Code::Unauthorized,
            format!("user is not authorized to execute the tx: {user}"),
        ));
    }
    if !can_exec_tx(&entity, tx.tx_type()) {
        return Ok(Response::err(
            Code::Unauthorized,
            format!("legal entity is not authorized to execute the tx: {entity}"),
        ));
    }

    let sign_bytes = tx.sign_bytes(&state.chain_id());
    if !verify_issuer(&user, &sign_bytes, tx.signature.as_ref()) {
        return Ok(Response::err(
            Code::InvalidSignature,
            "user's signature doesn't match",
        ));
    }

    if state.get_legal_entity(&tx.entity_id)?.is_some() {
        return Ok(Response::err(
            Code::InvalidInput,
            format!("legal entity already exists: {:?}", tx.entity_id),
        ));
    }

    let new_entity = LegalEntity::new(
        tx.entity_id.clone(),
        tx.kind,
        tx.name.clone(),
        user.address(),
        tx.parent_id.clone(),
    );
    state.set_legal_entity(&new_entity);
    set_legal_entity_in_index(state, &new_entity)
}

fn create_user<S: StateWriter>(
    state: &mut S,
    tx: &clear_types::CreateUserTx,
) -> StoreResult<Response> {
    let res = tx.validate_basic();
    if res.is_err() {
        return Ok(res.prepend_log("in validate_basic"));
    }

    let Some(creator) = state.get_user(&tx.address)? else {
        return Ok(Response::err(Code::UnknownAddress, "user is unknown"));
    };
    let Some(entity) = state.get_legal_entity(&creator.entity_id)? else {
        return Ok(Response::err(
            Code::Unauthorized,
            "user does not belong to any legal entity",
        ));
    };

    if !can_exec_tx(&creator, tx.tx_type()) {
        return Ok(Response::err(
            Code::Unauthorized,
            format!("user is not authorized to execute the tx: {creator}"),
        ));
    }
    if !can_exec_tx(&entity, tx.tx_type()) {
        return Ok(Response::err(
            Code::Unauthorized,
            format!("legal entity is not authorized to execute the tx: {entity}"),
        ));
    }

    let sign_bytes = tx.sign_bytes(&state.chain_id());
    if !verify_issuer(&creator, &sign_bytes, tx.signature.as_ref()) {
        return Ok(Response::err(
            Code::InvalidSignature,
            "user's signature doesn't match",
        ));
    }

    let new_address = public_key_to_address(&tx.pub_key);
    if state.get_user(&new_address)?.is_some() {
        return Ok(Response::err(
            Code::DuplicateAddress,
            format!("user already exists: {new_address}"),
        ));
    }

    make_new_user(state, &creator, tx);
    Ok(Response::ok())
}

// ---------------------------------------------------------------------------
// Validators
// ---------------------------------------------------------------------------

fn verify_issuer(
    user: &User,
    sign_bytes: &[u8],
    signature: Option<&clear_crypto::Signature>,
) -> bool {
    matches!(signature, Some(sig) if user.verify_signature(sign_bytes, sig))
}

fn validate_wallet_sequence(account: &Account, sender: &TransferSender) -> Response {
    match account.wallet(&sender.currency) {
        // Wallet does not exist yet, sequence must be 1
        None => {
            if sender.sequence != 1 {
                return Response::err(
                    Code::InvalidSequence,
                    format!("invalid sequence: got {}, want 1", sender.sequence),
                );
            }
            Response::ok()
        }
        Some(wallet) => {
            if sender.sequence != wallet.sequence + 1 {
                return Response::err(
                    Code::InvalidSequence,
                    format!(
                        "invalid sequence: got {}, want {}",
                        sender.sequence,
                        wallet.sequence + 1
                    ),
                );
            }
            Response::ok()
        }
    }
}

fn validate_sender(
    account: &Account,
    entity: &LegalEntity,
    user: &User,
    sign_bytes: &[u8],
    tx: &TransferTx,
) -> Response {
    let res = validate_permissions(user, entity, account, tx.tx_type());
    if res.is_err() {
        return res;
    }
    if !verify_issuer(user, sign_bytes, tx.sender.signature.as_ref()) {
        return Response::err(Code::InvalidSignature, "sender's signature doesn't match");
    }
    Response::ok()
}

fn validate_counter_signers<S: StateReader>(
    state: &S,
    account: &Account,
    entity: &LegalEntity,
    tx: &TransferTx,
) -> StoreResult<Response> {
    let chain_id = state.chain_id();
    let mut seen = HashSet::new();
    seen.insert(tx.sender.address);

    for cs in &tx.counter_signers {
        if !seen.insert(cs.address) {
            return Ok(Response::err(
                Code::DuplicateAddress,
                format!("duplicate signer address: {}", cs.address),
            ));
        }
        let Some(user) = state.get_user(&cs.address)? else {
            return Ok(Response::err(
                Code::UnknownAddress,
                format!("counter-signer is unknown: {}", cs.address),
            ));
        };
        let res = validate_permissions(&user, entity, account, tx.tx_type());
        if res.is_err() {
            return Ok(res);
        }
        if !verify_issuer(&user, &cs.sign_bytes(&chain_id), cs.signature.as_ref()) {
            return Ok(Response::err(
                Code::InvalidSignature,
                format!("counter-signer's signature doesn't match, user: {user}"),
            ));
        }
    }

    Ok(Response::ok())
}

fn validate_permissions(
    user: &User,
    entity: &LegalEntity,
    account: &Account,
    tx_type_byte: u8,
) -> Response {
    // Cross-entity access is forbidden
    if !account.belongs_to(&user.entity_id) {
        return Response::err(
            Code::Unauthorized,
            format!("access forbidden for user {} to account {}", user.name, account),
        );
    }
    if !can_exec_tx(user, tx_type_byte) {
        return Response::err(
            Code::Unauthorized,
            format!("user is not authorized to execute the tx: {user}"),
        );
    }
    if !can_exec_tx(entity, tx_type_byte) {
        return Response::err(
            Code::Unauthorized,
            format!("legal entity is not authorized to execute the tx: {entity}"),
        );
    }
    Response::ok()
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

fn apply_changes(account: &mut Account, currency: &str, amount: i64, credit: bool) {
    let mut wallet = account.wallet(currency).cloned().unwrap_or_else(|| {
        clear_types::Wallet {
            currency: currency.to_string(),
            balance: 0,
            sequence: 0,
        }
    });
    if credit {
        wallet.balance += amount;
    } else {
        wallet.balance -= amount;
    }
    wallet.sequence += 1;
    account.set_wallet(wallet);
}

fn make_new_user<S: StateWriter>(state: &mut S, creator: &User, tx: &clear_types::CreateUserTx) {
    let mut permissions = creator.permissions;
    if !tx.can_create {
        permissions = permissions.clear(Perm::CREATE_USER.add(Perm::CREATE_LEGAL_ENTITY));
    }
    let user = User::new(
        tx.pub_key,
        tx.name.clone(),
        creator.entity_id.clone(),
        permissions,
    );
    state.set_user(&user);
}

fn set_account_in_index<S: StateWriter>(state: &mut S, account: &Account) -> StoreResult<Response> {
    let mut index = state.get_account_index()?.unwrap_or_else(AccountIndex::new);
    if index.has(&account.id) {
        // The account was absent from the primary namespace yet its id is
        // indexed: the two have drifted. Report, do not repair.
        tracing::error!(account_id = %account.id, "account index diverged from store");
        return Ok(Response::err(
            Code::InvalidInput,
            format!("account already exists in the account index: {:?}", account.id),
        ));
    }
    index.add(account.id.clone());
    state.set_account_index(&index);
    Ok(Response::ok())
}

fn set_legal_entity_in_index<S: StateWriter>(
    state: &mut S,
    entity: &LegalEntity,
) -> StoreResult<Response> {
    let mut index = state
        .get_legal_entity_index()?
        .unwrap_or_else(LegalEntityIndex::new);
    if index.has(&entity.id) {
        tracing::error!(entity_id = %entity.id, "legal entity index diverged from store");
        return Ok(Response::err(
            Code::InvalidInput,
            format!(
                "legal entity already exists in the legal entity index: {:?}",
                entity.id
            ),
        ));
    }
    index.add(entity.id.clone());
    state.set_legal_entity_index(&index);
    Ok(Response::ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clear_crypto::{keypair_from_seed, Keypair};
    use clear_store::{MemStore, Store};
    use clear_types::{CounterSigner, EntityKind, TransferRecipient, Wallet};
    use clear_primitives::Address;
    use uuid::Uuid;

    const CHAIN_ID: &str = "chain";

    fn new_state() -> Store<MemStore> {
        let mut state = Store::new(MemStore::new());
        state.set_chain_id(CHAIN_ID);
        state
    }

    fn keyed_user(seed: u8, entity_id: &str, permissions: Perm) -> (Keypair, User) {
        let keypair = keypair_from_seed(&[seed; 32]).unwrap();
        let user = User::new(
            keypair.public,
            format!("user-{seed}"),
            entity_id.to_string(),
            permissions,
        );
        (keypair, user)
    }

    #[test]
    fn test_validate_wallet_sequence() {
        let mut account = Account::new("a".into(), "e".into());

        // No wallet yet: only 1 is acceptable
        let sender = |sequence| TransferSender {
            address: Address::from_bytes([1; 20]),
            account_id: "a".into(),
            currency: "USD".into(),
            amount: 10,
            sequence,
            signature: None,
        };
        assert!(validate_wallet_sequence(&account, &sender(1)).is_ok());
        assert_eq!(
            validate_wallet_sequence(&account, &sender(10)).code,
            Code::InvalidSequence
        );

        account.set_wallet(Wallet {
            currency: "USD".into(),
            balance: 0,
            sequence: 10,
        });
        assert!(validate_wallet_sequence(&account, &sender(11)).is_ok());
        assert_eq!(
            validate_wallet_sequence(&account, &sender(10)).code,
            Code::InvalidSequence
        );
        assert_eq!(
            validate_wallet_sequence(&account, &sender(12)).code,
            Code::InvalidSequence
        );
    }

    #[test]
    fn test_validate_permissions() {
        let entity_id = Uuid::new_v4().to_string();
        let (_, authorized) = keyed_user(1, &entity_id, Perm::TRANSFER);
        let entity = LegalEntity::new(
            entity_id.clone(),
            EntityKind::ClearingHouse,
            "CH".into(),
            Address::from_bytes([1; 20]),
            String::new(),
        );
        let account = Account::new("a".into(), entity_id.clone());

        assert!(
            validate_permissions(&authorized, &entity, &account, clear_types::tx_type::TRANSFER)
                .is_ok()
        );

        // Unauthorized user
        let (_, powerless) = keyed_user(2, &entity_id, Perm::NONE);
        assert_eq!(
            validate_permissions(&powerless, &entity, &account, clear_types::tx_type::TRANSFER)
                .code,
            Code::Unauthorized
        );

        // Account owned by a different entity
        let foreign = Account::new("b".into(), Uuid::new_v4().to_string());
        assert_eq!(
            validate_permissions(&authorized, &entity, &foreign, clear_types::tx_type::TRANSFER)
                .code,
            Code::Unauthorized
        );

        // Entity without the bit
        let mut weak_entity = entity;
        weak_entity.permissions = Perm::NONE;
        assert_eq!(
            validate_permissions(
                &authorized,
                &weak_entity,
                &account,
                clear_types::tx_type::TRANSFER
            )
            .code,
            Code::Unauthorized
        );
    }

    #[test]
    fn test_validate_sender() {
        let entity_id = Uuid::new_v4().to_string();
        let (keypair, user) = keyed_user(3, &entity_id, Perm::TRANSFER);
        let entity = LegalEntity::new(
            entity_id.clone(),
            EntityKind::ClearingHouse,
            "CH".into(),
            Address::from_bytes([1; 20]),
            String::new(),
        );
        let account = Account::new("a".into(), entity_id);

        let mut tx = TransferTx {
            sender: TransferSender {
                address: user.address(),
                account_id: "a".into(),
                currency: "USD".into(),
                amount: 10,
                sequence: 1,
                signature: None,
            },
            counter_signers: vec![],
            recipient: TransferRecipient { account_id: "b".into() },
        };
        tx.sign(&keypair, CHAIN_ID).unwrap();
        let sign_bytes = tx.sign_bytes(CHAIN_ID);

        assert!(validate_sender(&account, &entity, &user, &sign_bytes, &tx).is_ok());

        // Signature over different bytes fails
        assert_eq!(
            validate_sender(&account, &entity, &user, b"other bytes", &tx).code,
            Code::InvalidSignature
        );

        // Missing signature fails
        let mut unsigned = tx.clone();
        unsigned.sender.signature = None;
        assert_eq!(
            validate_sender(&account, &entity, &user, &sign_bytes, &unsigned).code,
            Code::InvalidSignature
        );
    }

    #[test]
    fn test_validate_counter_signers() {
        let mut state = new_state();
        let entity_id = Uuid::new_v4().to_string();
        let entity = LegalEntity::new(
            entity_id.clone(),
            EntityKind::ClearingHouse,
            "CH".into(),
            Address::from_bytes([1; 20]),
            String::new(),
        );
        state.set_legal_entity(&entity);
        let account = Account::new(Uuid::new_v4().to_string(), entity_id.clone());
        state.set_account(&account);

        let (sender_keypair, sender) = keyed_user(10, &entity_id, entity.permissions);
        state.set_user(&sender);

        let mut counter_signers = Vec::new();
        for seed in 11..=14u8 {
            let (keypair, user) = keyed_user(seed, &entity_id, entity.permissions);
            state.set_user(&user);
            let mut cs = CounterSigner {
                address: user.address(),
                signature: None,
            };
            cs.sign(&keypair, CHAIN_ID).unwrap();
            counter_signers.push(cs);
        }

        let mut tx = TransferTx {
            sender: TransferSender {
                address: sender.address(),
                account_id: account.id.clone(),
                currency: "USD".into(),
                amount: 10,
                sequence: 1,
                signature: None,
            },
            counter_signers,
            recipient: TransferRecipient {
                account_id: Uuid::new_v4().to_string(),
            },
        };
        tx.sign(&sender_keypair, CHAIN_ID).unwrap();

        assert!(validate_counter_signers(&state, &account, &entity, &tx)
            .unwrap()
            .is_ok());

        // Sender duplicated among the counter-signers
        let mut dup = tx.clone();
        dup.counter_signers.push(CounterSigner {
            address: sender.address(),
            signature: tx.sender.signature,
        });
        assert_eq!(
            validate_counter_signers(&state, &account, &entity, &dup)
                .unwrap()
                .code,
            Code::DuplicateAddress
        );

        // Unknown counter-signer
        let mut unknown = tx.clone();
        unknown.counter_signers.push(CounterSigner {
            address: Address::from_bytes([0xee; 20]),
            signature: tx.sender.signature,
        });
        assert_eq!(
            validate_counter_signers(&state, &account, &entity, &unknown)
                .unwrap()
                .code,
            Code::UnknownAddress
        );

        // Tampered counter-signature
        let mut tampered = tx.clone();
        let sb = tx.sign_bytes(CHAIN_ID);
        tampered.counter_signers[0].signature =
            Some(clear_crypto::sign(&sender_keypair, &sb));
        assert_eq!(
            validate_counter_signers(&state, &account, &entity, &tampered)
                .unwrap()
                .code,
            Code::InvalidSignature
        );

        // An account owned by another entity rejects every counter-signer
        let foreign = Account::new("x".into(), Uuid::new_v4().to_string());
        assert_eq!(
            validate_counter_signers(&state, &foreign, &entity, &tx)
                .unwrap()
                .code,
            Code::Unauthorized
        );
    }

    #[test]
    fn test_apply_changes() {
        let mut account = Account::new("a".into(), "e".into());

        apply_changes(&mut account, "USD", 100, false);
        let w = account.wallet("USD").unwrap();
        assert_eq!(w.balance, -100);
        assert_eq!(w.sequence, 1);

        apply_changes(&mut account, "USD", 40, true);
        let w = account.wallet("USD").unwrap();
        assert_eq!(w.balance, -60);
        assert_eq!(w.sequence, 2);

        // Other currencies get their own wallet
        apply_changes(&mut account, "EUR", 10, true);
        assert_eq!(account.wallets.len(), 2);
        assert_eq!(account.wallet("EUR").unwrap().sequence, 1);
    }

    #[test]
    fn test_make_new_user_masks() {
        let mut state = new_state();
        let creator_perms = Perm::TRANSFER
            .add(Perm::CREATE_ACCOUNT)
            .add(Perm::CREATE_LEGAL_ENTITY)
            .add(Perm::CREATE_USER);
        let (_, creator) = keyed_user(20, "e-1", creator_perms);
        let new_keypair = keypair_from_seed(&[21; 32]).unwrap();

        let tx = clear_types::CreateUserTx {
            address: creator.address(),
            pub_key: new_keypair.public,
            name: "restricted".into(),
            can_create: false,
            signature: None,
        };
        make_new_user(&mut state, &creator, &tx);
        let created = state
            .get_user(&public_key_to_address(&new_keypair.public))
            .unwrap()
            .unwrap();
        // Restricted inheritance drops exactly the two create bits
        assert!(created.permissions.has(Perm::TRANSFER));
        assert!(created.permissions.has(Perm::CREATE_ACCOUNT));
        assert!(!created.permissions.has(Perm::CREATE_USER));
        assert!(!created.permissions.has(Perm::CREATE_LEGAL_ENTITY));
        assert_eq!(created.entity_id, creator.entity_id);

        let full_keypair = keypair_from_seed(&[22; 32]).unwrap();
        let tx = clear_types::CreateUserTx {
            address: creator.address(),
            pub_key: full_keypair.public,
            name: "full".into(),
            can_create: true,
            signature: None,
        };
        make_new_user(&mut state, &creator, &tx);
        let created = state
            .get_user(&public_key_to_address(&full_keypair.public))
            .unwrap()
            .unwrap();
        assert_eq!(created.permissions, creator_perms);
    }

    #[test]
    fn test_index_divergence_is_reported() {
        let mut state = new_state();
        let account = Account::new(Uuid::new_v4().to_string(), "e-1".into());

        // Seed the index without the account record
        let mut index = AccountIndex::new();
        index.add(account.id.clone());
        state.set_account_index(&index);

        let res = set_account_in_index(&mut state, &account).unwrap();
        assert_eq!(res.code, Code::InvalidInput);

        // The index was not silently repaired
        assert_eq!(state.get_account_index().unwrap().unwrap().ids.len(), 1);
    }
}
