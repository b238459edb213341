//! Query dispatcher for read-only transactions
//!
//! Queries are signed to authenticate the caller but never mutate state, so
//! there is no dry-run/commit distinction on this path.

use clear_store::{StateReader, StoreResult};
use clear_types::{
    AccountIndexQueryTx, AccountQueryTx, AccountsReturned, Code, LegalEntitiesReturned,
    LegalEntityIndexQueryTx, LegalEntityQueryTx, Response, Tx, User,
};
use serde::Serialize;

/// Execute a query transaction against the state
pub fn exec_query<S: StateReader>(state: &S, tx: &Tx) -> Response {
    let result = match tx {
        Tx::AccountQuery(tx) => account_query(state, tx),
        Tx::AccountIndexQuery(tx) => account_index_query(state, tx),
        Tx::LegalEntityQuery(tx) => legal_entity_query(state, tx),
        Tx::LegalEntityIndexQuery(tx) => legal_entity_index_query(state, tx),
        _ => Ok(Response::err(
            Code::EncodingError,
            format!("tx type {:#04x} is not a query", tx.tx_type()),
        )),
    };
    match result {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(error = %err, tx_type = tx.tx_type(), "store failure during query");
            Response::err(Code::InternalError, err.to_string())
        }
    }
}

fn resolve_issuer<S: StateReader>(
    state: &S,
    address: &clear_primitives::Address,
) -> StoreResult<Result<User, Response>> {
    match state.get_user(address)? {
        Some(user) => Ok(Ok(user)),
        None => Ok(Err(Response::err(
            Code::UnknownAddress,
            format!("address is unknown: {address}"),
        ))),
    }
}

fn authenticate(
    user: &User,
    sign_bytes: &[u8],
    signature: Option<&clear_crypto::Signature>,
) -> Response {
    match signature {
        Some(sig) if user.verify_signature(sign_bytes, sig) => Response::ok(),
        _ => Response::err(Code::Unauthorized, "signature doesn't match"),
    }
}

fn marshal<T: Serialize>(payload: &T) -> Response {
    match serde_json::to_vec(payload) {
        Ok(data) => Response::ok_with_data(data),
        Err(err) => Response::err(
            Code::InternalError,
            format!("couldn't encode the response: {err}"),
        ),
    }
}

fn account_query<S: StateReader>(state: &S, tx: &AccountQueryTx) -> StoreResult<Response> {
    let res = tx.validate_basic();
    if res.is_err() {
        return Ok(res.prepend_log("in validate_basic"));
    }

    let user = match resolve_issuer(state, &tx.address)? {
        Ok(user) => user,
        Err(res) => return Ok(res),
    };
    let res = authenticate(&user, &tx.sign_bytes(&state.chain_id()), tx.signature.as_ref());
    if res.is_err() {
        return Ok(res);
    }

    // No partial results: any unknown id fails the whole query
    let mut accounts = Vec::with_capacity(tx.account_ids.len());
    for id in &tx.account_ids {
        let Some(account) = state.get_account(id)? else {
            return Ok(Response::err(
                Code::InvalidInput,
                format!("invalid account id: {id:?}"),
            ));
        };
        accounts.push(account);
    }

    Ok(marshal(&AccountsReturned { accounts }))
}

fn account_index_query<S: StateReader>(
    state: &S,
    tx: &AccountIndexQueryTx,
) -> StoreResult<Response> {
    let res = tx.validate_basic();
    if res.is_err() {
        return Ok(res.prepend_log("in validate_basic"));
    }

    let user = match resolve_issuer(state, &tx.address)? {
        Ok(user) => user,
        Err(res) => return Ok(res),
    };
    let res = authenticate(&user, &tx.sign_bytes(&state.chain_id()), tx.signature.as_ref());
    if res.is_err() {
        return Ok(res);
    }

    let Some(index) = state.get_account_index()? else {
        return Ok(Response::err(
            Code::InternalError,
            "account index has not yet been initialized",
        ));
    };

    Ok(marshal(&index))
}

fn legal_entity_query<S: StateReader>(state: &S, tx: &LegalEntityQueryTx) -> StoreResult<Response> {
    let res = tx.validate_basic();
    if res.is_err() {
        return Ok(res.prepend_log("in validate_basic"));
    }

    let user = match resolve_issuer(state, &tx.address)? {
        Ok(user) => user,
        Err(res) => return Ok(res),
    };
    let res = authenticate(&user, &tx.sign_bytes(&state.chain_id()), tx.signature.as_ref());
    if res.is_err() {
        return Ok(res);
    }

    let mut legal_entities = Vec::with_capacity(tx.entity_ids.len());
    for id in &tx.entity_ids {
        let Some(entity) = state.get_legal_entity(id)? else {
            return Ok(Response::err(
                Code::InvalidInput,
                format!("invalid legal entity id: {id:?}"),
            ));
        };
        legal_entities.push(entity);
    }

    Ok(marshal(&LegalEntitiesReturned { legal_entities }))
}

fn legal_entity_index_query<S: StateReader>(
    state: &S,
    tx: &LegalEntityIndexQueryTx,
) -> StoreResult<Response> {
    let res = tx.validate_basic();
    if res.is_err() {
        return Ok(res.prepend_log("in validate_basic"));
    }

    let user = match resolve_issuer(state, &tx.address)? {
        Ok(user) => user,
        Err(res) => return Ok(res),
    };
    let res = authenticate(&user, &tx.sign_bytes(&state.chain_id()), tx.signature.as_ref());
    if res.is_err() {
        return Ok(res);
    }

    let Some(index) = state.get_legal_entity_index()? else {
        return Ok(Response::err(
            Code::InternalError,
            "legal entity index has not yet been initialized",
        ));
    };

    Ok(marshal(&index))
}
