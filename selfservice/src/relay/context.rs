//! Context bootstrap calls
//!
//! The browser code needs a description of what the current user may do
//! (`context`) or, before login, what the login page should offer
//! (`pre_context`). Both are fetched from the remote service as JSON.

use serde_json::Value;

use crate::identity::CompositeId;
use crate::transport::{Connection, Params};

use super::errors::RelayError;
use super::proxy::{RelayReply, call_remote};

/// Status code of the login page reply understood by the browser code
pub const LOGIN_REQUIRED_STATUS: u16 = 576;

const PRE_CONTEXT_PATH: &str = "/userservice/pre_context";
const CONTEXT_PATH: &str = "/userservice/context";

/// Context available before authentication
pub async fn pre_context(
    conn: &mut Connection,
    accept_language: Option<&str>,
) -> Result<Value, RelayError> {
    let reply = call_remote(
        conn,
        PRE_CONTEXT_PATH,
        Params::new(),
        None,
        accept_language,
        false,
    )
    .await?;
    into_json(reply)
}

/// Context of an authenticated user, with `user` split into user and realm
pub async fn context(
    conn: &mut Connection,
    identity: &CompositeId,
    accept_language: Option<&str>,
) -> Result<Value, RelayError> {
    let reply = call_remote(
        conn,
        CONTEXT_PATH,
        Params::new(),
        Some(identity),
        accept_language,
        false,
    )
    .await?;
    into_json(reply).map(split_user_realm)
}

/// Replace a qualified `user` entry by separate `user` and `realm` entries
pub fn split_user_realm(mut context: Value) -> Value {
    let Some(map) = context.as_object_mut() else {
        return context;
    };
    let qualified = map
        .get("user")
        .and_then(Value::as_str)
        .and_then(|user| user.split_once('@'))
        .map(|(user, realm)| (user.to_string(), realm.to_string()));

    if let Some((user, realm)) = qualified {
        map.insert("user".to_string(), Value::String(user));
        map.insert("realm".to_string(), Value::String(realm));
    }
    context
}

fn into_json(reply: RelayReply) -> Result<Value, RelayError> {
    match reply {
        RelayReply::Json(value) => Ok(value),
        RelayReply::Text(_) => Err(RelayError::InvalidResponse(
            "expected a JSON context".to_string(),
        )),
    }
}
