//! Encoding of outbound messages and classification of inbound frames
//!
//! # Classification
//!
//! [`classify`] implements the precedence rules for telling the three inbound
//! kinds apart:
//!
//! 1. A `method` member makes the message a call:
//!    - with an `id` that is present and not `null` it is a **request**,
//!    - otherwise it is a **notification**.
//! 2. Without `method` it is a **reply**:
//!    - `error` wins over `result` when both are present,
//!    - a reply with neither is [`ReplyOutcome::Malformed`].
//!
//! The `jsonrpc` member is not checked; servers in the wild omit it on
//! notifications and replies.
//!
//! # Batches
//!
//! A frame holding a JSON array is a batch. [`decode`] classifies every
//! element separately so one bad element does not hide the others.
//!
//! # Examples
//!
//! ```rust
//! use rpcline_core::{codec, Inbound};
//!
//! let messages = codec::decode(r#"{"method":"news","params":{"headline":"hi"}}"#).unwrap();
//! assert!(matches!(messages[0], Ok(Inbound::Notification(_))));
//! ```

use crate::error::{Error, Result};
use crate::types::{
    Id, Inbound, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, Reply, ReplyOutcome,
};
use serde::Serialize;
use serde_json::Value;

/// Encode any serializable message to a JSON string
pub fn encode<T: Serialize>(msg: &T) -> Result<String> {
    serde_json::to_string(msg).map_err(|e| Error::Serialization(e.to_string()))
}

/// Encode a JSON-RPC request
///
/// ```rust
/// use rpcline_core::{codec, JsonRpcRequest, Id};
///
/// let request = JsonRpcRequest::new("add", None, Id::Number(1));
/// let json = codec::encode_request(&request).unwrap();
/// assert!(json.contains("\"method\":\"add\""));
/// ```
pub fn encode_request(req: &JsonRpcRequest) -> Result<String> {
    encode(req)
}

/// Encode a JSON-RPC notification
pub fn encode_notification(notif: &JsonRpcNotification) -> Result<String> {
    encode(notif)
}

/// Encode a JSON-RPC response
pub fn encode_response(resp: &JsonRpcResponse) -> Result<String> {
    encode(resp)
}

/// Decode one inbound text frame
///
/// The outer `Result` fails only when the frame is not JSON at all or is an
/// empty batch. Each element of the returned vector is the classification of
/// one message; a single-object frame yields a vector of length one.
pub fn decode(data: &str) -> Result<Vec<Result<Inbound>>> {
    let value: Value = serde_json::from_str(data)
        .map_err(|e| Error::ProtocolViolation(format!("frame is not valid JSON: {}", e)))?;

    match value {
        Value::Array(items) => {
            if items.is_empty() {
                return Err(Error::ProtocolViolation("empty batch".to_string()));
            }
            Ok(items.into_iter().map(classify).collect())
        }
        single => Ok(vec![classify(single)]),
    }
}

/// Classify a decoded JSON value as request, notification or reply
///
/// # Errors
///
/// `Error::ProtocolViolation` when the value is not an object, when `method`
/// is not a string, or when a request's `id` is neither string nor integer.
pub fn classify(value: Value) -> Result<Inbound> {
    let Value::Object(mut fields) = value else {
        return Err(Error::ProtocolViolation(
            "message is not a JSON object".to_string(),
        ));
    };

    if let Some(method) = fields.remove("method") {
        let Value::String(method) = method else {
            return Err(Error::ProtocolViolation(format!(
                "method must be a string, got {}",
                method
            )));
        };
        let params = fields.remove("params");

        return match fields.remove("id") {
            Some(id) if !id.is_null() => {
                let id: Id = serde_json::from_value(id.clone()).map_err(|_| {
                    Error::ProtocolViolation(format!("invalid request id {}", id))
                })?;
                Ok(Inbound::Request(JsonRpcRequest::new(method, params, id)))
            }
            _ => Ok(Inbound::Notification(JsonRpcNotification::new(method, params))),
        };
    }

    let id = fields
        .remove("id")
        .and_then(|id| serde_json::from_value::<Id>(id).ok());

    let outcome = if let Some(error) = fields.remove("error") {
        ReplyOutcome::Failure(error)
    } else if let Some(result) = fields.remove("result") {
        ReplyOutcome::Success(result)
    } else {
        ReplyOutcome::Malformed
    };

    Ok(Inbound::Reply(Reply { id, outcome }))
}
