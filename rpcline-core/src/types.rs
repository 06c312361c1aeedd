//! JSON-RPC 2.0 message types
//!
//! The wire format has no discriminator field: the kind of a message follows
//! from which members it carries. This module gives each kind its own Rust
//! type so the engine never has to inspect raw JSON after classification.
//!
//! # Message Kinds
//!
//! | Direction | Kind | Type |
//! |---|---|---|
//! | outbound | request | [`JsonRpcRequest`] |
//! | outbound | reply to an inbound request | [`JsonRpcResponse`] |
//! | outbound | notification | [`JsonRpcNotification`] |
//! | inbound | request / notification / reply | [`Inbound`] |
//!
//! Inbound messages are produced by [`crate::codec::classify`].

use crate::error::JsonRpcErrorData;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// JSON-RPC 2.0 request ID
///
/// The client allocates numeric ids for its own calls. Inbound requests may
/// use any of the three forms and the reply echoes the id back unchanged.
///
/// ```rust
/// use rpcline_core::Id;
///
/// let id1: Id = "req-123".into();
/// let id2: Id = 42i64.into();
///
/// assert_eq!(id1.to_string(), "\"req-123\"");
/// assert_eq!(id2.to_string(), "42");
/// assert_eq!(id2.as_number(), Some(42));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    /// String identifier
    String(String),
    /// Numeric identifier
    Number(i64),
    /// Null identifier
    Null,
}

impl Id {
    /// The numeric value, if this is a numeric id
    pub fn as_number(&self) -> Option<i64> {
        match self {
            Id::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::String(s) => write!(f, "\"{}\"", s),
            Id::Number(n) => write!(f, "{}", n),
            Id::Null => write!(f, "null"),
        }
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::String(s)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::String(s.to_string())
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id::Number(n)
    }
}

/// JSON-RPC 2.0 request
///
/// Sent by the client for every `call`, and produced by the classifier for
/// requests the server makes to the client.
///
/// ```rust
/// use rpcline_core::{JsonRpcRequest, Id};
/// use serde_json::json;
///
/// let req = JsonRpcRequest::new("subtract", Some(json!([42, 23])), Id::Number(1));
/// assert_eq!(req.jsonrpc, "2.0");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Always "2.0"
    pub jsonrpc: String,
    /// Name of the method to invoke
    pub method: String,
    /// Parameters; omitted from the JSON when None
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Correlation id
    pub id: Id,
}

impl JsonRpcRequest {
    /// Create a new JSON-RPC 2.0 request
    pub fn new(method: impl Into<String>, params: Option<Value>, id: Id) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params,
            id,
        }
    }
}

/// JSON-RPC 2.0 notification
///
/// A method call without an id. The server uses notifications to deliver
/// published messages; the method name is the topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    /// Always "2.0"
    pub jsonrpc: String,
    /// Method or topic name
    pub method: String,
    /// Optional payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    /// Create a new JSON-RPC 2.0 notification
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC 2.0 response
///
/// The client sends one of these back for every inbound request that a local
/// method handled. Exactly one of `result` and `error` is set by the
/// constructors.
///
/// ```rust
/// use rpcline_core::{JsonRpcResponse, JsonRpcErrorData, Id};
/// use serde_json::json;
///
/// let ok = JsonRpcResponse::success(json!({"value": 42}), Id::Number(1));
/// assert!(ok.is_success());
///
/// let err = JsonRpcResponse::error(JsonRpcErrorData::method_not_found("nope"), Id::Number(2));
/// assert!(err.is_error());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Always "2.0"
    pub jsonrpc: String,
    /// Result on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error object on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcErrorData>,
    /// Id of the request being answered
    pub id: Id,
}

impl JsonRpcResponse {
    /// Create a successful response
    ///
    /// A `null` result is still serialized as `"result":null`.
    pub fn success(result: Value, id: Id) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Create an error response
    pub fn error(error: JsonRpcErrorData, id: Id) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }

    /// True if `result` is present
    pub fn is_success(&self) -> bool {
        self.result.is_some()
    }

    /// True if `error` is present
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Outcome carried by an inbound reply
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyOutcome {
    /// `result` member, possibly `null`
    Success(Value),
    /// `error` member, passed on verbatim
    Failure(Value),
    /// Neither `result` nor `error`
    Malformed,
}

/// Inbound reply to a call the client issued
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// Correlation id; `None` when missing or not a valid id
    pub id: Option<Id>,
    /// What the reply reports
    pub outcome: ReplyOutcome,
}

/// A classified inbound message
///
/// ```rust
/// use rpcline_core::{codec, Inbound, ReplyOutcome};
/// use serde_json::json;
///
/// let message = codec::classify(json!({"id": 3, "result": [1, 2]})).unwrap();
/// match message {
///     Inbound::Reply(reply) => assert_eq!(reply.outcome, ReplyOutcome::Success(json!([1, 2]))),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone)]
pub enum Inbound {
    /// The server calls a method on the client and expects a reply
    Request(JsonRpcRequest),
    /// A message for a topic (or any other id-less method call)
    Notification(JsonRpcNotification),
    /// The answer to one of the client's calls
    Reply(Reply),
}

impl Inbound {
    /// Short label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Inbound::Request(_) => "request",
            Inbound::Notification(_) => "notification",
            Inbound::Reply(_) => "reply",
        }
    }
}
