//! Error types for rpcline
//!
//! Two error types live here:
//!
//! - **Error**: everything the engine can report to application code (uses thiserror)
//! - **JsonRpcErrorData**: the `error` object of a JSON-RPC 2.0 reply, as it
//!   appears on the wire
//!
//! # Where errors surface
//!
//! Misuse of the client (`on` with an unknown event name, `call` before
//! `connect`) fails synchronously at the call site. Failures of an outbound
//! call reach that call's error handler. Malformed inbound traffic never
//! reaches application code; it is dropped and logged.
//!
//! # Examples
//!
//! ```rust
//! use rpcline_core::{Error, JsonRpcErrorData};
//! use serde_json::json;
//!
//! // A server-side failure is carried verbatim
//! let error = Error::Remote(json!({"code": -32601, "message": "Method not found"}));
//!
//! // and can be read back as a structured error object
//! let data = error.as_rpc_error().unwrap();
//! assert_eq!(data.code, JsonRpcErrorData::method_not_found("x").code);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for rpcline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Application-level error type for rpcline
///
/// # Error Categories
///
/// - **Protocol errors**: ProtocolViolation, UnknownMethod, UnknownTopic
/// - **Misuse**: UnknownEvent, NotConnected, AlreadyConnected
/// - **Call outcomes**: Remote, Timeout, ConnectionClosed
/// - **Plumbing**: Serialization, WebSocket, Internal
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// An inbound frame or reply does not follow the protocol
    ///
    /// Covers frames that are not JSON objects, a non-string `method`, and
    /// replies carrying neither `result` nor `error`.
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// Inbound request for a method that is not registered locally
    #[error("Method not found: {0}")]
    UnknownMethod(String),

    /// The server's subscription acknowledgement does not list the topic
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),

    /// Lifecycle event name other than `open` or `close`
    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    /// Error payload reported by the server, untouched
    #[error("Remote error: {0}")]
    Remote(serde_json::Value),

    /// The call's deadline elapsed before a reply arrived
    #[error("Request timeout")]
    Timeout,

    /// The connection closed while the operation was outstanding
    #[error("Connection closed")]
    ConnectionClosed,

    /// The client has no live connection
    #[error("Not connected")]
    NotConnected,

    /// `connect` was called on a client that already holds a live connection
    #[error("Already connected")]
    AlreadyConnected,

    /// Converting between Rust values and JSON failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// WebSocket transport layer error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Unexpected internal condition
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Interpret a `Remote` payload as a JSON-RPC error object
    ///
    /// Returns `None` for every other variant and for remote payloads that
    /// lack `code` or `message`.
    pub fn as_rpc_error(&self) -> Option<JsonRpcErrorData> {
        match self {
            Error::Remote(payload) => serde_json::from_value(payload.clone()).ok(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

/// JSON-RPC 2.0 error object
///
/// Used for the error replies the client sends back when a local method
/// fails, or when an unknown method is answered under
/// `UnknownMethodPolicy::ReplyMethodNotFound`.
///
/// # Standard Error Codes
///
/// - `-32700`: Parse error
/// - `-32600`: Invalid Request
/// - `-32601`: Method not found
/// - `-32602`: Invalid params
/// - `-32603`: Internal error
/// - `-32000 to -32099`: Server error (implementation-defined)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcErrorData {
    /// Numeric error code
    pub code: i32,

    /// Short description of the error
    pub message: String,

    /// Optional structured details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcErrorData {
    /// Create an error object with code and message
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Create an error object carrying additional data
    ///
    /// ```rust
    /// use rpcline_core::JsonRpcErrorData;
    /// use serde_json::json;
    ///
    /// let error = JsonRpcErrorData::with_data(
    ///     1001,
    ///     "Insufficient funds",
    ///     json!({"balance": 50, "required": 100})
    /// );
    /// assert_eq!(error.data.unwrap()["required"], 100);
    /// ```
    pub fn with_data(code: i32, message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Parse error (-32700)
    pub fn parse_error() -> Self {
        Self::new(-32700, "Parse error")
    }

    /// Invalid request (-32600)
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::new(-32600, msg)
    }

    /// Method not found (-32601)
    ///
    /// ```rust
    /// use rpcline_core::JsonRpcErrorData;
    ///
    /// let error = JsonRpcErrorData::method_not_found("calculateFoo");
    /// assert_eq!(error.message, "Method not found: calculateFoo");
    /// ```
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::new(-32601, format!("Method not found: {}", method.into()))
    }

    /// Invalid params (-32602)
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::new(-32602, msg)
    }

    /// Internal error (-32603)
    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::new(-32603, msg)
    }
}

impl std::fmt::Display for JsonRpcErrorData {
    /// Formats as "[code] message", e.g. "[-32601] Method not found: foo"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for JsonRpcErrorData {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_from_serde() {
        let serde_error = serde_json::from_str::<serde_json::Value>(r#"{"invalid": json"#).unwrap_err();
        let error: Error = serde_error.into();

        match error {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_remote_error_as_rpc_error() {
        let error = Error::Remote(json!({
            "code": -32602,
            "message": "Invalid params",
            "data": {"missing": ["username"]}
        }));

        let data = error.as_rpc_error().unwrap();
        assert_eq!(data.code, -32602);
        assert_eq!(data.message, "Invalid params");
        assert_eq!(data.data.unwrap()["missing"][0], "username");
    }

    #[test]
    fn test_remote_error_with_arbitrary_payload() {
        // servers are free to send anything in `error`
        let error = Error::Remote(json!("boom"));
        assert!(error.as_rpc_error().is_none());
        assert!(error.to_string().contains("boom"));
    }

    #[test]
    fn test_non_remote_has_no_rpc_error() {
        assert!(Error::Timeout.as_rpc_error().is_none());
        assert!(Error::UnknownTopic("news".into()).as_rpc_error().is_none());
    }

    #[test]
    fn test_error_display_formatting() {
        assert_eq!(Error::UnknownEvent("bogus".into()).to_string(), "Unknown event: bogus");
        assert_eq!(Error::UnknownTopic("news".into()).to_string(), "Unknown topic: news");
        assert_eq!(Error::NotConnected.to_string(), "Not connected");
    }

    #[test]
    fn test_jsonrpc_error_display() {
        let error = JsonRpcErrorData::method_not_found("unknownMethod");
        assert_eq!(error.to_string(), "[-32601] Method not found: unknownMethod");
    }

    #[test]
    fn test_all_jsonrpc_error_codes() {
        let errors = vec![
            (JsonRpcErrorData::parse_error(), -32700),
            (JsonRpcErrorData::invalid_request("test"), -32600),
            (JsonRpcErrorData::method_not_found("test"), -32601),
            (JsonRpcErrorData::invalid_params("test"), -32602),
            (JsonRpcErrorData::internal_error("test"), -32603),
        ];

        for (error, expected_code) in errors {
            assert_eq!(error.code, expected_code);
            assert!(!error.message.is_empty());
        }
    }

    #[test]
    fn test_error_data_skips_missing_data() {
        let serialized = serde_json::to_string(&JsonRpcErrorData::new(-32000, "Custom error")).unwrap();
        assert_eq!(serialized, r#"{"code":-32000,"message":"Custom error"}"#);
    }

    #[test]
    fn test_error_data_deserialization() {
        let error: JsonRpcErrorData =
            serde_json::from_str(r#"{"code":-32601,"message":"Method not found"}"#).unwrap();

        assert_eq!(error.code, -32601);
        assert_eq!(error.message, "Method not found");
        assert!(error.data.is_none());
    }
}
