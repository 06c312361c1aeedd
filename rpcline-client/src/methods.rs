//! Methods the client exposes to the server
//!
//! Handlers are synchronous: they run on the receive task while the inbound
//! request is dispatched, and their return value becomes the reply.
//!
//! # Examples
//!
//! ```rust
//! use rpcline_client::{MethodRegistry, MethodResult};
//! use rpcline_core::JsonRpcErrorData;
//! use serde::Deserialize;
//! use serde_json::json;
//!
//! let methods = MethodRegistry::new();
//!
//! // infallible
//! methods.register("ping", |_| json!("pong"));
//!
//! // fallible: the error goes back as the reply's `error`
//! methods.register_fallible("divide", |params| -> MethodResult {
//!     let a = params[0].as_f64().unwrap_or(0.0);
//!     let b = params[1].as_f64().unwrap_or(0.0);
//!     if b == 0.0 {
//!         return Err(JsonRpcErrorData::invalid_params("division by zero"));
//!     }
//!     Ok(json!(a / b))
//! });
//!
//! // typed: params that do not deserialize are answered with -32602
//! #[derive(Deserialize)]
//! struct Greet { name: String }
//! methods.register_typed("greet", |p: Greet| Ok(format!("hello {}", p.name)));
//!
//! assert_eq!(methods.names(), vec!["divide", "greet", "ping"]);
//! ```

use crate::lock;
use rpcline_core::JsonRpcErrorData;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// What a local method returns: the reply's `result` or its `error`
pub type MethodResult = std::result::Result<Value, JsonRpcErrorData>;

/// A registered local method
pub type MethodHandler = Arc<dyn Fn(Value) -> MethodResult + Send + Sync>;

/// Registry of locally exposed methods
///
/// Cheap to clone; clones share the same table. Registration may happen
/// before or after connecting and takes effect for the next inbound request.
#[derive(Clone, Default)]
pub struct MethodRegistry {
    handlers: Arc<Mutex<HashMap<String, MethodHandler>>>,
}

impl MethodRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a method that always succeeds
    ///
    /// Replaces any handler already registered under `name`.
    pub fn register<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.register_fallible(name, move |params| Ok(handler(params)));
    }

    /// Register a method that may answer with a JSON-RPC error
    pub fn register_fallible<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(Value) -> MethodResult + Send + Sync + 'static,
    {
        let name = name.into();
        tracing::debug!(method = %name, "Registering method");
        lock(&self.handlers).insert(name, Arc::new(handler));
    }

    /// Register a method with typed params and result
    ///
    /// Params that fail to deserialize into `P` are answered with an
    /// invalid-params error; a result that fails to serialize with an
    /// internal error. Absent params deserialize from `null`.
    pub fn register_typed<P, R, F>(&self, name: impl Into<String>, handler: F)
    where
        P: DeserializeOwned + 'static,
        R: Serialize + 'static,
        F: Fn(P) -> std::result::Result<R, JsonRpcErrorData> + Send + Sync + 'static,
    {
        self.register_fallible(name, move |params| {
            let params: P = serde_json::from_value(params)
                .map_err(|e| JsonRpcErrorData::invalid_params(e.to_string()))?;
            let result = handler(params)?;
            serde_json::to_value(result).map_err(|e| JsonRpcErrorData::internal_error(e.to_string()))
        });
    }

    /// Remove a method; returns whether it was registered
    pub fn unregister(&self, name: &str) -> bool {
        lock(&self.handlers).remove(name).is_some()
    }

    /// Whether a method is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        lock(&self.handlers).contains_key(name)
    }

    /// Registered method names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = lock(&self.handlers).keys().cloned().collect();
        names.sort();
        names
    }

    pub(crate) fn get(&self, name: &str) -> Option<MethodHandler> {
        lock(&self.handlers).get(name).cloned()
    }
}
