//! Client configuration and per-call options

use crate::pending::Completion;
use rpcline_core::Error;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Success handler of an outbound call
pub type SuccessHandler = Box<dyn FnOnce(Value) + Send>;

/// Error handler of an outbound call
pub type ErrorHandler = Box<dyn FnOnce(Error) + Send>;

/// What runs when a call is made without its own handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefaultHandlers {
    /// Do nothing with the outcome
    #[default]
    Silent,
    /// Log the outcome: results at info level, errors at warn level
    Log,
}

impl DefaultHandlers {
    pub(crate) fn success(self, id: i64, method: &str) -> SuccessHandler {
        match self {
            DefaultHandlers::Silent => Box::new(|_| {}),
            DefaultHandlers::Log => {
                let method = method.to_string();
                Box::new(move |result| {
                    tracing::info!(id, method = %method, result = %result, "Call returned");
                })
            }
        }
    }

    pub(crate) fn error(self, id: i64, method: &str) -> ErrorHandler {
        match self {
            DefaultHandlers::Silent => Box::new(|_| {}),
            DefaultHandlers::Log => {
                let method = method.to_string();
                Box::new(move |error| {
                    tracing::warn!(id, method = %method, error = %error, "Call failed");
                })
            }
        }
    }
}

/// How to treat an inbound request for a method that is not registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownMethodPolicy {
    /// Drop the request without replying
    #[default]
    Ignore,
    /// Reply with a `-32601` "Method not found" error
    ReplyMethodNotFound,
}

/// Resolved client options
///
/// Built by [`crate::ClientBuilder`]; `Default` gives the quiet configuration
/// (no frame logging, silent default handlers, no deadlines).
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Log every frame sent and received on the `rpcline::frames` target
    pub debug_frames: bool,
    /// Handlers substituted for omitted ones
    pub default_handlers: DefaultHandlers,
    /// Treatment of requests for unregistered methods
    pub unknown_method: UnknownMethodPolicy,
    /// Deadline applied to calls that do not set their own
    pub call_timeout: Option<Duration>,
    /// Fail every pending call with `ConnectionClosed` when the connection closes
    pub fail_pending_on_close: bool,
}

/// Options for a single outbound call
///
/// ```rust
/// use rpcline_client::CallOptions;
/// use std::time::Duration;
///
/// let options = CallOptions::new()
///     .on_success(|value| println!("got {}", value))
///     .timeout(Duration::from_secs(5));
/// ```
#[derive(Default)]
pub struct CallOptions {
    pub(crate) on_success: Option<SuccessHandler>,
    pub(crate) on_error: Option<ErrorHandler>,
    pub(crate) timeout: Option<Duration>,
}

impl CallOptions {
    /// Options with no handlers and no deadline
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `handler` with the reply's `result`
    pub fn on_success<F>(mut self, handler: F) -> Self
    where
        F: FnOnce(Value) + Send + 'static,
    {
        self.on_success = Some(Box::new(handler));
        self
    }

    /// Run `handler` with the reply's `error`, a timeout, or a closed connection
    pub fn on_error<F>(mut self, handler: F) -> Self
    where
        F: FnOnce(Error) + Send + 'static,
    {
        self.on_error = Some(Box::new(handler));
        self
    }

    /// Give up on the call after `timeout`
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub(crate) fn into_completion(
        self,
        id: i64,
        method: &str,
        defaults: DefaultHandlers,
    ) -> (Completion, Option<Duration>) {
        let on_success = self.on_success.unwrap_or_else(|| defaults.success(id, method));
        let on_error = self.on_error.unwrap_or_else(|| defaults.error(id, method));

        let complete: Completion = Box::new(move |outcome| match outcome {
            Ok(value) => on_success(value),
            Err(error) => on_error(error),
        });

        (complete, self.timeout)
    }
}

impl fmt::Debug for CallOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallOptions")
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}
