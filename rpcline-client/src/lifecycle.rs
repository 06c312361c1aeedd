//! Connection lifecycle events and their handler lists

use crate::lock;
use crate::RpcClient;
use rpcline_core::Error;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

/// Handler invoked on a lifecycle event
pub type LifecycleHandler = Arc<dyn Fn(&RpcClient) + Send + Sync>;

/// The events a handler can be attached to
///
/// ```rust
/// use rpcline_client::LifecycleEvent;
///
/// assert_eq!("open".parse::<LifecycleEvent>().unwrap(), LifecycleEvent::Open);
/// assert!("message".parse::<LifecycleEvent>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// The transport finished opening
    Open,
    /// The transport closed, from either side
    Close,
}

impl LifecycleEvent {
    /// Wire-style name of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEvent::Open => "open",
            LifecycleEvent::Close => "close",
        }
    }
}

impl FromStr for LifecycleEvent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(LifecycleEvent::Open),
            "close" => Ok(LifecycleEvent::Close),
            other => Err(Error::UnknownEvent(other.to_string())),
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered handler lists for both events
#[derive(Clone, Default)]
pub(crate) struct LifecycleHooks {
    open: Arc<Mutex<Vec<LifecycleHandler>>>,
    close: Arc<Mutex<Vec<LifecycleHandler>>>,
}

impl LifecycleHooks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn list(&self, event: LifecycleEvent) -> &Mutex<Vec<LifecycleHandler>> {
        match event {
            LifecycleEvent::Open => &self.open,
            LifecycleEvent::Close => &self.close,
        }
    }

    pub(crate) fn push(&self, event: LifecycleEvent, handler: LifecycleHandler) {
        lock(self.list(event)).push(handler);
    }

    /// Copy of the handlers in registration order
    pub(crate) fn snapshot(&self, event: LifecycleEvent) -> Vec<LifecycleHandler> {
        lock(self.list(event)).clone()
    }

    pub(crate) fn count(&self, event: LifecycleEvent) -> usize {
        lock(self.list(event)).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_events() {
        assert_eq!("open".parse::<LifecycleEvent>().unwrap(), LifecycleEvent::Open);
        assert_eq!("close".parse::<LifecycleEvent>().unwrap(), LifecycleEvent::Close);

        match "bogus".parse::<LifecycleEvent>() {
            Err(Error::UnknownEvent(name)) => assert_eq!(name, "bogus"),
            other => panic!("Expected UnknownEvent, got {:?}", other),
        }
        // names are case-sensitive
        assert!("Open".parse::<LifecycleEvent>().is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for event in [LifecycleEvent::Open, LifecycleEvent::Close] {
            assert_eq!(event.to_string().parse::<LifecycleEvent>().unwrap(), event);
        }
    }

    #[test]
    fn test_hooks_keep_order_per_event() {
        let hooks = LifecycleHooks::new();
        hooks.push(LifecycleEvent::Open, Arc::new(|_| {}));
        hooks.push(LifecycleEvent::Open, Arc::new(|_| {}));
        hooks.push(LifecycleEvent::Close, Arc::new(|_| {}));

        assert_eq!(hooks.count(LifecycleEvent::Open), 2);
        assert_eq!(hooks.count(LifecycleEvent::Close), 1);
        assert_eq!(hooks.snapshot(LifecycleEvent::Open).len(), 2);
    }
}
