//! Topic-handler table
//!
//! Maps a topic name to the handler for notifications whose `method` is that
//! topic. Entries are only added once the server confirms a subscription;
//! notifications for other topics are dropped.

use crate::lock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Handler for messages published to a topic
pub type TopicHandler = Arc<dyn Fn(Value) + Send + Sync>;

#[derive(Clone, Default)]
pub(crate) struct TopicHandlers {
    handlers: Arc<Mutex<HashMap<String, TopicHandler>>>,
}

impl TopicHandlers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Install or replace the handler for `topic`
    pub(crate) fn install(&self, topic: impl Into<String>, handler: TopicHandler) {
        lock(&self.handlers).insert(topic.into(), handler);
    }

    pub(crate) fn remove(&self, topic: &str) -> bool {
        lock(&self.handlers).remove(topic).is_some()
    }

    pub(crate) fn contains(&self, topic: &str) -> bool {
        lock(&self.handlers).contains_key(topic)
    }

    /// Installed topics, sorted
    pub(crate) fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = lock(&self.handlers).keys().cloned().collect();
        topics.sort();
        topics
    }

    /// Deliver a notification; returns false when no handler is installed
    ///
    /// Absent params are delivered as `null`.
    pub(crate) fn handle(&self, topic: &str, params: Option<Value>) -> bool {
        let handler = match lock(&self.handlers).get(topic) {
            Some(handler) => Arc::clone(handler),
            None => return false,
        };

        handler(params.unwrap_or(Value::Null));
        true
    }
}
