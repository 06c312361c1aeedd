//! Pending-call table
//!
//! Every outbound call is recorded here under a fresh numeric id before its
//! frame is sent. The entry leaves the table exactly once:
//!
//! 1. a reply with a `result` or `error` for its id arrives,
//! 2. its deadline elapses, or
//! 3. the connection closes and the client fails pending calls on close.
//!
//! Whoever removes the entry runs its completion, and always after the table
//! lock is released, so completions are free to issue new calls.

use crate::lock;
use rpcline_core::{Id, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::task::JoinHandle;

/// Runs once with the outcome of a call
pub(crate) type Completion = Box<dyn FnOnce(Result<Value>) + Send>;

/// An outbound call waiting for its reply
pub(crate) struct PendingCall {
    pub(crate) method: String,
    pub(crate) started: Instant,
    complete: Completion,
    deadline: Option<JoinHandle<()>>,
}

impl PendingCall {
    pub(crate) fn new(method: impl Into<String>, complete: Completion) -> Self {
        Self {
            method: method.into(),
            started: Instant::now(),
            complete,
            deadline: None,
        }
    }

    /// Run the completion, cancelling the deadline timer if one is armed
    pub(crate) fn settle(mut self, outcome: Result<Value>) {
        if let Some(deadline) = self.deadline.take() {
            deadline.abort();
        }
        (self.complete)(outcome);
    }
}

/// Table of outstanding calls keyed by id
#[derive(Clone)]
pub(crate) struct PendingCalls {
    next: Arc<AtomicI64>,
    calls: Arc<Mutex<HashMap<i64, PendingCall>>>,
}

impl PendingCalls {
    pub(crate) fn new() -> Self {
        Self {
            next: Arc::new(AtomicI64::new(1)),
            calls: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Allocate the next id; starts at 1 and never repeats
    pub(crate) fn next_id(&self) -> i64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    pub(crate) fn insert(&self, id: i64, call: PendingCall) {
        lock(&self.calls).insert(id, call);
    }

    /// Remove the entry a reply refers to
    ///
    /// Only numeric ids can match, since the client only allocates numeric ids.
    pub(crate) fn take(&self, id: &Id) -> Option<PendingCall> {
        let id = id.as_number()?;
        lock(&self.calls).remove(&id)
    }

    /// Remove an entry whose deadline fired
    ///
    /// The timer handle is dropped rather than aborted since the caller is
    /// the timer task itself.
    pub(crate) fn expire(&self, id: i64) -> Option<PendingCall> {
        let mut call = lock(&self.calls).remove(&id)?;
        call.deadline = None;
        Some(call)
    }

    /// Attach a deadline timer to an entry
    ///
    /// If the entry is already gone the timer is cancelled.
    pub(crate) fn attach_deadline(&self, id: i64, deadline: JoinHandle<()>) {
        match lock(&self.calls).get_mut(&id) {
            Some(call) => call.deadline = Some(deadline),
            None => deadline.abort(),
        }
    }

    /// Remove every entry, oldest id first
    pub(crate) fn drain(&self) -> Vec<PendingCall> {
        let mut drained: Vec<(i64, PendingCall)> = lock(&self.calls).drain().collect();
        drained.sort_by_key(|(id, _)| *id);
        drained.into_iter().map(|(_, call)| call).collect()
    }

    pub(crate) fn len(&self) -> usize {
        lock(&self.calls).len()
    }
}
