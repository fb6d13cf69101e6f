//! Request tracking for the TCP transport
//!
//! A TCP connection can carry several calls at once, and the server may
//! answer them in any order. Each call registers a oneshot slot under its id
//! before the request is written; the connection's reader task resolves the
//! slot when the response with that id arrives.
//!
//! # Request Lifecycle
//!
//! 1. **Generate ID**: Take the next value from the client's `IdGenerator`
//! 2. **Register**: Create a oneshot slot for the response
//! 3. **Send**: Write the framed request
//! 4. **Wait**: Caller awaits the oneshot receiver
//! 5. **Complete**: Reader task matches the response id and resolves the slot
//!
//! A slot that is never answered is removed with `forget` (timeout, failed
//! write, caller gave up) or resolved with an error by `fail_all`/`close_all`.
//!
//! The slot map sits behind a synchronous lock that is never held across an
//! await, so a slot can also be released from `Drop`.

use jline_core::{Error, RequestId, Result, RpcResponse};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

/// Receiving half of a pending slot
pub type PendingResponse = oneshot::Receiver<Result<RpcResponse>>;

/// Monotonic request id source, shared by clones of a client
///
/// The first id handed out is 0.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    next: Arc<AtomicU64>,
}

impl IdGenerator {
    /// Create a generator starting at 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the next id
    pub fn next_id(&self) -> RequestId {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

#[derive(Default)]
struct Slots {
    pending: HashMap<RequestId, oneshot::Sender<Result<RpcResponse>>>,
    closed: bool,
}

/// In-flight calls of one connection
#[derive(Clone, Default)]
pub struct RequestManager {
    slots: Arc<Mutex<Slots>>,
}

impl RequestManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        // the map stays consistent even if a holder panicked
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a pending request
    ///
    /// # Errors
    ///
    /// - `Error::Protocol` if `id` is already in flight
    /// - `Error::ConnectionClosed` once the manager has been closed
    pub fn register(&self, id: RequestId) -> Result<PendingResponse> {
        let mut slots = self.lock();
        if slots.closed {
            return Err(Error::ConnectionClosed);
        }
        if slots.pending.contains_key(&id) {
            return Err(Error::Protocol(format!("request id {} is already in flight", id)));
        }

        let (tx, rx) = oneshot::channel();
        slots.pending.insert(id, tx);
        Ok(rx)
    }

    /// Resolve the slot for `id` with a response
    ///
    /// Returns `false` when nothing waits for `id`, e.g. after a timeout.
    pub fn complete(&self, id: RequestId, response: RpcResponse) -> bool {
        let slot = self.lock().pending.remove(&id);
        match slot {
            Some(tx) => {
                let _ = tx.send(Ok(response));
                true
            }
            None => {
                tracing::debug!(id, "Dropping response for unknown request");
                false
            }
        }
    }

    /// Remove the slot for `id` without resolving it
    pub fn forget(&self, id: RequestId) {
        self.lock().pending.remove(&id);
    }

    /// Fail all pending requests
    pub fn fail_all(&self, error: Error) {
        let mut slots = self.lock();
        for (_, tx) in slots.pending.drain() {
            let _ = tx.send(Err(error.clone()));
        }
    }

    /// Fail all pending requests and refuse new ones
    pub fn close_all(&self, error: Error) {
        let mut slots = self.lock();
        slots.closed = true;
        for (_, tx) in slots.pending.drain() {
            let _ = tx.send(Err(error.clone()));
        }
    }

    /// Whether `close_all` has been called
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Get the number of pending requests
    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }
}
