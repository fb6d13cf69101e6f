//! Connection state management
//!
//! Tracks the lifecycle of the TCP transport's connection. HTTP is
//! connectionless from the client's point of view and has no state here.
//!
//! # State Transitions
//!
//! ```text
//! Disconnected --connect()--> Connecting --ok--> Connected
//!       ^                          |                 |
//!       +--------- error ----------+                 |
//!       +---------------- close() / EOF -------------+
//! ```
//!
//! # Generations
//!
//! Each successful connect bumps a generation counter. A reader task that
//! notices its connection died reports the loss with the generation it was
//! started under, so a stale report cannot knock a newer connection back to
//! `Disconnected`.

use crate::metrics::ClientMetrics;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected
    Disconnected,
    /// Attempting to connect
    Connecting,
    /// Successfully connected
    Connected,
}

impl ConnectionState {
    /// Numeric value used by the connection state gauge
    pub fn as_gauge(self) -> i64 {
        match self {
            ConnectionState::Disconnected => 0,
            ConnectionState::Connecting => 1,
            ConnectionState::Connected => 2,
        }
    }
}

#[derive(Debug)]
struct Tracked {
    state: ConnectionState,
    generation: u64,
}

/// Manages connection state for one transport
#[derive(Clone)]
pub struct ConnectionManager {
    tracked: Arc<RwLock<Tracked>>,
    address: String,
    metrics: Option<Arc<ClientMetrics>>,
}

impl ConnectionManager {
    /// Create a new connection manager in the `Disconnected` state
    pub fn new(address: impl Into<String>, metrics: Option<Arc<ClientMetrics>>) -> Self {
        Self {
            tracked: Arc::new(RwLock::new(Tracked {
                state: ConnectionState::Disconnected,
                generation: 0,
            })),
            address: address.into(),
            metrics,
        }
    }

    /// Get the current connection state
    pub async fn state(&self) -> ConnectionState {
        self.tracked.read().await.state
    }

    /// Get the address this connection targets
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Transition to connecting state
    pub async fn connecting(&self) {
        self.set_state(ConnectionState::Connecting).await;
    }

    /// Transition to connected state, returning the new generation
    pub async fn connected(&self) -> u64 {
        let generation = {
            let mut tracked = self.tracked.write().await;
            tracked.generation += 1;
            tracked.state = ConnectionState::Connected;
            tracked.generation
        };
        self.report(ConnectionState::Connected);
        generation
    }

    /// Transition to disconnected state
    pub async fn disconnected(&self) {
        self.set_state(ConnectionState::Disconnected).await;
    }

    /// Report that the connection of `generation` was lost
    ///
    /// Returns `false` and changes nothing if a newer connection exists.
    pub async fn lost(&self, generation: u64) -> bool {
        {
            let mut tracked = self.tracked.write().await;
            if tracked.generation != generation {
                return false;
            }
            tracked.state = ConnectionState::Disconnected;
        }
        self.report(ConnectionState::Disconnected);
        true
    }

    async fn set_state(&self, new_state: ConnectionState) {
        self.tracked.write().await.state = new_state;
        self.report(new_state);
    }

    fn report(&self, state: ConnectionState) {
        tracing::debug!(address = %self.address, state = ?state, "Connection state changed");
        if let Some(ref m) = self.metrics {
            m.update_connection_state(state);
        }
    }
}
