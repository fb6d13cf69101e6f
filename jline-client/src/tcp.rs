//! Newline-delimited TCP transport
//!
//! Requests are written as one JSON text per line; responses are read back
//! through [`LineCodec`], which reassembles frames split across packets.
//!
//! # Connection Lifecycle
//!
//! 1. **Lazy connect**: The first call (or an explicit `connect()`) opens the
//!    socket and spawns a reader task that owns the read half
//! 2. **Calls**: Each call registers a pending slot, writes its frame under
//!    the writer lock and waits for the reader task to route the response
//! 3. **Loss**: EOF, a read error or a failed write tears the connection
//!    down and fails every in-flight call; the next call reconnects
//! 4. **Close**: `close()` shuts the socket down; dropping the last clone of
//!    the transport does the same
//!
//! No call is ever retried.
//!
//! # Uncorrelated Frames
//!
//! A frame that is not valid JSON, or a response whose id is null, cannot be
//! matched to a caller. Every in-flight call of the connection fails with the
//! decoded error, but the connection stays up since framing is still intact.

use crate::config::ClientConfig;
use crate::connection_state::{ConnectionManager, ConnectionState};
use crate::metrics::ClientMetrics;
use crate::request::{PendingResponse, RequestManager};
use crate::transport::Transport;
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use jline_core::{codec, Error, LineCodec, RequestId, Result, RpcRequest, RpcResponse};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite};

type FrameReader = FramedRead<OwnedReadHalf, LineCodec>;
type FrameWriter = FramedWrite<OwnedWriteHalf, LineCodec>;

/// JSON-RPC over a newline-delimited TCP stream
///
/// Cheap to clone; clones share the connection.
#[derive(Clone)]
pub struct TcpTransport {
    inner: Arc<TcpInner>,
}

struct TcpInner {
    connect_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
    max_frame_length: usize,
    slot: Mutex<Option<Connection>>,
    state: ConnectionManager,
    metrics: Option<Arc<ClientMetrics>>,
}

/// One live socket
struct Connection {
    generation: u64,
    writer: Arc<Mutex<FrameWriter>>,
    pending: RequestManager,
    reader: JoinHandle<()>,
}

impl Connection {
    fn handle(&self) -> ConnectionHandle {
        ConnectionHandle {
            generation: self.generation,
            writer: self.writer.clone(),
            pending: self.pending.clone(),
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// What a call needs from a connection, usable without holding the slot lock
struct ConnectionHandle {
    generation: u64,
    writer: Arc<Mutex<FrameWriter>>,
    pending: RequestManager,
}

impl TcpTransport {
    /// Create a transport for `config.address()`; nothing is opened yet
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_metrics(config, None)
    }

    /// Create a transport that reports connection metrics
    pub fn with_metrics(config: &ClientConfig, metrics: Option<Arc<ClientMetrics>>) -> Self {
        Self {
            inner: Arc::new(TcpInner {
                connect_timeout: config.connect_timeout,
                request_timeout: config.request_timeout,
                max_frame_length: config.max_frame_length,
                slot: Mutex::new(None),
                state: ConnectionManager::new(config.address(), metrics.clone()),
                metrics,
            }),
        }
    }

    /// The `host:port` this transport connects to
    pub fn address(&self) -> &str {
        self.inner.state.address()
    }

    /// Get the current connection state
    pub async fn state(&self) -> ConnectionState {
        self.inner.state.state().await
    }

    /// Check if a connection is currently open
    pub async fn is_connected(&self) -> bool {
        self.state().await == ConnectionState::Connected
    }

    /// Open the connection if it is not already open
    ///
    /// # Errors
    ///
    /// `Error::Transport` if the server cannot be reached, `Error::Timeout` if
    /// the configured connect timeout elapses.
    pub async fn connect(&self) -> Result<()> {
        self.current().await.map(|_| ())
    }

    /// Shut the connection down
    ///
    /// In-flight calls fail with `Error::ConnectionClosed`. Closing a
    /// transport that is not connected does nothing.
    pub async fn close(&self) -> Result<()> {
        let taken = self.inner.slot.lock().await.take();
        let Some(connection) = taken else {
            return Ok(());
        };

        tracing::info!(address = %self.address(), "Closing connection");
        connection.reader.abort();
        let flushed = SinkExt::<String>::close(&mut *connection.writer.lock().await).await;
        connection.pending.close_all(Error::ConnectionClosed);
        self.inner.state.lost(connection.generation).await;
        flushed
    }

    /// The live connection, opening one if needed
    async fn current(&self) -> Result<ConnectionHandle> {
        let mut slot = self.inner.slot.lock().await;
        let alive = match slot.as_ref() {
            Some(connection) => {
                !connection.reader.is_finished() && !connection.pending.is_closed()
            }
            None => false,
        };

        if !alive {
            // A dead reader has already failed its calls
            *slot = None;
            *slot = Some(self.open().await?);
        }

        slot.as_ref()
            .map(Connection::handle)
            .ok_or(Error::ConnectionClosed)
    }

    async fn open(&self) -> Result<Connection> {
        let inner = &self.inner;
        let address = inner.state.address();

        inner.state.connecting().await;
        tracing::info!(address = %address, "Connecting to server");

        let stream = match dial(address, inner.connect_timeout).await {
            Ok(stream) => stream,
            Err(e) => {
                inner.state.disconnected().await;
                if let Some(ref m) = inner.metrics {
                    m.record_connect("failure");
                }
                tracing::warn!(address = %address, error = %e, "Connection failed");
                return Err(e);
            }
        };

        let generation = inner.state.connected().await;
        if let Some(ref m) = inner.metrics {
            m.record_connect("success");
        }
        tracing::info!(address = %address, generation, "Connected successfully");

        let (read_half, write_half) = stream.into_split();
        let codec = LineCodec::with_max_length(inner.max_frame_length);
        let pending = RequestManager::new();

        let reader = tokio::spawn(read_loop(
            FramedRead::new(read_half, codec.clone()),
            pending.clone(),
            inner.state.clone(),
            generation,
            inner.metrics.clone(),
        ));

        Ok(Connection {
            generation,
            writer: Arc::new(Mutex::new(FramedWrite::new(write_half, codec))),
            pending,
            reader,
        })
    }

    /// Tear down the connection of `generation` after a failed write
    async fn drop_connection(&self, generation: u64) {
        let mut slot = self.inner.slot.lock().await;
        if slot.as_ref().map(|connection| connection.generation) != Some(generation) {
            return;
        }
        if let Some(connection) = slot.take() {
            connection.pending.close_all(Error::ConnectionClosed);
            self.inner.state.lost(generation).await;
        }
    }
}

#[async_trait]
impl Transport for TcpTransport {
    fn name(&self) -> &'static str {
        "tcp"
    }

    #[tracing::instrument(skip(self, request), fields(address = %self.address(), id = request.id))]
    async fn exchange(&self, request: RpcRequest) -> Result<RpcResponse> {
        let id = request.id;
        let frame = codec::encode_request(&request)?;
        // nothing is written, the shared connection stays up
        let max = self.inner.max_frame_length;
        if frame.len() > max {
            tracing::warn!(limit = max, actual = frame.len(), "Request frame too large");
            return Err(Error::FrameTooLarge {
                limit: max,
                actual: frame.len(),
            });
        }

        let connection = self.current().await?;
        let mut slot = PendingSlot::register(&connection.pending, id)?;

        let sent = connection.writer.lock().await.send(frame).await;
        if let Err(e) = sent {
            tracing::warn!(error = %e, "Write failed, dropping connection");
            drop(slot);
            self.drop_connection(connection.generation).await;
            return Err(e);
        }
        tracing::debug!("Request sent, waiting for response");

        match self.inner.request_timeout {
            Some(limit) => match tokio::time::timeout(limit, slot.response()).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::warn!(timeout_ms = limit.as_millis() as u64, "Request timed out");
                    Err(Error::Timeout)
                }
            },
            None => slot.response().await,
        }
    }
}

/// A registered call; the slot is released if the call is abandoned
///
/// Covers timeouts, failed writes and callers that drop the call future.
struct PendingSlot {
    pending: RequestManager,
    id: RequestId,
    rx: PendingResponse,
    answered: bool,
}

impl PendingSlot {
    fn register(pending: &RequestManager, id: RequestId) -> Result<Self> {
        let rx = pending.register(id)?;
        Ok(Self {
            pending: pending.clone(),
            id,
            rx,
            answered: false,
        })
    }

    /// Wait until the reader task resolves the slot
    async fn response(&mut self) -> Result<RpcResponse> {
        let outcome = (&mut self.rx).await;
        self.answered = true;
        outcome.map_err(|_| Error::ConnectionClosed)?
    }
}

impl Drop for PendingSlot {
    fn drop(&mut self) {
        if !self.answered {
            self.pending.forget(self.id);
        }
    }
}

async fn dial(address: &str, timeout: Option<Duration>) -> Result<TcpStream> {
    let connect = TcpStream::connect(address);
    match timeout {
        Some(limit) => match tokio::time::timeout(limit, connect).await {
            Ok(stream) => Ok(stream?),
            Err(_) => Err(Error::Timeout),
        },
        None => Ok(connect.await?),
    }
}

/// Route responses to their callers until the stream ends
async fn read_loop(
    mut frames: FrameReader,
    pending: RequestManager,
    state: ConnectionManager,
    generation: u64,
    metrics: Option<Arc<ClientMetrics>>,
) {
    let reason = loop {
        match frames.next().await {
            Some(Ok(frame)) => {
                if let Some(ref m) = metrics {
                    m.record_frame(frame.len());
                }
                route(&frame, &pending);
            }
            Some(Err(e)) => {
                tracing::error!(error = %e, "Connection read failed");
                if let Some(ref m) = metrics {
                    m.record_error(e.kind());
                }
                break e;
            }
            None => {
                tracing::info!(generation, "Connection closed by server");
                break Error::ConnectionClosed;
            }
        }
    };

    pending.close_all(reason);
    state.lost(generation).await;
}

fn route(frame: &str, pending: &RequestManager) {
    let response = match codec::decode_response(frame) {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "Undecodable frame, failing in-flight calls");
            pending.fail_all(e);
            return;
        }
    };

    match response.id {
        Some(id) => {
            pending.complete(id, response);
        }
        None => {
            let error = match response.into_result() {
                Err(e) => e,
                Ok(_) => Error::Protocol("response carries no id".to_string()),
            };
            tracing::warn!(error = %error, "Response without id, failing in-flight calls");
            pending.fail_all(error);
        }
    }
}
