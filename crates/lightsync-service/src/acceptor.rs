// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! TCP acceptor: one connection carries one payload, terminated by peer close.
//!
//! The listener and every connection task run on a tokio runtime. Finished
//! payloads are pushed onto an unbounded MPSC queue whose single consumer is
//! the scene thread, so payloads reach the engine in enqueue order (the order
//! reads completed), not accept order.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::string::FromUtf8Error;
use std::time::Duration;

use lightsync_app_core::prefs::SyncPrefs;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, error, info, warn};

/// One fully received payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundPayload {
    /// Remote address of the sending connection.
    pub peer: SocketAddr,
    /// Payload text (validated UTF-8).
    pub text: String,
}

/// Producer side of the payload queue (cloned into every connection task).
pub type PayloadSender = mpsc::UnboundedSender<InboundPayload>;
/// Consumer side of the payload queue (owned by the scene thread).
pub type PayloadReceiver = mpsc::UnboundedReceiver<InboundPayload>;

/// Create the multi-producer/single-consumer payload queue.
pub fn payload_queue() -> (PayloadSender, PayloadReceiver) {
    mpsc::unbounded_channel()
}

/// Listener lifecycle. Connections are not tracked; each is handled to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No listening socket.
    Stopped,
    /// Accepting connections.
    Listening,
}

/// Per-connection resource bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadLimits {
    /// Deadline for reading a whole payload; `None` waits for the peer indefinitely.
    pub read_timeout: Option<Duration>,
    /// Largest payload accepted from one connection.
    pub max_payload_bytes: usize,
    /// Size of the bounded read buffer.
    pub recv_buffer_bytes: usize,
}

impl Default for ReadLimits {
    fn default() -> Self {
        Self::from(&SyncPrefs::default())
    }
}

impl From<&SyncPrefs> for ReadLimits {
    fn from(prefs: &SyncPrefs) -> Self {
        Self {
            read_timeout: prefs.read_timeout(),
            max_payload_bytes: prefs.max_payload_bytes,
            recv_buffer_bytes: prefs.recv_buffer_bytes,
        }
    }
}

/// Failure to start listening.
#[derive(Debug, Error)]
pub enum BindError {
    /// `start` was called while a listener is already running.
    #[error("already listening on {0}")]
    AlreadyListening(SocketAddr),
    /// The OS refused the bind (port in use, permission denied, ...).
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: SocketAddr,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },
}

/// Pause after a failed accept before retrying.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Source of inbound connections for the accept loop.
trait Incoming: Send + 'static {
    type Stream: AsyncRead + Unpin + Send + 'static;

    fn accept(
        &mut self,
    ) -> impl Future<Output = io::Result<(Self::Stream, SocketAddr)>> + Send + '_;
}

impl Incoming for TcpListener {
    type Stream = TcpStream;

    fn accept(&mut self) -> impl Future<Output = io::Result<(TcpStream, SocketAddr)>> + Send + '_ {
        TcpListener::accept(&*self)
    }
}

/// Why a connection's payload was dropped.
#[derive(Debug, Error)]
pub enum ReadError {
    /// Socket error mid-read.
    #[error("read failed: {0}")]
    Io(#[from] io::Error),
    /// Payload grew past the configured cap.
    #[error("payload exceeds {limit} bytes")]
    TooLarge {
        /// Configured cap.
        limit: usize,
    },
    /// Peer did not close within the read deadline.
    #[error("peer did not close within {0:?}")]
    TimedOut(Duration),
    /// Payload bytes are not UTF-8.
    #[error("payload is not valid utf-8: {0}")]
    Utf8(#[from] FromUtf8Error),
}

struct Listening {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Owns the listening socket and spawns one task per accepted connection.
pub struct Acceptor {
    runtime: Handle,
    sender: PayloadSender,
    limits: ReadLimits,
    listening: Option<Listening>,
}

impl Acceptor {
    /// Create a stopped acceptor that spawns onto `runtime` and enqueues into `sender`.
    pub fn new(runtime: Handle, sender: PayloadSender, limits: ReadLimits) -> Self {
        Self {
            runtime,
            sender,
            limits,
            listening: None,
        }
    }

    /// Bind `addr` and start accepting. Returns the bound address (useful with port 0).
    ///
    /// Safe to call from a thread outside the runtime; the bind itself is synchronous.
    pub fn start(&mut self, addr: SocketAddr) -> Result<SocketAddr, BindError> {
        if let Some(bound) = self.local_addr() {
            return Err(BindError::AlreadyListening(bound));
        }
        self.listening = None;

        let _guard = self.runtime.enter();
        let listener = bind_listener(addr).map_err(|source| {
            error!(%addr, %source, "failed to bind light-sync listener");
            BindError::Bind { addr, source }
        })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| BindError::Bind { addr, source })?;

        let (shutdown, shutdown_rx) = oneshot::channel();
        let task = self.runtime.spawn(accept_loop(
            listener,
            self.sender.clone(),
            self.limits,
            shutdown_rx,
        ));
        info!(%local_addr, "listening for light payloads");
        self.listening = Some(Listening {
            local_addr,
            shutdown,
            task,
        });
        Ok(local_addr)
    }

    /// Close the listening socket. Returns `false` when already stopped,
    /// including when the accept loop has ended on its own.
    ///
    /// Does not wait for in-flight connections; payloads they finish are still
    /// enqueued, so the consumer should drain once more afterwards.
    pub fn stop(&mut self) -> bool {
        let Some(listening) = self.listening.take() else {
            return false;
        };
        if listening.task.is_finished() {
            return false;
        }
        let _ = listening.shutdown.send(());
        info!(local_addr = %listening.local_addr, "stopping light-sync listener");
        true
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        match &self.listening {
            Some(listening) if !listening.task.is_finished() => ConnectionState::Listening,
            _ => ConnectionState::Stopped,
        }
    }

    /// Bound address while listening.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match self.state() {
            ConnectionState::Listening => self.listening.as_ref().map(|l| l.local_addr),
            ConnectionState::Stopped => None,
        }
    }

    /// Per-connection limits in effect.
    pub fn limits(&self) -> ReadLimits {
        self.limits
    }
}

impl Drop for Acceptor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn bind_listener(addr: SocketAddr) -> io::Result<TcpListener> {
    let listener = std::net::TcpListener::bind(addr)?;
    listener.set_nonblocking(true)?;
    TcpListener::from_std(listener)
}

async fn accept_loop<I: Incoming>(
    mut incoming: I,
    sender: PayloadSender,
    limits: ReadLimits,
    mut shutdown: oneshot::Receiver<()>,
) {
    loop {
        let accepted = tokio::select! {
            _ = &mut shutdown => break,
            accepted = incoming.accept() => accepted,
        };
        match accepted {
            Ok((stream, peer)) => {
                debug!(%peer, "connection accepted");
                tokio::spawn(handle_connection(stream, peer, sender.clone(), limits));
            }
            Err(err) => {
                warn!(%err, backoff = ?ACCEPT_BACKOFF, "accept failed; retrying");
                tokio::select! {
                    _ = &mut shutdown => break,
                    () = time::sleep(ACCEPT_BACKOFF) => {}
                }
            }
        }
    }
    debug!("accept loop finished");
}

async fn handle_connection<S>(
    mut stream: S,
    peer: SocketAddr,
    sender: PayloadSender,
    limits: ReadLimits,
) where
    S: AsyncRead + Unpin + Send,
{
    let result = read_payload(&mut stream, &limits).await;
    drop(stream);
    match result {
        Ok(text) if text.is_empty() => debug!(%peer, "connection closed without payload"),
        Ok(text) => {
            debug!(%peer, bytes = text.len(), "payload received");
            if sender.send(InboundPayload { peer, text }).is_err() {
                warn!(%peer, "payload queue closed; payload dropped");
            }
        }
        Err(err) => warn!(%peer, %err, "payload dropped"),
    }
}

/// Read until the peer closes, within `limits`, and validate the bytes as UTF-8.
pub async fn read_payload<R>(reader: &mut R, limits: &ReadLimits) -> Result<String, ReadError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let read = read_to_close(reader, limits.max_payload_bytes, limits.recv_buffer_bytes);
    let bytes = match limits.read_timeout {
        Some(deadline) => time::timeout(deadline, read)
            .await
            .map_err(|_| ReadError::TimedOut(deadline))??,
        None => read.await?,
    };
    Ok(String::from_utf8(bytes)?)
}

async fn read_to_close<R>(
    reader: &mut R,
    limit: usize,
    chunk: usize,
) -> Result<Vec<u8>, ReadError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut payload = Vec::new();
    let mut buf = vec![0u8; chunk.max(1)];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(payload);
        }
        if payload.len() + n > limit {
            return Err(ReadError::TooLarge { limit });
        }
        payload.extend_from_slice(&buf[..n]);
    }
}
