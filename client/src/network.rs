//! Connection lifecycle for one game against the simulator
//!
//! A [`Session`] owns two tasks: the receive path, which turns stream bytes
//! into snapshots inside the shared cell, and the send path, which writes
//! intent tokens queued by the tick loop. Neither ever blocks the caller.

use crate::config::ClientConfig;
use crate::input::IntentTransport;
use crate::snapshot::{snapshot_cell, SnapshotReader, SnapshotWriter};
use log::{debug, error, info, warn};
use shared::{
    parse_preamble, FrameDecoder, Intent, PlayerIdentity, PreambleError, Snapshot, PREAMBLE_LEN,
};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

/// Intent tokens that may wait for the send task, a few ticks' worth.
///
/// When the peer stops reading, further tokens are dropped instead of queued:
/// the next tick samples a fresh intent anyway.
pub const OUTBOUND_CAPACITY: usize = 8;

/// Why a connect attempt did not produce a session.
#[derive(Debug, Error)]
pub enum ConnectFailure {
    #[error("connection to {addr} refused: {source}")]
    Refused {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("no handshake from {addr} within {timeout:?}")]
    Timeout { addr: String, timeout: Duration },
    #[error("malformed handshake preamble: {0}")]
    MalformedPreamble(#[from] PreambleError),
    #[error("failed to send player identity: {0}")]
    HandshakeWrite(String),
    #[error("stream closed during handshake: {0}")]
    Io(#[source] io::Error),
}

/// The outbound direction of the session is gone.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("outbound stream closed")]
pub struct LinkClosed;

/// Reads the player index preamble, then answers with the identity line.
pub async fn handshake<S>(stream: &mut S, identity: &PlayerIdentity) -> Result<i32, ConnectFailure>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut preamble = [0u8; PREAMBLE_LEN];
    stream
        .read_exact(&mut preamble)
        .await
        .map_err(ConnectFailure::Io)?;
    let local_id = parse_preamble(&preamble)?;

    let line = identity
        .encode_line()
        .map_err(|e| ConnectFailure::HandshakeWrite(e.to_string()))?;
    stream
        .write_all(&line)
        .await
        .map_err(|e| ConnectFailure::HandshakeWrite(e.to_string()))?;
    stream
        .flush()
        .await
        .map_err(|e| ConnectFailure::HandshakeWrite(e.to_string()))?;

    Ok(local_id)
}

/// One connect attempt: open the stream, handshake, start the session tasks.
///
/// Must be called from inside a tokio runtime.
pub async fn connect(
    config: &ClientConfig,
    identity: &PlayerIdentity,
) -> Result<Session, ConnectFailure> {
    let addr = config.server.clone();

    let attempt = async {
        let mut stream = TcpStream::connect(&addr)
            .await
            .map_err(|source| ConnectFailure::Refused {
                addr: addr.clone(),
                source,
            })?;
        let local_id = handshake(&mut stream, identity).await?;
        Ok::<_, ConnectFailure>((stream, local_id))
    };

    let (stream, local_id) = timeout(config.connect_timeout, attempt)
        .await
        .map_err(|_| ConnectFailure::Timeout {
            addr: addr.clone(),
            timeout: config.connect_timeout,
        })??;

    if let Err(e) = stream.set_nodelay(true) {
        debug!("Could not disable Nagle on {}: {}", addr, e);
    }

    info!("Connected to {} as player {}", addr, local_id);
    let (reader, writer) = stream.into_split();
    Ok(Session::start(reader, writer, local_id, config.max_frame_len))
}

/// Runs [`connect`] under the configured [`RetryPolicy`](crate::config::RetryPolicy).
///
/// Gives up with the last failure once the attempt budget is spent.
pub async fn connect_with_retry(
    config: &ClientConfig,
    identity: &PlayerIdentity,
) -> Result<Session, ConnectFailure> {
    let attempts = config.retry.attempts();
    let mut attempt = 1;

    loop {
        info!("Connecting to {} (attempt {}/{})", config.server, attempt, attempts);

        match connect(config, identity).await {
            Ok(session) => return Ok(session),
            Err(e) if attempt < attempts => {
                let delay = config.retry.delay_after(attempt);
                warn!("Connect attempt {} failed: {}; retrying in {:?}", attempt, e, delay);
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                error!("Giving up on {} after {} attempts: {}", config.server, attempt, e);
                return Err(e);
            }
        }
    }
}

/// A live connection: local player index plus the two I/O tasks.
///
/// Dropping the session closes it.
pub struct Session {
    local_id: i32,
    snapshots: SnapshotReader,
    outbound: mpsc::Sender<&'static [u8]>,
    outbound_open: Arc<AtomicBool>,
    stop: Arc<watch::Sender<bool>>,
    receive_task: JoinHandle<()>,
    send_task: JoinHandle<()>,
    closed: bool,
}

impl Session {
    /// Starts the receive and send tasks over an already handshaken stream.
    pub fn start<R, W>(reader: R, writer: W, local_id: i32, max_frame_len: usize) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (cell_writer, snapshots) = snapshot_cell();
        let (outbound, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let outbound_open = Arc::new(AtomicBool::new(true));
        let (stop_tx, stop_rx) = watch::channel(false);
        let stop = Arc::new(stop_tx);

        let receive_task = tokio::spawn(receive_loop(
            reader,
            FrameDecoder::new(max_frame_len),
            cell_writer,
            stop_rx,
            Arc::clone(&outbound_open),
        ));
        let send_task = tokio::spawn(send_loop(
            writer,
            outbound_rx,
            Arc::clone(&outbound_open),
            Arc::clone(&stop),
        ));

        Self {
            local_id,
            snapshots,
            outbound,
            outbound_open,
            stop,
            receive_task,
            send_task,
            closed: false,
        }
    }

    pub fn local_id(&self) -> i32 {
        self.local_id
    }

    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.snapshots.read_latest()
    }

    pub fn is_outbound_open(&self) -> bool {
        !self.closed && self.outbound_open.load(Ordering::SeqCst)
    }

    /// Queues raw bytes for the send task, dropping them while the link is stalled.
    pub fn send_token(&self, token: &'static [u8]) -> Result<(), LinkClosed> {
        if !self.is_outbound_open() {
            return Err(LinkClosed);
        }
        match self.outbound.try_send(token) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                debug!("Outbound stalled, dropping {:?}", String::from_utf8_lossy(token));
                Ok(())
            }
            Err(TrySendError::Closed(_)) => Err(LinkClosed),
        }
    }

    /// Whether both I/O tasks have exited.
    pub fn is_finished(&self) -> bool {
        self.receive_task.is_finished() && self.send_task.is_finished()
    }

    /// Releases the transport. Safe to call any number of times.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.outbound_open.store(false, Ordering::SeqCst);
        let _ = self.stop.send(true);
        self.send_task.abort();
        info!("Session for player {} closed", self.local_id);
    }
}

impl IntentTransport for Session {
    /// Level-triggered: every non-neutral tick puts one token on the wire.
    fn dispatch(&mut self, intent: Intent) -> Result<(), LinkClosed> {
        match intent.token() {
            Some(token) => self.send_token(token),
            None if self.is_outbound_open() => Ok(()),
            None => Err(LinkClosed),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

async fn receive_loop<R>(
    mut reader: R,
    mut decoder: FrameDecoder,
    cell: SnapshotWriter,
    mut stop: watch::Receiver<bool>,
    outbound_open: Arc<AtomicBool>,
) where
    R: AsyncRead + Unpin,
{
    let mut buffer = [0u8; 4096];

    loop {
        tokio::select! {
            result = reader.read(&mut buffer) => match result {
                Ok(0) => {
                    info!("Simulator closed the stream");
                    break;
                }
                Ok(len) => {
                    for frame in decoder.feed(&buffer[..len]) {
                        match frame {
                            Ok(snapshot) => cell.write(snapshot),
                            Err(e) => warn!("Dropped frame ({} total): {}", decoder.dropped(), e),
                        }
                    }
                }
                Err(e) => {
                    warn!("Stream read failed: {}", e);
                    break;
                }
            },
            _ = stop.changed() => {
                debug!("Receive path stopping");
                break;
            }
        }
    }

    outbound_open.store(false, Ordering::SeqCst);
    cell.end_of_stream();
}

async fn send_loop<W>(
    mut writer: W,
    mut outbound: mpsc::Receiver<&'static [u8]>,
    outbound_open: Arc<AtomicBool>,
    stop: Arc<watch::Sender<bool>>,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(token) = outbound.recv().await {
        if let Err(e) = writer.write_all(token).await {
            warn!("Intent write failed, treating connection as lost: {}", e);
            outbound_open.store(false, Ordering::SeqCst);
            let _ = stop.send(true);
            break;
        }
    }
}
