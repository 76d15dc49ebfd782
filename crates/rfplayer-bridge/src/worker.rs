//! Serial worker thread.
//!
//! The RFPlayer answers one command at a time over a single line, so the
//! transport is owned by exactly one thread. HTTP handlers submit
//! [`SerialRequest`]s through a [`SerialHandle`]; the worker runs each
//! write-then-drain exchange to completion before taking the next one, which
//! keeps replies from interleaving.
//!
//! ## Failure
//!
//! A transport error is answered to the request that hit it, then the worker
//! marks the link [`LinkState::Down`] and exits. Queued and later requests
//! fail with [`BridgeError::LinkDown`]. The binary watches the link state and
//! shuts the process down.

use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};
use rfplayer_metrics::metric_defs;
use rfplayer_protocol::{Command, Reply};
use tokio::sync::{oneshot, watch};
use tracing::{debug, error, info};

use crate::error::{BridgeError, BridgeResult, TransportError};
use crate::transport::{discard, drain, Transport};

// ============================================================================
// Requests
// ============================================================================

/// One exchange with the device.
#[derive(Debug)]
pub struct SerialRequest {
    /// Command to send first, or `None` to only drain pending output.
    pub command: Option<Command>,
    /// Where to deliver the reply.
    pub reply_tx: oneshot::Sender<BridgeResult<Reply>>,
}

/// Health of the serial link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
    /// The worker is accepting requests.
    Up,
    /// The worker stopped after a transport failure.
    Down(String),
}

impl LinkState {
    /// Check if the link has failed.
    pub fn is_down(&self) -> bool {
        matches!(self, LinkState::Down(_))
    }
}

// ============================================================================
// Worker
// ============================================================================

/// Owns the transport and performs exchanges.
pub struct SerialWorker<T: Transport> {
    transport: T,
}

impl<T: Transport> SerialWorker<T> {
    /// Wrap an open transport.
    pub fn new(transport: T) -> Self {
        SerialWorker { transport }
    }

    /// Put the device in JSON mode and flush stale output.
    ///
    /// `FORMAT JSON` produces no reply, so whatever is read afterwards is
    /// left over from a previous session and is thrown away. Returns the
    /// number of bytes discarded.
    pub fn initialize(&mut self) -> BridgeResult<usize> {
        self.write_command(&Command::FormatJson)?;

        let stale = discard(&mut self.transport)?;
        if stale > 0 {
            info!(bytes = stale, "discarded stale output from previous session");
        }
        metrics::counter!(metric_defs::SERIAL_STALE_DISCARDED.name).increment(stale as u64);
        Ok(stale)
    }

    /// Send `command` (if any), drain the reply and strip its prefix.
    pub fn exchange(&mut self, command: Option<&Command>) -> BridgeResult<Reply> {
        let operation = command.map_or("read", Command::name);
        let started = Instant::now();

        if let Some(command) = command {
            self.write_command(command)?;
        }

        let raw = drain(&mut self.transport)?;
        debug!(operation, bytes = raw.len(), "drained reply");
        metrics::counter!(metric_defs::SERIAL_BYTES_READ.name).increment(raw.len() as u64);
        metrics::histogram!(metric_defs::SERIAL_EXCHANGE_TIME.name, "operation" => operation)
            .record(started.elapsed().as_micros() as f64);

        Ok(Reply::from_raw(&raw))
    }

    fn write_command(&mut self, command: &Command) -> BridgeResult<()> {
        let text = command.to_command_string()?;
        info!(command = %text, "sending command");

        let framed = rfplayer_protocol::frame(&text);
        self.transport
            .write_all(&framed)
            .map_err(TransportError::Write)?;
        metrics::counter!(metric_defs::SERIAL_BYTES_WRITTEN.name).increment(framed.len() as u64);
        Ok(())
    }
}

// ============================================================================
// Handle
// ============================================================================

/// Cloneable handle used by request handlers to reach the worker.
#[derive(Clone)]
pub struct SerialHandle {
    request_tx: Sender<SerialRequest>,
    link_rx: watch::Receiver<LinkState>,
}

impl SerialHandle {
    /// Run one exchange on the worker and wait for its reply.
    pub async fn exchange(&self, command: Option<Command>) -> BridgeResult<Reply> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.request_tx
            .send(SerialRequest { command, reply_tx })
            .map_err(|_| BridgeError::LinkDown)?;
        reply_rx.await.map_err(|_| BridgeError::LinkDown)?
    }

    /// Drain whatever the device has buffered without sending anything.
    pub async fn read(&self) -> BridgeResult<Reply> {
        self.exchange(None).await
    }

    /// Send a command and return its reply.
    pub async fn send(&self, command: Command) -> BridgeResult<Reply> {
        self.exchange(Some(command)).await
    }

    /// Current link state.
    pub fn link_state(&self) -> LinkState {
        self.link_rx.borrow().clone()
    }

    /// Resolve once the link has gone down (or the worker has vanished).
    pub async fn link_down(&self) -> LinkState {
        let mut link_rx = self.link_rx.clone();
        let state = match link_rx.wait_for(LinkState::is_down).await {
            Ok(state) => state.clone(),
            Err(_) => LinkState::Down("serial worker exited".to_string()),
        };
        state
    }
}

/// Handle to the running worker thread.
pub struct SerialWorkerThread {
    /// Thread join handle.
    thread: JoinHandle<()>,
}

impl SerialWorkerThread {
    /// Check if the worker has stopped.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Join the worker thread. It exits once every [`SerialHandle`] is
    /// dropped or the link fails.
    pub fn join(self) -> thread::Result<()> {
        self.thread.join()
    }

    /// Join the worker, reporting a panic as a lost link.
    pub fn finish(self) -> BridgeResult<()> {
        self.join().map_err(|_| {
            error!("serial worker panicked");
            BridgeError::LinkDown
        })
    }
}

/// Spawn the worker on its own thread.
///
/// The worker begins accepting requests immediately. Call
/// [`SerialWorker::initialize`] first if the device needs it.
pub fn spawn_serial_worker<T>(
    worker: SerialWorker<T>,
) -> std::io::Result<(SerialHandle, SerialWorkerThread)>
where
    T: Transport + 'static,
{
    let (request_tx, request_rx) = crossbeam_channel::unbounded();
    let (link_tx, link_rx) = watch::channel(LinkState::Up);

    let thread = thread::Builder::new()
        .name("rfplayer-serial".to_string())
        .spawn(move || serial_worker_main(worker, request_rx, link_tx))?;

    Ok((
        SerialHandle {
            request_tx,
            link_rx,
        },
        SerialWorkerThread { thread },
    ))
}

/// Main function for the worker thread.
///
/// Blocks waiting for requests and processes them one at a time until every
/// handle is dropped or the transport fails.
fn serial_worker_main<T: Transport>(
    mut worker: SerialWorker<T>,
    request_rx: Receiver<SerialRequest>,
    link_tx: watch::Sender<LinkState>,
) {
    while let Ok(request) = request_rx.recv() {
        // The client went away while this request was queued.
        if request.reply_tx.is_closed() {
            debug!(
                operation = request.command.as_ref().map_or("read", Command::name),
                "skipping abandoned request"
            );
            continue;
        }

        let result = worker.exchange(request.command.as_ref());

        let failure = match &result {
            Err(BridgeError::Transport(e)) => Some(e.to_string()),
            _ => None,
        };

        // The requester may have given up; nothing to do then.
        let _ = request.reply_tx.send(result);

        if let Some(reason) = failure {
            error!(%reason, "serial link failed, stopping worker");
            link_tx.send_replace(LinkState::Down(reason));
            return;
        }
    }
    debug!("all serial handles dropped, worker exiting");
}
