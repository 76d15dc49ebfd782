//! Serial transport.
//!
//! The [`Transport`] trait is the seam between the bridge and the serial
//! line. [`SerialTransport`] drives a real device through the `serialport`
//! crate; [`MockTransport`] plays back scripted replies for tests.
//!
//! A read that returns no data within the port's timeout means the device
//! has nothing more to say. [`drain`] relies on that to know when a reply is
//! complete.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, info, trace};

use crate::config::SerialConfig;
use crate::error::TransportError;

/// Chunk size used when draining a reply.
pub const DRAIN_CHUNK_SIZE: usize = 256;

/// Chunk size used when discarding stale output at startup.
pub const DISCARD_CHUNK_SIZE: usize = 128;

/// Byte-level access to the device.
pub trait Transport: Send {
    /// Write all bytes. No acknowledgement is awaited.
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Read into `buf`, blocking for at most the read timeout.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        (**self).write_all(data)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }
}

/// Whether a read error just means the device has gone quiet.
///
/// serialport reports an expired read window as `TimedOut`.
fn is_end_of_data(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::UnexpectedEof
    )
}

/// Read until the device goes quiet, returning everything received in order.
pub fn drain<T: Transport + ?Sized>(transport: &mut T) -> Result<Vec<u8>, TransportError> {
    let mut buf = [0u8; DRAIN_CHUNK_SIZE];
    let mut out = Vec::new();

    loop {
        match transport.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                trace!(bytes = n, "drained chunk");
                out.extend_from_slice(&buf[..n]);
            }
            Err(e) if is_end_of_data(&e) => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(TransportError::Read(e)),
        }
    }

    Ok(out)
}

/// Throw away whatever the device has buffered, logging each chunk.
///
/// Used once after the link is opened to flush output left over from a
/// previous session. Returns the number of bytes discarded.
pub fn discard<T: Transport + ?Sized>(transport: &mut T) -> Result<usize, TransportError> {
    let mut buf = [0u8; DISCARD_CHUNK_SIZE];
    let mut total = 0;

    loop {
        match transport.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                debug!(
                    bytes = n,
                    data = %String::from_utf8_lossy(&buf[..n]),
                    "discarding stale output"
                );
                total += n;
            }
            Err(e) if is_end_of_data(&e) => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(TransportError::Read(e)),
        }
    }

    Ok(total)
}

// ============================================================================
// Serial Port
// ============================================================================

/// A real serial device.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Open the device at 8 data bits, no parity, 1 stop bit, no flow control.
    pub fn open(config: &SerialConfig) -> Result<Self, TransportError> {
        let port = serialport::new(&config.port, config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.read_timeout())
            .open()
            .map_err(|source| TransportError::Open {
                port: config.port.clone(),
                source,
            })?;

        info!(
            port = %config.port,
            baud = config.baud_rate,
            timeout_ms = config.read_timeout_ms,
            "opened serial port"
        );

        Ok(SerialTransport { port })
    }
}

impl Transport for SerialTransport {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        let port = self.port.as_mut();
        port.write_all(data)?;
        port.flush()
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.as_mut().read(buf)
    }
}

// ============================================================================
// Scripted Transport
// ============================================================================

type Responder = Box<dyn FnMut(&[u8]) -> Option<Vec<u8>> + Send>;

#[derive(Default)]
struct MockState {
    pending: VecDeque<io::Result<Vec<u8>>>,
    writes: Vec<Vec<u8>>,
    write_error: Option<io::ErrorKind>,
    responder: Option<Responder>,
}

/// A transport that plays back scripted reads and records writes.
///
/// Clones share state, so a test can keep one clone for inspection after
/// handing another to the serial worker. When nothing is queued a read
/// reports `TimedOut`, the same way an idle serial port does.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create an idle transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a chunk to be returned by upcoming reads.
    pub fn queue_read(&self, data: impl Into<Vec<u8>>) {
        self.state.lock().pending.push_back(Ok(data.into()));
    }

    /// Queue a read error.
    pub fn queue_read_error(&self, kind: io::ErrorKind) {
        self.state
            .lock()
            .pending
            .push_back(Err(io::Error::new(kind, "scripted read error")));
    }

    /// Make every subsequent write fail.
    pub fn fail_writes(&self, kind: io::ErrorKind) {
        self.state.lock().write_error = Some(kind);
    }

    /// Install a device model: each write is passed to `responder`, and any
    /// bytes it returns are queued as the reply.
    pub fn set_responder<F>(&self, responder: F)
    where
        F: FnMut(&[u8]) -> Option<Vec<u8>> + Send + 'static,
    {
        self.state.lock().responder = Some(Box::new(responder));
    }

    /// Every write so far, one entry per call.
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state.lock().writes.clone()
    }

    /// Number of reads still queued.
    pub fn pending_reads(&self) -> usize {
        self.state.lock().pending.len()
    }
}

impl Transport for MockTransport {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        let mut state = self.state.lock();
        if let Some(kind) = state.write_error {
            return Err(io::Error::new(kind, "scripted write error"));
        }
        state.writes.push(data.to_vec());
        let reply = state.responder.as_mut().and_then(|respond| respond(data));
        if let Some(reply) = reply {
            state.pending.push_back(Ok(reply));
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        match state.pending.pop_front() {
            None => Err(io::Error::new(io::ErrorKind::TimedOut, "no data")),
            Some(Err(e)) => Err(e),
            Some(Ok(mut chunk)) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                if n < chunk.len() {
                    chunk.drain(..n);
                    state.pending.push_front(Ok(chunk));
                }
                Ok(n)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_concatenates_chunks() {
        let mut transport = MockTransport::new();
        transport.queue_read(b"ZIA--".to_vec());
        transport.queue_read(b"PONG".to_vec());
        transport.queue_read(b"\r\n".to_vec());

        let data = drain(&mut transport).unwrap();
        assert_eq!(data, b"ZIA--PONG\r\n");
    }

    #[test]
    fn test_drain_stops_at_zero_length_read() {
        let mut transport = MockTransport::new();
        transport.queue_read(b"first".to_vec());
        transport.queue_read(Vec::new());
        transport.queue_read(b"second".to_vec());

        assert_eq!(drain(&mut transport).unwrap(), b"first");
        assert_eq!(transport.pending_reads(), 1);
        assert_eq!(drain(&mut transport).unwrap(), b"second");
    }

    #[test]
    fn test_drain_idle_transport() {
        let mut transport = MockTransport::new();
        assert!(drain(&mut transport).unwrap().is_empty());
    }

    #[test]
    fn test_drain_large_reply_spans_chunks() {
        let mut transport = MockTransport::new();
        let reply: Vec<u8> = (0..1000).map(|i| (i % 251) as u8).collect();
        transport.queue_read(reply.clone());

        assert_eq!(drain(&mut transport).unwrap(), reply);
    }

    #[test]
    fn test_drain_treats_eof_as_end_of_data() {
        let mut transport = MockTransport::new();
        transport.queue_read(b"OK".to_vec());
        transport.queue_read_error(io::ErrorKind::UnexpectedEof);

        assert_eq!(drain(&mut transport).unwrap(), b"OK");
    }

    #[test]
    fn test_drain_retries_interrupted() {
        let mut transport = MockTransport::new();
        transport.queue_read(b"A".to_vec());
        transport.queue_read_error(io::ErrorKind::Interrupted);
        transport.queue_read(b"B".to_vec());

        assert_eq!(drain(&mut transport).unwrap(), b"AB");
    }

    #[test]
    fn test_drain_fails_on_unexpected_error() {
        let mut transport = MockTransport::new();
        transport.queue_read(b"partial".to_vec());
        transport.queue_read_error(io::ErrorKind::BrokenPipe);

        assert!(matches!(drain(&mut transport), Err(TransportError::Read(_))));
    }

    #[test]
    fn test_discard_counts_bytes() {
        let mut transport = MockTransport::new();
        transport.queue_read(vec![b'x'; 300]);

        assert_eq!(discard(&mut transport).unwrap(), 300);
        assert_eq!(transport.pending_reads(), 0);
    }

    #[test]
    fn test_discard_fails_on_unexpected_error() {
        let mut transport = MockTransport::new();
        transport.queue_read_error(io::ErrorKind::PermissionDenied);

        assert!(matches!(discard(&mut transport), Err(TransportError::Read(_))));
    }

    #[test]
    fn test_mock_records_writes_and_responds() {
        let mut transport = MockTransport::new();
        transport.set_responder(|data| (data == b"ZIA++PING\r").then(|| b"ZIA--PONG".to_vec()));

        transport.write_all(b"ZIA++PING\r").unwrap();
        transport.write_all(b"ZIA++OTHER\r").unwrap();

        assert_eq!(transport.writes().len(), 2);
        assert_eq!(drain(&mut transport).unwrap(), b"ZIA--PONG");
    }

    #[test]
    fn test_mock_write_failure() {
        let mut transport = MockTransport::new();
        transport.fail_writes(io::ErrorKind::BrokenPipe);

        assert!(transport.write_all(b"ZIA++PING\r").is_err());
        assert!(transport.writes().is_empty());
    }
}
