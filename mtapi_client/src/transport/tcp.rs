//! TCP transport speaking line-delimited JSON frames.
//!
//! One background reader thread per connection routes replies to waiting
//! callers by request id and forwards quote pushes and health changes as
//! `TransportEvent`s. Writers share the socket under a mutex so that frames
//! from concurrent callers never interleave.
use std::collections::HashMap;
use std::io::BufReader;
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info, warn};
use mtapi_common::command_type::PROTOCOL_VERSION;
use mtapi_common::frame::{write_frame, ClientFrame, FrameReader, ServerFrame};
use mtapi_common::{Command, MtApiError, MtQuote, ResponseEnvelope, Result};

use super::{Endpoint, SessionId, Transport, TransportEvent};
use crate::config::ClientConfig;

/// Reply routed back to a waiting caller.
enum Reply {
    Response(Option<ResponseEnvelope>),
    Quotes(Vec<MtQuote>),
}

/// State of one open connection.
struct Session {
    stream: TcpStream,
    writer: Mutex<TcpStream>,
    /// `None` once the reader has stopped; no new waiters are accepted then.
    pending: Mutex<Option<HashMap<u64, Sender<Reply>>>>,
    /// Set on a local close so the reader stays silent about it.
    closed: AtomicBool,
    endpoint: Endpoint,
    id: SessionId,
}

impl Session {
    fn register(&self, id: u64) -> Result<Receiver<Reply>> {
        let (tx, rx) = bounded(1);
        let mut pending = self.pending.lock()?;
        match pending.as_mut() {
            Some(waiters) => {
                waiters.insert(id, tx);
                Ok(rx)
            }
            None => Err(MtApiError::ChannelUnavailable(format!(
                "connection to {} is closed",
                self.endpoint
            ))),
        }
    }

    fn forget(&self, id: u64) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(waiters) = pending.as_mut() {
            waiters.remove(&id);
        }
    }

    fn complete(&self, id: u64, reply: Reply) {
        let waiter = {
            let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
            pending.as_mut().and_then(|waiters| waiters.remove(&id))
        };
        match waiter {
            Some(tx) => {
                // The caller may have timed out in the meantime.
                let _ = tx.send(reply);
            }
            None => debug!("Reply for unknown request {} dropped", id),
        }
    }

    /// Releases every waiting caller; their receivers observe a disconnect.
    fn drain(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(waiters) = pending.take() {
            if !waiters.is_empty() {
                debug!("Releasing {} pending request(s)", waiters.len());
            }
        }
    }

    fn send(&self, frame: &ClientFrame) -> Result<()> {
        let mut writer = self.writer.lock()?;
        write_frame(&mut *writer, frame)
    }

    fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        if let Err(e) = self.send(&ClientFrame::Goodbye) {
            debug!("Goodbye to {} not delivered: {}", self.endpoint, e);
        }
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

/// `Transport` over a single TCP connection.
pub struct TcpTransport {
    config: ClientConfig,
    events: Sender<TransportEvent>,
    session: Mutex<Option<Arc<Session>>>,
    next_id: AtomicU64,
    next_session: AtomicU64,
}

impl TcpTransport {
    /// Creates a closed transport that will publish its notifications on `events`.
    pub fn new(config: ClientConfig, events: Sender<TransportEvent>) -> Self {
        Self {
            config,
            events,
            session: Mutex::new(None),
            next_id: AtomicU64::new(1),
            next_session: AtomicU64::new(1),
        }
    }

    fn current(&self) -> Result<Arc<Session>> {
        self.session
            .lock()?
            .clone()
            .ok_or_else(|| MtApiError::ChannelUnavailable("transport is not open".to_string()))
    }

    fn connect_stream(&self, endpoint: &Endpoint) -> Result<TcpStream> {
        let mut last_error = None;
        for addr in endpoint.socket_addrs()? {
            match TcpStream::connect_timeout(&addr, self.config.connect_timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    debug!("Connect to {} failed: {}", addr, e);
                    last_error = Some(e);
                }
            }
        }
        Err(match last_error {
            Some(e) => MtApiError::Io(e),
            None => MtApiError::ConnectFailure(format!("no address for {}", endpoint)),
        })
    }

    fn handshake(
        &self,
        stream: &TcpStream,
        reader: &mut FrameReader<BufReader<TcpStream>>,
    ) -> Result<String> {
        let mut writer = stream.try_clone()?;
        write_frame(
            &mut writer,
            &ClientFrame::Hello {
                protocol_version: PROTOCOL_VERSION,
                client: self.config.client_name.clone(),
            },
        )?;
        stream.set_read_timeout(Some(self.config.handshake_timeout))?;
        let reply = reader.read_frame::<ServerFrame>()?;
        stream.set_read_timeout(None)?;
        match reply {
            Some(ServerFrame::Welcome {
                protocol_version,
                terminal,
            }) if protocol_version == PROTOCOL_VERSION => Ok(terminal),
            Some(ServerFrame::Welcome {
                protocol_version, ..
            }) => Err(MtApiError::Handshake(format!(
                "terminal speaks protocol {}, client speaks {}",
                protocol_version, PROTOCOL_VERSION
            ))),
            Some(other) => Err(MtApiError::Handshake(format!(
                "expected Welcome, got {:?}",
                other
            ))),
            None => Err(MtApiError::Handshake(
                "connection closed during handshake".to_string(),
            )),
        }
    }

    fn round_trip(&self, frame_for: impl FnOnce(u64) -> ClientFrame) -> Result<Reply> {
        let session = self.current()?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let rx = session.register(id)?;
        if let Err(e) = session.send(&frame_for(id)) {
            session.forget(id);
            return Err(MtApiError::ChannelUnavailable(format!(
                "write to {} failed: {}",
                session.endpoint, e
            )));
        }
        match self.config.command_timeout {
            Some(timeout) => match rx.recv_timeout(timeout) {
                Ok(reply) => Ok(reply),
                Err(RecvTimeoutError::Timeout) => {
                    session.forget(id);
                    Err(MtApiError::Timeout(timeout))
                }
                Err(RecvTimeoutError::Disconnected) => Err(channel_lost(&session)),
            },
            None => rx.recv().map_err(|_| channel_lost(&session)),
        }
    }
}

fn channel_lost(session: &Session) -> MtApiError {
    MtApiError::ChannelUnavailable(format!(
        "connection to {} lost while waiting for a reply",
        session.endpoint
    ))
}

impl Transport for TcpTransport {
    fn open(&self, endpoint: &Endpoint) -> Result<SessionId> {
        self.close();

        let stream = self.connect_stream(endpoint)?;
        stream.set_nodelay(true)?;
        let mut reader = FrameReader::new(BufReader::new(stream.try_clone()?));
        let terminal = self.handshake(&stream, &mut reader)?;
        info!("Handshake with '{}' at {} complete", terminal, endpoint);

        let id = self.next_session.fetch_add(1, Ordering::SeqCst);
        let session = Arc::new(Session {
            writer: Mutex::new(stream.try_clone()?),
            stream,
            pending: Mutex::new(Some(HashMap::new())),
            closed: AtomicBool::new(false),
            endpoint: endpoint.clone(),
            id,
        });

        let reader_session = Arc::clone(&session);
        let events = self.events.clone();
        thread::Builder::new()
            .name("mtapi-reader".to_string())
            .spawn(move || read_loop(reader_session, reader, events))?;

        *self.session.lock()? = Some(session);
        Ok(id)
    }

    fn close(&self) {
        let session = self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(session) = session {
            info!("Closing connection to {}", session.endpoint);
            session.shutdown();
        }
    }

    fn send_request(&self, command: &Command) -> Result<Option<ResponseEnvelope>> {
        let reply = self.round_trip(|id| ClientFrame::Request {
            id,
            command: command.clone(),
        })?;
        match reply {
            Reply::Response(response) => Ok(response),
            Reply::Quotes(_) => Err(MtApiError::Protocol(format!(
                "quote list received for {}",
                command.operation
            ))),
        }
    }

    fn get_quotes(&self) -> Result<Vec<MtQuote>> {
        match self.round_trip(|id| ClientFrame::GetQuotes { id })? {
            Reply::Quotes(quotes) => Ok(quotes),
            Reply::Response(_) => Err(MtApiError::Protocol(
                "command reply received for quote list request".to_string(),
            )),
        }
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.close();
    }
}

/// Blocking loop that decodes terminal frames until the connection ends.
fn read_loop(
    session: Arc<Session>,
    mut reader: FrameReader<BufReader<TcpStream>>,
    events: Sender<TransportEvent>,
) {
    let publish = |event: TransportEvent| {
        if session.closed.load(Ordering::SeqCst) {
            return;
        }
        if events.send(event).is_err() {
            debug!("Transport event dropped: no listener");
        }
    };

    let outcome = loop {
        match reader.read_frame::<ServerFrame>() {
            Ok(Some(frame)) => match frame {
                ServerFrame::Response { id, response } => {
                    session.complete(id, Reply::Response(response))
                }
                ServerFrame::Quotes { id, quotes } => session.complete(id, Reply::Quotes(quotes)),
                ServerFrame::QuoteAdded { quote } => publish(TransportEvent::QuoteAdded(quote)),
                ServerFrame::QuoteUpdated { quote } => {
                    publish(TransportEvent::QuoteUpdated(quote))
                }
                ServerFrame::QuoteRemoved { quote } => {
                    publish(TransportEvent::QuoteRemoved(quote))
                }
                ServerFrame::Goodbye => {
                    info!("Terminal at {} said goodbye", session.endpoint);
                    break TransportEvent::ServerDisconnected { session: session.id };
                }
                ServerFrame::Welcome { .. } => warn!("Unexpected Welcome after handshake ignored"),
            },
            Ok(None) => {
                info!("Terminal at {} closed the connection", session.endpoint);
                break TransportEvent::ServerDisconnected { session: session.id };
            }
            Err(e) => {
                if !session.closed.load(Ordering::SeqCst) {
                    error!("Connection to {} failed: {}", session.endpoint, e);
                }
                break TransportEvent::ServerFailed {
                    session: session.id,
                    reason: e.to_string(),
                };
            }
        }
    };

    session.drain();
    publish(outcome);
    let _ = session.stream.shutdown(Shutdown::Both);
    debug!("Reader for {} stopped", session.endpoint);
}
