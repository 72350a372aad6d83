//! Per-connection handling.
//!
//! A session owns one accepted socket. The connection thread answers the
//! handshake and then reads client frames; each request is executed on its
//! own worker so replies may leave out of order. A push thread forwards
//! broadcast pushes to the same socket. Whole frames are written under one
//! writer mutex.
use std::io::{BufReader, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

use crossbeam_channel::{bounded, select, Receiver};
use log::{debug, error, info, warn};
use mtapi_common::frame::{write_frame, ClientFrame, FrameReader, ServerFrame};
use mtapi_common::{Command, MtApiError, MtQuote, ResponseEnvelope, Result};

use crate::server::TerminalConfig;

/// Executes commands on behalf of connected clients.
pub trait CommandHandler: Send + Sync {
    /// Runs one command. `None` means the operation has no result.
    fn handle(&self, command: &Command) -> Option<ResponseEnvelope>;

    /// Instruments currently subscribed on the terminal.
    fn quotes(&self) -> Vec<MtQuote>;
}

/// Unsolicited output delivered to every session.
#[derive(Debug, Clone)]
pub enum Push {
    /// A well-formed frame.
    Frame(ServerFrame),
    /// A raw line written as is, for exercising client error paths.
    Raw(String),
    /// Say goodbye, then close the socket.
    Close,
    /// Close the socket without a goodbye.
    Abort,
}

type SharedWriter = Arc<Mutex<TcpStream>>;

fn send(writer: &SharedWriter, frame: &ServerFrame) -> Result<()> {
    let mut stream = writer.lock()?;
    write_frame(&mut *stream, frame)
}

/// Serves one client until either side closes the connection.
pub(crate) fn run_session(
    stream: TcpStream,
    handler: Arc<dyn CommandHandler>,
    config: TerminalConfig,
    push_rx: Receiver<Push>,
) -> Result<()> {
    let peer = stream.peer_addr()?;
    let mut reader = FrameReader::new(BufReader::new(stream.try_clone()?));
    let writer: SharedWriter = Arc::new(Mutex::new(stream.try_clone()?));

    match reader.read_frame::<ClientFrame>()? {
        Some(ClientFrame::Hello {
            protocol_version,
            client,
        }) => {
            if protocol_version != config.protocol_version {
                warn!(
                    "Client '{}' at {} speaks protocol {}, terminal speaks {}",
                    client, peer, protocol_version, config.protocol_version
                );
            }
            send(
                &writer,
                &ServerFrame::Welcome {
                    protocol_version: config.protocol_version,
                    terminal: config.name.clone(),
                },
            )?;
            info!("Client '{}' connected from {}", client, peer);
        }
        Some(other) => {
            let _ = stream.shutdown(Shutdown::Both);
            return Err(MtApiError::Handshake(format!(
                "expected Hello from {}, got {:?}",
                peer, other
            )));
        }
        None => {
            debug!("{} left before the handshake", peer);
            return Ok(());
        }
    }

    let (stop_tx, stop_rx) = bounded::<()>(1);
    {
        let writer = Arc::clone(&writer);
        let stream = stream.try_clone()?;
        thread::spawn(move || forward_pushes(writer, stream, push_rx, stop_rx));
    }

    loop {
        match reader.read_frame::<ClientFrame>() {
            Ok(Some(ClientFrame::Request { id, command })) => {
                let handler = Arc::clone(&handler);
                let writer = Arc::clone(&writer);
                thread::spawn(move || {
                    debug!("Request {}: {}", id, command.operation);
                    let response = handler.handle(&command);
                    if let Err(e) = send(&writer, &ServerFrame::Response { id, response }) {
                        debug!("Reply {} not delivered: {}", id, e);
                    }
                });
            }
            Ok(Some(ClientFrame::GetQuotes { id })) => {
                let quotes = handler.quotes();
                send(&writer, &ServerFrame::Quotes { id, quotes })?;
            }
            Ok(Some(ClientFrame::Goodbye)) => {
                info!("Client at {} said goodbye", peer);
                break;
            }
            Ok(Some(ClientFrame::Hello { .. })) => warn!("Repeated Hello from {} ignored", peer),
            Ok(None) => {
                info!("Client at {} closed the connection", peer);
                break;
            }
            Err(e) => {
                warn!("Session with {} ended: {}", peer, e);
                break;
            }
        }
    }

    let _ = stop_tx.try_send(());
    let _ = stream.shutdown(Shutdown::Both);
    Ok(())
}

/// Writes broadcast pushes to one client until the session stops.
fn forward_pushes(
    writer: SharedWriter,
    stream: TcpStream,
    push_rx: Receiver<Push>,
    stop_rx: Receiver<()>,
) {
    loop {
        select! {
            recv(stop_rx) -> _ => break,
            recv(push_rx) -> msg => match msg {
                Ok(Push::Frame(frame)) => {
                    if let Err(e) = send(&writer, &frame) {
                        error!("Failed to push frame: {}", e);
                        break;
                    }
                }
                Ok(Push::Raw(line)) => {
                    let written = writer.lock().map_err(MtApiError::from).and_then(|mut s| {
                        s.write_all(line.as_bytes())?;
                        s.write_all(b"\n")?;
                        s.flush()?;
                        Ok(())
                    });
                    if let Err(e) = written {
                        error!("Failed to push raw line: {}", e);
                        break;
                    }
                }
                Ok(Push::Close) => {
                    if let Err(e) = send(&writer, &ServerFrame::Goodbye) {
                        debug!("Goodbye not delivered: {}", e);
                    }
                    let _ = stream.shutdown(Shutdown::Both);
                    break;
                }
                Ok(Push::Abort) => {
                    let _ = stream.shutdown(Shutdown::Both);
                    break;
                }
                Err(_) => break,
            }
        }
    }
}
