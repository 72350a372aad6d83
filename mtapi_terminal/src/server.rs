//! TCP accept loop and push broadcasting.
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use crossbeam_channel::{unbounded, Sender};
use log::{debug, error, info};
use mtapi_common::command_type::PROTOCOL_VERSION;
use mtapi_common::frame::ServerFrame;
use mtapi_common::net::LOCALHOST;
use mtapi_common::{MtQuote, Result};

use crate::session::{run_session, CommandHandler, Push};

/// Identity the terminal presents during the handshake.
#[derive(Debug, Clone)]
pub struct TerminalConfig {
    /// Name sent in `Welcome`.
    pub name: String,
    /// Protocol version sent in `Welcome`.
    pub protocol_version: u32,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            name: "MtApi Simulated Terminal".to_string(),
            protocol_version: PROTOCOL_VERSION,
        }
    }
}

type Subscribers = Arc<Mutex<Vec<Sender<Push>>>>;

/// Terminal endpoint accepting any number of clients.
///
/// Dropping it stops accepting and closes every session with a goodbye.
pub struct MockTerminal {
    local_addr: SocketAddr,
    subscribers: Subscribers,
    shutdown: Arc<AtomicBool>,
}

impl MockTerminal {
    /// Starts on an ephemeral localhost port with the default identity.
    pub fn start(handler: Arc<dyn CommandHandler>) -> Result<Self> {
        Self::bind(&format!("{}:0", LOCALHOST), handler, TerminalConfig::default())
    }

    /// Starts on `bind_addr` (e.g., `0.0.0.0:8222`).
    pub fn bind(
        bind_addr: &str,
        handler: Arc<dyn CommandHandler>,
        config: TerminalConfig,
    ) -> Result<Self> {
        let listener = TcpListener::bind(bind_addr)?;
        let local_addr = listener.local_addr()?;
        let subscribers: Subscribers = Arc::new(Mutex::new(Vec::new()));
        let shutdown = Arc::new(AtomicBool::new(false));

        {
            let subscribers = Arc::clone(&subscribers);
            let shutdown = Arc::clone(&shutdown);
            thread::Builder::new()
                .name("terminal-accept".to_string())
                .spawn(move || accept_loop(listener, handler, config, subscribers, shutdown))?;
        }
        info!("Terminal listening on {}", local_addr);

        Ok(Self {
            local_addr,
            subscribers,
            shutdown,
        })
    }

    /// Bound address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Bound port.
    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Announces a newly subscribed instrument.
    pub fn push_added(&self, quote: Option<MtQuote>) {
        self.broadcast(Push::Frame(ServerFrame::QuoteAdded { quote }));
    }

    /// Announces a price change.
    pub fn push_updated(&self, quote: Option<MtQuote>) {
        self.broadcast(Push::Frame(ServerFrame::QuoteUpdated { quote }));
    }

    /// Announces an unsubscribed instrument.
    pub fn push_removed(&self, quote: Option<MtQuote>) {
        self.broadcast(Push::Frame(ServerFrame::QuoteRemoved { quote }));
    }

    /// Writes `line` verbatim to every client.
    pub fn push_raw(&self, line: &str) {
        self.broadcast(Push::Raw(line.to_string()));
    }

    /// Says goodbye to every client and closes their sessions.
    pub fn disconnect_all(&self) {
        self.broadcast(Push::Close);
    }

    /// Drops every client connection without a goodbye.
    pub fn abort_all(&self) {
        self.broadcast(Push::Abort);
    }

    /// Stops accepting and closes every session.
    pub fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }
        self.disconnect_all();
        // Unblocks the accept call.
        let _ = TcpStream::connect(self.local_addr);
        info!("Terminal on {} stopped", self.local_addr);
    }

    fn broadcast(&self, push: Push) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| tx.send(push.clone()).is_ok());
        debug!("Push delivered to {} session(s)", subscribers.len());
    }
}

impl Drop for MockTerminal {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Accepts clients until shutdown. A failing client never stops the loop.
fn accept_loop(
    listener: TcpListener,
    handler: Arc<dyn CommandHandler>,
    config: TerminalConfig,
    subscribers: Subscribers,
    shutdown: Arc<AtomicBool>,
) {
    for stream in listener.incoming() {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        match stream {
            Ok(stream) => {
                let (push_tx, push_rx) = unbounded::<Push>();
                subscribers
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(push_tx);

                let handler = Arc::clone(&handler);
                let config = config.clone();
                thread::spawn(move || {
                    if let Err(e) = run_session(stream, handler, config, push_rx) {
                        error!("Session error: {}", e);
                    }
                });
            }
            Err(e) => error!("TCP connection error: {}", e),
        }
    }
    debug!("Accept loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::SimulatedTerminal;
    use mtapi_common::frame::{write_frame, ClientFrame, FrameReader};
    use mtapi_common::{Command, MtCommandType, ResponseEnvelope};
    use std::io::BufReader;
    use std::time::Duration;

    fn open(terminal: &MockTerminal) -> (TcpStream, FrameReader<BufReader<TcpStream>>) {
        let stream = TcpStream::connect(terminal.local_addr()).unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        let reader = FrameReader::new(BufReader::new(stream.try_clone().unwrap()));
        (stream, reader)
    }

    fn hello(stream: &mut TcpStream, reader: &mut FrameReader<BufReader<TcpStream>>) {
        write_frame(
            stream,
            &ClientFrame::Hello {
                protocol_version: PROTOCOL_VERSION,
                client: "test".to_string(),
            },
        )
        .unwrap();
        match reader.read_frame::<ServerFrame>().unwrap() {
            Some(ServerFrame::Welcome {
                protocol_version, ..
            }) => assert_eq!(protocol_version, PROTOCOL_VERSION),
            other => panic!("expected Welcome, got {:?}", other),
        }
    }

    #[test]
    fn handshake_request_and_push() {
        let terminal = MockTerminal::start(Arc::new(SimulatedTerminal::new())).unwrap();
        let (mut stream, mut reader) = open(&terminal);
        hello(&mut stream, &mut reader);

        write_frame(
            &mut stream,
            &ClientFrame::Request {
                id: 42,
                command: Command::bare(MtCommandType::AccountLeverage),
            },
        )
        .unwrap();
        assert_eq!(
            reader.read_frame::<ServerFrame>().unwrap(),
            Some(ServerFrame::Response {
                id: 42,
                response: Some(ResponseEnvelope::Int(100)),
            })
        );

        let quote = MtQuote {
            instrument: "EURUSD".to_string(),
            bid: 1.1,
            ask: 1.1002,
        };
        terminal.push_updated(Some(quote.clone()));
        assert_eq!(
            reader.read_frame::<ServerFrame>().unwrap(),
            Some(ServerFrame::QuoteUpdated { quote: Some(quote) })
        );

        terminal.disconnect_all();
        assert_eq!(reader.read_frame::<ServerFrame>().unwrap(), Some(ServerFrame::Goodbye));
        assert_eq!(reader.read_frame::<ServerFrame>().unwrap(), None);
    }

    #[test]
    fn session_without_hello_is_dropped() {
        let terminal = MockTerminal::start(Arc::new(SimulatedTerminal::new())).unwrap();
        let (mut stream, mut reader) = open(&terminal);
        write_frame(&mut stream, &ClientFrame::GetQuotes { id: 1 }).unwrap();
        assert!(!matches!(reader.read_frame::<ServerFrame>(), Ok(Some(_))));
    }
}
