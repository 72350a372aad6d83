//! The application-facing client handle.
//!
//! Wires the connection state machine, the command dispatcher and the quote
//! router around one transport. A pump thread drains the transport's
//! notification channel: quote pushes go to the router in arrival order,
//! health notices go to the state machine.
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender};
use log::{debug, error, warn};
use mtapi_common::{Command, FromResponse, MtCommandType, Quote, Result, Value};

use crate::config::ClientConfig;
use crate::connection::{ConnectionEvent, ConnectionManager, ConnectionState};
use crate::dispatcher::Dispatcher;
use crate::observer::SubscriptionId;
use crate::router::QuoteRouter;
use crate::transport::{Endpoint, TcpTransport, Transport, TransportEvent};

/// Client for a remote trading terminal.
///
/// All methods take `&self` and may be called from any thread. Connecting and
/// disconnecting return immediately; completion is reported through
/// `on_connection_state_changed`.
pub struct MtApiClient {
    connection: ConnectionManager,
    dispatcher: Dispatcher,
    router: Arc<QuoteRouter>,
    transport: Arc<dyn Transport>,
    pump_stop: Sender<()>,
}

impl Default for MtApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MtApiClient {
    /// Client with default settings over TCP.
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Client over TCP with custom settings.
    pub fn with_config(config: ClientConfig) -> Self {
        let (events_tx, events_rx) = unbounded();
        let transport = Arc::new(TcpTransport::new(config.clone(), events_tx));
        Self::with_transport(transport, events_rx, config)
    }

    /// Client over any transport. `events` must receive that transport's notifications.
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        events: Receiver<TransportEvent>,
        config: ClientConfig,
    ) -> Self {
        let connection = ConnectionManager::new(Arc::clone(&transport));
        let dispatcher = Dispatcher::new(
            Arc::clone(&transport),
            connection.state_cell(),
            config.resolve_mode,
        );
        let router = Arc::new(QuoteRouter::new());

        let (pump_stop, stop_rx) = bounded::<()>(1);
        let pump_router = Arc::clone(&router);
        let pump_connection = connection.clone();
        if let Err(e) = thread::Builder::new()
            .name("mtapi-events".to_string())
            .spawn(move || pump_events(events, stop_rx, pump_router, pump_connection))
        {
            error!("Failed to start transport event pump: {}", e);
        }

        Self {
            connection,
            dispatcher,
            router,
            transport,
            pump_stop,
        }
    }

    /// Starts connecting to `host:port` in the background.
    pub fn begin_connect(&self, host: &str, port: u16) {
        self.connection.begin_connect(Endpoint::Remote {
            host: host.to_string(),
            port,
        });
    }

    /// Starts connecting to `port` on the local machine in the background.
    pub fn begin_connect_local(&self, port: u16) {
        self.connection.begin_connect(Endpoint::Local { port });
    }

    /// Starts disconnecting in the background.
    pub fn begin_disconnect(&self) {
        self.connection.begin_disconnect();
    }

    /// Current connection state. Does not contact the terminal.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// True while the state is `Connected`. Does not contact the terminal;
    /// see `is_connected` for the terminal's own view.
    pub fn is_connection_active(&self) -> bool {
        self.connection_state() == ConnectionState::Connected
    }

    /// Quotes currently subscribed on the terminal. Empty when not connected.
    pub fn get_quotes(&self) -> Vec<Quote> {
        if !self.is_connection_active() {
            return Vec::new();
        }
        match self.transport.get_quotes() {
            Ok(records) => records.into_iter().map(Quote::from).collect(),
            Err(e) => {
                warn!("Quote list unavailable: {}", e);
                Vec::new()
            }
        }
    }

    /// Observes price updates as `(instrument, bid, ask)`.
    pub fn on_quote_updated(
        &self,
        observer: impl Fn(&str, f64, f64) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.router.on_updated(observer)
    }

    /// Observes instruments added to the terminal's quote registry.
    pub fn on_quote_added(
        &self,
        observer: impl Fn(&Quote) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.router.on_added(observer)
    }

    /// Observes instruments removed from the terminal's quote registry.
    pub fn on_quote_removed(
        &self,
        observer: impl Fn(&Quote) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.router.on_removed(observer)
    }

    /// Observes connection state changes.
    pub fn on_connection_state_changed(
        &self,
        observer: impl Fn(&ConnectionEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.connection.subscribe(observer)
    }

    /// Removes any observer registered through this client.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.router.unsubscribe(id) || self.connection.unsubscribe(id)
    }

    /// Sends an arbitrary operation and reports failures.
    ///
    /// Channel failures are errors; shape mismatches follow
    /// `ClientConfig::resolve_mode`.
    pub fn execute<T: FromResponse>(
        &self,
        operation: MtCommandType,
        parameters: Vec<Value>,
    ) -> Result<T> {
        self.dispatcher.call(&Command::new(operation, parameters))
    }

    /// Sends an arbitrary operation; any failure yields `T::default()`.
    pub fn send_command<T: FromResponse>(
        &self,
        operation: MtCommandType,
        parameters: Vec<Value>,
    ) -> T {
        self.invoke(Command::new(operation, parameters))
    }

    pub(crate) fn invoke<T: FromResponse>(&self, command: Command) -> T {
        self.dispatcher.call_or_default(&command)
    }
}

impl Drop for MtApiClient {
    fn drop(&mut self) {
        let _ = self.pump_stop.try_send(());
        self.connection.shutdown();
    }
}

/// Drains transport notifications until the client is dropped.
fn pump_events(
    events: Receiver<TransportEvent>,
    stop_rx: Receiver<()>,
    router: Arc<QuoteRouter>,
    connection: ConnectionManager,
) {
    loop {
        select! {
            recv(stop_rx) -> _ => break,
            recv(events) -> msg => match msg {
                Ok(TransportEvent::QuoteAdded(record)) => router.quote_added(record),
                Ok(TransportEvent::QuoteUpdated(record)) => router.quote_updated(record),
                Ok(TransportEvent::QuoteRemoved(record)) => router.quote_removed(record),
                Ok(TransportEvent::ServerDisconnected { session }) => {
                    connection.remote_closed(session)
                }
                Ok(TransportEvent::ServerFailed { session, reason }) => {
                    connection.remote_failed(session, reason)
                }
                Err(_) => break,
            }
        }
    }
    debug!("Transport event pump stopped");
}
