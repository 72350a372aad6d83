//! Connection lifecycle.
//!
//! A single worker thread owns every state transition, so transitions are
//! totally ordered: connect and disconnect requests from the application and
//! health notices from the transport are queued and applied one at a time.
//! Observers are notified from a separate thread, in transition order, so a
//! slow or panicking observer never holds up the state machine.
//!
//! ```text
//!  Disconnected --connect--> Connecting --ok--> Connected
//!       ^   ^                    |                 |  |
//!       |   |                    +--error--> Failed |  |
//!       |   +-------- disconnect / remote close ----+  |
//!       |                               Failed <--------+ transport failure
//! ```
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, error, info, warn};
use strum_macros::Display;

use crate::observer::{ObserverRegistry, SubscriptionId};
use crate::transport::{Endpoint, SessionId, Transport};

/// Connection status as seen by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Default)]
pub enum ConnectionState {
    /// No channel (initial state).
    #[default]
    Disconnected,
    /// A connection attempt is in progress.
    Connecting,
    /// Commands can be sent.
    Connected,
    /// The last attempt or the live channel failed.
    Failed,
}

/// State-change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionEvent {
    /// State entered.
    pub state: ConnectionState,
    /// Human-readable reason.
    pub message: String,
}

impl fmt::Display for ConnectionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.state, self.message)
    }
}

/// Callback signature for state-change observers.
pub type ConnectionObserver = dyn Fn(&ConnectionEvent) + Send + Sync;

/// Snapshot-readable holder of the current state. Only the worker writes it.
#[derive(Clone, Default)]
pub struct StateCell(Arc<Mutex<ConnectionState>>);

impl StateCell {
    /// Current state; never blocks on I/O.
    pub fn get(&self) -> ConnectionState {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn replace(&self, next: ConnectionState) -> ConnectionState {
        let mut state = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *state, next)
    }

    #[cfg(test)]
    pub(crate) fn force(&self, state: ConnectionState) {
        self.replace(state);
    }
}

enum Job {
    Connect(Endpoint),
    Disconnect,
    RemoteClosed(SessionId),
    RemoteFailed(SessionId, String),
    Shutdown,
}

/// Handle to the connection state machine. Cloning shares the same machine.
#[derive(Clone)]
pub struct ConnectionManager {
    state: StateCell,
    jobs: Sender<Job>,
    observers: Arc<ObserverRegistry<ConnectionObserver>>,
}

impl ConnectionManager {
    /// Starts the worker and notifier threads.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let state = StateCell::default();
        let observers: Arc<ObserverRegistry<ConnectionObserver>> =
            Arc::new(ObserverRegistry::new());
        let (jobs_tx, jobs_rx) = unbounded::<Job>();
        let (notify_tx, notify_rx) = unbounded::<ConnectionEvent>();

        let notifier_observers = Arc::clone(&observers);
        if let Err(e) = thread::Builder::new()
            .name("mtapi-notifier".to_string())
            .spawn(move || deliver_notifications(notify_rx, notifier_observers))
        {
            error!("Failed to start connection notifier: {}", e);
        }

        let worker = ConnectionWorker {
            state: state.clone(),
            transport,
            notify: notify_tx,
            session: None,
        };
        if let Err(e) = thread::Builder::new()
            .name("mtapi-connection".to_string())
            .spawn(move || worker.run(jobs_rx))
        {
            error!("Failed to start connection worker: {}", e);
        }

        Self {
            state,
            jobs: jobs_tx,
            observers,
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Shared state cell, for components that gate on the state.
    pub fn state_cell(&self) -> StateCell {
        self.state.clone()
    }

    /// Queues a connection attempt and returns immediately.
    pub fn begin_connect(&self, endpoint: Endpoint) {
        self.submit(Job::Connect(endpoint));
    }

    /// Queues a disconnect and returns immediately.
    pub fn begin_disconnect(&self) {
        self.submit(Job::Disconnect);
    }

    /// Transport reported a graceful close of `session` by the terminal.
    pub fn remote_closed(&self, session: SessionId) {
        self.submit(Job::RemoteClosed(session));
    }

    /// Transport reported a failure of `session`.
    pub fn remote_failed(&self, session: SessionId, reason: String) {
        self.submit(Job::RemoteFailed(session, reason));
    }

    /// Registers a state-change observer.
    pub fn subscribe(
        &self,
        observer: impl Fn(&ConnectionEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.observers.register(Arc::new(observer))
    }

    /// Removes a state-change observer.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers.unregister(id)
    }

    /// Stops the worker after the jobs already queued; closes a live channel.
    pub fn shutdown(&self) {
        self.submit(Job::Shutdown);
    }

    fn submit(&self, job: Job) {
        if self.jobs.send(job).is_err() {
            warn!("Connection worker is not running; request dropped");
        }
    }
}

struct ConnectionWorker {
    state: StateCell,
    transport: Arc<dyn Transport>,
    notify: Sender<ConnectionEvent>,
    /// Channel opened by the last successful connect, while it is live.
    session: Option<SessionId>,
}

impl ConnectionWorker {
    fn run(mut self, jobs: Receiver<Job>) {
        for job in jobs.iter() {
            match job {
                Job::Connect(endpoint) => self.connect(endpoint),
                Job::Disconnect => self.disconnect(),
                Job::RemoteClosed(session) => self.remote_closed(session),
                Job::RemoteFailed(session, reason) => self.remote_failed(session, reason),
                Job::Shutdown => {
                    if self.state.get() == ConnectionState::Connected {
                        self.transport.close();
                    }
                    break;
                }
            }
        }
        debug!("Connection worker stopped");
    }

    fn connect(&mut self, endpoint: Endpoint) {
        match self.state.get() {
            ConnectionState::Disconnected | ConnectionState::Failed => {}
            current => {
                warn!("Connect to {} ignored: already {}", endpoint, current);
                return;
            }
        }

        self.transition(
            ConnectionState::Connecting,
            format!("Connecting to {}", endpoint),
        );
        match self.transport.open(&endpoint) {
            Ok(session) => {
                self.session = Some(session);
                self.transition(
                    ConnectionState::Connected,
                    format!("Connected to {}", endpoint),
                )
            }
            Err(e) => self.transition(
                ConnectionState::Failed,
                format!("Failed connection to {}. {}", endpoint, e),
            ),
        }
    }

    fn disconnect(&mut self) {
        self.session = None;
        match self.state.get() {
            ConnectionState::Connected => {
                self.transport.close();
                self.transition(ConnectionState::Disconnected, "Disconnected".to_string());
            }
            current => {
                // Nothing live to tear down, but release anything half-open.
                self.transport.close();
                debug!("Disconnect while {}: no transition", current);
            }
        }
    }

    /// True when `session` is the live channel; consumes it so that one
    /// channel ends at most once.
    fn take_live(&mut self, session: SessionId) -> bool {
        if self.state.get() == ConnectionState::Connected && self.session == Some(session) {
            self.session = None;
            true
        } else {
            false
        }
    }

    fn remote_closed(&mut self, session: SessionId) {
        if !self.take_live(session) {
            debug!("Stale remote close of session {} ignored", session);
            return;
        }
        self.transport.close();
        self.transition(
            ConnectionState::Disconnected,
            "MtApi is disconnected".to_string(),
        );
    }

    fn remote_failed(&mut self, session: SessionId, reason: String) {
        if !self.take_live(session) {
            debug!("Stale remote failure of session {} ignored: {}", session, reason);
            return;
        }
        self.transport.close();
        self.transition(
            ConnectionState::Failed,
            format!("Failed connection with MtApi. {}", reason),
        );
    }

    fn transition(&self, next: ConnectionState, message: String) {
        let previous = self.state.replace(next);
        info!("Connection {} -> {}: {}", previous, next, message);
        let event = ConnectionEvent {
            state: next,
            message,
        };
        if self.notify.send(event).is_err() {
            debug!("State notification dropped: notifier stopped");
        }
    }
}

fn deliver_notifications(
    events: Receiver<ConnectionEvent>,
    observers: Arc<ObserverRegistry<ConnectionObserver>>,
) {
    for event in events.iter() {
        observers.notify("connection-state", |observer| observer(&event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::RecvTimeoutError;
    use mtapi_common::{Command, MtApiError, MtQuote, ResponseEnvelope, Result};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Transport whose `open` succeeds or fails on demand. Sessions are
    /// numbered from 1 in open order.
    #[derive(Default)]
    struct ScriptedTransport {
        fail_open: bool,
        opens: AtomicUsize,
        closes: AtomicUsize,
    }

    impl Transport for ScriptedTransport {
        fn open(&self, _endpoint: &Endpoint) -> Result<SessionId> {
            let session = self.opens.fetch_add(1, Ordering::SeqCst) as SessionId + 1;
            if self.fail_open {
                Err(MtApiError::ConnectFailure("connection refused".to_string()))
            } else {
                Ok(session)
            }
        }

        fn close(&self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }

        fn send_request(&self, _command: &Command) -> Result<Option<ResponseEnvelope>> {
            Ok(None)
        }

        fn get_quotes(&self) -> Result<Vec<MtQuote>> {
            Ok(Vec::new())
        }
    }

    fn spawn_manager(transport: ScriptedTransport) -> (ConnectionManager, Receiver<ConnectionEvent>) {
        let manager = ConnectionManager::new(Arc::new(transport));
        let (tx, rx) = unbounded();
        manager.subscribe(move |event| {
            let _ = tx.send(event.clone());
        });
        (manager, rx)
    }

    fn next(rx: &Receiver<ConnectionEvent>) -> ConnectionEvent {
        rx.recv_timeout(Duration::from_secs(2))
            .expect("state notification")
    }

    fn endpoint() -> Endpoint {
        Endpoint::Remote {
            host: "192.168.1.2".to_string(),
            port: 8222,
        }
    }

    #[test]
    fn starts_disconnected() {
        let (manager, _rx) = spawn_manager(ScriptedTransport::default());
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn connect_then_disconnect() {
        let (manager, rx) = spawn_manager(ScriptedTransport::default());
        manager.begin_connect(endpoint());

        let connecting = next(&rx);
        assert_eq!(connecting.state, ConnectionState::Connecting);
        assert_eq!(connecting.message, "Connecting to 192.168.1.2:8222");
        let connected = next(&rx);
        assert_eq!(connected.state, ConnectionState::Connected);
        assert_eq!(manager.state(), ConnectionState::Connected);

        manager.begin_disconnect();
        let disconnected = next(&rx);
        assert_eq!(disconnected.state, ConnectionState::Disconnected);
        assert_eq!(disconnected.message, "Disconnected");
        assert!(matches!(
            rx.recv_timeout(Duration::from_millis(100)),
            Err(RecvTimeoutError::Timeout)
        ));
    }

    #[test]
    fn failed_open_reports_reason() {
        let transport = ScriptedTransport {
            fail_open: true,
            ..Default::default()
        };
        let (manager, rx) = spawn_manager(transport);
        manager.begin_connect(Endpoint::Local { port: 8222 });

        assert_eq!(next(&rx).state, ConnectionState::Connecting);
        let failed = next(&rx);
        assert_eq!(failed.state, ConnectionState::Failed);
        assert!(failed.message.starts_with("Failed connection to 'localhost':8222."));
        assert!(failed.message.contains("connection refused"));

        // Retry is allowed from Failed.
        manager.begin_connect(Endpoint::Local { port: 8222 });
        assert_eq!(next(&rx).state, ConnectionState::Connecting);
        assert_eq!(next(&rx).state, ConnectionState::Failed);
    }

    #[test]
    fn connect_while_connected_is_ignored() {
        let (manager, rx) = spawn_manager(ScriptedTransport::default());
        manager.begin_connect(endpoint());
        manager.begin_connect(endpoint());
        assert_eq!(next(&rx).state, ConnectionState::Connecting);
        assert_eq!(next(&rx).state, ConnectionState::Connected);
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn remote_health_events() {
        let (manager, rx) = spawn_manager(ScriptedTransport::default());
        manager.begin_connect(endpoint());
        next(&rx);
        next(&rx);

        manager.remote_closed(1);
        let closed = next(&rx);
        assert_eq!(closed.state, ConnectionState::Disconnected);
        assert_eq!(closed.message, "MtApi is disconnected");

        // Stale notices after the channel is gone change nothing.
        manager.remote_failed(1, "late".to_string());
        manager.remote_closed(1);
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        manager.begin_connect(endpoint());
        next(&rx);
        next(&rx);
        manager.remote_failed(2, "broken pipe".to_string());
        let failed = next(&rx);
        assert_eq!(failed.state, ConnectionState::Failed);
        assert!(failed.message.contains("broken pipe"));
    }

    #[test]
    fn late_notice_from_previous_session_is_ignored() {
        let transport = Arc::new(ScriptedTransport::default());
        let manager = ConnectionManager::new(Arc::clone(&transport) as Arc<dyn Transport>);
        let (tx, rx) = unbounded();
        manager.subscribe(move |event: &ConnectionEvent| {
            let _ = tx.send(event.clone());
        });

        manager.begin_connect(endpoint());
        next(&rx);
        next(&rx);
        manager.begin_disconnect();
        assert_eq!(next(&rx).state, ConnectionState::Disconnected);
        manager.begin_connect(endpoint());
        next(&rx);
        assert_eq!(next(&rx).state, ConnectionState::Connected);
        let closes = transport.closes.load(Ordering::SeqCst);

        // Session 1 ended before session 2 opened.
        manager.remote_closed(1);
        manager.remote_failed(1, "reset by peer".to_string());
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert_eq!(manager.state(), ConnectionState::Connected);
        assert_eq!(transport.closes.load(Ordering::SeqCst), closes);

        manager.remote_closed(2);
        assert_eq!(next(&rx).state, ConnectionState::Disconnected);
    }

    #[test]
    fn disconnect_when_idle_emits_nothing() {
        let (manager, rx) = spawn_manager(ScriptedTransport::default());
        manager.begin_disconnect();
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn slow_observer_does_not_block_transitions() {
        let manager = ConnectionManager::new(Arc::new(ScriptedTransport::default()));
        let (release_tx, release_rx) = unbounded::<()>();
        manager.subscribe(move |_| {
            let _ = release_rx.recv_timeout(Duration::from_secs(5));
        });
        manager.begin_connect(endpoint());

        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while manager.state() != ConnectionState::Connected {
            assert!(std::time::Instant::now() < deadline, "worker blocked by observer");
            thread::sleep(Duration::from_millis(5));
        }
        drop(release_tx);
    }
}
