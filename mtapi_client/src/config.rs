//! Client configuration.
use std::time::Duration;

/// How typed calls react to a reply whose shape does not fit the requested type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResolveMode {
    /// Return the type's default value (the terminal's weakly typed contract).
    #[default]
    Lenient,
    /// Return `MtApiError::ResponseMismatch`.
    Strict,
}

/// Tunables for the client and its TCP transport.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Upper bound for establishing the TCP connection.
    pub connect_timeout: Duration,
    /// Upper bound for the terminal's answer to the greeting.
    pub handshake_timeout: Duration,
    /// Upper bound for a single command round trip. `None` waits until the
    /// reply arrives or the channel fails.
    pub command_timeout: Option<Duration>,
    /// Shape-mismatch policy for `MtApiClient::execute`.
    pub resolve_mode: ResolveMode,
    /// Name announced to the terminal in the greeting.
    pub client_name: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            handshake_timeout: Duration::from_secs(5),
            command_timeout: None,
            resolve_mode: ResolveMode::Lenient,
            client_name: format!("mtapi_client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Sets the TCP connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the handshake timeout.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Bounds every command round trip.
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    /// Sets the shape-mismatch policy.
    pub fn with_resolve_mode(mut self, mode: ResolveMode) -> Self {
        self.resolve_mode = mode;
        self
    }
}
