//! Shared networking constants and helpers used by client and terminal.

/// Default port the terminal-side expert listens on.
pub const DEFAULT_PORT: u16 = 8222;
/// Address used when connecting by port alone.
pub const LOCALHOST: &str = "127.0.0.1";

/// Helper to format an address with a port like "host:port".
pub fn addr(host: &str, port: u16) -> String {
    format!("{}:{}", host, port)
}
