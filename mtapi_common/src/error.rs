//! Error types shared between the client and the simulated terminal.
//!
//! The `MtApiError` enum unifies the failure cases of the command channel:
//! socket I/O, frame (de)serialization, channel availability, handshake and
//! lock poisoning. Crates propagate it through the `Result` alias.
use std::io;
use std::sync::PoisonError;
use std::time::Duration;

use thiserror::Error;

/// Unified error type shared by client and terminal.
#[derive(Error, Debug)]
pub enum MtApiError {
    /// I/O error originating from sockets.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failure while encoding/decoding a JSON frame via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A command was issued while the channel is not connected, or the
    /// channel dropped while the command was in flight.
    #[error("Channel unavailable: {0}")]
    ChannelUnavailable(String),

    /// Opening the channel to the terminal failed.
    #[error("Connect failure: {0}")]
    ConnectFailure(String),

    /// The terminal answered the greeting with something unexpected.
    #[error("Handshake error: {0}")]
    Handshake(String),

    /// No reply arrived within the configured command timeout.
    #[error("No response within {0:?}")]
    Timeout(Duration),

    /// A frame violated the line protocol.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The reply shape cannot be converted to the requested type.
    #[error("Response mismatch: expected {expected}, found {found}")]
    ResponseMismatch {
        /// Requested Rust type.
        expected: &'static str,
        /// Shape actually received.
        found: &'static str,
    },

    /// Crossbeam/channel send failed (e.g., receiver dropped); contains a short context string.
    #[error("Channel send failed: {0}")]
    ChannelSend(String),

    /// Crossbeam/channel receive failed (e.g., sender closed); contains a short context string.
    #[error("Channel receive failed: {0}")]
    ChannelRecv(String),

    /// Error indicating a poisoned mutex/lock was encountered.
    #[error("Mutex Lock Poisoned: {0}")]
    MutexLock(String),
}

impl<T> From<PoisonError<T>> for MtApiError {
    fn from(err: PoisonError<T>) -> Self {
        MtApiError::MutexLock(err.to_string())
    }
}

impl MtApiError {
    /// True for errors that mean "the channel is not usable right now".
    pub fn is_channel_unavailable(&self) -> bool {
        matches!(
            self,
            MtApiError::ChannelUnavailable(_) | MtApiError::Io(_) | MtApiError::ChannelRecv(_)
        )
    }
}
