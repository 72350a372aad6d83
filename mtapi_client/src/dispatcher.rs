//! Command dispatcher: one round trip per call on the shared transport.
//!
//! The dispatcher holds no state beyond the transport handle and a read-only
//! view of the connection state. It never retries; a failed call is reported
//! to its caller, which decides what to do.
use std::sync::Arc;

use log::debug;
use mtapi_common::response::{resolve, resolve_strict};
use mtapi_common::{Command, FromResponse, MtApiError, ResponseEnvelope, Result};

use crate::config::ResolveMode;
use crate::connection::{ConnectionState, StateCell};
use crate::transport::Transport;

/// Sends commands and resolves their replies.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    state: StateCell,
    mode: ResolveMode,
}

impl Dispatcher {
    /// Creates a dispatcher gated on `state`.
    pub fn new(transport: Arc<dyn Transport>, state: StateCell, mode: ResolveMode) -> Self {
        Self {
            transport,
            state,
            mode,
        }
    }

    /// Sends `command` and returns the raw reply envelope.
    ///
    /// Fails with `ChannelUnavailable` when the connection is not in the
    /// `Connected` state or the channel drops mid-call.
    pub fn send(&self, command: &Command) -> Result<Option<ResponseEnvelope>> {
        let state = self.state.get();
        if state != ConnectionState::Connected {
            return Err(MtApiError::ChannelUnavailable(format!(
                "{} sent while {}",
                command.operation, state
            )));
        }
        debug!(
            "-> {} ({} parameter(s))",
            command.operation,
            command.parameters.len()
        );
        let reply = self.transport.send_request(command).map_err(|e| match e {
            MtApiError::ChannelUnavailable(_) | MtApiError::Timeout(_) => e,
            other => MtApiError::ChannelUnavailable(other.to_string()),
        })?;
        debug!(
            "<- {} {}",
            command.operation,
            reply.as_ref().map_or("(empty)", ResponseEnvelope::shape)
        );
        Ok(reply)
    }

    /// Sends `command` and converts the reply to `T`.
    ///
    /// Channel failures are always errors. A shape mismatch yields
    /// `T::default()` in lenient mode and `ResponseMismatch` in strict mode.
    pub fn call<T: FromResponse>(&self, command: &Command) -> Result<T> {
        let reply = self.send(command)?;
        match self.mode {
            ResolveMode::Lenient => Ok(resolve(reply.as_ref())),
            ResolveMode::Strict => resolve_strict(reply.as_ref()),
        }
    }

    /// Legacy behaviour: every failure collapses to `T::default()`.
    pub fn call_or_default<T: FromResponse>(&self, command: &Command) -> T {
        match self.send(command) {
            Ok(reply) => resolve(reply.as_ref()),
            Err(e) => {
                debug!("{} returned default: {}", command.operation, e);
                T::default()
            }
        }
    }
}
