//! Common types shared by the terminal client and the simulated terminal.
//!
//! This crate aggregates:
//! - `error`: unified error type `MtApiError` used across the workspace.
//! - `result`: handy `Result<T, MtApiError>` alias.
//! - `command_type`: the versioned operation catalogue.
//! - `value`, `command`: command envelopes sent to the terminal.
//! - `response`: reply envelopes and the type resolver.
//! - `quote`: wire and public quote records.
//! - `frame`: line-delimited JSON frames on the channel.
//! - `time`, `color`, `types`: terminal encodings used by typed operations.
//! - `net`: networking constants and small helpers.
#![warn(missing_docs)]
pub mod color;
pub mod command;
pub mod command_type;
pub mod error;
pub mod frame;
pub mod net;
pub mod quote;
pub mod response;
pub mod result;
pub mod time;
pub mod types;
pub mod value;

pub use command::Command;
pub use command_type::MtCommandType;
pub use error::MtApiError;
pub use quote::{MtQuote, Quote};
pub use response::{FromResponse, ResponseEnvelope};
pub use result::Result;
pub use value::Value;
