//! Client library for driving a remote trading terminal over TCP.
//!
//! The client issues typed commands to the terminal, tracks the connection
//! lifecycle and fans out live quote pushes to registered observers.
//!
//! ```no_run
//! use mtapi_client::{ConnectionState, MtApiClient};
//!
//! let client = MtApiClient::new();
//! client.on_connection_state_changed(|event| println!("{}", event));
//! client.on_quote_updated(|symbol, bid, ask| println!("{} {} {}", symbol, bid, ask));
//! client.begin_connect("127.0.0.1", 8222);
//! // ... wait for ConnectionState::Connected ...
//! if client.connection_state() == ConnectionState::Connected {
//!     println!("balance: {}", client.account_balance());
//! }
//! ```
#![warn(missing_docs)]
pub mod client;
pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod observer;
pub mod router;
pub mod shims;
pub mod transport;

pub use client::MtApiClient;
pub use config::{ClientConfig, ResolveMode};
pub use connection::{ConnectionEvent, ConnectionState};
pub use observer::SubscriptionId;
pub use shims::OrderSendRequest;
pub use transport::{Endpoint, SessionId, TcpTransport, Transport, TransportEvent};

pub use mtapi_common::color::Color;
pub use mtapi_common::types;
pub use mtapi_common::{Command, MtApiError, MtCommandType, Quote, Result, Value};
