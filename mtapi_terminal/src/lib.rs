//! Simulated trading terminal speaking the MtApi wire protocol.
//!
//! It wires together the same building blocks as a small streaming server:
//!
//! - `MockTerminal` accepts TCP connections and owns one session per client.
//! - Each session answers the handshake, executes commands through a
//!   `CommandHandler` and forwards broadcast quote pushes to its client.
//! - `SimulatedTerminal` is a stateful handler with an account, orders,
//!   global variables, quotes and synthetic bars.
//! - `QuoteGenerator` produces random-walk quote ticks for the standalone binary.
//!
//! Client integration tests run a `MockTerminal` on an ephemeral localhost port.
#![warn(missing_docs)]
pub mod quote_generator;
pub mod server;
pub mod session;
pub mod simulator;

pub use server::{MockTerminal, TerminalConfig};
pub use session::{CommandHandler, Push};
pub use simulator::SimulatedTerminal;
