//! Simulated MtApi terminal.
//!
//! Listens for MtApi clients, answers their commands from an in-memory demo
//! account and streams random-walk quotes to every connected client.
//!
//! Usage example (CLI):
//! ```bash
//! mtapi_terminal --port 8222 --interval-ms 250 --symbols EURUSD,USDJPY
//! ```
#![warn(missing_docs)]
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossbeam_channel::unbounded;
use log::{info, warn};
use mtapi_common::net::{addr, DEFAULT_PORT};
use mtapi_common::{MtApiError, MtQuote, Result};
use mtapi_terminal::quote_generator::{QuoteEvent, QuoteGenerator};
use mtapi_terminal::session::CommandHandler;
use mtapi_terminal::{MockTerminal, SimulatedTerminal, TerminalConfig};

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Interface to listen on.
    #[clap(long, default_value = "0.0.0.0")]
    bind: String,

    /// Port to listen on.
    #[clap(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Milliseconds between quote ticks.
    #[clap(long, default_value_t = 500)]
    interval_ms: u64,

    /// Instruments to quote, separated by commas. Defaults to every simulated instrument.
    #[clap(long, value_delimiter = ',')]
    symbols: Vec<String>,
}

fn main() -> Result<()> {
    init_logger();
    let args = Args::parse();
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            info!("Ctrl+C received. Shutting down terminal...");
            shutdown.store(true, Ordering::SeqCst);
        })
        .map_err(|e| MtApiError::Io(io::Error::other(e)))?;
    }

    let simulator = Arc::new(SimulatedTerminal::new());
    let seed = select_symbols(&simulator, &args.symbols);
    if seed.is_empty() {
        warn!("No known instruments selected; no quotes will be streamed");
    }

    let terminal = MockTerminal::bind(
        &addr(args.bind.trim(), args.port),
        simulator.clone(),
        TerminalConfig::default(),
    )?;

    let subscription_tx = QuoteGenerator::start(
        seed,
        Duration::from_millis(args.interval_ms.max(1)),
        shutdown.clone(),
    );
    let (ticks_tx, ticks_rx) = unbounded::<QuoteEvent>();
    subscription_tx
        .send(ticks_tx)
        .map_err(|e| MtApiError::ChannelSend(e.to_string()))?;

    info!("Terminal is running on {}. Press Ctrl+C to exit.", terminal.local_addr());
    for event in ticks_rx.iter() {
        match event {
            QuoteEvent::Quote(quote) => {
                simulator.set_quote(quote.clone());
                terminal.push_updated(Some(quote));
            }
            QuoteEvent::Shutdown => break,
        }
    }

    terminal.shutdown();
    Ok(())
}

/// Keeps only the requested instruments on the simulator and returns them.
fn select_symbols(simulator: &SimulatedTerminal, symbols: &[String]) -> Vec<MtQuote> {
    let quotes = simulator.quotes();
    if symbols.is_empty() {
        return quotes;
    }
    let wanted: Vec<String> = symbols.iter().map(|s| s.trim().to_uppercase()).collect();
    for symbol in &wanted {
        if simulator.quote(symbol).is_none() {
            warn!("Unknown instrument {} skipped", symbol);
        }
    }
    quotes
        .into_iter()
        .filter(|q| {
            let keep = wanted.contains(&q.instrument);
            if !keep {
                simulator.remove_quote(&q.instrument);
            }
            keep
        })
        .collect()
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
