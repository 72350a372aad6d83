//! MtApi demo client: connects to a terminal, prints an account summary and
//! streams quote updates to the log until interrupted.
//!
//! Usage example (CLI):
//! ```bash
//! mtapi_client --host 192.168.0.10 --port 8222 --period m15
//! ```
#![warn(missing_docs)]
mod args;

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use crossbeam_channel::{unbounded, RecvTimeoutError};
use log::{error, info, warn};
use mtapi_client::{ClientConfig, ConnectionState, MtApiClient, MtApiError, Result};

use crate::args::Args;

const CONNECT_WAIT: Duration = Duration::from_secs(30);

fn main() -> Result<()> {
    init_logger();
    let args = Args::parse();
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            info!("Ctrl+C received. Shutting down client...");
            shutdown.store(true, Ordering::SeqCst);
        })
        .map_err(|e| MtApiError::Io(io::Error::other(e)))?;
    }

    let mut config = ClientConfig::default();
    if args.command_timeout > 0 {
        config = config.with_command_timeout(Duration::from_secs(args.command_timeout));
    }
    let client = MtApiClient::with_config(config);

    let (state_tx, state_rx) = unbounded();
    client.on_connection_state_changed(move |event| {
        info!("{}", event);
        let _ = state_tx.send(event.state);
    });
    client.on_quote_added(|quote| info!("ADDED: {} bid={} ask={}", quote.instrument(), quote.bid(), quote.ask()));
    client.on_quote_removed(|quote| info!("REMOVED: {}", quote.instrument()));
    client.on_quote_updated(|symbol, bid, ask| info!("QUOTE: {} bid={} ask={}", symbol, bid, ask));

    if args.local {
        client.begin_connect_local(args.port);
    } else {
        client.begin_connect(args.host.trim(), args.port);
    }

    loop {
        match state_rx.recv_timeout(CONNECT_WAIT) {
            Ok(ConnectionState::Connected) => break,
            Ok(ConnectionState::Failed) => {
                return Err(MtApiError::ConnectFailure(
                    "terminal did not accept the connection".to_string(),
                ))
            }
            Ok(_) => continue,
            Err(RecvTimeoutError::Timeout) => {
                client.begin_disconnect();
                return Err(MtApiError::Timeout(CONNECT_WAIT));
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(MtApiError::ChannelRecv("state channel closed".to_string()))
            }
        }
    }

    print_summary(&client, &args);

    info!("Client is running. Press Ctrl+C to exit.");
    while !shutdown.load(Ordering::Relaxed) {
        if !client.is_connection_active() {
            warn!("Connection lost: {}", client.connection_state());
            break;
        }
        thread::sleep(Duration::from_millis(200));
    }

    client.begin_disconnect();
    // Give the disconnect a moment to reach the terminal before exiting.
    match state_rx.recv_timeout(Duration::from_secs(2)) {
        Ok(state) => info!("Final state: {}", state),
        Err(_) => error!("Terminal did not confirm the disconnect"),
    }
    Ok(())
}

fn print_summary(client: &MtApiClient, args: &Args) {
    info!(
        "Terminal: {} ({}), connected to trade server: {}",
        client.terminal_name(),
        client.terminal_company(),
        client.is_connected()
    );
    info!(
        "Account {} '{}' at {}: balance={:.2} equity={:.2} {}",
        client.account_number(),
        client.account_name(),
        client.account_server(),
        client.account_balance(),
        client.account_equity(),
        client.account_currency()
    );
    info!("Open orders: {}", client.orders_total());

    for quote in client.get_quotes() {
        let symbol = quote.instrument();
        info!(
            "{}: bid={} ask={} spread={:.5} bars({})={} last close={}",
            symbol,
            quote.bid(),
            quote.ask(),
            quote.spread(),
            args.period,
            client.i_bars(symbol, args.period),
            client.i_close(symbol, args.period, 0)
        );
    }
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
