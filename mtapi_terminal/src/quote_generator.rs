//! Quote tick generator and event broadcasting.
//!
//! The `QuoteGenerator` runs a background thread that walks the bid of every
//! instrument and broadcasts the new quotes to all subscribers using
//! `crossbeam_channel`. Subscribers register by sending a `Sender<QuoteEvent>`
//! to the channel returned by `QuoteGenerator::start`. A subscriber whose
//! channel is closed is dropped from the list.
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{unbounded, Sender};
use log::{debug, info};
use mtapi_common::MtQuote;
use rand::Rng;

/// Message sent by the generator to its subscribers.
#[derive(Debug, Clone)]
pub enum QuoteEvent {
    /// New tick for one instrument.
    Quote(MtQuote),
    /// The generator is stopping.
    Shutdown,
}

/// Next bid of a small random walk around `bid`, rounded to `digits`.
///
/// The relative change is sampled uniformly from `[-0.05%, +0.05%]`; the
/// result never drops below one point.
pub fn next_price(bid: f64, digits: i32) -> f64 {
    let mut rng = rand::rng();
    let change: f64 = rng.random_range(-0.0005..0.0005);
    let scale = 10f64.powi(digits);
    (bid * (1.0 + change) * scale).round().max(1.0) / scale
}

/// Price precision used for `bid`: three digits for yen-like prices, five otherwise.
pub fn digits_for(bid: f64) -> i32 {
    if bid >= 10.0 { 3 } else { 5 }
}

/// Moves `quote` one tick, keeping its spread.
pub fn next_quote(quote: &MtQuote) -> MtQuote {
    let digits = digits_for(quote.bid);
    let spread = quote.ask - quote.bid;
    let bid = next_price(quote.bid, digits);
    let scale = 10f64.powi(digits);
    MtQuote {
        instrument: quote.instrument.clone(),
        bid,
        ask: ((bid + spread) * scale).round() / scale,
    }
}

/// Background market data generator.
pub struct QuoteGenerator;

impl QuoteGenerator {
    /// Starts the generator thread over `seed` and returns the subscription channel.
    ///
    /// Every `interval` each instrument moves one tick. When `shutdown` is set,
    /// subscribers receive `QuoteEvent::Shutdown` and the thread exits.
    pub fn start(
        seed: Vec<MtQuote>,
        interval: Duration,
        shutdown: Arc<AtomicBool>,
    ) -> Sender<Sender<QuoteEvent>> {
        let (subscribe_tx, subscribe_rx) = unbounded::<Sender<QuoteEvent>>();

        thread::spawn(move || {
            let mut clients: Vec<Sender<QuoteEvent>> = Vec::new();
            let mut current: BTreeMap<String, MtQuote> = seed
                .into_iter()
                .map(|q| (q.instrument.clone(), q))
                .collect();

            info!(
                "Quote generator started for {} instrument(s)",
                current.len()
            );

            while !shutdown.load(Ordering::Relaxed) {
                while let Ok(new_client_tx) = subscribe_rx.try_recv() {
                    clients.push(new_client_tx);
                    debug!("Generator: subscriber added, total {}", clients.len());
                }

                for quote in current.values_mut() {
                    *quote = next_quote(quote);
                    let event = QuoteEvent::Quote(quote.clone());
                    clients.retain(|client_tx| client_tx.send(event.clone()).is_ok());
                }

                thread::sleep(interval);
            }

            for client_tx in &clients {
                let _ = client_tx.send(QuoteEvent::Shutdown);
            }
            info!("Quote generator stopped");
        });
        subscribe_tx
    }
}
