//! Quote records.
//!
//! `MtQuote` is the record as the terminal pushes it; `Quote` is the immutable
//! snapshot handed to application observers.
use serde::{Deserialize, Serialize};

/// Quote record as carried on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MtQuote {
    /// Instrument symbol (e.g., `EURUSD`).
    pub instrument: String,
    /// Bid price.
    pub bid: f64,
    /// Ask price.
    pub ask: f64,
}

/// Public bid/ask snapshot for one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    instrument: String,
    bid: f64,
    ask: f64,
}

impl Quote {
    /// Creates a snapshot.
    pub fn new(instrument: impl Into<String>, bid: f64, ask: f64) -> Self {
        Quote {
            instrument: instrument.into(),
            bid,
            ask,
        }
    }

    /// Instrument symbol.
    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    /// Bid price.
    pub fn bid(&self) -> f64 {
        self.bid
    }

    /// Ask price.
    pub fn ask(&self) -> f64 {
        self.ask
    }

    /// Ask minus bid.
    pub fn spread(&self) -> f64 {
        self.ask - self.bid
    }
}

impl From<MtQuote> for Quote {
    fn from(record: MtQuote) -> Self {
        Quote {
            instrument: record.instrument,
            bid: record.bid,
            ask: record.ask,
        }
    }
}
