//! Bid/ask quote for a single instrument.

use serde::{Deserialize, Serialize};

/// A bid/ask snapshot. Fetched fresh each decision cycle, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    /// Instrument code, e.g. `EUR_USD`.
    pub instrument: String,

    pub bid: f64,

    pub ask: f64,

    /// ask - bid, fixed at construction.
    pub spread: f64,
}

impl Quote {
    pub fn new(instrument: impl Into<String>, bid: f64, ask: f64) -> Self {
        Self {
            instrument: instrument.into(),
            bid,
            ask,
            spread: ask - bid,
        }
    }
}
