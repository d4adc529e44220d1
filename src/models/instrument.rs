//! Broker-reported instrument metadata.

use serde::{Deserialize, Serialize};

/// Trading parameters and state for one instrument, as reported by the
/// broker. Fetched at the start of each decision cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentMeta {
    /// Instrument code in `BASE_QUOTE` form, e.g. `USD_JPY`.
    pub instrument: String,

    #[serde(default)]
    pub display_name: String,

    /// Minimal price increment, e.g. 0.0001 for EUR_USD.
    pub pip: f64,

    /// Broker-side cap on order size.
    pub max_trade_units: u32,

    /// Smallest quotable price increment.
    #[serde(default)]
    pub precision: f64,

    /// Trailing stop bounds, in pips.
    pub min_trailing_stop: u32,
    pub max_trailing_stop: u32,

    /// Margin required per unit, as a fraction of notional.
    pub margin_rate: f64,

    /// Whether trading is currently unavailable for this instrument.
    pub halted: bool,
}

impl InstrumentMeta {
    /// Base and quote currencies split out of the instrument code.
    pub fn currency_pair(&self) -> Option<(&str, &str)> {
        self.instrument.split_once('_')
    }
}
