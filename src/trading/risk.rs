//! Volatility-derived order risk parameters.

use crate::models::{InstrumentMeta, Quote, Side};

use super::config::SigmaConfig;

/// Stop-loss and take-profit prices plus trailing stop distance in pips for
/// one order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskParams {
    pub stop_loss: f64,
    pub take_profit: f64,
    pub trailing_stop: u32,
}

/// Derive risk parameters from the window standard deviation.
///
/// The trailing stop is `ceil((std * sigma.trailing_stop + spread) / pip)`
/// clamped into the broker's `[min_trailing_stop, max_trailing_stop]`. Buys
/// anchor stop/profit on the ask, sells on the bid.
pub fn compute_risk(
    std: f64,
    side: Side,
    meta: &InstrumentMeta,
    quote: &Quote,
    sigma: &SigmaConfig,
) -> RiskParams {
    let trail_price = std * sigma.trailing_stop;
    let pips = ((trail_price + quote.spread) / meta.pip).ceil();
    let trailing_stop =
        (pips as i64).clamp(meta.min_trailing_stop as i64, meta.max_trailing_stop as i64) as u32;

    let stop_offset = std * sigma.stop_loss;
    let profit_offset = std * sigma.take_profit;
    let (stop_loss, take_profit) = match side {
        Side::Buy => (quote.ask - stop_offset, quote.ask + profit_offset),
        Side::Sell => (quote.bid + stop_offset, quote.bid - profit_offset),
    };

    RiskParams {
        stop_loss,
        take_profit,
        trailing_stop,
    }
}
