//! Order side and the market order intent built per trade decision.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Direction of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            other => Err(EngineError::InvalidSide(other.to_string())),
        }
    }
}

/// A market order ready for submission. Constructed once per trade decision,
/// submitted, then discarded; no order state is retained in the core.
#[derive(Debug, Clone)]
pub struct OrderIntent {
    pub instrument: String,
    pub side: Side,
    pub units: u32,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// Trailing stop distance in pips.
    pub trailing_stop: u32,
}
