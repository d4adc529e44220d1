//! Broker capability trait.
//!
//! The decision core holds a `Broker` and is otherwise independent of
//! transport and authentication, so tests can substitute a deterministic
//! in-memory broker without touching decision logic. Broker failures are
//! never caught or retried by the core; they propagate out of the evaluation
//! cycle and abort the loop.

use std::collections::HashMap;
use std::fmt;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{InstrumentMeta, OrderIntent, Quote, Side};

/// Account currency and margin figures, fetched fresh each cycle.
#[derive(Debug, Clone)]
pub struct AccountSummary {
    pub currency: String,
    pub margin_avail: f64,
    pub margin_used: f64,
}

/// Record echoed by the broker after a market order was accepted. Displayed
/// and discarded; the broker is the durable store for open trades.
#[derive(Debug, Clone)]
pub struct OrderConfirmation {
    pub instrument: String,
    pub side: Side,
    pub units: u32,
    /// Fill price reported by the broker.
    pub price: f64,
    pub time: DateTime<Utc>,
    /// Id of the trade the order opened, when the broker reports one.
    pub trade_id: Option<i64>,
}

impl fmt::Display for OrderConfirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "instrument: {}\nside: {}\nunits: {}\nprice: {}\ntime: {}",
            self.instrument, self.side, self.units, self.price, self.time
        )?;
        if let Some(id) = self.trade_id {
            write!(f, "\ntrade: {id}")?;
        }
        Ok(())
    }
}

/// Operations the decision core needs from a broker.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Account currency and current margin state.
    async fn account(&self) -> Result<AccountSummary>;

    /// Codes of every instrument tradable on the account.
    async fn instrument_list(&self) -> Result<Vec<String>>;

    /// Trading parameters for one instrument, including the halted flag.
    async fn instrument_meta(&self, instrument: &str) -> Result<InstrumentMeta>;

    /// Current bid/ask for the given instruments, keyed by instrument code.
    async fn quotes(&self, instruments: &[String]) -> Result<HashMap<String, Quote>>;

    /// The most recent `count` midpoint closes, oldest first. Callers treat
    /// any other length as a window size mismatch.
    async fn midpoint_history(
        &self,
        instrument: &str,
        granularity: &str,
        count: usize,
    ) -> Result<Vec<f64>>;

    /// Submit a market order.
    async fn submit_order(&self, intent: &OrderIntent) -> Result<OrderConfirmation>;
}
