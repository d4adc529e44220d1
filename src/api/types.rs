//! Wire types for the OANDA v1 REST API.
//!
//! Numeric-looking fields that OANDA serves as strings (pip, precision) are
//! deserialized as strings and parsed when converting to the core models.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::models::InstrumentMeta;

/// GET /v1/accounts/{accountId}
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub account_currency: String,
    pub margin_avail: f64,
    pub margin_used: f64,
    #[serde(default)]
    pub balance: f64,
}

/// GET /v1/instruments with no field selection, used for listing codes.
#[derive(Debug, Clone, Deserialize)]
pub struct InstrumentListResponse {
    pub instruments: Vec<InstrumentName>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstrumentName {
    pub instrument: String,
}

/// GET /v1/instruments with the full field selection.
#[derive(Debug, Clone, Deserialize)]
pub struct InstrumentMetaResponse {
    pub instruments: Vec<InstrumentField>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentField {
    pub instrument: String,
    #[serde(default)]
    pub display_name: String,
    pub pip: String,
    pub max_trade_units: u32,
    #[serde(default)]
    pub precision: String,
    pub min_trailing_stop: f64,
    pub max_trailing_stop: f64,
    pub margin_rate: f64,
    pub halted: bool,
}

impl InstrumentField {
    pub fn into_meta(self) -> Result<InstrumentMeta> {
        let pip: f64 = self
            .pip
            .parse()
            .with_context(|| format!("bad pip {:?} for {}", self.pip, self.instrument))?;
        let precision: f64 = if self.precision.is_empty() {
            0.0
        } else {
            self.precision.parse().with_context(|| {
                format!("bad precision {:?} for {}", self.precision, self.instrument)
            })?
        };
        Ok(InstrumentMeta {
            instrument: self.instrument,
            display_name: self.display_name,
            pip,
            max_trade_units: self.max_trade_units,
            precision,
            min_trailing_stop: self.min_trailing_stop as u32,
            max_trailing_stop: self.max_trailing_stop as u32,
            margin_rate: self.margin_rate,
            halted: self.halted,
        })
    }
}

/// GET /v1/prices
#[derive(Debug, Clone, Deserialize)]
pub struct PricesResponse {
    pub prices: Vec<PriceTick>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceTick {
    pub instrument: String,
    pub time: DateTime<Utc>,
    pub bid: f64,
    pub ask: f64,
}

/// GET /v1/candles?candleFormat=midpoint
#[derive(Debug, Clone, Deserialize)]
pub struct CandlesResponse {
    pub instrument: String,
    #[serde(default)]
    pub granularity: String,
    pub candles: Vec<MidpointCandle>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MidpointCandle {
    pub time: DateTime<Utc>,
    pub close_mid: f64,
    #[serde(default)]
    pub volume: i64,
    #[serde(default)]
    pub complete: bool,
}

/// POST /v1/accounts/{accountId}/orders
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreateResponse {
    pub instrument: String,
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub trade_opened: Option<TradeOpened>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeOpened {
    pub id: i64,
    #[serde(default)]
    pub units: u32,
    #[serde(default)]
    pub side: String,
    #[serde(default)]
    pub take_profit: f64,
    #[serde(default)]
    pub stop_loss: f64,
    #[serde(default)]
    pub trailing_stop: f64,
}
