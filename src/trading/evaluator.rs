//! Per-instrument decision cycle.
//!
//! One evaluation per instrument per cycle, gates evaluated strictly in
//! order: halted, margin sufficiency, spread, band breakout. Halted status
//! and margin gate all statistical work so no history is fetched for
//! instruments that cannot trade regardless of signal.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::Instant;
use tracing::debug;

use crate::api::{Broker, OrderConfirmation};
use crate::models::{MarginState, OrderIntent, Side, Window};

use super::config::TradeConfig;
use super::{risk, sizer, stats};

/// Why an instrument produced no order this cycle. These are normal
/// control-flow results, never errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Halted,
    InsufficientMargin,
    SpreadTooWide,
    NoSignal,
}

impl SkipReason {
    pub fn message(&self) -> &'static str {
        match self {
            SkipReason::Halted => "Skip for trading halted.",
            SkipReason::InsufficientMargin => "Skip for lack of margin.",
            SkipReason::SpreadTooWide => "Skip for large spread.",
            SkipReason::NoSignal => "Skip by the criteria.",
        }
    }
}

/// Outcome of one evaluation.
#[derive(Debug, Clone)]
pub enum Decision {
    /// An order was submitted.
    Entered {
        side: Side,
        units: u32,
        confirmation: OrderConfirmation,
    },
    Skip(SkipReason),
}

impl Decision {
    pub fn is_halted(&self) -> bool {
        matches!(self, Decision::Skip(SkipReason::Halted))
    }
}

/// Minimum elapsed time since evaluation start before the margin-dependent
/// step, and before the statistics-dependent step. Keeps broker polling
/// under external rate limits.
const MARGIN_STEP_PACE: Duration = Duration::from_millis(500);
const STATS_STEP_PACE: Duration = Duration::from_secs(1);

/// Evaluates instruments against the band model and submits market orders
/// on breakouts. Holds the broker by composition; account currency and the
/// instrument universe are fetched once at construction and are immutable
/// for the run.
pub struct SignalEvaluator<B> {
    broker: B,
    config: TradeConfig,
    account_currency: String,
    instrument_list: Vec<String>,
}

impl<B: Broker> SignalEvaluator<B> {
    pub async fn new(broker: B, config: TradeConfig) -> Result<Self> {
        let account = broker.account().await?;
        let instrument_list = broker.instrument_list().await?;
        debug!(
            currency = %account.currency,
            instruments = instrument_list.len(),
            "evaluator ready"
        );
        Ok(Self {
            broker,
            config,
            account_currency: account.currency,
            instrument_list,
        })
    }

    pub fn account_currency(&self) -> &str {
        &self.account_currency
    }

    #[cfg(test)]
    pub(crate) fn broker(&self) -> &B {
        &self.broker
    }

    /// Run one decision cycle for `instrument`.
    ///
    /// Broker failures and core errors (window size mismatch, missing
    /// conversion path) propagate; proceeding on partial market state before
    /// submitting an order is unsafe.
    pub async fn evaluate(&self, instrument: &str) -> Result<Decision> {
        let started = Instant::now();

        let meta = self.broker.instrument_meta(instrument).await?;
        debug!(instrument, halted = meta.halted, "instrument meta");
        if meta.halted {
            pace(started, MARGIN_STEP_PACE).await;
            return Ok(Decision::Skip(SkipReason::Halted));
        }

        let quotes = self.broker.quotes(&self.instrument_list).await?;
        let quote = quotes
            .get(instrument)
            .with_context(|| format!("no quote for {instrument}"))?
            .clone();

        pace(started, MARGIN_STEP_PACE).await;
        let account = self.broker.account().await?;
        let margin = MarginState {
            avail: account.margin_avail,
            used: account.margin_used,
        };
        let units = sizer::size(
            &meta,
            &quote,
            &quotes,
            &margin,
            &self.config.margin_ratio,
            &self.instrument_list,
            &self.account_currency,
        )?;
        debug!(instrument, units, "sized position");

        pace(started, STATS_STEP_PACE).await;
        if units == 0 {
            return Ok(Decision::Skip(SkipReason::InsufficientMargin));
        }

        let window_config = &self.config.model.window;
        let midpoints = self
            .broker
            .midpoint_history(instrument, &window_config.granularity, window_config.size)
            .await?;
        let window = Window {
            instrument: instrument.to_string(),
            midpoints,
        };
        let ws = stats::compute_stat(
            &window,
            window_config.size,
            self.config.model.sigma.entry_trigger,
        )?;
        debug!(instrument, last = ws.last, mean = ws.mean, std = ws.std, "window stat");

        let max_spread = ws.std * self.config.model.sigma.max_spread;
        if quote.spread > max_spread {
            return Ok(Decision::Skip(SkipReason::SpreadTooWide));
        }

        let side = if ws.last > ws.upper_bound {
            Some(Side::Buy)
        } else if ws.last < ws.lower_bound {
            Some(Side::Sell)
        } else {
            None
        };

        match side {
            Some(side) => {
                let risk = risk::compute_risk(ws.std, side, &meta, &quote, &self.config.model.sigma);
                let intent = OrderIntent {
                    instrument: instrument.to_string(),
                    side,
                    units,
                    stop_loss: risk.stop_loss,
                    take_profit: risk.take_profit,
                    trailing_stop: risk.trailing_stop,
                };
                let confirmation = self.broker.submit_order(&intent).await?;
                Ok(Decision::Entered {
                    side,
                    units,
                    confirmation,
                })
            }
            None => Ok(Decision::Skip(SkipReason::NoSignal)),
        }
    }
}

/// Wait until `min` has elapsed since `started`. No extra wait is added when
/// the preceding steps already took longer.
async fn pace(started: Instant, min: Duration) {
    let elapsed = started.elapsed();
    if elapsed < min {
        tokio::time::sleep(min - elapsed).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FakeBroker;
    use crate::models::{InstrumentMeta, Quote};

    fn meta(instrument: &str, halted: bool) -> InstrumentMeta {
        InstrumentMeta {
            instrument: instrument.to_string(),
            display_name: String::new(),
            pip: 0.0001,
            max_trade_units: 10_000_000,
            precision: 0.00001,
            min_trailing_stop: 5,
            max_trailing_stop: 10_000,
            margin_rate: 0.02,
            halted,
        }
    }

    /// Twenty flat midpoints around 1.30 with the last one set explicitly.
    fn window_with_last(last: f64) -> Vec<f64> {
        let mut mids: Vec<f64> = (0..19)
            .map(|i| if i % 2 == 0 { 1.2999 } else { 1.3001 })
            .collect();
        mids.push(last);
        mids
    }

    fn config() -> TradeConfig {
        TradeConfig::default()
    }

    async fn evaluator(broker: FakeBroker) -> SignalEvaluator<FakeBroker> {
        SignalEvaluator::new(broker, config()).await.unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_halted_skips_before_anything_else() {
        // No quotes and no history registered: any later step would fail.
        let mut broker = FakeBroker::new("USD", 0.0, 0.0);
        broker.metas.insert("EUR_USD".to_string(), meta("EUR_USD", true));
        let evaluator = evaluator(broker).await;

        let decision = evaluator.evaluate("EUR_USD").await.unwrap();
        assert!(matches!(decision, Decision::Skip(SkipReason::Halted)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_margin_skips_before_history_fetch() {
        // History deliberately wrong-sized: reaching the stats step would
        // error, so a clean InsufficientMargin proves the gate ordering.
        // ticket = 0.01 * 100100 = 1001 >= avail - preserve = 100 - 20020.
        let broker = FakeBroker::new("USD", 100.0, 100_000.0).with_instrument(
            meta("EUR_USD", false),
            Quote::new("EUR_USD", 1.2999, 1.3001),
            vec![1.30],
        );
        let evaluator = evaluator(broker).await;

        let decision = evaluator.evaluate("EUR_USD").await.unwrap();
        assert!(matches!(
            decision,
            Decision::Skip(SkipReason::InsufficientMargin)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_size_mismatch_is_fatal() {
        let broker = FakeBroker::new("USD", 100_000.0, 0.0).with_instrument(
            meta("EUR_USD", false),
            Quote::new("EUR_USD", 1.2999, 1.3001),
            vec![1.30; 7],
        );
        let evaluator = evaluator(broker).await;

        let err = evaluator.evaluate("EUR_USD").await.unwrap_err();
        assert!(err.to_string().contains("window size mismatch"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wide_spread_skips() {
        let broker = FakeBroker::new("USD", 100_000.0, 0.0).with_instrument(
            meta("EUR_USD", false),
            // Spread 0.01 dwarfs std (~1e-4) * max_spread.
            Quote::new("EUR_USD", 1.2950, 1.3050),
            window_with_last(1.3001),
        );
        let evaluator = evaluator(broker).await;

        let decision = evaluator.evaluate("EUR_USD").await.unwrap();
        assert!(matches!(decision, Decision::Skip(SkipReason::SpreadTooWide)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_breakout_above_band_buys() {
        let broker = FakeBroker::new("USD", 100_000.0, 0.0).with_instrument(
            meta("EUR_USD", false),
            Quote::new("EUR_USD", 1.30999, 1.31),
            window_with_last(1.31),
        );
        let evaluator = evaluator(broker).await;

        let decision = evaluator.evaluate("EUR_USD").await.unwrap();
        let Decision::Entered { side, units, .. } = decision else {
            panic!("expected a trade, got {decision:?}");
        };
        assert_eq!(side, Side::Buy);
        // Quote currency matches the account: conversion = ask = 1.31,
        // ticket = 1000, margin_per_unit = 1.31 * 0.02 -> floor = 38167.
        assert_eq!(units, 38_167);

        let orders = evaluator.broker.submitted_orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].side, Side::Buy);
        assert_eq!(orders[0].units, 38_167);
        assert!(orders[0].stop_loss < 1.31);
        assert!(orders[0].take_profit > 1.31);
    }

    #[tokio::test(start_paused = true)]
    async fn test_breakout_below_band_sells() {
        let broker = FakeBroker::new("USD", 100_000.0, 0.0).with_instrument(
            meta("EUR_USD", false),
            Quote::new("EUR_USD", 1.28999, 1.29),
            window_with_last(1.29),
        );
        let evaluator = evaluator(broker).await;

        let decision = evaluator.evaluate("EUR_USD").await.unwrap();
        let Decision::Entered { side, .. } = decision else {
            panic!("expected a trade, got {decision:?}");
        };
        assert_eq!(side, Side::Sell);

        let orders = evaluator.broker.submitted_orders();
        assert_eq!(orders[0].side, Side::Sell);
        assert!(orders[0].stop_loss > 1.29);
        assert!(orders[0].take_profit < 1.29);
    }

    #[tokio::test(start_paused = true)]
    async fn test_inside_band_is_no_signal() {
        let broker = FakeBroker::new("USD", 100_000.0, 0.0).with_instrument(
            meta("EUR_USD", false),
            Quote::new("EUR_USD", 1.29999, 1.30),
            window_with_last(1.3001),
        );
        let evaluator = evaluator(broker).await;

        let decision = evaluator.evaluate("EUR_USD").await.unwrap();
        assert!(matches!(decision, Decision::Skip(SkipReason::NoSignal)));
        assert!(evaluator.broker.submitted_orders().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_trading_evaluation_paces_to_one_second() {
        let broker = FakeBroker::new("USD", 100_000.0, 0.0).with_instrument(
            meta("EUR_USD", false),
            Quote::new("EUR_USD", 1.30999, 1.31),
            window_with_last(1.31),
        );
        let evaluator = evaluator(broker).await;

        let started = Instant::now();
        let decision = evaluator.evaluate("EUR_USD").await.unwrap();
        assert!(matches!(decision, Decision::Entered { .. }));
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_halted_skip_paces_to_half_second() {
        let mut broker = FakeBroker::new("USD", 0.0, 0.0);
        broker.metas.insert("EUR_USD".to_string(), meta("EUR_USD", true));
        let evaluator = evaluator(broker).await;

        let started = Instant::now();
        let decision = evaluator.evaluate("EUR_USD").await.unwrap();
        assert!(matches!(decision, Decision::Skip(SkipReason::Halted)));
        assert!(started.elapsed() >= Duration::from_millis(500));
    }
}
