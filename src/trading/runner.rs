//! Polling loop: drives the evaluator across the instrument set.
//!
//! Evaluation is strictly sequential; margin state depends on orders
//! submitted earlier in the same run, so instruments are never evaluated
//! concurrently. There is no cancellation token: nothing is buffered
//! in-process, so an external terminate signal is always safe to leave at
//! the platform's default immediate behavior.

use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info};

use crate::api::Broker;
use crate::models::Side;

use super::evaluator::{Decision, SignalEvaluator};

/// Loop parameters, typically from the CLI.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Maximum number of iterations over the instrument set.
    pub iterations: usize,

    /// Sleep between iterations.
    pub interval: Duration,

    /// Demote status lines to debug logging.
    pub quiet: bool,
}

/// Repeatedly evaluates every configured instrument, stopping early after
/// an iteration in which all of them reported halted.
pub struct TradeRunner<B> {
    evaluator: SignalEvaluator<B>,
    instruments: Vec<String>,
    config: RunnerConfig,
}

impl<B: Broker> TradeRunner<B> {
    pub fn new(
        evaluator: SignalEvaluator<B>,
        instruments: Vec<String>,
        config: RunnerConfig,
    ) -> Self {
        Self {
            evaluator,
            instruments,
            config,
        }
    }

    /// Run up to the configured number of iterations. Broker failures abort
    /// the loop; Skip decisions do not.
    pub async fn run(&self) -> Result<()> {
        self.report(None, "!!! OPEN DEALS !!!");

        for iteration in 0..self.config.iterations {
            let mut all_halted = true;

            for instrument in &self.instruments {
                let decision = self.evaluator.evaluate(instrument).await?;
                all_halted &= decision.is_halted();

                match &decision {
                    Decision::Entered {
                        side,
                        units,
                        confirmation,
                    } => {
                        let verb = match side {
                            Side::Buy => "Buy",
                            Side::Sell => "Sell",
                        };
                        self.report(
                            Some(instrument),
                            &format!("{verb} {units} units.\n{confirmation}"),
                        );
                    }
                    Decision::Skip(reason) => self.report(Some(instrument), reason.message()),
                }
            }

            if all_halted {
                info!(iteration, "all instruments halted, stopping");
                break;
            }
            if iteration + 1 < self.config.iterations {
                tokio::time::sleep(self.config.interval).await;
            }
        }

        Ok(())
    }

    fn report(&self, instrument: Option<&str>, message: &str) {
        let text = match instrument {
            Some(instrument) => format!("[ fxband ]\t{instrument}\t>>>>>>\t{message}"),
            None => format!("[ fxband ]\t{message}"),
        };
        if self.config.quiet {
            debug!("{text}");
        } else {
            println!("{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::api::FakeBroker;
    use crate::models::{InstrumentMeta, Quote};
    use crate::trading::config::TradeConfig;

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

    fn quiet_window() -> Vec<f64> {
        (0..20)
            .map(|i| if i % 2 == 0 { 1.2999 } else { 1.3001 })
            .collect()
    }

    async fn runner(broker: FakeBroker, instruments: &[&str], iterations: usize) -> TradeRunner<FakeBroker> {
        let evaluator = SignalEvaluator::new(broker, TradeConfig::default())
            .await
            .unwrap();
        TradeRunner::new(
            evaluator,
            instruments.iter().map(|s| s.to_string()).collect(),
            RunnerConfig {
                iterations,
                interval: Duration::from_secs(2),
                quiet: true,
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_after_first_all_halted_iteration() {
        let broker = FakeBroker::new("USD", 100_000.0, 0.0)
            .with_instrument(
                meta("EUR_USD", true),
                Quote::new("EUR_USD", 1.2999, 1.3001),
                quiet_window(),
            )
            .with_instrument(
                meta("USD_JPY", true),
                Quote::new("USD_JPY", 101.0, 101.02),
                quiet_window(),
            );
        let runner = runner(broker, &["EUR_USD", "USD_JPY"], 10).await;

        runner.run().await.unwrap();

        // One meta fetch per instrument in the single iteration that ran.
        let calls = runner.evaluator.broker().meta_calls.load(Ordering::SeqCst);
        assert_eq!(calls, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mixed_halt_does_not_stop_the_loop() {
        let broker = FakeBroker::new("USD", 100_000.0, 0.0)
            .with_instrument(
                meta("EUR_USD", true),
                Quote::new("EUR_USD", 1.2999, 1.3001),
                quiet_window(),
            )
            .with_instrument(
                meta("USD_JPY", false),
                Quote::new("USD_JPY", 101.0, 101.0001),
                quiet_window_jpy(),
            );
        let runner = runner(broker, &["EUR_USD", "USD_JPY"], 3).await;

        runner.run().await.unwrap();

        let calls = runner.evaluator.broker().meta_calls.load(Ordering::SeqCst);
        assert_eq!(calls, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_exactly_n_iterations_without_halt() {
        let broker = FakeBroker::new("USD", 100_000.0, 0.0).with_instrument(
            meta("EUR_USD", false),
            Quote::new("EUR_USD", 1.29999, 1.30),
            quiet_window(),
        );
        let runner = runner(broker, &["EUR_USD"], 4).await;

        runner.run().await.unwrap();

        let calls = runner.evaluator.broker().meta_calls.load(Ordering::SeqCst);
        assert_eq!(calls, 4);
        // Nothing broke out of the band, so nothing was submitted.
        assert!(runner.evaluator.broker().submitted_orders().is_empty());
    }

    fn quiet_window_jpy() -> Vec<f64> {
        (0..20)
            .map(|i| if i % 2 == 0 { 100.99 } else { 101.01 })
            .collect()
    }
}
