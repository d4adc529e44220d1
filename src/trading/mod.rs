//! Decision core: window statistics, position sizing, order risk, the
//! per-instrument evaluator, and the polling loop that drives it.

mod config;
mod evaluator;
mod risk;
mod runner;
mod sizer;
mod stats;

pub use config::{MarginRatioConfig, ModelConfig, SigmaConfig, TradeConfig, WindowConfig};
pub use evaluator::{Decision, SignalEvaluator, SkipReason};
pub use risk::{compute_risk, RiskParams};
pub use runner::{RunnerConfig, TradeRunner};
pub use sizer::size;
pub use stats::compute_stat;
