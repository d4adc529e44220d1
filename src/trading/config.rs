//! Trade model configuration: window, sigma multipliers, margin ratios.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Price history window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Candle granularity code, e.g. "M1", "H1".
    pub granularity: String,

    /// Number of midpoint closes per window.
    pub size: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            granularity: "M1".to_string(),
            size: 20,
        }
    }
}

/// Multiples of the window standard deviation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SigmaConfig {
    /// Spread ceiling: skip when spread exceeds std * max_spread.
    pub max_spread: f64,

    /// Band half-width: bounds are mean +/- std * entry_trigger.
    pub entry_trigger: f64,

    /// Trailing stop distance before pip conversion.
    pub trailing_stop: f64,

    pub stop_loss: f64,

    pub take_profit: f64,
}

impl Default for SigmaConfig {
    fn default() -> Self {
        Self {
            max_spread: 0.5,
            entry_trigger: 2.0,
            trailing_stop: 3.0,
            stop_loss: 2.0,
            take_profit: 4.0,
        }
    }
}

/// Statistical model parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub window: WindowConfig,
    pub sigma: SigmaConfig,
}

/// Named fractions of total account margin. Immutable for the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarginRatioConfig {
    /// Fraction of total margin risked per ticket.
    pub ticket: f64,

    /// Fraction of total margin kept untouchable.
    pub preserve: f64,

    /// Additional named fractions, computed alongside ticket and preserve.
    #[serde(flatten)]
    pub extra: HashMap<String, f64>,
}

impl Default for MarginRatioConfig {
    fn default() -> Self {
        Self {
            ticket: 0.01,
            preserve: 0.2,
            extra: HashMap::new(),
        }
    }
}

/// Margin amounts computed against a total, one per configured ratio key.
#[derive(Debug, Clone)]
pub struct MarginAmounts {
    pub ticket: f64,
    pub preserve: f64,
    pub extra: HashMap<String, f64>,
}

impl MarginRatioConfig {
    /// Amount for every configured ratio key: ratio * total margin.
    pub fn amounts(&self, total: f64) -> MarginAmounts {
        MarginAmounts {
            ticket: self.ticket * total,
            preserve: self.preserve * total,
            extra: self
                .extra
                .iter()
                .map(|(k, v)| (k.clone(), v * total))
                .collect(),
        }
    }
}

/// Full trade configuration: the instrument universe, the statistical model,
/// and margin allocation ratios.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeConfig {
    pub instruments: Vec<String>,
    pub model: ModelConfig,
    pub margin_ratio: MarginRatioConfig,
}

impl Default for TradeConfig {
    fn default() -> Self {
        Self {
            instruments: vec!["EUR_USD".to_string(), "USD_JPY".to_string()],
            model: ModelConfig::default(),
            margin_ratio: MarginRatioConfig::default(),
        }
    }
}

impl TradeConfig {
    /// Load from a JSON file; absent fields fall back to defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}
