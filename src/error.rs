//! Fatal decision-core errors.
//!
//! These abort the evaluation cycle; skips (halted instrument, insufficient
//! margin, wide spread, no signal) are ordinary decision outcomes and never
//! appear here.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The broker returned a price history whose length differs from the
    /// configured window size. Trading on a partial window is never safe.
    #[error("window size mismatch: expected {expected} midpoints, got {actual}")]
    WindowSizeMismatch { expected: usize, actual: usize },

    /// No conversion path exists from the instrument's quote currency to the
    /// account currency, so margin per unit cannot be priced.
    #[error("no conversion path from {quote_currency} to account currency {account_currency}")]
    InvalidInstrumentPair {
        quote_currency: String,
        account_currency: String,
    },

    /// An order side outside buy/sell crossed the wire.
    #[error("invalid order side: {0}")]
    InvalidSide(String),
}
