//! Margin-constrained position sizing with currency-pair conversion.

use std::collections::HashMap;

use tracing::debug;

use crate::error::EngineError;
use crate::models::{InstrumentMeta, MarginState, Quote};

use super::config::MarginRatioConfig;

/// Units to open for one ticket under the configured margin ratios.
///
/// Returns 0 when the ticket allocation does not fit under
/// `avail - preserve`; that is a normal outcome, not an error. A positive
/// count is `floor(ticket / margin_per_unit)` clipped down to the broker's
/// `max_trade_units`, never raised.
pub fn size(
    meta: &InstrumentMeta,
    quote: &Quote,
    quotes: &HashMap<String, Quote>,
    margin: &MarginState,
    ratios: &MarginRatioConfig,
    instrument_list: &[String],
    account_currency: &str,
) -> Result<u32, EngineError> {
    let conversion = conversion_price(meta, quote, quotes, instrument_list, account_currency)?;
    let amounts = ratios.amounts(margin.total());
    let margin_per_unit = conversion * meta.margin_rate;
    debug!(
        instrument = %meta.instrument,
        conversion,
        margin_per_unit,
        ticket = amounts.ticket,
        preserve = amounts.preserve,
        "sizing inputs"
    );

    if amounts.ticket < margin.avail - amounts.preserve {
        let units = (amounts.ticket / margin_per_unit).floor();
        if units <= meta.max_trade_units as f64 {
            Ok(units as u32)
        } else {
            Ok(meta.max_trade_units)
        }
    } else {
        Ok(0)
    }
}

/// Price of one unit of the instrument's quote currency in the account
/// currency.
///
/// Resolution order: the instrument's own ask (inverted when the account
/// currency is the base), then a cross pair, trying `QUOTE_ACCOUNT` before
/// `ACCOUNT_QUOTE`. The first multiplies asks, the second divides; the
/// precedence is part of the contract.
fn conversion_price(
    meta: &InstrumentMeta,
    quote: &Quote,
    quotes: &HashMap<String, Quote>,
    instrument_list: &[String],
    account_currency: &str,
) -> Result<f64, EngineError> {
    let invalid_pair = |quote_currency: &str| EngineError::InvalidInstrumentPair {
        quote_currency: quote_currency.to_string(),
        account_currency: account_currency.to_string(),
    };

    let (base, quote_ccy) = meta
        .currency_pair()
        .ok_or_else(|| invalid_pair(&meta.instrument))?;

    if base == account_currency {
        return Ok(1.0 / quote.ask);
    }
    if quote_ccy == account_currency {
        return Ok(quote.ask);
    }

    let direct = format!("{quote_ccy}_{account_currency}");
    let inverse = format!("{account_currency}_{quote_ccy}");
    if instrument_list.iter().any(|i| i == &direct) {
        let cross = quotes.get(&direct).ok_or_else(|| invalid_pair(quote_ccy))?;
        Ok(quote.ask * cross.ask)
    } else if instrument_list.iter().any(|i| i == &inverse) {
        let cross = quotes.get(&inverse).ok_or_else(|| invalid_pair(quote_ccy))?;
        Ok(quote.ask / cross.ask)
    } else {
        Err(invalid_pair(quote_ccy))
    }
}
