//! Broker interfaces: the capability trait consumed by the decision core and
//! the OANDA REST client implementing it.

mod broker;
mod oanda;
mod types;

pub use broker::{AccountSummary, Broker, OrderConfirmation};
pub use oanda::OandaClient;

#[cfg(test)]
pub(crate) use broker::testing::FakeBroker;
