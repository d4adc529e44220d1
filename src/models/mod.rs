//! Data models for quotes, instruments, margin, windows, and orders.

mod instrument;
mod margin;
mod order;
mod quote;
mod window;

pub use instrument::InstrumentMeta;
pub use margin::MarginState;
pub use order::{OrderIntent, Side};
pub use quote::Quote;
pub use window::{Window, WindowStat};
