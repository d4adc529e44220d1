//! Account margin snapshot.

/// Available and used margin for the account, fetched fresh each cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarginState {
    pub avail: f64,
    pub used: f64,
}

impl MarginState {
    /// Total margin. Always derived from avail + used, never stored.
    pub fn total(&self) -> f64 {
        self.avail + self.used
    }
}
