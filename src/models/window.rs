//! Price window and its derived statistics.

/// An ordered series of midpoint closes for one instrument, most recent
/// last. The length must equal the configured window size; a mismatch is an
/// error, never a silent truncation.
#[derive(Debug, Clone)]
pub struct Window {
    pub instrument: String,
    pub midpoints: Vec<f64>,
}

/// Statistics derived from a full window. Ephemeral: recomputed every cycle
/// and discarded at the cycle boundary.
#[derive(Debug, Clone)]
pub struct WindowStat {
    pub instrument: String,

    /// Final element of the series, taken verbatim.
    pub last: f64,

    pub mean: f64,

    /// Population standard deviation (divisor N).
    pub std: f64,

    /// mean + std * entry_trigger
    pub upper_bound: f64,

    /// mean - std * entry_trigger
    pub lower_bound: f64,
}
