//! Rolling-window statistics and entry bounds.

use statrs::statistics::Statistics;

use crate::error::EngineError;
use crate::models::{Window, WindowStat};

/// Compute last/mean/std and symmetric entry bounds over a full window.
///
/// The window length must equal `window_size` exactly; a short or long
/// history is a `WindowSizeMismatch`, never a truncation. The standard
/// deviation is the population one (divisor N).
pub fn compute_stat(
    window: &Window,
    window_size: usize,
    entry_trigger: f64,
) -> Result<WindowStat, EngineError> {
    if window.midpoints.len() != window_size {
        return Err(EngineError::WindowSizeMismatch {
            expected: window_size,
            actual: window.midpoints.len(),
        });
    }
    let last = window
        .midpoints
        .last()
        .copied()
        .ok_or(EngineError::WindowSizeMismatch {
            expected: window_size,
            actual: 0,
        })?;

    let mean = (&window.midpoints).mean();
    let std = (&window.midpoints).population_std_dev();

    Ok(WindowStat {
        instrument: window.instrument.clone(),
        last,
        mean,
        std,
        upper_bound: mean + std * entry_trigger,
        lower_bound: mean - std * entry_trigger,
    })
}
