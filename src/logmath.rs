//! Log-domain arithmetic helpers shared by the probabilistic kernels.
//!
//! Probabilities are stored as natural logs throughout the crate. The
//! canonical "impossible event" marker is [`LOG_ZERO`] rather than negative
//! infinity, so that adding a finite log-probability to it stays close to
//! the marker instead of underflowing.

/// Log-domain representation of a zero probability.
pub const LOG_ZERO: f64 = -1e30;

/// Numerically stable `log Σ exp(xᵢ)`.
///
/// Computed as `m + log Σ exp(xᵢ − m)` with `m = max xᵢ`. Entries equal to
/// [`LOG_ZERO`] contribute no mass to the inner sum; an empty input or one
/// whose maximum is [`LOG_ZERO`] collapses back to [`LOG_ZERO`].
pub fn log_sum_exp(values: &[f64]) -> f64 {
    if values.is_empty() {
        return LOG_ZERO;
    }

    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == LOG_ZERO {
        return LOG_ZERO;
    }

    let sum: f64 = values
        .iter()
        .filter(|&&v| v != LOG_ZERO)
        .map(|&v| (v - max).exp())
        .sum();

    max + sum.ln()
}
