use crate::models::{RawScore, Signal, SignalScore};

/// Map a provider's raw output into [0, 1] using the signal's known range
///
/// Non-finite raw values are treated as unavailable rather than clamped, so a
/// broken provider can never leak into the weighted sum.
#[inline]
pub fn normalize(signal: Signal, raw: RawScore) -> SignalScore {
    if !raw.available || !raw.value.is_finite() {
        return SignalScore::unavailable(signal);
    }

    let (low, high) = signal.output_range();
    let normalized = ((raw.value - low) / (high - low)).clamp(0.0, 1.0);

    SignalScore {
        signal,
        raw: raw.value,
        normalized,
        available: true,
    }
}
