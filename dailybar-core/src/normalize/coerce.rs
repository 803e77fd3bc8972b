//! Float → `u32` coercion with saturating bounds.
//!
//! Out-of-range values are clamped to `[0, u32::MAX]`, never wrapped. The
//! boolean in each result reports whether clamping changed the value.
//! Infinite prices clamp to the nearest bound. A missing volume encodes as
//! 0, including on raw rows whose prices are present; volume is never
//! forward-filled within a row.

/// Upper bound of every encoded field.
pub const U32_CEILING: f64 = u32::MAX as f64;

/// Round a price half-to-even and clamp it into `u32`.
///
/// NaN (an unfilled leading session) encodes as 0 and is not counted as a clamp.
pub fn price_to_u32(price: f64) -> (u32, bool) {
    if price.is_nan() {
        return (0, false);
    }
    let rounded = price.round_ties_even();
    let clamped = rounded.clamp(0.0, U32_CEILING);
    (clamped as u32, clamped != rounded)
}

/// Encode a volume: missing is 0, the rest is clamped then truncated.
pub fn volume_to_u32(volume: Option<f64>) -> (u32, bool) {
    let value = volume.filter(|v| !v.is_nan()).unwrap_or(0.0);
    let clamped = value.clamp(0.0, U32_CEILING);
    (clamped.trunc() as u32, clamped != value)
}
