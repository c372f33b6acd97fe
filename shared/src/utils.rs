// Numeric helpers shared by the engine and report consumers.

/// Rounds half away from zero to the given number of decimal places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Percentage change from `from` to `to`. Callers guarantee `from` is non-zero.
pub fn percent_change(from: f64, to: f64) -> f64 {
    (to - from) / from * 100.0
}
