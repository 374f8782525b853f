/// Divides, returning 0 when the denominator is zero or the quotient is not finite.
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }

    let ratio = numerator / denominator;
    if ratio.is_finite() {
        ratio
    } else {
        0.0
    }
}

/// `part / whole * 100` with the same zero-denominator policy as [`safe_ratio`].
pub fn percentage(part: f64, whole: f64) -> f64 {
    safe_ratio(part, whole) * 100.0
}

/// Display rounding only. Aggregates keep full precision internally.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Lowercases a column label and drops everything that is not a letter or digit,
/// so "Bounce Rate (%)" and "bounce_rate" compare equal.
pub fn normalize_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
