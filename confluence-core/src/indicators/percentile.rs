//! Volatility normalization: where the current ATR sits in its own history.

/// Fraction of finite `history` values less than or equal to `current`, in [0, 1].
///
/// `None` when `current` is not finite or the history has no finite values.
pub fn atr_percentile(current: f64, history: &[f64]) -> Option<f64> {
    if !current.is_finite() {
        return None;
    }
    let valid: Vec<f64> = history.iter().copied().filter(|v| v.is_finite()).collect();
    if valid.is_empty() {
        return None;
    }
    let at_or_below = valid.iter().filter(|&&v| v <= current).count();
    Some(at_or_below as f64 / valid.len() as f64)
}
