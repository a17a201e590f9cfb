//! Normalized Google Distance over literature co-occurrence counts.
//!
//! Lower values mean the two entities co-occur more often than their
//! individual frequencies predict. Used only to order neighbor expansion.

/// Tolerance when comparing log counts that came from separate store queries.
const LOG_EPSILON: f64 = 1e-9;

/// NGD from a precomputed `ln(|A|)`, the raw `|B|` and `|A ∩ B|`, and
/// `ln(N)` for the corpus size.
///
/// Returns `None` (unscored) when either set is empty or a singleton, the
/// intersection is empty, or the counts are numerically inconsistent (an
/// intersection larger than the smaller set, a corpus smaller than a set).
/// The result does not depend on which of the two sets is passed as `A`.
pub fn calculate_ngd(
    log_len_a: f64,
    len_b: u64,
    len_intersection: u64,
    log_normalizer: f64,
) -> Option<f64> {
    if len_b == 0 || len_intersection == 0 {
        return None;
    }
    if !log_len_a.is_finite() || log_len_a <= 0.0 {
        return None;
    }

    let log_len_b = (len_b as f64).ln();
    if log_len_b <= 0.0 {
        return None;
    }
    let log_intersection = (len_intersection as f64).ln();

    let (hi, lo) = if log_len_a >= log_len_b {
        (log_len_a, log_len_b)
    } else {
        (log_len_b, log_len_a)
    };
    if log_intersection > lo + LOG_EPSILON {
        return None;
    }

    let denominator = log_normalizer - lo;
    if denominator.is_nan() || denominator <= 0.0 {
        return None;
    }

    let ngd = (hi - log_intersection) / denominator;
    ngd.is_finite().then_some(ngd)
}

/// Convenience wrapper taking raw counts and the raw corpus size.
pub fn ngd_from_counts(len_a: u64, len_b: u64, len_intersection: u64, normalizer: f64) -> Option<f64> {
    if len_a == 0 || normalizer <= 0.0 {
        return None;
    }
    calculate_ngd((len_a as f64).ln(), len_b, len_intersection, normalizer.ln())
}
