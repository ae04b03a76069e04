//! Log-domain helpers and defaults.

/// Label of the silence phoneme that brackets every word model.
pub const DEFAULT_SILENCE_LABEL: &str = "sil";

/// Upper bound on lattice cells (states × slices) before a decode is
/// refused. Each cell costs a score, a back-pointer and a visited bit.
pub const DEFAULT_MAX_LATTICE_CELLS: usize = 1 << 25;

/// Natural log of a linear probability; `0` maps to `−∞`.
#[inline]
pub fn log_prob(p: f64) -> f64 {
    if p == 0.0 {
        f64::NEG_INFINITY
    } else {
        p.ln()
    }
}

/// `ln(1/n)`, the log-probability of each of `n` equally likely choices.
#[inline]
pub fn uniform_log_prior(n: usize) -> f64 {
    -(n as f64).ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_probability_is_negative_infinity() {
        assert_eq!(log_prob(0.0), f64::NEG_INFINITY);
        assert_eq!(log_prob(1.0), 0.0);
        assert!((log_prob(0.5) - 0.5f64.ln()).abs() < 1e-15);
    }

    #[test]
    fn uniform_prior_sums_to_one() {
        for n in [1usize, 2, 7, 100] {
            let total: f64 = (0..n).map(|_| uniform_log_prior(n).exp()).sum();
            assert!((total - 1.0).abs() < 1e-12, "n={n}: {total}");
        }
        assert_eq!(uniform_log_prior(1), 0.0);
    }
}
