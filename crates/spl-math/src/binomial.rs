//! Binomial coefficients for rational derivative recombination.

/// Compute the binomial coefficient `C(n, k)` as a float.
///
/// Uses the multiplicative formula, so intermediate values stay small for the
/// low orders needed by derivative evaluation. Returns 0.0 when `k > n`.
pub fn binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }

    let k = k.min(n - k);
    let mut c = 1.0;
    for i in 0..k {
        c = c * (n - i) as f64 / (i + 1) as f64;
    }

    c
}
