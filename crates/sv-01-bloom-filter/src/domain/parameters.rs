//! Bloom filter parameter math
//!
//! Formulas:
//! - FPR ≈ (1 - e^(-kn/m))^k
//! - n̂ = -(m/k) · ln(1 - X/m)     -- X = set bits
//! - m = -n·ln(fpr) / (ln 2)^2     -- optimal bits
//! - k = (m/n)·ln 2                -- optimal probes

use std::f64::consts::LN_2;

/// Bloom filter parameters
#[derive(Clone, Debug, PartialEq)]
pub struct BloomFilterParams {
    /// Number of bits in the filter, rounded up to whole 32-bit words
    pub size_bits: usize,
    /// Number of probes
    pub hash_count: u32,
    /// Expected false positive rate at the target element count
    pub expected_fpr: f64,
}

/// Calculate optimal parameters for `num_elements` at `target_fpr`.
pub fn calculate_optimal_parameters(num_elements: usize, target_fpr: f64) -> BloomFilterParams {
    if num_elements == 0 {
        return BloomFilterParams {
            size_bits: 32,
            hash_count: 1,
            expected_fpr: 0.0,
        };
    }

    let n = num_elements as f64;
    let m = (-n * target_fpr.ln() / (LN_2 * LN_2)).ceil() as usize;
    let m = m.max(1).div_ceil(32) * 32;

    let k = ((m as f64 / n) * LN_2).round() as u32;
    let k = k.clamp(1, 32);

    BloomFilterParams {
        size_bits: m,
        hash_count: k,
        expected_fpr: calculate_fpr(m, num_elements, k),
    }
}

/// False positive rate after inserting `n` elements.
pub fn calculate_fpr(m: usize, n: usize, k: u32) -> f64 {
    if m == 0 {
        return 1.0;
    }
    let exponent = -(k as f64) * (n as f64) / (m as f64);
    (1.0 - exponent.exp()).powi(k as i32)
}

/// Maximum-likelihood estimate of inserted elements from the fill ratio.
///
/// Diverges to `f64::INFINITY` once every bit is set.
pub fn estimate_cardinality(m: usize, k: u32, bits_set: usize) -> f64 {
    if m == 0 || k == 0 {
        return 0.0;
    }
    if bits_set >= m {
        return f64::INFINITY;
    }
    let fill = bits_set as f64 / m as f64;
    -(m as f64) / (k as f64) * (1.0 - fill).ln()
}
