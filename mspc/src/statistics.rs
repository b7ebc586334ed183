//! Fisher's method for combining the p-values of the peaks of a cluster.

use statrs::distribution::{ChiSquared, ContinuousCDF};

use mspc_core::MspcError;

/// Smallest positive (subnormal) double, about 4.9e-324.
pub const SMALLEST_POSITIVE: f64 = f64::from_bits(1);

/// Combined evidence of a cluster of peaks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombinedScore {
    /// Fisher's statistic: `-2 * sum(ln(p_i))`.
    pub x_squared: f64,
    /// Right-tail probability of chi-squared with `2n` degrees of freedom at `x_squared`.
    pub probability: f64,
    /// Number of p-values combined.
    pub n: usize,
}

/// Combine p-values with Fisher's method.
///
/// A zero p-value is replaced by [`SMALLEST_POSITIVE`] so the logarithm stays
/// finite, and the resulting probability is clamped to `[SMALLEST_POSITIVE, 1]`
/// so extreme statistics never underflow to zero.
pub fn fisher_combined<I>(values: I) -> Result<CombinedScore, MspcError>
where
    I: IntoIterator<Item = f64>,
{
    let (n, log_sum) = values
        .into_iter()
        .map(|p| p.clamp(SMALLEST_POSITIVE, 1.0).ln())
        .fold((0usize, 0.0f64), |(n, sum), ln_p| (n + 1, sum + ln_p));

    if n == 0 {
        return Err(MspcError::Statistics(
            "cannot combine an empty set of p-values".to_string(),
        ));
    }

    let x_squared = -2.0 * log_sum;
    let probability = chi_squared_sf(x_squared, 2 * n)?;

    Ok(CombinedScore {
        x_squared,
        probability,
        n,
    })
}

/// Upper-tail probability of the chi-squared distribution with `df` degrees of freedom.
pub fn chi_squared_sf(x: f64, df: usize) -> Result<f64, MspcError> {
    let chi2_dist =
        ChiSquared::new(df as f64).map_err(|e| MspcError::Statistics(e.to_string()))?;
    Ok(chi2_dist.sf(x).clamp(SMALLEST_POSITIVE, 1.0))
}
