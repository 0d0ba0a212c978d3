//! Variance estimates and Wald confidence intervals from influence functions.
//!
//! The influence vector of an estimator is its first-order expansion
//! `estimate - truth ≈ 1/n * sum(ic)`, so the standard error follows directly
//! from `sqrt(sum(ic²)) / n`.

use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

use crate::utils::{slice_is_finite, usize_to_f64};

pub mod report;

pub use report::render_influence_table;

/// Confidence level used when none is given.
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

/// Errors for influence-based inference.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum InferenceError {
    #[error("confidence level must lie strictly between 0 and 1, got {level}")]
    InvalidLevel { level: f64 },
    #[error("influence vector must contain at least one value")]
    EmptyInfluence,
    #[error("influence vector contains missing or non-finite values")]
    NonFiniteInfluence,
    #[error("estimate must be finite")]
    NonFiniteEstimate,
}

/// Two-sided confidence interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        (self.lower..=self.upper).contains(&value)
    }
}

/// Standard error implied by an influence vector, `sqrt(sum(ic²)) / n`.
///
/// # Errors
///
/// Returns `InferenceError` if `influence` is empty or holds non-finite values.
pub fn standard_error(influence: &[f64]) -> Result<f64, InferenceError> {
    if influence.is_empty() {
        return Err(InferenceError::EmptyInfluence);
    }
    if !slice_is_finite(influence) {
        return Err(InferenceError::NonFiniteInfluence);
    }
    let sum_sq: f64 = influence.iter().map(|value| value * value).sum();
    Ok(sum_sq.sqrt() / usize_to_f64(influence.len()))
}

/// Point estimate with its influence-based standard error and Wald interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InfluenceSummary {
    pub estimate: f64,
    pub standard_error: f64,
    pub interval: ConfidenceInterval,
    pub level: f64,
}

impl InfluenceSummary {
    /// # Errors
    ///
    /// Returns `InferenceError` if `level` is outside `(0, 1)`, the estimate is
    /// not finite, or the influence vector is empty or non-finite.
    pub fn from_influence(
        estimate: f64,
        influence: &[f64],
        level: f64,
    ) -> Result<Self, InferenceError> {
        if !(level > 0.0 && level < 1.0) {
            return Err(InferenceError::InvalidLevel { level });
        }
        if !estimate.is_finite() {
            return Err(InferenceError::NonFiniteEstimate);
        }
        let se = standard_error(influence)?;
        let z = normal_quantile(1.0 - (1.0 - level) / 2.0);
        Ok(Self {
            estimate,
            standard_error: se,
            interval: ConfidenceInterval {
                lower: z.mul_add(-se, estimate),
                upper: z.mul_add(se, estimate),
            },
            level,
        })
    }
}

fn normal_quantile(p: f64) -> f64 {
    Normal::new(0.0, 1.0).map_or(f64::NAN, |normal| normal.inverse_cdf(p))
}
