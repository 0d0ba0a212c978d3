/////////////////////////////////////////////////////////////////////////////////////////////\
//
// Numeric helpers shared by the influence assemblers and inference summaries.
//
// Created on: 16 Oct 2026     Author: Tobias Kragholm
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Utilities
//!
//! Small numeric helpers shared by the influence assemblers and the inference
//! summaries.

/// Lossless-enough conversion used for sample sizes and counts.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    f64::from(u32::try_from(value).unwrap_or(u32::MAX))
}

#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / usize_to_f64(values.len())
}

#[must_use]
pub fn slice_is_finite(values: &[f64]) -> bool {
    values.iter().all(|value| value.is_finite())
}

/// Index of the first element that breaks ascending order, if any.
#[must_use]
pub fn first_descent(values: &[f64]) -> Option<usize> {
    values
        .windows(2)
        .position(|pair| pair[1] < pair[0])
        .map(|idx| idx + 1)
}

/// Stable permutation that sorts `values` ascending.
#[must_use]
pub fn ascending_order(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    order
}

/// Contiguous runs of equal values along `order`, as ranges into `order`.
pub fn tie_runs<'a>(
    values: &'a [f64],
    order: &'a [usize],
) -> impl Iterator<Item = std::ops::Range<usize>> + 'a {
    let mut start = 0;
    std::iter::from_fn(move || {
        if start >= order.len() {
            return None;
        }
        let value = values[order[start]];
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == value {
            end += 1;
        }
        let run = start..end;
        start = end;
        Some(run)
    })
}
