//! Cross-validated AUC influence function for a binary outcome.
//!
//! No time dimension and no censoring: cases have outcome `1`, controls `0`,
//! and the AUC is `nu / (q0 * q1)` with `q1` the share of cases.

use crate::input::{BinaryInput, PairwiseConcordance, validate_scalar};
use crate::utils::usize_to_f64;

use super::InfluenceError;
use super::auc::checked_denominator;

/// Influence function of the cross-validated binary-outcome AUC.
///
/// `concordance` holds the out-of-fold probability that each case outranks
/// each control; `numerator` is the cross-validated estimate of `nu`.
///
/// # Errors
///
/// Returns `InfluenceError` if the outcome or concordance estimates are
/// malformed, or if the sample holds only cases or only controls.
pub fn binary_auc_influence_cv(
    input: &BinaryInput,
    concordance: &PairwiseConcordance,
    numerator: f64,
) -> Result<Vec<f64>, InfluenceError> {
    input.validate()?;
    validate_scalar("numerator", numerator)?;
    let n = input.len();
    let cases = input.cases();
    concordance.validate_groups(n, &cases, &input.controls())?;

    let n_f = usize_to_f64(n);
    let case_share = usize_to_f64(cases.len()) / n_f;
    let control_share = 1.0 - case_share;
    let mu = checked_denominator(case_share * control_share)?;
    log::debug!("binary auc influence: {} subjects, {} cases", n, cases.len());

    let (case_count, control_count) = (concordance.cases.len(), concordance.controls.len());
    let rows = concordance.case_rows(n);
    let columns = concordance.control_columns(n);
    let ic = (0..n)
        .map(|i| {
            let (nu_if, mu_if) = match (rows[i], columns[i]) {
                (Some(row), _) => {
                    let total: f64 = (0..control_count)
                        .map(|col| concordance.value(row, col))
                        .sum();
                    (total / n_f, control_share)
                }
                (None, Some(col)) => {
                    let total: f64 = (0..case_count)
                        .map(|row| concordance.value(row, col))
                        .sum();
                    (total / n_f, case_share)
                }
                (None, None) => (0.0, 0.0),
            };
            nu_if.mul_add(mu, -mu_if * numerator) / (mu * mu)
        })
        .collect();
    Ok(ic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use faer::Mat;

    fn concordance() -> PairwiseConcordance {
        let values = [[1.0, 0.5, 0.0], [0.8, 1.0, 0.6]];
        PairwiseConcordance::new(
            Mat::from_fn(2, 3, |row, col| values[row][col]),
            vec![0, 2],
            vec![1, 3, 4],
        )
    }

    #[test]
    fn influence_matches_hand_computation() {
        let input = BinaryInput::new(vec![1, 0, 1, 0, 0]);
        // nu = sum(thetahat) / n^2
        let ic = binary_auc_influence_cv(&input, &concordance(), 0.156).expect("influence");
        let expected = [
            -0.375,
            0.416_666_666_666_666_7,
            0.375,
            0.166_666_666_666_666_7,
            -0.583_333_333_333_333_3,
        ];
        for (value, target) in ic.iter().zip(expected) {
            assert_relative_eq!(*value, target, epsilon = 1e-9);
        }
        assert!(ic.iter().sum::<f64>().abs() < 1e-12);
    }

    #[test]
    fn groups_must_match_outcome() {
        let input = BinaryInput::new(vec![1, 1, 0, 0, 0]);
        let err = binary_auc_influence_cv(&input, &concordance(), 0.156)
            .expect_err("mismatched groups");
        assert!(matches!(err, InfluenceError::Input(_)));
    }

    #[test]
    fn single_group_sample_is_degenerate() {
        let input = BinaryInput::new(vec![1, 1]);
        let theta = PairwiseConcordance::new(Mat::zeros(2, 0), vec![0, 1], Vec::new());
        let err = binary_auc_influence_cv(&input, &theta, 0.0).expect_err("no controls");
        assert!(matches!(err, InfluenceError::DegenerateDenominator { .. }));
    }
}
