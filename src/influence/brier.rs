/////////////////////////////////////////////////////////////////////////////////////////////\
//
// Influence function of the IPCW Brier score.
//
// Created on: 16 Oct 2026     Author: Tobias Kragholm
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Brier score
//!
//! Influence function of the IPCW Brier score at horizon `tau`, in two forms:
//! recomputing the loss from predicted risks, or consuming per-subject IPCW
//! squared residuals directly. Both add the censoring term read off the
//! Nelson–Aalen compensator.

use crate::input::{
    CensoringWeights, HorizonRole, OrderingPolicy, SurvivalInput, validate_positive_weights,
    validate_scalar, validate_subject_values,
};
use crate::utils::{mean, usize_to_f64};

use super::InfluenceError;
use super::compensator::CensoringCompensator;
use super::fold::TailIntegral;
use super::horizon::Horizon;

/// Influence function of the Brier score estimate `brier` for predicted risks
/// `risk` of the event of interest by the input's horizon.
///
/// `before_time` holds the censoring survival `G(T_i-)` of each subject. When
/// no subject is observed at or before the horizon every value is
/// `risk² - brier`.
///
/// # Errors
///
/// Returns `InfluenceError` if the inputs violate the input contract.
pub fn brier_influence_input(
    input: &SurvivalInput,
    risk: &[f64],
    before_time: &[f64],
    brier: f64,
    ordering: OrderingPolicy,
) -> Result<Vec<f64>, InfluenceError> {
    let sample = input.time_ordered(ordering)?;
    validate_subject_values("risk", risk, sample.len())?;
    validate_positive_weights("censoring weights", before_time, sample.len())?;
    validate_scalar("brier", brier)?;
    let risk = sample.gather(risk);
    let before_time = sample.gather(before_time);

    let horizon = Horizon::locate(sample.time(), sample.horizon());
    if horizon.last_index().is_none() {
        log::debug!(
            "brier influence: no subject observed at or before horizon {}",
            sample.horizon()
        );
        let ic = risk.iter().map(|&r| r.mul_add(r, -brier)).collect();
        return Ok(sample.restore(ic));
    }

    let time = sample.time();
    let status = sample.status();
    let roles = sample.roles();
    let n = usize_to_f64(sample.len());
    let case_weight = |i: usize| {
        if roles[i] == HorizonRole::Case {
            2.0_f64.mul_add(-risk[i], 1.0) / before_time[i]
        } else {
            0.0
        }
    };
    let compensator = CensoringCompensator::from_sorted(time, status);
    let mut tail = TailIntegral::new((0..sample.len()).map(case_weight).sum());
    log::debug!(
        "brier influence: {} subjects, {} at or before horizon",
        sample.len(),
        horizon.count()
    );

    let mut ic = vec![0.0; sample.len()];
    for block in compensator.blocks() {
        for k in block.subjects.clone() {
            if roles[k] == HorizonRole::Case {
                tail.retire(case_weight(k), block.preceding);
            }
        }
        for i in block.subjects {
            let term = compensator.subject_term(time, status, horizon, i);
            ic[i] = case_weight(i) + tail.evaluate(term) / n + risk[i].mul_add(risk[i], -brier);
        }
    }
    Ok(sample.restore(ic))
}

/// Influence function of the Brier score from per-subject IPCW squared
/// residuals, as produced by [`ipcw_squared_residuals`]. The estimate is their
/// mean.
///
/// # Errors
///
/// Returns `InfluenceError` if the inputs violate the input contract.
pub fn brier_influence_squared_input(
    input: &SurvivalInput,
    residuals: &[f64],
    ordering: OrderingPolicy,
) -> Result<Vec<f64>, InfluenceError> {
    let sample = input.time_ordered(ordering)?;
    validate_subject_values("residuals", residuals, sample.len())?;
    let residuals = sample.gather(residuals);

    let time = sample.time();
    let status = sample.status();
    let roles = sample.roles();
    let n = usize_to_f64(sample.len());
    let horizon = Horizon::locate(time, sample.horizon());
    let compensator = CensoringCompensator::from_sorted(time, status);

    let brier = mean(&residuals);
    let mut case_total = 0.0;
    let mut survivor_total = 0.0;
    for (role, &value) in roles.iter().zip(&residuals) {
        match role {
            HorizonRole::Case => case_total += value,
            HorizonRole::Survivor => survivor_total += value,
            HorizonRole::Competing | HorizonRole::CensoredBefore => {}
        }
    }
    let survivor_share = survivor_total / n;
    let mut tail = TailIntegral::new(case_total);
    log::debug!(
        "squared-residual brier influence: {} subjects, estimate {:.6}",
        sample.len(),
        brier
    );

    let mut ic = vec![0.0; sample.len()];
    for block in compensator.blocks() {
        for k in block.subjects.clone() {
            if roles[k] == HorizonRole::Case {
                tail.retire(residuals[k], block.preceding);
            }
        }
        for i in block.subjects {
            let term = compensator.subject_term(time, status, horizon, i);
            ic[i] = residuals[i] - brier + tail.evaluate(term) / n + survivor_share * term;
        }
    }
    Ok(sample.restore(ic))
}

/// IPCW squared residuals at the input's horizon: `(1 - r)² / G(T-)` for
/// cases, `r² / G(T-)` for competing events, `r² / G(tau)` for subjects
/// observed after the horizon, and `0` for subjects censored before it.
///
/// # Errors
///
/// Returns `InfluenceError` if the inputs violate the input contract.
pub fn ipcw_squared_residuals(
    input: &SurvivalInput,
    risk: &[f64],
    weights: &CensoringWeights,
) -> Result<Vec<f64>, InfluenceError> {
    let roles = input.roles()?;
    weights.validate(roles.len())?;
    validate_subject_values("risk", risk, roles.len())?;
    Ok(roles
        .iter()
        .zip(risk)
        .zip(&weights.before_time)
        .map(|((role, &r), &g)| match role {
            HorizonRole::Case => (1.0 - r).powi(2) / g,
            HorizonRole::Competing => r * r / g,
            HorizonRole::Survivor => r * r / weights.at_horizon,
            HorizonRole::CensoredBefore => 0.0,
        })
        .collect())
}

/// IPCW Brier score at the input's horizon.
///
/// # Errors
///
/// Returns `InfluenceError` if the inputs violate the input contract.
pub fn ipcw_brier(
    input: &SurvivalInput,
    risk: &[f64],
    weights: &CensoringWeights,
) -> Result<f64, InfluenceError> {
    Ok(mean(&ipcw_squared_residuals(input, risk, weights)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn small_input() -> (SurvivalInput, Vec<f64>, CensoringWeights) {
        (
            SurvivalInput::new(
                vec![1.0, 2.0, 2.0, 3.0, 4.0, 5.0, 5.0, 6.0],
                vec![1, 0, 2, 1, 0, 1, 2, 0],
                5.0,
            ),
            vec![0.4, 0.3, 0.5, 0.7, 0.8, 0.6, 0.4, 0.1],
            CensoringWeights::new(vec![1.0, 1.0, 0.9, 0.9, 0.9, 0.75, 0.75, 0.6], 0.75),
        )
    }

    fn assert_all_close(values: &[f64], expected: &[f64]) {
        assert_eq!(values.len(), expected.len());
        for (value, target) in values.iter().zip(expected) {
            assert_relative_eq!(*value, *target, epsilon = 1e-9);
        }
    }

    #[test]
    fn squared_residuals_follow_horizon_roles() {
        let (input, risk, weights) = small_input();
        let residuals = ipcw_squared_residuals(&input, &risk, &weights).expect("residuals");
        assert_all_close(
            &residuals,
            &[
                0.36,
                0.0,
                0.277_777_777_777_777_8,
                0.1,
                0.0,
                0.213_333_333_333_333_37,
                0.213_333_333_333_333_37,
                0.013_333_333_333_333_336,
            ],
        );
        let brier = ipcw_brier(&input, &risk, &weights).expect("brier");
        assert_relative_eq!(brier, 0.147_222_222_222_222_23, epsilon = 1e-12);
    }

    #[test]
    fn plug_in_influence_matches_reference_values() {
        let (input, risk, weights) = small_input();
        let ic = brier_influence_input(
            &input,
            &risk,
            &weights.before_time,
            0.147_222_222_222_222_23,
            OrderingPolicy::RequireSorted,
        )
        .expect("influence");
        assert_all_close(
            &ic,
            &[
                0.212_777_777_777_777_76,
                -0.144_297_052_154_195,
                0.117_290_249_433_106_59,
                -0.087_154_195_011_337_78,
                0.457_290_249_433_106_7,
                -0.022_709_750_566_893_394,
                0.043_956_916_099_773_26,
                -0.106_043_083_900_226_76,
            ],
        );
    }

    #[test]
    fn squared_residual_influence_matches_reference_values() {
        let (input, risk, weights) = small_input();
        let residuals = ipcw_squared_residuals(&input, &risk, &weights).expect("residuals");
        let ic = brier_influence_squared_input(&input, &residuals, OrderingPolicy::RequireSorted)
            .expect("influence");
        assert_all_close(
            &ic,
            &[
                0.212_777_777_777_777_76,
                -0.107_222_222_222_222_22,
                0.123_888_888_888_888_9,
                -0.053_888_888_888_888_875,
                -0.111_388_888_888_888_88,
                0.045_277_777_777_777_82,
                0.045_277_777_777_777_82,
                -0.154_722_222_222_222_23,
            ],
        );
        assert!(ic.iter().sum::<f64>().abs() < 1e-12);
    }

    #[test]
    fn empty_horizon_short_circuits_to_squared_risk() {
        let (input, risk, weights) = small_input();
        let early = SurvivalInput::new(input.time.clone(), input.status.clone(), 0.5);
        let ic = brier_influence_input(
            &early,
            &risk,
            &weights.before_time,
            0.2,
            OrderingPolicy::RequireSorted,
        )
        .expect("influence");
        let expected: Vec<f64> = risk.iter().map(|r| r * r - 0.2).collect();
        assert_all_close(&ic, &expected);
    }

    #[test]
    fn squared_residual_variant_restores_caller_order() {
        let (input, risk, weights) = small_input();
        let residuals = ipcw_squared_residuals(&input, &risk, &weights).expect("residuals");
        let sorted = brier_influence_squared_input(&input, &residuals, OrderingPolicy::RequireSorted)
            .expect("sorted influence");

        let permutation = [3, 7, 0, 5, 1, 6, 4, 2];
        let shuffled = SurvivalInput::new(
            permutation.iter().map(|&i| input.time[i]).collect(),
            permutation.iter().map(|&i| input.status[i]).collect(),
            input.horizon,
        );
        let shuffled_residuals: Vec<f64> = permutation.iter().map(|&i| residuals[i]).collect();
        let ic = brier_influence_squared_input(
            &shuffled,
            &shuffled_residuals,
            OrderingPolicy::SortAndRestore,
        )
        .expect("shuffled influence");
        for (position, &original) in permutation.iter().enumerate() {
            assert_relative_eq!(ic[position], sorted[original], epsilon = 1e-12);
        }
    }

    #[test]
    fn squared_residual_variant_validates_its_input() {
        let (input, _, _) = small_input();
        let err = brier_influence_squared_input(&input, &[0.1; 3], OrderingPolicy::RequireSorted)
            .expect_err("length mismatch");
        assert!(matches!(err, InfluenceError::Input(_)));

        let mut residuals = vec![0.1; input.len()];
        residuals[4] = f64::NAN;
        let err = brier_influence_squared_input(&input, &residuals, OrderingPolicy::RequireSorted)
            .expect_err("missing residual");
        assert!(matches!(err, InfluenceError::Input(_)));
    }

    #[test]
    fn non_positive_censoring_weight_is_rejected() {
        let (input, risk, mut weights) = small_input();
        weights.before_time[2] = 0.0;
        let err = brier_influence_input(
            &input,
            &risk,
            &weights.before_time,
            0.2,
            OrderingPolicy::RequireSorted,
        )
        .expect_err("zero weight");
        assert!(matches!(err, InfluenceError::Input(_)));
    }
}
