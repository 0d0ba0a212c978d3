/////////////////////////////////////////////////////////////////////////////////////////////\
//
// Rank aggregation strategies for the AUC influence function.
//
// Created on: 16 Oct 2026     Author: Tobias Kragholm
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Rank aggregation
//!
//! Risk-dependent sums needed by the AUC influence function. For each subject
//! we need the share of horizon survivors it outranks, the weighted mass of
//! competing events it outranks, and the weighted mass of cases that outrank
//! it. Two strategies produce the same quantities:
//!
//! - [`RiskRanking`] sorts by risk score once and sweeps the order forward and
//!   backward, O(n log n).
//! - [`PairwiseKernel`] reads an externally estimated concordance matrix pair
//!   by pair, O(n²).

use crate::input::{
    HorizonRole, InputError, PairwiseConcordance, check_length, validate_subject_values,
};
use crate::utils::{ascending_order, tie_runs, usize_to_f64};

/// Per-subject rank aggregates, all indexed in time order.
#[derive(Debug, Clone, PartialEq)]
pub struct RankAggregates {
    /// Horizon survivors ranked below the subject, divided by `n`.
    pub survivor_share: Vec<f64>,
    /// Sum of `1 / G(T_j-)` over cases ranked above the subject.
    pub cases_above: Vec<f64>,
    /// Sum of `1 / G(T_j-)` over competing events ranked below the subject.
    pub competing_below: Vec<f64>,
}

impl RankAggregates {
    fn zeros(n: usize) -> Self {
        Self {
            survivor_share: vec![0.0; n],
            cases_above: vec![0.0; n],
            competing_below: vec![0.0; n],
        }
    }
}

/// Source of the rank aggregates consumed by the AUC assembler.
pub trait RankAggregationStrategy {
    /// Compute aggregates for subjects with horizon `roles` and censoring
    /// weights `G(T_i-)`, both in time order.
    ///
    /// # Errors
    ///
    /// Returns `InputError` if the strategy's data does not fit the sample.
    fn aggregate(&self, roles: &[HorizonRole], weights: &[f64])
    -> Result<RankAggregates, InputError>;
}

/// How equal risk scores enter the aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieHandling {
    /// Strictly lower / strictly higher risk only; members of a tie-block all
    /// see the same value.
    #[default]
    Strict,
    /// Only subjects tied with the current one, leaving the subject itself out.
    WithinTies,
}

/// Ranking trick over predicted risk scores.
#[derive(Debug, Clone, Copy)]
pub struct RiskRanking<'a> {
    risk: &'a [f64],
    ties: TieHandling,
}

impl<'a> RiskRanking<'a> {
    #[must_use]
    pub const fn new(risk: &'a [f64], ties: TieHandling) -> Self {
        Self { risk, ties }
    }

    fn strict(&self, roles: &[HorizonRole], weights: &[f64]) -> RankAggregates {
        let n = roles.len();
        let n_f = usize_to_f64(n);
        let order = ascending_order(self.risk);
        let runs: Vec<_> = tie_runs(self.risk, &order).collect();
        let mut aggregates = RankAggregates::zeros(n);

        let mut survivors = 0usize;
        let mut competing = 0.0;
        for run in &runs {
            let block = &order[run.clone()];
            for &k in block {
                aggregates.survivor_share[k] = usize_to_f64(survivors) / n_f;
                aggregates.competing_below[k] = competing;
            }
            for &k in block {
                match roles[k] {
                    HorizonRole::Survivor => survivors += 1,
                    HorizonRole::Competing => competing += 1.0 / weights[k],
                    HorizonRole::Case | HorizonRole::CensoredBefore => {}
                }
            }
        }

        let mut cases = 0.0;
        for run in runs.iter().rev() {
            let block = &order[run.clone()];
            for &k in block {
                aggregates.cases_above[k] = cases;
            }
            for &k in block {
                if roles[k] == HorizonRole::Case {
                    cases += 1.0 / weights[k];
                }
            }
        }
        aggregates
    }

    fn within_ties(&self, roles: &[HorizonRole], weights: &[f64]) -> RankAggregates {
        let n = roles.len();
        let n_f = usize_to_f64(n);
        let order = ascending_order(self.risk);
        let mut aggregates = RankAggregates::zeros(n);

        for run in tie_runs(self.risk, &order) {
            let block = &order[run];
            let mut survivors = 0usize;
            let mut competing = 0.0;
            let mut cases = 0.0;
            for &k in block {
                match roles[k] {
                    HorizonRole::Survivor => survivors += 1,
                    HorizonRole::Competing => competing += 1.0 / weights[k],
                    HorizonRole::Case => cases += 1.0 / weights[k],
                    HorizonRole::CensoredBefore => {}
                }
            }
            for &k in block {
                let own = 1.0 / weights[k];
                let (own_survivor, own_competing, own_case) = match roles[k] {
                    HorizonRole::Survivor => (1, 0.0, 0.0),
                    HorizonRole::Competing => (0, own, 0.0),
                    HorizonRole::Case => (0, 0.0, own),
                    HorizonRole::CensoredBefore => (0, 0.0, 0.0),
                };
                aggregates.survivor_share[k] = usize_to_f64(survivors - own_survivor) / n_f;
                aggregates.competing_below[k] = competing - own_competing;
                aggregates.cases_above[k] = cases - own_case;
            }
        }
        aggregates
    }
}

impl RankAggregationStrategy for RiskRanking<'_> {
    fn aggregate(
        &self,
        roles: &[HorizonRole],
        weights: &[f64],
    ) -> Result<RankAggregates, InputError> {
        validate_subject_values("risk", self.risk, roles.len())?;
        check_length("censoring weights", weights.len(), roles.len())?;
        Ok(match self.ties {
            TieHandling::Strict => self.strict(roles, weights),
            TieHandling::WithinTies => self.within_ties(roles, weights),
        })
    }
}

/// Pairwise concordance kernel, typically estimated out of fold.
#[derive(Debug, Clone, Copy)]
pub struct PairwiseKernel<'a> {
    concordance: &'a PairwiseConcordance,
}

impl<'a> PairwiseKernel<'a> {
    #[must_use]
    pub const fn new(concordance: &'a PairwiseConcordance) -> Self {
        Self { concordance }
    }
}

impl RankAggregationStrategy for PairwiseKernel<'_> {
    fn aggregate(
        &self,
        roles: &[HorizonRole],
        weights: &[f64],
    ) -> Result<RankAggregates, InputError> {
        let n = roles.len();
        check_length("censoring weights", weights.len(), n)?;
        let cases: Vec<usize> = (0..n).filter(|&i| roles[i] == HorizonRole::Case).collect();
        let controls: Vec<usize> = (0..n).filter(|&i| roles[i].is_control()).collect();
        let theta = self.concordance;
        theta.validate_groups(n, &cases, &controls)?;

        let n_f = usize_to_f64(n);
        let rows = theta.case_rows(n);
        let columns = theta.control_columns(n);
        let mut aggregates = RankAggregates::zeros(n);
        for i in 0..n {
            if let Some(row) = rows[i] {
                let mut survivors = 0.0;
                let mut competing = 0.0;
                for (col, &j) in theta.controls.iter().enumerate() {
                    let value = theta.value(row, col);
                    match roles[j] {
                        HorizonRole::Survivor => survivors += value,
                        HorizonRole::Competing => competing += value / weights[j],
                        HorizonRole::Case | HorizonRole::CensoredBefore => {}
                    }
                }
                aggregates.survivor_share[i] = survivors / n_f;
                aggregates.competing_below[i] = competing;
            } else if let Some(col) = columns[i] {
                aggregates.cases_above[i] = theta
                    .cases
                    .iter()
                    .enumerate()
                    .map(|(row, &j)| theta.value(row, col) / weights[j])
                    .sum();
            }
        }
        Ok(aggregates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use faer::Mat;

    use HorizonRole::{Case, CensoredBefore, Competing, Survivor};

    // time = [1, 2, 2, 3, 4, 5], status = [1, 1, 0, 2, 0, 1], tau = 3.5
    fn tied_sample() -> (Vec<HorizonRole>, Vec<f64>, Vec<f64>) {
        (
            vec![Case, Case, CensoredBefore, Competing, Survivor, Survivor],
            vec![1.0, 1.0, 1.0, 0.8, 0.8, 0.6],
            vec![0.3, 0.6, 0.6, 0.1, 0.6, 0.8],
        )
    }

    #[test]
    fn strict_mode_gives_tie_blocks_one_value() {
        let (roles, weights, risk) = tied_sample();
        let agg = RiskRanking::new(&risk, TieHandling::Strict)
            .aggregate(&roles, &weights)
            .expect("aggregation");
        let expected_share = [0.0, 0.0, 0.0, 0.0, 0.0, 1.0 / 6.0];
        for (value, target) in agg.survivor_share.iter().zip(expected_share) {
            assert_relative_eq!(*value, target, epsilon = 1e-12);
        }
        // competing subject 3 (risk 0.1, weight 0.8) sits below everyone else
        assert_relative_eq!(agg.competing_below[0], 1.25, epsilon = 1e-12);
        assert_relative_eq!(agg.competing_below[1], 1.25, epsilon = 1e-12);
        assert_relative_eq!(agg.competing_below[3], 0.0);
        // cases at risk 0.3 and 0.6
        assert_relative_eq!(agg.cases_above[3], 2.0, epsilon = 1e-12);
        assert_relative_eq!(agg.cases_above[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(agg.cases_above[1], 0.0);
        assert_relative_eq!(agg.cases_above[5], 0.0);
    }

    #[test]
    fn within_ties_mode_leaves_each_subject_out() {
        let (roles, weights, risk) = tied_sample();
        let agg = RiskRanking::new(&risk, TieHandling::WithinTies)
            .aggregate(&roles, &weights)
            .expect("aggregation");
        let expected_share = [0.0, 1.0 / 6.0, 1.0 / 6.0, 0.0, 0.0, 0.0];
        for (value, target) in agg.survivor_share.iter().zip(expected_share) {
            assert_relative_eq!(*value, target, epsilon = 1e-12);
        }
        // subject 1 is the only case in the 0.6 block
        assert_relative_eq!(agg.cases_above[1], 0.0);
        assert_relative_eq!(agg.cases_above[2], 1.0, epsilon = 1e-12);
        assert_relative_eq!(agg.cases_above[4], 1.0, epsilon = 1e-12);
        assert!(agg.competing_below.iter().all(|value| *value == 0.0));
    }

    #[test]
    fn pairwise_indicator_kernel_matches_strict_ranking() {
        let roles = vec![Case, Competing, Case, CensoredBefore, Survivor, Survivor];
        let weights = vec![1.0, 0.9, 0.9, 0.8, 0.7, 0.7];
        let risk = vec![0.9, 0.2, 0.4, 0.5, 0.3, 0.95];
        let cases = vec![0, 2];
        let controls = vec![1, 4, 5];
        let thetahat = Mat::from_fn(cases.len(), controls.len(), |r, c| {
            if risk[cases[r]] >= risk[controls[c]] {
                1.0
            } else {
                0.0
            }
        });
        let concordance = PairwiseConcordance::new(thetahat, cases, controls);
        let pairwise = PairwiseKernel::new(&concordance)
            .aggregate(&roles, &weights)
            .expect("pairwise aggregation");
        let ranked = RiskRanking::new(&risk, TieHandling::Strict)
            .aggregate(&roles, &weights)
            .expect("ranked aggregation");
        for i in [0, 2] {
            assert_relative_eq!(
                pairwise.survivor_share[i],
                ranked.survivor_share[i],
                epsilon = 1e-12
            );
            assert_relative_eq!(
                pairwise.competing_below[i],
                ranked.competing_below[i],
                epsilon = 1e-12
            );
        }
        for i in [1, 4, 5] {
            assert_relative_eq!(pairwise.cases_above[i], ranked.cases_above[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn pairwise_rejects_groups_inconsistent_with_roles() {
        let roles = vec![Case, Survivor];
        let concordance = PairwiseConcordance::new(Mat::from_fn(1, 1, |_, _| 0.5), vec![1], vec![0]);
        let err = PairwiseKernel::new(&concordance)
            .aggregate(&roles, &[1.0, 1.0])
            .expect_err("swapped groups should fail");
        assert_eq!(err, InputError::ConcordanceGroupMismatch { group: "cases" });
    }

    #[test]
    fn risk_length_is_checked() {
        let roles = vec![Case, Survivor];
        let err = RiskRanking::new(&[0.1], TieHandling::Strict)
            .aggregate(&roles, &[1.0, 1.0])
            .expect_err("short risk should fail");
        assert_eq!(
            err,
            InputError::LengthMismatch {
                name: "risk",
                len: 1,
                expected: 2
            }
        );
    }
}
