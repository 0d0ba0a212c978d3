/////////////////////////////////////////////////////////////////////////////////////////////\
//
// Influence function of the IPCW time-dependent AUC with competing risks.
//
// Created on: 16 Oct 2026     Author: Tobias Kragholm
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Time-dependent AUC
//!
//! Influence function of the inverse-probability-of-censoring weighted AUC at
//! horizon `tau` with competing risks. Cases are subjects with the event of
//! interest at or before `tau`; controls are subjects still event-free after
//! `tau` or with a competing event before it. The AUC functional is a ratio
//! `nu / mu` of two U-statistics; each subject's value is the linearization
//! `(IF_nu * mu - IF_mu * nu) / mu^2`, including the terms that come from
//! estimating the censoring distribution with Nelson–Aalen.

use crate::input::{
    CensoringWeights, HorizonRole, OrderingPolicy, PairwiseConcordance, SurvivalInput,
    TimeOrderedSample, validate_scalar, validate_subject_values,
};
use crate::utils::usize_to_f64;

use super::InfluenceError;
use super::compensator::CensoringCompensator;
use super::fold::TailIntegral;
use super::horizon::Horizon;
use super::ranking::{
    PairwiseKernel, RankAggregates, RankAggregationStrategy, RiskRanking, TieHandling,
};

/// Options for the plug-in AUC influence function.
#[derive(Debug, Clone, Copy, Default)]
pub struct AucOptions {
    /// Treatment of equal risk scores.
    pub ties: TieHandling,
    /// Treatment of input not sorted by time.
    pub ordering: OrderingPolicy,
}

/// Scalars of the AUC functional shared by every subject's influence value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AucComponents {
    /// Weighted share of cases, `F1(tau)`.
    pub case_mass: f64,
    /// Weighted share of competing events, `F2(tau)`.
    pub competing_mass: f64,
    /// Share of subjects observed after the horizon.
    pub survivor_share: f64,
    /// `1/n * sum over cases of survivor_share_i / G(T_i-)`.
    pub survivor_concordance: f64,
    /// `1/n^2 * sum over cases of competing_below_i / G(T_i-)`.
    pub competing_concordance: f64,
    /// Denominator `mu` of the AUC functional.
    pub denominator: f64,
    /// Numerator `nu` implied by the aggregates.
    pub numerator: f64,
}

impl AucComponents {
    #[must_use]
    pub fn compute(
        roles: &[HorizonRole],
        weights: &[f64],
        at_horizon: f64,
        horizon: Horizon,
        aggregates: &RankAggregates,
    ) -> Self {
        let n = usize_to_f64(roles.len());
        let mut case_mass = 0.0;
        let mut competing_mass = 0.0;
        let mut survivor_concordance = 0.0;
        let mut competing_concordance = 0.0;
        for (i, role) in roles.iter().enumerate() {
            match role {
                HorizonRole::Case => {
                    case_mass += 1.0 / weights[i];
                    survivor_concordance += aggregates.survivor_share[i] / weights[i];
                    competing_concordance += aggregates.competing_below[i] / weights[i];
                }
                HorizonRole::Competing => competing_mass += 1.0 / weights[i],
                HorizonRole::Survivor | HorizonRole::CensoredBefore => {}
            }
        }
        case_mass /= n;
        competing_mass /= n;
        survivor_concordance /= n;
        competing_concordance /= n * n;
        let survivor_share = usize_to_f64(roles.len() - horizon.count()) / n;
        let denominator =
            (case_mass * survivor_share).mul_add(1.0 / at_horizon, case_mass * competing_mass);
        Self {
            case_mass,
            competing_mass,
            survivor_share,
            survivor_concordance,
            competing_concordance,
            denominator,
            numerator: survivor_concordance / at_horizon + competing_concordance,
        }
    }
}

enum Numerator {
    FromAuc(f64),
    Given(f64),
}

/// Influence function of the plug-in AUC estimate `auc` at the input's horizon.
///
/// # Errors
///
/// Returns `InfluenceError` if the inputs violate the input contract or the AUC
/// denominator is degenerate.
pub fn auc_influence_input(
    input: &SurvivalInput,
    risk: &[f64],
    weights: &CensoringWeights,
    auc: f64,
    options: AucOptions,
) -> Result<Vec<f64>, InfluenceError> {
    let sample = input.time_ordered(options.ordering)?;
    weights.validate(sample.len())?;
    validate_subject_values("risk", risk, sample.len())?;
    validate_scalar("auc", auc)?;
    let risk = sample.gather(risk);
    let before_time = sample.gather(&weights.before_time);
    let strategy = RiskRanking::new(&risk, options.ties);
    let aggregates = strategy.aggregate(sample.roles(), &before_time)?;
    log::debug!(
        "auc influence: {} subjects, ties {:?}, reordered {}",
        sample.len(),
        options.ties,
        sample.was_reordered()
    );
    let ic = assemble(
        &sample,
        &before_time,
        weights.at_horizon,
        &aggregates,
        Numerator::FromAuc(auc),
    )?;
    Ok(sample.restore(ic))
}

/// Cross-validated AUC influence function from out-of-fold pairwise
/// concordance estimates. `numerator` is the cross-validated estimate of `nu`.
///
/// # Errors
///
/// Returns `InfluenceError` if the inputs violate the input contract, the
/// concordance groups do not match the sample, or the AUC denominator is
/// degenerate.
pub fn auc_influence_cv_input(
    input: &SurvivalInput,
    weights: &CensoringWeights,
    concordance: &PairwiseConcordance,
    numerator: f64,
    ordering: OrderingPolicy,
) -> Result<Vec<f64>, InfluenceError> {
    let sample = input.time_ordered(ordering)?;
    weights.validate(sample.len())?;
    validate_scalar("numerator", numerator)?;
    let before_time = sample.gather(&weights.before_time);
    let concordance = if sample.was_reordered() {
        concordance.reindexed(&sample.sorted_positions())
    } else {
        concordance.clone()
    };
    let aggregates = PairwiseKernel::new(&concordance).aggregate(sample.roles(), &before_time)?;
    log::debug!(
        "cross-validated auc influence: {} subjects, {} cases, {} controls",
        sample.len(),
        concordance.cases.len(),
        concordance.controls.len()
    );
    let ic = assemble(
        &sample,
        &before_time,
        weights.at_horizon,
        &aggregates,
        Numerator::Given(numerator),
    )?;
    Ok(sample.restore(ic))
}

/// AUC influence function with any rank aggregation strategy, for input
/// already sorted by time. The strategy sees subjects in the input's order.
///
/// # Errors
///
/// Returns `InfluenceError` if the input is unsorted or malformed, the strategy
/// rejects the sample, or the AUC denominator is degenerate.
pub fn auc_influence_with_strategy<S: RankAggregationStrategy + ?Sized>(
    input: &SurvivalInput,
    weights: &CensoringWeights,
    strategy: &S,
    numerator: f64,
) -> Result<Vec<f64>, InfluenceError> {
    let sample = input.time_ordered(OrderingPolicy::RequireSorted)?;
    weights.validate(sample.len())?;
    validate_scalar("numerator", numerator)?;
    let aggregates = strategy.aggregate(sample.roles(), &weights.before_time)?;
    assemble(
        &sample,
        &weights.before_time,
        weights.at_horizon,
        &aggregates,
        Numerator::Given(numerator),
    )
}

/// Plug-in IPCW AUC at the input's horizon. Pairs with equal risk count one
/// half.
///
/// # Errors
///
/// Returns `InfluenceError` if the inputs violate the input contract or the AUC
/// denominator is degenerate.
pub fn ipcw_auc(
    input: &SurvivalInput,
    risk: &[f64],
    weights: &CensoringWeights,
    ordering: OrderingPolicy,
) -> Result<f64, InfluenceError> {
    let sample = input.time_ordered(ordering)?;
    weights.validate(sample.len())?;
    validate_subject_values("risk", risk, sample.len())?;
    let risk = sample.gather(risk);
    let before_time = sample.gather(&weights.before_time);
    let horizon = Horizon::locate(sample.time(), sample.horizon());
    let component = |ties| -> Result<AucComponents, InfluenceError> {
        let aggregates = RiskRanking::new(&risk, ties).aggregate(sample.roles(), &before_time)?;
        Ok(AucComponents::compute(
            sample.roles(),
            &before_time,
            weights.at_horizon,
            horizon,
            &aggregates,
        ))
    };
    let strict = component(TieHandling::Strict)?;
    let tied = component(TieHandling::WithinTies)?;
    let denominator = checked_denominator(strict.denominator)?;
    Ok(tied.numerator.mul_add(0.5, strict.numerator) / denominator)
}

pub(super) fn checked_denominator(value: f64) -> Result<f64, InfluenceError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(InfluenceError::DegenerateDenominator {
            quantity: "auc denominator",
            value,
        })
    }
}

/// Tail integrals over later tie-blocks, one per term family.
#[derive(Debug, Clone, Copy)]
struct AucTails {
    case_survivor: TailIntegral,
    case_competing: TailIntegral,
    case_mass: TailIntegral,
    competing_case: TailIntegral,
    competing_mass: TailIntegral,
}

impl AucTails {
    fn new(components: &AucComponents, numerator: f64, at_horizon: f64, n: f64) -> Self {
        let cross = (numerator - components.survivor_concordance / at_horizon) * n * n;
        Self {
            case_survivor: TailIntegral::new(n * components.survivor_concordance),
            case_competing: TailIntegral::shifted(cross, 1.0),
            case_mass: TailIntegral::new(n * components.case_mass),
            competing_case: TailIntegral::shifted(cross, 1.0),
            competing_mass: TailIntegral::new(n * components.competing_mass),
        }
    }

    fn retire(
        &mut self,
        role: HorizonRole,
        subject: usize,
        weight: f64,
        aggregates: &RankAggregates,
        preceding: Option<f64>,
    ) {
        match role {
            HorizonRole::Case => {
                self.case_survivor
                    .retire(aggregates.survivor_share[subject] / weight, preceding);
                self.case_competing
                    .retire(aggregates.competing_below[subject] / weight, preceding);
                self.case_mass.retire(1.0 / weight, preceding);
            }
            HorizonRole::Competing => {
                self.competing_case
                    .retire(aggregates.cases_above[subject] / weight, preceding);
                self.competing_mass.retire(1.0 / weight, preceding);
            }
            HorizonRole::Survivor | HorizonRole::CensoredBefore => {}
        }
    }
}

fn assemble(
    sample: &TimeOrderedSample,
    weights: &[f64],
    at_horizon: f64,
    aggregates: &RankAggregates,
    numerator: Numerator,
) -> Result<Vec<f64>, InfluenceError> {
    let time = sample.time();
    let status = sample.status();
    let roles = sample.roles();
    let n = usize_to_f64(sample.len());
    let horizon = Horizon::locate(time, sample.horizon());
    let compensator = CensoringCompensator::from_sorted(time, status);
    let components = AucComponents::compute(roles, weights, at_horizon, horizon, aggregates);
    let mu = checked_denominator(components.denominator)?;
    let nu = match numerator {
        Numerator::FromAuc(auc) => auc * mu,
        Numerator::Given(value) => value,
    };
    log::trace!(
        "auc components: F1={:.6} F2={:.6} mu={:.6} nu={:.6}, {} at or before horizon (boundary {})",
        components.case_mass,
        components.competing_mass,
        mu,
        nu,
        horizon.count(),
        horizon.boundary_index()
    );

    let mut tails = AucTails::new(&components, nu, at_horizon, n);
    let mut ic = vec![0.0; sample.len()];
    for block in compensator.blocks() {
        for k in block.subjects.clone() {
            tails.retire(roles[k], k, weights[k], aggregates, block.preceding);
        }
        for i in block.subjects {
            let term = compensator.subject_term(time, status, horizon, i);
            let case_mass_tail = tails.case_mass.evaluate(term) / n;

            let mut nu_if = (term - 2.0) / at_horizon * components.survivor_concordance
                + tails.case_survivor.evaluate(term) / (at_horizon * n)
                + tails.competing_case.evaluate(term) / (n * n)
                + tails.case_competing.evaluate(term) / (n * n);
            let mut mu_if = (term - 2.0) / at_horizon
                * components.survivor_share
                * components.case_mass
                + components.survivor_share / at_horizon * case_mass_tail
                + components.case_mass
                    * (tails.competing_mass.evaluate(term) / n - components.competing_mass)
                + components.competing_mass * (case_mass_tail - components.case_mass);

            let g = weights[i];
            match roles[i] {
                HorizonRole::Case => {
                    nu_if += aggregates.survivor_share[i] / (g * at_horizon)
                        + aggregates.competing_below[i] / (n * g);
                    mu_if += components.survivor_share / (g * at_horizon)
                        + components.competing_mass / g;
                }
                HorizonRole::Competing => {
                    nu_if += aggregates.cases_above[i] / (n * g);
                    mu_if += components.case_mass / g;
                }
                HorizonRole::Survivor => {
                    nu_if += aggregates.cases_above[i] / (n * at_horizon);
                    mu_if += components.case_mass / at_horizon;
                }
                HorizonRole::CensoredBefore => {}
            }
            ic[i] = nu_if.mul_add(mu, -mu_if * nu) / (mu * mu);
        }
    }
    Ok(ic)
}
