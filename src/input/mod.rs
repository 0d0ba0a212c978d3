//! # Influence inputs
//!
//! Containers for right-censored competing-risk samples, the externally
//! estimated censoring survival weights, and the ordering policy applied before
//! the numerical core runs. All entry points validate through this module so
//! every computation sees the same contract.
//!
//! # Examples
//!
//! ```
//! use ipcw_influence::{OrderingPolicy, SurvivalInput};
//!
//! let input = SurvivalInput::new(vec![1.0, 2.0, 3.0], vec![1, 0, 2], 2.5);
//! assert!(input.validate().is_ok());
//!
//! let sample = input.time_ordered(OrderingPolicy::RequireSorted).unwrap();
//! assert_eq!(sample.len(), 3);
//! ```
//!
//! ```
//! use ipcw_influence::{OrderingPolicy, SurvivalInput};
//!
//! let input = SurvivalInput::new(vec![3.0, 1.0], vec![1, 1], 2.0);
//! assert!(input.time_ordered(OrderingPolicy::RequireSorted).is_err());
//! assert!(input.time_ordered(OrderingPolicy::SortAndRestore).is_ok());
//! ```

use thiserror::Error;

use crate::utils::{ascending_order, first_descent, slice_is_finite};

pub mod binary;
pub mod pairwise;

pub use binary::BinaryInput;
pub use pairwise::PairwiseConcordance;

/// Errors returned when validating influence-function inputs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("sample must contain at least one subject")]
    EmptySample,
    #[error("{name} length ({len}) must match the number of subjects ({expected})")]
    LengthMismatch {
        name: &'static str,
        len: usize,
        expected: usize,
    },
    #[error("{name} contains missing or non-finite values")]
    NonFinite { name: &'static str },
    #[error("horizon must be finite")]
    NonFiniteHorizon,
    #[error("status at index {index} is {value}; expected 0 (censored), 1 (event) or 2 (competing)")]
    InvalidStatus { index: usize, value: u8 },
    #[error("binary outcome at index {index} is {value}; expected 0 or 1")]
    InvalidBinaryOutcome { index: usize, value: u8 },
    #[error("{name} must be strictly positive")]
    NonPositiveWeight { name: &'static str },
    #[error("time must be sorted ascending; order breaks at index {index}")]
    UnsortedTime { index: usize },
    #[error(
        "concordance matrix is {rows}x{cols} but there are {cases} cases and {controls} controls"
    )]
    ConcordanceShape {
        rows: usize,
        cols: usize,
        cases: usize,
        controls: usize,
    },
    #[error("concordance subject index {index} is out of range for {len} subjects")]
    ConcordanceIndexOutOfRange { index: usize, len: usize },
    #[error("concordance {group} do not match the groups implied by the outcome")]
    ConcordanceGroupMismatch { group: &'static str },
    #[error("concordance values must be finite probabilities in [0, 1]")]
    InvalidConcordanceValue,
}

/// Observed status of a subject at its event or censoring time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventStatus {
    Censored,
    Event,
    Competing,
}

impl EventStatus {
    #[must_use]
    pub const fn is_censored(self) -> bool {
        matches!(self, Self::Censored)
    }
}

impl TryFrom<u8> for EventStatus {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Censored),
            1 => Ok(Self::Event),
            2 => Ok(Self::Competing),
            other => Err(other),
        }
    }
}

/// Where a subject falls relative to the evaluation horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HorizonRole {
    /// Event of interest observed at or before the horizon.
    Case,
    /// Competing event observed at or before the horizon.
    Competing,
    /// Still under observation after the horizon.
    Survivor,
    /// Censored at or before the horizon.
    CensoredBefore,
}

impl HorizonRole {
    #[must_use]
    pub fn classify(time: f64, status: EventStatus, horizon: f64) -> Self {
        if time > horizon {
            return Self::Survivor;
        }
        match status {
            EventStatus::Event => Self::Case,
            EventStatus::Competing => Self::Competing,
            EventStatus::Censored => Self::CensoredBefore,
        }
    }

    /// Controls are compared against cases in the AUC kernel.
    #[must_use]
    pub const fn is_control(self) -> bool {
        matches!(self, Self::Survivor | Self::Competing)
    }
}

/// How entry points treat input that is not sorted by time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderingPolicy {
    /// Reject unsorted time with `InputError::UnsortedTime`.
    #[default]
    RequireSorted,
    /// Stably sort by time, compute, and return values in the caller's order.
    SortAndRestore,
}

/// Right-censored competing-risk sample evaluated at a horizon `tau`.
#[derive(Debug, Clone)]
pub struct SurvivalInput {
    pub time: Vec<f64>,
    pub status: Vec<u8>,
    pub horizon: f64,
}

impl SurvivalInput {
    #[must_use]
    pub const fn new(time: Vec<f64>, status: Vec<u8>, horizon: f64) -> Self {
        Self {
            time,
            status,
            horizon,
        }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.time.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Validate lengths, finiteness, and status codes.
    ///
    /// # Errors
    ///
    /// Returns `InputError` if the sample is malformed.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.time.is_empty() {
            return Err(InputError::EmptySample);
        }
        check_length("status", self.status.len(), self.time.len())?;
        if !slice_is_finite(&self.time) {
            return Err(InputError::NonFinite { name: "time" });
        }
        if !self.horizon.is_finite() {
            return Err(InputError::NonFiniteHorizon);
        }
        self.parse_status().map(|_| ())
    }

    /// Horizon role of each subject, in the caller's order.
    ///
    /// # Errors
    ///
    /// Returns `InputError` if the sample is malformed.
    pub fn roles(&self) -> Result<Vec<HorizonRole>, InputError> {
        self.validate()?;
        Ok(self
            .parse_status()?
            .into_iter()
            .zip(&self.time)
            .map(|(status, &time)| HorizonRole::classify(time, status, self.horizon))
            .collect())
    }

    fn parse_status(&self) -> Result<Vec<EventStatus>, InputError> {
        self.status
            .iter()
            .enumerate()
            .map(|(index, &value)| {
                EventStatus::try_from(value)
                    .map_err(|value| InputError::InvalidStatus { index, value })
            })
            .collect()
    }

    /// Validate the sample and arrange it in ascending time order.
    ///
    /// # Errors
    ///
    /// Returns `InputError` if the sample is malformed, or if it is unsorted
    /// under `OrderingPolicy::RequireSorted`.
    pub fn time_ordered(&self, policy: OrderingPolicy) -> Result<TimeOrderedSample, InputError> {
        self.validate()?;
        let status = self.parse_status()?;
        let order = match (first_descent(&self.time), policy) {
            (None, _) => None,
            (Some(index), OrderingPolicy::RequireSorted) => {
                return Err(InputError::UnsortedTime { index });
            }
            (Some(_), OrderingPolicy::SortAndRestore) => Some(ascending_order(&self.time)),
        };
        let (time, status) = match &order {
            None => (self.time.clone(), status),
            Some(order) => (
                order.iter().map(|&i| self.time[i]).collect(),
                order.iter().map(|&i| status[i]).collect(),
            ),
        };
        let roles = time
            .iter()
            .zip(&status)
            .map(|(&t, &s)| HorizonRole::classify(t, s, self.horizon))
            .collect();
        Ok(TimeOrderedSample {
            time,
            status,
            roles,
            horizon: self.horizon,
            order,
        })
    }
}

/// Censoring survival estimates supplied by the caller.
#[derive(Debug, Clone)]
pub struct CensoringWeights {
    /// Censoring survival just before each subject's time, `G(T_i-)`.
    pub before_time: Vec<f64>,
    /// Censoring survival at the horizon, `G(tau)`.
    pub at_horizon: f64,
}

impl CensoringWeights {
    #[must_use]
    pub const fn new(before_time: Vec<f64>, at_horizon: f64) -> Self {
        Self {
            before_time,
            at_horizon,
        }
    }

    /// # Errors
    ///
    /// Returns `InputError` if lengths differ from `n` or any weight is not
    /// strictly positive.
    pub fn validate(&self, n: usize) -> Result<(), InputError> {
        validate_positive_weights("censoring weights", &self.before_time, n)?;
        if !self.at_horizon.is_finite() {
            return Err(InputError::NonFinite {
                name: "censoring weight at horizon",
            });
        }
        if self.at_horizon <= 0.0 {
            return Err(InputError::NonPositiveWeight {
                name: "censoring weight at horizon",
            });
        }
        Ok(())
    }
}

/// A validated sample in ascending time order, remembering how to map results
/// back to the caller's order.
#[derive(Debug, Clone)]
pub struct TimeOrderedSample {
    time: Vec<f64>,
    status: Vec<EventStatus>,
    roles: Vec<HorizonRole>,
    horizon: f64,
    order: Option<Vec<usize>>,
}

impl TimeOrderedSample {
    #[must_use]
    pub const fn len(&self) -> usize {
        self.time.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    #[must_use]
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    #[must_use]
    pub fn status(&self) -> &[EventStatus] {
        &self.status
    }

    #[must_use]
    pub fn roles(&self) -> &[HorizonRole] {
        &self.roles
    }

    #[must_use]
    pub const fn horizon(&self) -> f64 {
        self.horizon
    }

    /// True when the caller's input had to be re-sorted.
    #[must_use]
    pub const fn was_reordered(&self) -> bool {
        self.order.is_some()
    }

    /// Arrange a per-subject vector in time order.
    #[must_use]
    pub fn gather(&self, values: &[f64]) -> Vec<f64> {
        match &self.order {
            None => values.to_vec(),
            Some(order) => order.iter().map(|&i| values[i]).collect(),
        }
    }

    /// Map a subject index from the caller's order to time order.
    #[must_use]
    pub fn sorted_positions(&self) -> Vec<usize> {
        match &self.order {
            None => (0..self.len()).collect(),
            Some(order) => {
                let mut positions = vec![0; order.len()];
                for (sorted, &original) in order.iter().enumerate() {
                    positions[original] = sorted;
                }
                positions
            }
        }
    }

    /// Return time-ordered results in the caller's order.
    #[must_use]
    pub fn restore(&self, values: Vec<f64>) -> Vec<f64> {
        match &self.order {
            None => values,
            Some(order) => {
                let mut restored = vec![0.0; values.len()];
                for (sorted, &original) in order.iter().enumerate() {
                    restored[original] = values[sorted];
                }
                restored
            }
        }
    }
}

pub(crate) const fn check_length(
    name: &'static str,
    len: usize,
    expected: usize,
) -> Result<(), InputError> {
    if len != expected {
        return Err(InputError::LengthMismatch {
            name,
            len,
            expected,
        });
    }
    Ok(())
}

pub(crate) fn validate_subject_values(
    name: &'static str,
    values: &[f64],
    n: usize,
) -> Result<(), InputError> {
    check_length(name, values.len(), n)?;
    if !slice_is_finite(values) {
        return Err(InputError::NonFinite { name });
    }
    Ok(())
}

pub(crate) fn validate_positive_weights(
    name: &'static str,
    values: &[f64],
    n: usize,
) -> Result<(), InputError> {
    validate_subject_values(name, values, n)?;
    if values.iter().any(|&value| value <= 0.0) {
        return Err(InputError::NonPositiveWeight { name });
    }
    Ok(())
}

pub(crate) fn validate_scalar(name: &'static str, value: f64) -> Result<(), InputError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(InputError::NonFinite { name })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_empty_sample() {
        let input = SurvivalInput::new(Vec::new(), Vec::new(), 1.0);
        assert_eq!(input.validate(), Err(InputError::EmptySample));
    }

    #[test]
    fn validate_rejects_length_mismatch() {
        let input = SurvivalInput::new(vec![1.0, 2.0], vec![1], 1.0);
        let err = input.validate().expect_err("length mismatch should fail");
        assert_eq!(
            err,
            InputError::LengthMismatch {
                name: "status",
                len: 1,
                expected: 2
            }
        );
    }

    #[test]
    fn validate_rejects_missing_time() {
        let input = SurvivalInput::new(vec![1.0, f64::NAN], vec![1, 0], 1.0);
        assert_eq!(
            input.validate(),
            Err(InputError::NonFinite { name: "time" })
        );
    }

    #[test]
    fn validate_rejects_unknown_status_code() {
        let input = SurvivalInput::new(vec![1.0, 2.0], vec![1, 3], 1.0);
        assert_eq!(
            input.validate(),
            Err(InputError::InvalidStatus { index: 1, value: 3 })
        );
    }

    #[test]
    fn validate_rejects_non_finite_horizon() {
        let input = SurvivalInput::new(vec![1.0], vec![1], f64::NAN);
        assert_eq!(input.validate(), Err(InputError::NonFiniteHorizon));
    }

    #[test]
    fn require_sorted_reports_first_descent() {
        let input = SurvivalInput::new(vec![1.0, 3.0, 2.0], vec![1, 1, 1], 2.0);
        let err = input
            .time_ordered(OrderingPolicy::RequireSorted)
            .expect_err("unsorted time should fail");
        assert_eq!(err, InputError::UnsortedTime { index: 2 });
    }

    #[test]
    fn sort_and_restore_round_trips_subject_order() {
        let input = SurvivalInput::new(vec![3.0, 1.0, 2.0], vec![0, 1, 2], 2.0);
        let sample = input
            .time_ordered(OrderingPolicy::SortAndRestore)
            .expect("sorting should succeed");
        assert!(sample.was_reordered());
        assert_eq!(sample.time(), &[1.0, 2.0, 3.0]);
        assert_eq!(
            sample.status(),
            &[EventStatus::Event, EventStatus::Competing, EventStatus::Censored]
        );
        assert_eq!(sample.gather(&[30.0, 10.0, 20.0]), vec![10.0, 20.0, 30.0]);
        assert_eq!(sample.restore(vec![10.0, 20.0, 30.0]), vec![30.0, 10.0, 20.0]);
        assert_eq!(sample.sorted_positions(), vec![2, 0, 1]);
    }

    #[test]
    fn roles_follow_horizon_and_status() {
        let input = SurvivalInput::new(vec![1.0, 2.0, 2.0, 3.0], vec![1, 2, 0, 1], 2.0);
        let sample = input
            .time_ordered(OrderingPolicy::RequireSorted)
            .expect("sorted input");
        assert_eq!(
            sample.roles(),
            &[
                HorizonRole::Case,
                HorizonRole::Competing,
                HorizonRole::CensoredBefore,
                HorizonRole::Survivor
            ]
        );
    }

    #[test]
    fn censoring_weights_must_be_positive() {
        let weights = CensoringWeights::new(vec![1.0, 0.0], 0.5);
        assert_eq!(
            weights.validate(2),
            Err(InputError::NonPositiveWeight {
                name: "censoring weights"
            })
        );
        let weights = CensoringWeights::new(vec![1.0, 0.5], 0.0);
        assert_eq!(
            weights.validate(2),
            Err(InputError::NonPositiveWeight {
                name: "censoring weight at horizon"
            })
        );
        assert!(CensoringWeights::new(vec![1.0, 0.5], 0.5).validate(2).is_ok());
    }
}
