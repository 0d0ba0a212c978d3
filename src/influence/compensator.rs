//! # Censoring compensator
//!
//! Nelson–Aalen estimate of the censoring hazard on the grid of unique
//! observed times, accumulated into the compensator of the censoring
//! martingale. Each subject's contribution to the influence function of the
//! censoring survival estimate is read off this grid without searching.

use std::ops::Range;

use crate::input::EventStatus;
use crate::utils::usize_to_f64;

use super::horizon::Horizon;

/// Run of subjects sharing one observed time.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeBlock {
    /// Position on the unique time grid.
    pub index: usize,
    /// Subjects (in time order) observed at this time.
    pub subjects: Range<usize>,
    /// Cumulative compensator at the previous unique time, `None` for the first.
    pub preceding: Option<f64>,
}

/// Censoring hazard and cumulative compensator on the unique time grid.
///
/// Built once per call from a time-sorted sample and immutable afterwards.
#[derive(Debug, Clone)]
pub struct CensoringCompensator {
    n: usize,
    unique_times: Vec<f64>,
    block_starts: Vec<usize>,
    at_risk: Vec<usize>,
    censored: Vec<usize>,
    hazard: Vec<f64>,
    cumulative: Vec<f64>,
    block_of: Vec<usize>,
}

impl CensoringCompensator {
    /// Single pass over a time-sorted sample.
    ///
    /// `time` must be sorted ascending and non-empty; `status` has the same
    /// length. Callers go through `SurvivalInput::time_ordered`, which
    /// guarantees both.
    #[must_use]
    pub fn from_sorted(time: &[f64], status: &[EventStatus]) -> Self {
        let n = time.len();
        let n_f = usize_to_f64(n);
        let mut unique_times = Vec::new();
        let mut block_starts = Vec::new();
        let mut at_risk = Vec::new();
        let mut censored = Vec::new();
        let mut block_of = Vec::with_capacity(n);

        for (i, (&t, &s)) in time.iter().zip(status).enumerate() {
            if unique_times.last() != Some(&t) {
                unique_times.push(t);
                block_starts.push(i);
                // subjects i.. are still under observation at t
                at_risk.push(n - i);
                censored.push(0);
            }
            let block = unique_times.len() - 1;
            if s.is_censored() {
                censored[block] += 1;
            }
            block_of.push(block);
        }

        let hazard: Vec<f64> = censored
            .iter()
            .zip(&at_risk)
            .map(|(&c, &y)| usize_to_f64(c) / usize_to_f64(y))
            .collect();
        let cumulative = hazard
            .iter()
            .zip(&at_risk)
            .scan(0.0, |total, (&h, &y)| {
                *total += h * n_f / usize_to_f64(y);
                Some(*total)
            })
            .collect();

        log::trace!(
            "censoring compensator: {} subjects on {} unique times",
            n,
            unique_times.len()
        );

        Self {
            n,
            unique_times,
            block_starts,
            at_risk,
            censored,
            hazard,
            cumulative,
            block_of,
        }
    }

    /// Number of unique observed times.
    #[must_use]
    pub fn unique_count(&self) -> usize {
        self.unique_times.len()
    }

    #[must_use]
    pub fn unique_times(&self) -> &[f64] {
        &self.unique_times
    }

    #[must_use]
    pub fn at_risk(&self) -> &[usize] {
        &self.at_risk
    }

    #[must_use]
    pub fn censored_counts(&self) -> &[usize] {
        &self.censored
    }

    /// Censoring hazard increments `censored / at_risk`.
    #[must_use]
    pub fn hazard(&self) -> &[f64] {
        &self.hazard
    }

    /// Running sum of `hazard * n / at_risk` up to and including each time.
    #[must_use]
    pub fn cumulative(&self) -> &[f64] {
        &self.cumulative
    }

    /// Unique-time index of each subject.
    #[must_use]
    pub fn block_of(&self, subject: usize) -> usize {
        self.block_of[subject]
    }

    /// Tie-blocks of the time grid, in time order.
    pub fn blocks(&self) -> impl Iterator<Item = TimeBlock> + '_ {
        (0..self.unique_times.len()).map(move |index| {
            let end = self
                .block_starts
                .get(index + 1)
                .copied()
                .unwrap_or(self.n);
            TimeBlock {
                index,
                subjects: self.block_starts[index]..end,
                preceding: index.checked_sub(1).map(|prev| self.cumulative[prev]),
            }
        })
    }

    /// Contribution of `subject` to the influence function of the censoring
    /// survival estimate, evaluated at the horizon boundary.
    ///
    /// Subjects beyond the horizon are evaluated at the last time at or before
    /// it. An empty horizon contributes nothing.
    #[must_use]
    pub fn subject_term(
        &self,
        time: &[f64],
        status: &[EventStatus],
        horizon: Horizon,
        subject: usize,
    ) -> f64 {
        let Some(last) = horizon.last_index() else {
            return 0.0;
        };
        let boundary = self.block_of[subject.min(last)];
        if self.unique_times[boundary] < time[subject] {
            return -self.cumulative[boundary];
        }
        let own = self.block_of[subject];
        let jump = if status[subject].is_censored() {
            usize_to_f64(self.n) / usize_to_f64(self.at_risk[own])
        } else {
            0.0
        };
        jump - self.cumulative[own]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    use EventStatus::{Censored, Competing, Event};

    fn sample() -> (Vec<f64>, Vec<EventStatus>) {
        (
            vec![1.0, 2.0, 2.0, 3.0, 4.0],
            vec![Event, Censored, Censored, Event, Censored],
        )
    }

    #[test]
    fn grid_counts_match_hand_computation() {
        let (time, status) = sample();
        let comp = CensoringCompensator::from_sorted(&time, &status);
        assert_eq!(comp.unique_count(), 4);
        assert_eq!(comp.unique_times(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(comp.at_risk(), &[5, 4, 2, 1]);
        assert_eq!(comp.censored_counts(), &[0, 2, 0, 1]);
        assert_relative_eq!(comp.hazard()[1], 0.5);
        assert_relative_eq!(comp.hazard()[3], 1.0);
        let expected = [0.0, 0.625, 0.625, 5.625];
        for (value, target) in comp.cumulative().iter().zip(expected) {
            assert_relative_eq!(*value, target, epsilon = 1e-12);
        }
        assert_eq!(comp.block_of(2), 1);
    }

    #[test]
    fn blocks_cover_subjects_in_order() {
        let (time, status) = sample();
        let comp = CensoringCompensator::from_sorted(&time, &status);
        let blocks: Vec<_> = comp.blocks().collect();
        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[0].subjects, 0..1);
        assert_eq!(blocks[0].preceding, None);
        assert_eq!(blocks[1].subjects, 1..3);
        assert_eq!(blocks[3].subjects, 4..5);
        assert_relative_eq!(blocks[2].preceding.unwrap_or(f64::NAN), 0.625);
    }

    #[test]
    fn subject_term_uses_horizon_boundary() {
        let (time, status) = sample();
        let comp = CensoringCompensator::from_sorted(&time, &status);
        let horizon = Horizon::locate(&time, 2.5);
        let terms: Vec<f64> = (0..time.len())
            .map(|i| comp.subject_term(&time, &status, horizon, i))
            .collect();
        let expected = [0.0, 0.625, 0.625, -0.625, -0.625];
        for (value, target) in terms.iter().zip(expected) {
            assert_relative_eq!(*value, target, epsilon = 1e-12);
        }
    }

    #[test]
    fn subject_term_is_zero_for_empty_horizon() {
        let (time, status) = sample();
        let comp = CensoringCompensator::from_sorted(&time, &status);
        let horizon = Horizon::locate(&time, 0.5);
        assert!(horizon.last_index().is_none());
        assert_relative_eq!(comp.subject_term(&time, &status, horizon, 3), 0.0);
    }

    #[test]
    fn single_subject_is_one_block() {
        let comp = CensoringCompensator::from_sorted(&[2.0], &[Competing]);
        assert_eq!(comp.unique_count(), 1);
        assert_eq!(comp.at_risk(), &[1]);
        assert_relative_eq!(comp.cumulative()[0], 0.0);
    }
}
