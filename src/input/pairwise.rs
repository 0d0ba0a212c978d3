//! Pairwise concordance estimates for the cross-validated AUC influence
//! functions.
//!
//! Row `r` of the matrix belongs to subject `cases[r]` and column `c` to
//! subject `controls[c]`; the entry is the out-of-fold probability that the
//! case outranks the control.

use faer::Mat;

use super::InputError;

#[derive(Debug, Clone)]
pub struct PairwiseConcordance {
    pub thetahat: Mat<f64>,
    pub cases: Vec<usize>,
    pub controls: Vec<usize>,
}

impl PairwiseConcordance {
    #[must_use]
    pub const fn new(thetahat: Mat<f64>, cases: Vec<usize>, controls: Vec<usize>) -> Self {
        Self {
            thetahat,
            cases,
            controls,
        }
    }

    /// Probability that case row `row` outranks control column `col`.
    #[must_use]
    pub fn value(&self, row: usize, col: usize) -> f64 {
        self.thetahat[(row, col)]
    }

    /// Check shape, value range, and that the case/control groups match the
    /// ones implied by the outcome.
    ///
    /// # Errors
    ///
    /// Returns `InputError` if the concordance estimates are inconsistent with
    /// the sample.
    pub fn validate_groups(
        &self,
        n: usize,
        expected_cases: &[usize],
        expected_controls: &[usize],
    ) -> Result<(), InputError> {
        if self.thetahat.nrows() != self.cases.len() || self.thetahat.ncols() != self.controls.len()
        {
            return Err(InputError::ConcordanceShape {
                rows: self.thetahat.nrows(),
                cols: self.thetahat.ncols(),
                cases: self.cases.len(),
                controls: self.controls.len(),
            });
        }
        if let Some(&index) = self
            .cases
            .iter()
            .chain(&self.controls)
            .find(|&&index| index >= n)
        {
            return Err(InputError::ConcordanceIndexOutOfRange { index, len: n });
        }
        if !same_members(&self.cases, expected_cases) {
            return Err(InputError::ConcordanceGroupMismatch { group: "cases" });
        }
        if !same_members(&self.controls, expected_controls) {
            return Err(InputError::ConcordanceGroupMismatch { group: "controls" });
        }
        for row in 0..self.thetahat.nrows() {
            for col in 0..self.thetahat.ncols() {
                let value = self.thetahat[(row, col)];
                if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                    return Err(InputError::InvalidConcordanceValue);
                }
            }
        }
        Ok(())
    }

    /// Map subject indices through `positions` (caller order to time order).
    /// Indices outside `positions` are kept so validation can report them.
    #[must_use]
    pub fn reindexed(&self, positions: &[usize]) -> Self {
        let remap = |indices: &[usize]| -> Vec<usize> {
            indices
                .iter()
                .map(|&i| positions.get(i).copied().unwrap_or(i))
                .collect()
        };
        Self {
            thetahat: self.thetahat.clone(),
            cases: remap(&self.cases),
            controls: remap(&self.controls),
        }
    }

    /// Matrix row for each subject, `None` for non-cases.
    #[must_use]
    pub fn case_rows(&self, n: usize) -> Vec<Option<usize>> {
        slots(&self.cases, n)
    }

    /// Matrix column for each subject, `None` for non-controls.
    #[must_use]
    pub fn control_columns(&self, n: usize) -> Vec<Option<usize>> {
        slots(&self.controls, n)
    }
}

fn slots(indices: &[usize], n: usize) -> Vec<Option<usize>> {
    let mut slots = vec![None; n];
    for (slot, &subject) in indices.iter().enumerate() {
        slots[subject] = Some(slot);
    }
    slots
}

fn same_members(given: &[usize], expected: &[usize]) -> bool {
    if given.len() != expected.len() {
        return false;
    }
    let mut given = given.to_vec();
    let mut expected = expected.to_vec();
    given.sort_unstable();
    expected.sort_unstable();
    given == expected
}
