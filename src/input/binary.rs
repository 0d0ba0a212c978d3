//! Binary outcome input used by the cross-validated AUC influence function
//! without a time dimension.

use super::InputError;

/// Binary outcome sample, `1` for cases and `0` for controls.
#[derive(Debug, Clone)]
pub struct BinaryInput {
    pub outcome: Vec<u8>,
}

impl BinaryInput {
    #[must_use]
    pub const fn new(outcome: Vec<u8>) -> Self {
        Self { outcome }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.outcome.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.outcome.is_empty()
    }

    /// # Errors
    ///
    /// Returns `InputError` if the sample is empty or holds codes other than
    /// `0` and `1`.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.outcome.is_empty() {
            return Err(InputError::EmptySample);
        }
        if let Some((index, &value)) = self
            .outcome
            .iter()
            .enumerate()
            .find(|(_, value)| **value > 1)
        {
            return Err(InputError::InvalidBinaryOutcome { index, value });
        }
        Ok(())
    }

    #[must_use]
    pub fn cases(&self) -> Vec<usize> {
        self.indices_with(1)
    }

    #[must_use]
    pub fn controls(&self) -> Vec<usize> {
        self.indices_with(0)
    }

    fn indices_with(&self, code: u8) -> Vec<usize> {
        self.outcome
            .iter()
            .enumerate()
            .filter_map(|(i, &value)| (value == code).then_some(i))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_codes_above_one() {
        let input = BinaryInput::new(vec![0, 1, 2]);
        assert_eq!(
            input.validate(),
            Err(InputError::InvalidBinaryOutcome { index: 2, value: 2 })
        );
    }

    #[test]
    fn groups_partition_subjects() {
        let input = BinaryInput::new(vec![1, 0, 0, 1]);
        assert!(input.validate().is_ok());
        assert_eq!(input.cases(), vec![0, 3]);
        assert_eq!(input.controls(), vec![1, 2]);
    }
}
