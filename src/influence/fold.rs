//! Running tail integrals over time tie-blocks.
//!
//! Both assemblers walk subjects in time order and need, for each subject,
//! integrals over the subjects observed strictly later. Instead of re-summing,
//! each tie-block retires its own contribution from the state once, before its
//! members are evaluated.

/// `part1 + (term - shift) * part2`, where `part2` is the weight still ahead in
/// time and `part1` the weight already retired times the compensator at the
/// time it was retired.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TailIntegral {
    part1: f64,
    part2: f64,
    shift: f64,
}

impl TailIntegral {
    #[must_use]
    pub const fn new(total: f64) -> Self {
        Self::shifted(total, 0.0)
    }

    /// Tail integral whose compensator is offset by `shift`.
    #[must_use]
    pub const fn shifted(total: f64, shift: f64) -> Self {
        Self {
            part1: 0.0,
            part2: total,
            shift,
        }
    }

    /// Remove `weight` observed in the block with compensator `preceding` at the
    /// previous unique time. The first block has no preceding compensator and
    /// only leaves the tail.
    pub fn retire(&mut self, weight: f64, preceding: Option<f64>) {
        if let Some(compensator) = preceding {
            self.part1 -= weight * (compensator + self.shift);
        }
        self.part2 -= weight;
    }

    #[must_use]
    pub fn evaluate(&self, subject_term: f64) -> f64 {
        (subject_term - self.shift).mul_add(self.part2, self.part1)
    }

    #[cfg(test)]
    const fn remaining(&self) -> f64 {
        self.part2
    }
}
