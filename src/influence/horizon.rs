//! Partition of a time-sorted sample at the evaluation horizon.

/// Last subject (in time order) observed at or before the horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Horizon {
    last: Option<usize>,
}

impl Horizon {
    /// Binary search over ascending `time`.
    #[must_use]
    pub fn locate(time: &[f64], tau: f64) -> Self {
        let count = time.partition_point(|&t| t <= tau);
        Self {
            last: count.checked_sub(1),
        }
    }

    /// `None` when every subject is observed after the horizon.
    #[must_use]
    pub const fn last_index(self) -> Option<usize> {
        self.last
    }

    /// Last index at or before the horizon, `0` when there is none.
    #[must_use]
    pub fn boundary_index(self) -> usize {
        self.last.unwrap_or(0)
    }

    /// Number of subjects observed at or before the horizon.
    #[must_use]
    pub fn count(self) -> usize {
        self.last.map_or(0, |last| last + 1)
    }
}
