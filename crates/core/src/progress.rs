//! Course progress arithmetic.
//!
//! Progress is the share of a course's quizzes that a user has completed at
//! least once. Storage supplies the two counts; this module only turns them
//! into a percentage.

use serde::{Deserialize, Serialize};

/// Upper bound of a progress percentage.
pub const COMPLETE: f64 = 100.0;

/// Counts a progress percentage is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Distinct quizzes of the course the user has a result for.
    pub completed: u64,
    /// Quizzes reachable from the course's lessons.
    pub total: u64,
}

impl ProgressSnapshot {
    #[must_use]
    pub fn new(completed: u64, total: u64) -> Self {
        Self { completed, total }
    }

    /// Percent complete in `[0.0, 100.0]`.
    ///
    /// A course without quizzes reports `0.0`.
    #[must_use]
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }

        // Quiz counts stay far below 2^53, so the conversion is exact.
        #[allow(clippy::cast_precision_loss)]
        let ratio = self.completed as f64 / self.total as f64;

        (ratio * COMPLETE).clamp(0.0, COMPLETE)
    }

    /// Returns true once every quiz in the course has been completed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed >= self.total
    }

    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.total.saturating_sub(self.completed)
    }
}
