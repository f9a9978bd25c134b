//! Adaptive time budget for migration transactions.
//!
//! Every transaction pays a roughly fixed overhead (begin, commit, schema
//! checks) on top of per-row work. The ratio of work time to whole
//! transaction time over recent samples estimates how much of a
//! transaction is productive; scaling the expected transaction length by
//! that ratio gives the work budget for the next one.

use std::time::Duration;

use ferry_core::config::MigrationConfig;

/// One finished migration transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sample {
    /// Time spent transferring rows.
    pub work: Duration,
    /// Wall time of the whole transaction, commit included.
    pub total: Duration,
}

impl Sample {
    fn is_filled(&self) -> bool {
        !self.work.is_zero() && !self.total.is_zero()
    }
}

/// Fixed-capacity ring of recent samples. New samples evict the oldest,
/// so the budget tracks a moving window rather than the full history.
#[derive(Debug, Clone)]
pub struct TimeBudgeter {
    samples: Vec<Sample>,
    cursor: usize,
    max_expecting: Duration,
    max_initialize: Duration,
}

impl TimeBudgeter {
    pub fn new(config: &MigrationConfig) -> Self {
        Self::with_limits(
            config.effective_max_expecting(),
            config.effective_max_initialize(),
            config.effective_sample_count(),
        )
    }

    pub fn with_limits(max_expecting: Duration, max_initialize: Duration, capacity: usize) -> Self {
        debug_assert!(capacity > 0, "budgeter needs at least one sample slot");
        Self {
            samples: vec![Sample::default(); capacity.max(1)],
            cursor: 0,
            max_expecting,
            max_initialize,
        }
    }

    /// Record a finished transaction. Both durations must be non-zero and
    /// the whole transaction must outlast its work.
    pub fn record_sample(&mut self, work: Duration, total: Duration) {
        debug_assert!(!work.is_zero(), "work time must be positive");
        debug_assert!(total > work, "total time must exceed work time");
        if work.is_zero() || total <= work {
            tracing::debug!(?work, ?total, "discarding degenerate migration sample");
            return;
        }

        self.samples[self.cursor] = Sample { work, total };
        self.cursor = (self.cursor + 1) % self.samples.len();
    }

    /// Work time allowed for the next migration transaction.
    ///
    /// Falls back to the initialize duration while there is no history,
    /// and whenever the computed budget is not a finite value in
    /// `(0, max_expecting]`.
    pub fn next_budget(&self) -> Duration {
        let candidate = match self.ratio() {
            Some(ratio) => self.max_expecting.as_secs_f64() * ratio,
            None => return self.max_initialize,
        };
        if !candidate.is_finite()
            || candidate <= 0.0
            || candidate > self.max_expecting.as_secs_f64()
        {
            return self.max_initialize;
        }
        Duration::from_secs_f64(candidate)
    }

    /// Σ work / Σ total over filled samples, `None` without history.
    pub fn ratio(&self) -> Option<f64> {
        let (work, total) = self
            .samples
            .iter()
            .filter(|s| s.is_filled())
            .fold((0.0, 0.0), |(work, total), s| {
                (work + s.work.as_secs_f64(), total + s.total.as_secs_f64())
            });
        (total > 0.0).then(|| work / total)
    }

    /// Number of slots holding a recorded sample.
    pub fn filled_samples(&self) -> usize {
        self.samples.iter().filter(|s| s.is_filled()).count()
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    pub fn max_expecting(&self) -> Duration {
        self.max_expecting
    }

    pub fn max_initialize(&self) -> Duration {
        self.max_initialize
    }
}
