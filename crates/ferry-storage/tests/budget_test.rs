//! Time budgeter tests: bootstrap, bounds, convergence, and properties.

use std::time::Duration;

use ferry_core::config::MigrationConfig;
use ferry_storage::TimeBudgeter;
use proptest::prelude::*;

fn us(v: u64) -> Duration {
    Duration::from_micros(v)
}

#[test]
fn test_defaults_from_config() {
    let budgeter = TimeBudgeter::new(&MigrationConfig::default());
    assert_eq!(budgeter.capacity(), 10);
    assert_eq!(budgeter.max_expecting(), Duration::from_millis(10));
    assert_eq!(budgeter.next_budget(), Duration::from_millis(5));
}

/// With a fixed per-transaction overhead, the budget settles where
/// work + overhead matches the expected transaction length.
#[test]
fn test_budget_converges_under_fixed_overhead() {
    let expecting = Duration::from_millis(10);
    let overhead = Duration::from_millis(2);
    let mut budgeter = TimeBudgeter::with_limits(expecting, Duration::from_millis(5), 10);

    let mut budget = budgeter.next_budget();
    for _ in 0..200 {
        budgeter.record_sample(budget, budget + overhead);
        budget = budgeter.next_budget();
    }
    let total = budget + overhead;
    let gap = total.max(expecting) - total.min(expecting);
    assert!(gap < Duration::from_micros(50), "settled at {total:?}");
}

#[test]
fn test_high_ratio_stays_below_expecting() {
    let mut budgeter = TimeBudgeter::with_limits(us(100), us(40), 3);
    budgeter.record_sample(us(99), us(100));
    assert!(budgeter.next_budget() < us(100));
    assert!(budgeter.next_budget() > us(40));
}

proptest! {
    #[test]
    fn prop_budget_stays_in_bounds(
        samples in prop::collection::vec((1u64..50_000, 1u64..50_000), 0..40),
        capacity in 1usize..16,
    ) {
        let expecting = Duration::from_millis(10);
        let initialize = Duration::from_millis(5);
        let mut budgeter = TimeBudgeter::with_limits(expecting, initialize, capacity);
        for (work, overhead) in &samples {
            budgeter.record_sample(us(*work), us(work + overhead));
        }

        let budget = budgeter.next_budget();
        prop_assert!(budget > Duration::ZERO);
        prop_assert!(budget <= expecting);
        prop_assert!(budgeter.filled_samples() <= capacity);
        prop_assert_eq!(budgeter.filled_samples(), samples.len().min(capacity));
        if samples.is_empty() {
            prop_assert_eq!(budget, initialize);
        }
    }

    #[test]
    fn prop_only_recent_samples_count(
        old in prop::collection::vec((1u64..50_000, 1u64..50_000), 1..20),
        recent in (1u64..50_000, 1u64..50_000),
        capacity in 1usize..4,
    ) {
        let mut budgeter =
            TimeBudgeter::with_limits(Duration::from_millis(10), Duration::from_millis(5), capacity);
        for (work, overhead) in &old {
            budgeter.record_sample(us(*work), us(work + overhead));
        }
        for _ in 0..capacity {
            budgeter.record_sample(us(recent.0), us(recent.0 + recent.1));
        }

        let expected = recent.0 as f64 / (recent.0 + recent.1) as f64;
        let ratio = budgeter.ratio().unwrap();
        prop_assert!((ratio - expected).abs() < 1e-9);
    }
}
