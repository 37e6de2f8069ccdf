// Aggregate node state: CPU accumulator, memory gauges, construction-time constants.

use crate::counter::{MetricSample, NodeMetric};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Point-in-time copy of the aggregator state.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateState {
    /// CPU time summed across all cores since the aggregator started.
    pub cpu_usage_core_nanoseconds: u64,
    pub memory_working_set_bytes: u64,
    pub memory_committed_bytes: u64,
    pub memory_capacity_bytes: u64,
    pub start_time: DateTime<Utc>,
}

/// Fields that change with every sample. Only touched under the aggregator lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct RunningTotals {
    pub(super) cpu_usage_core_nanoseconds: u64,
    pub(super) memory_working_set_bytes: u64,
    pub(super) memory_committed_bytes: u64,
}

impl RunningTotals {
    pub(super) fn apply(&mut self, sample: &MetricSample, num_cores: usize, period: Duration) {
        match sample.metric {
            NodeMetric::Cpu => {
                self.cpu_usage_core_nanoseconds = self
                    .cpu_usage_core_nanoseconds
                    .saturating_add(cpu_nanoseconds(sample.value, num_cores, period));
            }
            NodeMetric::WorkingSet => self.memory_working_set_bytes = gauge_bytes(sample.value),
            NodeMetric::CommittedBytes => self.memory_committed_bytes = gauge_bytes(sample.value),
        }
    }
}

/// CPU time covered by one sample taken every `period` at `percent`
/// utilization of all cores.
///
/// `(percent / 100) * cores * period_ns`, which is `(percent / 100) * cores * 1e9`
/// at the default one-second period. Negative and NaN percentages contribute
/// nothing.
pub fn cpu_nanoseconds(percent: f64, num_cores: usize, period: Duration) -> u64 {
    if percent.is_nan() || percent <= 0.0 {
        return 0;
    }
    ((percent / 100.0) * num_cores as f64 * period.as_nanos() as f64).round() as u64
}

fn gauge_bytes(value: f64) -> u64 {
    // float -> int casts saturate; NaN becomes 0
    value as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(metric: NodeMetric, value: f64) -> MetricSample {
        MetricSample {
            metric,
            name: String::new(),
            value,
        }
    }

    const SECOND: Duration = Duration::from_secs(1);

    #[test]
    fn half_utilization_on_four_cores_is_two_seconds() {
        assert_eq!(cpu_nanoseconds(50.0, 4, SECOND), 2_000_000_000);
    }

    #[test]
    fn cpu_nanoseconds_scale_with_sampling_period() {
        let period = Duration::from_millis(100);
        assert_eq!(cpu_nanoseconds(50.0, 4, period), 200_000_000);
        assert_eq!(cpu_nanoseconds(10.0, 4, Duration::from_millis(1)), 400_000);

        let mut totals = RunningTotals::default();
        totals.apply(&sample(NodeMetric::Cpu, 50.0), 4, period);
        totals.apply(&sample(NodeMetric::Cpu, 50.0), 4, period);
        assert_eq!(totals.cpu_usage_core_nanoseconds, 400_000_000);
    }

    #[test]
    fn cpu_nanoseconds_ignores_negative_and_nan() {
        assert_eq!(cpu_nanoseconds(-5.0, 4, SECOND), 0);
        assert_eq!(cpu_nanoseconds(f64::NAN, 4, SECOND), 0);
        assert_eq!(cpu_nanoseconds(0.0, 4, SECOND), 0);
    }

    #[test]
    fn cpu_accumulates_and_gauges_replace() {
        let mut totals = RunningTotals::default();
        totals.apply(&sample(NodeMetric::Cpu, 50.0), 4, SECOND);
        totals.apply(&sample(NodeMetric::WorkingSet, 1024.0), 4, SECOND);
        totals.apply(&sample(NodeMetric::Cpu, 25.0), 4, SECOND);
        totals.apply(&sample(NodeMetric::WorkingSet, 2048.0), 4, SECOND);
        totals.apply(&sample(NodeMetric::CommittedBytes, 4096.0), 4, SECOND);
        assert_eq!(totals.cpu_usage_core_nanoseconds, 3_000_000_000);
        assert_eq!(totals.memory_working_set_bytes, 2048);
        assert_eq!(totals.memory_committed_bytes, 4096);
    }

    #[test]
    fn cpu_accumulator_saturates_instead_of_wrapping() {
        let mut totals = RunningTotals {
            cpu_usage_core_nanoseconds: u64::MAX - 1,
            ..Default::default()
        };
        totals.apply(&sample(NodeMetric::Cpu, 100.0), 8, SECOND);
        assert_eq!(totals.cpu_usage_core_nanoseconds, u64::MAX);
    }

    #[test]
    fn gauge_clamps_negative_to_zero() {
        let mut totals = RunningTotals::default();
        totals.apply(&sample(NodeMetric::CommittedBytes, -1.0), 1, SECOND);
        assert_eq!(totals.memory_committed_bytes, 0);
    }
}
