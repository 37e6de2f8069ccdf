// Node aggregator: fans samples from every counter source into one consumer that
// updates the locked aggregate state.

mod state;

pub use state::{AggregateState, cpu_nanoseconds};

use crate::counter::{
    COMMITTED_BYTES_COUNTER, CPU_COUNTER, CounterProvider, CounterQuery, CounterSource,
    DEFAULT_SAMPLE_PERIOD, MetricSample, NodeMetric, WORKING_SET_COUNTER,
};
use crate::error::AggregatorError;
use crate::host::HostInfo;
use chrono::{DateTime, Utc};
use state::RunningTotals;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Counter paths and sampling period for the node metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorConfig {
    pub period: Duration,
    pub cpu_counter: String,
    pub working_set_counter: String,
    pub committed_bytes_counter: String,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            period: DEFAULT_SAMPLE_PERIOD,
            cpu_counter: CPU_COUNTER.into(),
            working_set_counter: WORKING_SET_COUNTER.into(),
            committed_bytes_counter: COMMITTED_BYTES_COUNTER.into(),
        }
    }
}

impl AggregatorConfig {
    fn queries(&self) -> [(NodeMetric, CounterQuery); 3] {
        [
            (NodeMetric::Cpu, &self.cpu_counter),
            (NodeMetric::WorkingSet, &self.working_set_counter),
            (NodeMetric::CommittedBytes, &self.committed_bytes_counter),
        ]
        .map(|(metric, path)| {
            (
                metric,
                CounterQuery::new(path.clone()).with_period(self.period),
            )
        })
    }
}

pub struct Aggregator {
    provider: Arc<dyn CounterProvider>,
    config: AggregatorConfig,
    num_cores: usize,
    memory_capacity_bytes: u64,
    start_time: DateTime<Utc>,
    totals: Mutex<RunningTotals>,
    started: AtomicBool,
}

impl Aggregator {
    /// Captures installed memory, core count and start time. Starts nothing.
    pub fn new(
        host: &dyn HostInfo,
        provider: Arc<dyn CounterProvider>,
        config: AggregatorConfig,
    ) -> Result<Self, AggregatorError> {
        let memory_capacity_bytes = host.physical_memory_bytes()?;
        Ok(Self {
            provider,
            config,
            num_cores: host.num_cores(),
            memory_capacity_bytes,
            start_time: Utc::now(),
            totals: Mutex::new(RunningTotals::default()),
            started: AtomicBool::new(false),
        })
    }

    pub fn num_cores(&self) -> usize {
        self.num_cores
    }

    pub fn memory_capacity_bytes(&self) -> u64 {
        self.memory_capacity_bytes
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// Opens every counter, then spawns one sampling task per counter plus the
    /// consumer. Nothing is spawned unless all counters open.
    ///
    /// The returned handle completes once `token` is cancelled and every task
    /// has exited. Must be called from within a tokio runtime.
    pub fn start(
        self: &Arc<Self>,
        token: CancellationToken,
    ) -> Result<tokio::task::JoinHandle<()>, AggregatorError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(AggregatorError::AlreadyStarted);
        }

        let mut sources = Vec::with_capacity(3);
        for (metric, query) in self.config.queries() {
            match CounterSource::open(self.provider.as_ref(), query, metric) {
                Ok(source) => sources.push(source),
                Err(e) => {
                    warn!(error = %e, operation = "open_counter", "aggregator start failed");
                    self.started.store(false, Ordering::SeqCst);
                    return Err(e.into());
                }
            }
        }

        let (tx, rx) = mpsc::channel::<MetricSample>(1);
        let producers: Vec<_> = sources
            .into_iter()
            .map(|source| source.spawn(tx.clone(), token.clone()))
            .collect();
        drop(tx);
        let consumer = tokio::spawn(self.clone().consume(rx, token));

        info!(
            period_ms = self.config.period.as_millis() as u64,
            num_cores = self.num_cores,
            memory_capacity_bytes = self.memory_capacity_bytes,
            "node aggregation started"
        );

        Ok(tokio::spawn(async move {
            if let Err(e) = consumer.await {
                warn!(error = %e, "aggregator consumer task failed");
            }
            for producer in producers {
                if let Err(e) = producer.await {
                    warn!(error = %e, "counter source task failed");
                }
            }
            debug!("node aggregation stopped");
        }))
    }

    async fn consume(
        self: Arc<Self>,
        mut rx: mpsc::Receiver<MetricSample>,
        token: CancellationToken,
    ) {
        loop {
            let sample = tokio::select! {
                _ = token.cancelled() => break,
                received = rx.recv() => match received {
                    Some(sample) => sample,
                    None => break,
                },
            };
            trace!(%sample, "sample received");
            self.record(&sample);
        }
        debug!("aggregator consumer stopped");
    }

    fn record(&self, sample: &MetricSample) {
        self.lock().apply(sample, self.num_cores, self.config.period);
    }

    pub fn snapshot(&self) -> AggregateState {
        let totals = *self.lock();
        AggregateState {
            cpu_usage_core_nanoseconds: totals.cpu_usage_core_nanoseconds,
            memory_working_set_bytes: totals.memory_working_set_bytes,
            memory_committed_bytes: totals.memory_committed_bytes,
            memory_capacity_bytes: self.memory_capacity_bytes,
            start_time: self.start_time,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RunningTotals> {
        // critical sections are plain field copies; a poisoned lock still holds whole values
        self.totals.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counter::ScriptedCounterProvider;
    use crate::error::HostError;
    use crate::host::StaticHost;

    fn host(memory: Option<u64>) -> StaticHost {
        StaticHost {
            memory_bytes: memory,
            num_cores: 4,
            machine_id: "node".into(),
        }
    }

    #[test]
    fn new_fails_without_physical_memory() {
        let err = Aggregator::new(
            &host(None),
            Arc::new(ScriptedCounterProvider::new()),
            AggregatorConfig::default(),
        )
        .err()
        .unwrap();
        assert!(matches!(
            err,
            AggregatorError::Host(HostError::PhysicalMemory(_))
        ));
    }

    #[test]
    fn fresh_snapshot_is_zeroed_with_constants() {
        let agg = Aggregator::new(
            &host(Some(8_589_934_592)),
            Arc::new(ScriptedCounterProvider::new()),
            AggregatorConfig::default(),
        )
        .unwrap();
        let snap = agg.snapshot();
        assert_eq!(snap.cpu_usage_core_nanoseconds, 0);
        assert_eq!(snap.memory_working_set_bytes, 0);
        assert_eq!(snap.memory_committed_bytes, 0);
        assert_eq!(snap.memory_capacity_bytes, 8_589_934_592);
        assert_eq!(snap.start_time, agg.start_time());
    }

    #[test]
    fn record_applies_samples_in_order() {
        let agg = Aggregator::new(
            &host(Some(1)),
            Arc::new(ScriptedCounterProvider::new()),
            AggregatorConfig::default(),
        )
        .unwrap();
        for (metric, value) in [
            (NodeMetric::Cpu, 50.0),
            (NodeMetric::WorkingSet, 10.0),
            (NodeMetric::WorkingSet, 20.0),
        ] {
            agg.record(&MetricSample {
                metric,
                name: String::new(),
                value,
            });
        }
        let snap = agg.snapshot();
        assert_eq!(snap.cpu_usage_core_nanoseconds, 2_000_000_000);
        assert_eq!(snap.memory_working_set_bytes, 20);
    }

    #[test]
    fn config_queries_cover_all_metrics() {
        let cfg = AggregatorConfig {
            period: Duration::from_millis(250),
            ..Default::default()
        };
        let queries = cfg.queries();
        assert_eq!(queries[0].0, NodeMetric::Cpu);
        assert_eq!(queries[0].1.path, CPU_COUNTER);
        assert_eq!(queries[2].1.path, COMMITTED_BYTES_COUNTER);
        assert!(
            queries
                .iter()
                .all(|(_, q)| q.period == Duration::from_millis(250))
        );
    }
}
