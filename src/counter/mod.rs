// Performance counter sources: open a named counter, then sample it once per period
// into the shared fan-in channel.

mod scripted;
mod sysinfo;

pub use self::sysinfo::SysinfoCounterProvider;
pub use scripted::{ScriptedCounterProvider, ScriptedTick};

use crate::error::CounterError;
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub const CPU_COUNTER: &str = r"\Processor(_Total)\% Processor Time";
pub const WORKING_SET_COUNTER: &str = r"\Process(_Total)\Working Set - Private";
pub const COMMITTED_BYTES_COUNTER: &str = r"\Memory\Committed Bytes";

pub const DEFAULT_SAMPLE_PERIOD: Duration = Duration::from_secs(1);

/// One live counter. Returns every instance value of the underlying batch.
pub trait Counter: Send + 'static {
    fn collect(&mut self) -> Result<Vec<f64>, CounterError>;
}

/// Opens counters by path.
///
/// `open_counter` validates the path, attaches the counter and performs the
/// first collection, so a returned counter is known to work at least once.
pub trait CounterProvider: Send + Sync {
    fn open_counter(&self, path: &str) -> Result<Box<dyn Counter>, CounterError>;
}

/// Which node metric a counter feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeMetric {
    Cpu,
    WorkingSet,
    CommittedBytes,
}

/// A counter path plus its sampling period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterQuery {
    pub path: String,
    pub period: Duration,
}

impl CounterQuery {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            period: DEFAULT_SAMPLE_PERIOD,
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }
}

/// One tick's value, tagged with the metric it feeds.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub metric: NodeMetric,
    pub name: String,
    pub value: f64,
}

impl fmt::Display for MetricSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name: {} | Value: {}", self.name, self.value)
    }
}

/// An opened counter that has not started sampling yet.
pub struct CounterSource {
    query: CounterQuery,
    metric: NodeMetric,
    counter: Box<dyn Counter>,
}

impl fmt::Debug for CounterSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CounterSource")
            .field("query", &self.query)
            .field("metric", &self.metric)
            .finish_non_exhaustive()
    }
}

impl CounterSource {
    pub fn open(
        provider: &dyn CounterProvider,
        query: CounterQuery,
        metric: NodeMetric,
    ) -> Result<Self, CounterError> {
        let counter = provider.open_counter(&query.path)?;
        debug!(counter = %query.path, ?metric, "counter opened");
        Ok(Self {
            query,
            metric,
            counter,
        })
    }

    /// Spawns the sampling loop. Runs until `token` is cancelled or `tx` is closed.
    pub fn spawn(
        self,
        tx: mpsc::Sender<MetricSample>,
        token: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run(tx, token))
    }

    async fn run(self, tx: mpsc::Sender<MetricSample>, token: CancellationToken) {
        let CounterSource {
            query,
            metric,
            mut counter,
        } = self;
        let mut tick = interval(query.period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick completes immediately; open already collected once
        tick.tick().await;

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tick.tick() => {}
            }

            let joined = tokio::task::spawn_blocking(move || {
                let result = counter.collect();
                (counter, result)
            })
            .await;
            let result = match joined {
                Ok((returned, result)) => {
                    counter = returned;
                    result
                }
                Err(e) => {
                    warn!(error = %e, counter = %query.path, "counter collection task failed");
                    break;
                }
            };

            // Multiple instances: keep the last one of the batch.
            let value = match result.map(|values| values.last().copied()) {
                Ok(Some(v)) => v,
                Ok(None) => {
                    debug!(counter = %query.path, "collection returned no instances; skipping tick");
                    continue;
                }
                Err(e) => {
                    debug!(error = %e, counter = %query.path, "collection failed; skipping tick");
                    continue;
                }
            };

            let sample = MetricSample {
                metric,
                name: query.path.clone(),
                value,
            };
            tokio::select! {
                _ = token.cancelled() => break,
                sent = tx.send(sample) => {
                    if sent.is_err() {
                        break;
                    }
                }
            }
        }
        debug!(counter = %query.path, "counter source stopped");
    }
}
