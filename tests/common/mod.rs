// Shared test helpers
#![allow(dead_code)]

use chrono::{DateTime, Utc};
use nodestats::aggregator::AggregatorConfig;
use nodestats::counter::{
    COMMITTED_BYTES_COUNTER, CPU_COUNTER, ScriptedCounterProvider, ScriptedTick,
    WORKING_SET_COUNTER,
};
use nodestats::docker_repo::RuntimeClient;
use nodestats::error::RuntimeError;
use nodestats::host::StaticHost;
use nodestats::models::*;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

pub const CAPACITY_BYTES: u64 = 8_589_934_592;

pub fn test_host(num_cores: usize) -> StaticHost {
    StaticHost {
        memory_bytes: Some(CAPACITY_BYTES),
        num_cores,
        machine_id: "test-node".into(),
    }
}

pub const FAST_PERIOD: Duration = Duration::from_millis(1);

pub fn fast_config() -> AggregatorConfig {
    AggregatorConfig {
        period: FAST_PERIOD,
        ..Default::default()
    }
}

pub fn values(vs: &[f64]) -> Vec<ScriptedTick> {
    vs.iter().copied().map(ScriptedTick::Value).collect()
}

/// Prepends the tick consumed by the setup collection when a counter opens.
pub fn after_setup(ticks: Vec<ScriptedTick>) -> Vec<ScriptedTick> {
    std::iter::once(ScriptedTick::Value(0.0)).chain(ticks).collect()
}

/// Provider scripting all three node counters; each script starts after setup.
pub fn scripted(
    cpu: Vec<ScriptedTick>,
    working_set: Vec<ScriptedTick>,
    committed: Vec<ScriptedTick>,
) -> ScriptedCounterProvider {
    ScriptedCounterProvider::new()
        .with_counter(CPU_COUNTER, after_setup(cpu))
        .with_counter(WORKING_SET_COUNTER, after_setup(working_set))
        .with_counter(COMMITTED_BYTES_COUNTER, after_setup(committed))
}

/// Polls `cond` every couple of milliseconds for up to five seconds.
pub async fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    cond()
}

pub fn created() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

pub fn raw_usage(id: &str, cpu_ticks_100ns: u64) -> ContainerUsageRaw {
    ContainerUsageRaw {
        id: id.to_string(),
        cpu_ticks_100ns,
        working_set_bytes: 4096,
        committed_bytes: 8192,
        networks: vec![NetworkUsageRaw {
            rx_bytes: 10,
            rx_packets: 1,
            tx_bytes: 20,
            tx_packets: 2,
            ..Default::default()
        }],
        created: created(),
        labels: HashMap::from([("app".to_string(), id.to_string())]),
        image: format!("{id}:latest"),
    }
}

/// In-memory runtime: fixed containers, optional per-id fetch failures.
#[derive(Default)]
pub struct FakeRuntime {
    pub containers: Vec<ContainerSummary>,
    pub usage: HashMap<String, ContainerUsageRaw>,
    pub failing: HashSet<String>,
    pub version: VersionInfo,
    pub version_fails: bool,
    pub fetched: Mutex<Vec<String>>,
}

impl FakeRuntime {
    pub fn with_containers(ids: &[&str]) -> Self {
        let mut rt = FakeRuntime {
            version: VersionInfo {
                kernel_version: "6.1.0".into(),
                engine_version: "27.0.1".into(),
                api_version: "1.46".into(),
            },
            ..Default::default()
        };
        for (i, id) in ids.iter().enumerate() {
            rt.containers.push(ContainerSummary {
                id: id.to_string(),
                name: format!("c{i}"),
                image: format!("{id}:latest"),
                labels: HashMap::new(),
                created: created(),
            });
            rt.usage
                .insert(id.to_string(), raw_usage(id, 500 * (i as u64 + 1)));
        }
        rt
    }

    pub fn failing_on(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    pub fn failing_version(mut self) -> Self {
        self.version_fails = true;
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

impl RuntimeClient for FakeRuntime {
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, RuntimeError> {
        Ok(self.containers.clone())
    }

    async fn container_stats(
        &self,
        container: &ContainerSummary,
    ) -> Result<ContainerUsageRaw, RuntimeError> {
        let id = container.id.as_str();
        self.fetched.lock().unwrap().push(id.to_string());
        if self.failing.contains(id) {
            return Err(RuntimeError::NoStats { id: id.to_string() });
        }
        self.usage
            .get(id)
            .cloned()
            .ok_or_else(|| RuntimeError::NotFound { id: id.to_string() })
    }

    async fn server_version(&self) -> Result<VersionInfo, RuntimeError> {
        if self.version_fails {
            return Err(RuntimeError::Docker(
                bollard::errors::Error::DockerResponseServerError {
                    status_code: 503,
                    message: "daemon unavailable".into(),
                },
            ));
        }
        Ok(self.version.clone())
    }
}
