use crate::aggregator::AggregatorConfig;
use crate::counter::{COMMITTED_BYTES_COUNTER, CPU_COUNTER, WORKING_SET_COUNTER};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

/// Perf-counter sampling: period and the three aggregate counter paths.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub period_ms: u64,
    pub cpu_counter: String,
    pub working_set_counter: String,
    pub committed_bytes_counter: String,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            period_ms: 1000,
            cpu_counter: CPU_COUNTER.into(),
            working_set_counter: WORKING_SET_COUNTER.into(),
            committed_bytes_counter: COMMITTED_BYTES_COUNTER.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    /// Unix socket of the Docker daemon; platform defaults when unset.
    #[serde(default)]
    pub docker_socket: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            docker_socket: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            period: Duration::from_millis(self.sampling.period_ms),
            cpu_counter: self.sampling.cpu_counter.clone(),
            working_set_counter: self.sampling.working_set_counter.clone(),
            committed_bytes_counter: self.sampling.committed_bytes_counter.clone(),
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.server.host.is_empty(),
            "server.host must be non-empty"
        );
        anyhow::ensure!(
            self.sampling.period_ms > 0,
            "sampling.period_ms must be > 0, got {}",
            self.sampling.period_ms
        );
        for (key, path) in [
            ("sampling.cpu_counter", &self.sampling.cpu_counter),
            ("sampling.working_set_counter", &self.sampling.working_set_counter),
            (
                "sampling.committed_bytes_counter",
                &self.sampling.committed_bytes_counter,
            ),
        ] {
            anyhow::ensure!(!path.is_empty(), "{} must be non-empty", key);
        }
        anyhow::ensure!(
            self.runtime
                .docker_socket
                .as_ref()
                .is_none_or(|s| !s.is_empty()),
            "runtime.docker_socket must be non-empty when set"
        );
        anyhow::ensure!(
            self.runtime.request_timeout_secs > 0,
            "runtime.request_timeout_secs must be > 0, got {}",
            self.runtime.request_timeout_secs
        );
        Ok(())
    }
}
