// Container-runtime client: trait consumed by the stats client, Docker implementation via bollard

mod stats;

use crate::config::RuntimeConfig;
use crate::error::RuntimeError;
use crate::models::{ContainerSummary, ContainerUsageRaw, VersionInfo};
use bollard::Docker;
use bollard::query_parameters::{ListContainersOptions, StatsOptions};
use futures_util::StreamExt;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tracing::{instrument, warn};

/// The narrow slice of a container runtime the stats client needs.
pub trait RuntimeClient: Send + Sync + 'static {
    /// Running containers.
    fn list_containers(
        &self,
    ) -> impl Future<Output = Result<Vec<ContainerSummary>, RuntimeError>> + Send;

    /// One-shot usage for a container from `list_containers`; creation time,
    /// labels and image come from the listing.
    fn container_stats(
        &self,
        container: &ContainerSummary,
    ) -> impl Future<Output = Result<ContainerUsageRaw, RuntimeError>> + Send;

    fn server_version(&self) -> impl Future<Output = Result<VersionInfo, RuntimeError>> + Send;
}

pub struct DockerRepo {
    docker: Docker,
}

impl DockerRepo {
    pub fn connect(config: &RuntimeConfig) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let docker = match config.docker_socket.as_deref() {
            Some(path) => Docker::connect_with_unix(
                path,
                config.request_timeout_secs,
                bollard::API_DEFAULT_VERSION,
            )?,
            None => Docker::connect_with_local_defaults()?.with_timeout(timeout),
        };
        Ok(Self { docker })
    }

    async fn list(
        &self,
        filters: HashMap<String, Vec<String>>,
    ) -> Result<Vec<ContainerSummary>, RuntimeError> {
        let options = ListContainersOptions {
            all: false,
            filters: Some(filters),
            ..Default::default()
        };
        let containers = self.docker.list_containers(Some(options)).await?;
        Ok(containers
            .iter()
            .filter_map(|c| {
                let summary = stats::process_summary(c);
                if summary.is_none() {
                    warn!("Docker listed a container without an id; skipping");
                }
                summary
            })
            .collect())
    }
}

impl RuntimeClient for DockerRepo {
    #[instrument(skip(self), fields(repo = "docker", operation = "list_containers"))]
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>, RuntimeError> {
        let filters = HashMap::from([("status".to_string(), vec!["running".to_string()])]);
        self.list(filters).await
    }

    #[instrument(skip(self, container), fields(repo = "docker", operation = "container_stats", id = %container.id))]
    async fn container_stats(
        &self,
        container: &ContainerSummary,
    ) -> Result<ContainerUsageRaw, RuntimeError> {
        let options = StatsOptions {
            stream: false,
            ..Default::default()
        };
        let response = self
            .docker
            .stats(&container.id, Some(options))
            .next()
            .await
            .ok_or_else(|| RuntimeError::NoStats {
                id: container.id.clone(),
            })??;
        Ok(stats::process_usage(&response, container))
    }

    #[instrument(skip(self), fields(repo = "docker", operation = "server_version"))]
    async fn server_version(&self) -> Result<VersionInfo, RuntimeError> {
        let v = self.docker.version().await?;
        Ok(VersionInfo {
            kernel_version: v.kernel_version.unwrap_or_default(),
            engine_version: v.version.unwrap_or_default(),
            api_version: v.api_version.unwrap_or_default(),
        })
    }
}
