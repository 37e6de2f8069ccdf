// Stats client: node stats from the aggregator, container stats from the runtime,
// machine and version info.

use crate::aggregator::Aggregator;
use crate::docker_repo::RuntimeClient;
use crate::error::{HostError, RuntimeError};
use crate::host::HostInfo;
use crate::models::{ContainerInfo, ContainerSummary, MachineInfo, VersionInfo};
use crate::translate::{self, ROOT_CONTAINER};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub struct StatsClient<R> {
    aggregator: Arc<Aggregator>,
    runtime: Arc<R>,
    host: Arc<dyn HostInfo>,
}

impl<R> Clone for StatsClient<R> {
    fn clone(&self) -> Self {
        Self {
            aggregator: self.aggregator.clone(),
            runtime: self.runtime.clone(),
            host: self.host.clone(),
        }
    }
}

impl<R: RuntimeClient> StatsClient<R> {
    pub fn new(aggregator: Arc<Aggregator>, runtime: Arc<R>, host: Arc<dyn HostInfo>) -> Self {
        Self {
            aggregator,
            runtime,
            host,
        }
    }

    /// Root (node) record from the latest aggregate state.
    pub fn node_stats(&self) -> ContainerInfo {
        translate::build_node_stats(&self.aggregator.snapshot())
    }

    /// Every running container, keyed by id. Fails if any single fetch fails.
    pub async fn all_container_stats(
        &self,
    ) -> Result<HashMap<String, ContainerInfo>, RuntimeError> {
        let containers = self.runtime.list_containers().await?;
        let ids: Vec<String> = containers.iter().map(|c| c.id.clone()).collect();
        let by_id: HashMap<&str, &ContainerSummary> =
            containers.iter().map(|c| (c.id.as_str(), c)).collect();
        let runtime = self.runtime.as_ref();
        let infos = translate::build_all_containers(&ids, move |id| {
            let container = by_id.get(id.as_str()).copied();
            async move {
                match container {
                    Some(container) => runtime.container_stats(container).await,
                    None => Err(RuntimeError::NotFound { id }),
                }
            }
        })
        .await?;
        debug!(containers = infos.len(), "container stats collected");
        Ok(infos)
    }

    /// Root record under `/` plus every container.
    pub async fn container_infos(&self) -> Result<HashMap<String, ContainerInfo>, RuntimeError> {
        let root = self.node_stats();
        let mut infos = self.all_container_stats().await?;
        infos.insert(ROOT_CONTAINER.to_string(), root);
        Ok(infos)
    }

    pub fn machine_info(&self) -> Result<MachineInfo, HostError> {
        Ok(MachineInfo {
            num_cores: self.aggregator.num_cores(),
            memory_capacity_bytes: self.aggregator.memory_capacity_bytes(),
            machine_id: self.host.machine_id()?,
        })
    }

    pub async fn version_info(&self) -> Result<VersionInfo, RuntimeError> {
        self.runtime.server_version().await
    }
}
