// Translate aggregator snapshots and raw runtime usage into uniform stats records.
// Stateless; safe to call concurrently.

use crate::aggregator::AggregateState;
use crate::models::{
    ContainerInfo, ContainerSpec, ContainerStats, ContainerUsageRaw, CpuStats, CpuUsage,
    InterfaceStats, MemorySpec, MemoryStats, NetworkStats, NetworkUsageRaw,
};
use chrono::Utc;
use std::collections::HashMap;
use std::future::Future;

/// Key of the node-level record in a combined map.
pub const ROOT_CONTAINER: &str = "/";

/// The runtime reports endpoint counters without adapter names.
pub const DEFAULT_INTERFACE_NAME: &str = "eth0";

pub const CONTAINER_NAMESPACE: &str = "docker";

/// Runtime CPU ticks are 100 ns each.
pub fn cpu_ticks_to_nanoseconds(ticks_100ns: u64) -> u64 {
    ticks_100ns.saturating_mul(100)
}

/// Root (node) record from one aggregator snapshot.
pub fn build_node_stats(snapshot: &AggregateState) -> ContainerInfo {
    let spec = ContainerSpec {
        creation_time: snapshot.start_time,
        namespace: String::new(),
        labels: HashMap::new(),
        image: String::new(),
        has_cpu: true,
        has_memory: true,
        memory: MemorySpec {
            limit: snapshot.memory_capacity_bytes,
        },
        has_network: false,
        has_filesystem: false,
        has_diskio: false,
    };
    let stats = ContainerStats {
        timestamp: Utc::now(),
        cpu: Some(CpuStats {
            usage: CpuUsage {
                total: snapshot.cpu_usage_core_nanoseconds,
            },
        }),
        memory: Some(MemoryStats {
            working_set: snapshot.memory_working_set_bytes,
            usage: snapshot.memory_committed_bytes,
        }),
        network: None,
    };
    ContainerInfo {
        spec,
        stats: vec![stats],
    }
}

pub fn build_container_stats(raw: &ContainerUsageRaw) -> ContainerInfo {
    let spec = ContainerSpec {
        creation_time: raw.created,
        namespace: CONTAINER_NAMESPACE.into(),
        labels: raw.labels.clone(),
        image: raw.image.clone(),
        has_cpu: true,
        has_memory: true,
        memory: MemorySpec::default(),
        has_network: true,
        has_filesystem: false,
        has_diskio: false,
    };
    let stats = ContainerStats {
        timestamp: Utc::now(),
        cpu: Some(CpuStats {
            usage: CpuUsage {
                total: cpu_ticks_to_nanoseconds(raw.cpu_ticks_100ns),
            },
        }),
        memory: Some(MemoryStats {
            working_set: raw.working_set_bytes,
            usage: raw.committed_bytes,
        }),
        network: Some(NetworkStats {
            interfaces: raw.networks.iter().map(interface_stats).collect(),
        }),
    };
    ContainerInfo {
        spec,
        stats: vec![stats],
    }
}

fn interface_stats(n: &NetworkUsageRaw) -> InterfaceStats {
    InterfaceStats {
        name: DEFAULT_INTERFACE_NAME.into(),
        rx_bytes: n.rx_bytes,
        rx_packets: n.rx_packets,
        rx_errors: n.rx_errors,
        rx_dropped: n.rx_dropped,
        tx_bytes: n.tx_bytes,
        tx_packets: n.tx_packets,
        tx_errors: n.tx_errors,
        tx_dropped: n.tx_dropped,
    }
}

/// Fetches and translates every container in `ids`, in order.
///
/// All or nothing: the first fetch error is returned and no partial map is produced.
pub async fn build_all_containers<F, Fut, E>(
    ids: &[String],
    mut fetch: F,
) -> Result<HashMap<String, ContainerInfo>, E>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<ContainerUsageRaw, E>>,
{
    let mut infos = HashMap::with_capacity(ids.len());
    for id in ids {
        let raw = fetch(id.clone()).await?;
        infos.insert(id.clone(), build_container_stats(&raw));
    }
    Ok(infos)
}
