// Map raw Docker API responses into runtime usage records.

use crate::models::{ContainerSummary, ContainerUsageRaw, NetworkUsageRaw};
use bollard::models::{ContainerStatsResponse, ContainerSummary as DockerContainerSummary};
use chrono::{DateTime, Utc};

/// Listing entry -> summary. `None` when the daemon omitted the id.
pub(crate) fn process_summary(c: &DockerContainerSummary) -> Option<ContainerSummary> {
    let id = c.id.as_ref().filter(|id| !id.is_empty())?.clone();
    let name = c
        .names
        .as_ref()
        .and_then(|n| n.first())
        .map(|n| n.trim_start_matches('/').to_string())
        .unwrap_or_else(|| id.clone());
    Some(ContainerSummary {
        name,
        image: c.image.clone().unwrap_or_default(),
        labels: c.labels.clone().unwrap_or_default(),
        created: c
            .created
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        id,
    })
}

/// One-shot stats response + listing metadata -> usage record.
///
/// Working set and commit come from the Windows-only fields; daemons that do
/// not report them fall back to plain memory usage.
pub(crate) fn process_usage(
    s: &ContainerStatsResponse,
    summary: &ContainerSummary,
) -> ContainerUsageRaw {
    let cpu_ticks = s
        .cpu_stats
        .as_ref()
        .and_then(|c| c.cpu_usage.as_ref())
        .and_then(|u| u.total_usage)
        .unwrap_or(0);

    let memory = s.memory_stats.as_ref();
    let usage = memory.and_then(|m| m.usage).unwrap_or(0);
    let working_set = memory.and_then(|m| m.privateworkingset).unwrap_or(usage);
    let committed = memory.and_then(|m| m.commitbytes).unwrap_or(usage);

    let networks = s
        .networks
        .as_ref()
        .map(|n| {
            let mut endpoints: Vec<_> = n.iter().collect();
            endpoints.sort_by(|a, b| a.0.cmp(b.0));
            endpoints
                .into_iter()
                .map(|(_, v)| NetworkUsageRaw {
                    rx_bytes: v.rx_bytes.unwrap_or(0),
                    rx_packets: v.rx_packets.unwrap_or(0),
                    rx_errors: v.rx_errors.unwrap_or(0),
                    rx_dropped: v.rx_dropped.unwrap_or(0),
                    tx_bytes: v.tx_bytes.unwrap_or(0),
                    tx_packets: v.tx_packets.unwrap_or(0),
                    tx_errors: v.tx_errors.unwrap_or(0),
                    tx_dropped: v.tx_dropped.unwrap_or(0),
                })
                .collect()
        })
        .unwrap_or_default();

    ContainerUsageRaw {
        id: summary.id.clone(),
        cpu_ticks_100ns: cpu_ticks,
        working_set_bytes: working_set,
        committed_bytes: committed,
        networks,
        created: summary.created,
        labels: summary.labels.clone(),
        image: summary.image.clone(),
    }
}
