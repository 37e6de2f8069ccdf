// Raw container-runtime data, as handed over by the runtime client

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One entry of the runtime's container listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSummary {
    pub id: String,
    pub name: String,
    pub image: String,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    pub created: DateTime<Utc>,
}

/// Per-container resource usage as reported by the runtime.
///
/// `cpu_ticks_100ns` is cumulative CPU time in 100-nanosecond units. Memory
/// fields are already in bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerUsageRaw {
    pub id: String,
    pub cpu_ticks_100ns: u64,
    pub working_set_bytes: u64,
    pub committed_bytes: u64,
    #[serde(default)]
    pub networks: Vec<NetworkUsageRaw>,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub image: String,
}

/// Counters for one network endpoint; the runtime does not report adapter names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkUsageRaw {
    pub rx_bytes: u64,
    pub rx_packets: u64,
    pub rx_errors: u64,
    pub rx_dropped: u64,
    pub tx_bytes: u64,
    pub tx_packets: u64,
    pub tx_errors: u64,
    pub tx_dropped: u64,
}
