// Machine identity and runtime version info

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineInfo {
    pub num_cores: usize,
    pub memory_capacity_bytes: u64,
    pub machine_id: String,
}

/// Kernel and container-engine versions reported by the runtime daemon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub kernel_version: String,
    pub engine_version: String,
    pub api_version: String,
}
