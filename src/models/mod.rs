// Domain models: uniform stats records, raw runtime data, machine/version info

mod container;
mod machine;
mod raw;

pub use container::{
    ContainerInfo, ContainerSpec, ContainerStats, CpuStats, CpuUsage, InterfaceStats, MemorySpec,
    MemoryStats, NetworkStats,
};
pub use machine::{MachineInfo, VersionInfo};
pub use raw::{ContainerSummary, ContainerUsageRaw, NetworkUsageRaw};
