// Host facts: installed memory, core count, machine id

mod linux;

use crate::error::HostError;
use sysinfo::System;

/// Static facts about the node the aggregator runs on.
pub trait HostInfo: Send + Sync {
    /// Installed physical memory in bytes.
    fn physical_memory_bytes(&self) -> Result<u64, HostError>;

    fn num_cores(&self) -> usize;

    fn machine_id(&self) -> Result<String, HostError>;
}

/// Converts a kibibyte count (as reported by the OS) into bytes.
pub fn kib_to_bytes(kib: u64) -> u64 {
    kib.saturating_mul(1024)
}

/// Host facts read through sysinfo and /proc.
pub struct SysinfoHost {
    num_cores: usize,
    total_memory_bytes: u64,
}

impl Default for SysinfoHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SysinfoHost {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_all();
        sys.refresh_memory();
        let num_cores = match sys.cpus().len() {
            0 => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            n => n,
        };
        Self {
            num_cores,
            total_memory_bytes: sys.total_memory(),
        }
    }
}

impl HostInfo for SysinfoHost {
    fn physical_memory_bytes(&self) -> Result<u64, HostError> {
        if let Some(kib) = linux::read_mem_total_kib() {
            return Ok(kib_to_bytes(kib));
        }
        match self.total_memory_bytes {
            0 => Err(HostError::PhysicalMemory(
                "total memory reported as zero".into(),
            )),
            bytes => Ok(bytes),
        }
    }

    fn num_cores(&self) -> usize {
        self.num_cores
    }

    fn machine_id(&self) -> Result<String, HostError> {
        System::host_name()
            .filter(|h| !h.is_empty())
            .ok_or(HostError::MachineId)
    }
}

/// Fixed host facts, for tests and embedding.
#[derive(Debug, Clone)]
pub struct StaticHost {
    /// `None` makes `physical_memory_bytes` fail.
    pub memory_bytes: Option<u64>,
    pub num_cores: usize,
    pub machine_id: String,
}

impl HostInfo for StaticHost {
    fn physical_memory_bytes(&self) -> Result<u64, HostError> {
        self.memory_bytes
            .ok_or_else(|| HostError::PhysicalMemory("not available".into()))
    }

    fn num_cores(&self) -> usize {
        self.num_cores
    }

    fn machine_id(&self) -> Result<String, HostError> {
        Ok(self.machine_id.clone())
    }
}
