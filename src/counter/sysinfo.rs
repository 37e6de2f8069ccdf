// OS-backed counters: maps the aggregate counter paths onto sysinfo readings.

use super::{COMMITTED_BYTES_COUNTER, CPU_COUNTER, Counter, CounterProvider, WORKING_SET_COUNTER};
use crate::error::CounterError;
use sysinfo::System;

#[derive(Debug, Clone, Copy)]
enum Reading {
    CpuPercent,
    UsedMemory,
    CommittedMemory,
}

impl Reading {
    fn for_path(path: &str) -> Option<Self> {
        match path {
            CPU_COUNTER => Some(Reading::CpuPercent),
            WORKING_SET_COUNTER => Some(Reading::UsedMemory),
            COMMITTED_BYTES_COUNTER => Some(Reading::CommittedMemory),
            _ => None,
        }
    }
}

/// Counter provider backed by sysinfo. Only the three aggregate counters resolve.
#[derive(Debug, Clone, Copy, Default)]
pub struct SysinfoCounterProvider;

impl CounterProvider for SysinfoCounterProvider {
    fn open_counter(&self, path: &str) -> Result<Box<dyn Counter>, CounterError> {
        let reading = Reading::for_path(path).ok_or_else(|| CounterError::InvalidPath {
            path: path.to_string(),
        })?;
        let mut counter = SysinfoCounter {
            path: path.to_string(),
            reading,
            sys: System::new(),
        };
        counter.collect().map_err(|e| CounterError::Setup {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Box::new(counter))
    }
}

struct SysinfoCounter {
    path: String,
    reading: Reading,
    sys: System,
}

impl SysinfoCounter {
    fn unavailable(&self, what: &str) -> CounterError {
        CounterError::Collection {
            path: self.path.clone(),
            reason: format!("{what} unavailable"),
        }
    }
}

impl Counter for SysinfoCounter {
    fn collect(&mut self) -> Result<Vec<f64>, CounterError> {
        match self.reading {
            Reading::CpuPercent => {
                self.sys.refresh_cpu_usage();
                if self.sys.cpus().is_empty() {
                    return Err(self.unavailable("cpu usage"));
                }
                let usage = self.sys.global_cpu_usage() as f64;
                Ok(vec![usage.clamp(0.0, 100.0)])
            }
            Reading::UsedMemory => {
                self.sys.refresh_memory();
                if self.sys.total_memory() == 0 {
                    return Err(self.unavailable("memory information"));
                }
                Ok(vec![self.sys.used_memory() as f64])
            }
            Reading::CommittedMemory => {
                self.sys.refresh_memory();
                if self.sys.total_memory() == 0 {
                    return Err(self.unavailable("memory information"));
                }
                let committed = self.sys.used_memory().saturating_add(self.sys.used_swap());
                Ok(vec![committed as f64])
            }
        }
    }
}
