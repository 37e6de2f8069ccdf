// Error taxonomy: initialization failures, per-tick collection failures, runtime query failures.

use thiserror::Error;

/// Failures from a performance counter provider.
#[derive(Debug, Error)]
pub enum CounterError {
    /// The path does not resolve to a counter the provider knows about.
    #[error("invalid counter path '{path}'")]
    InvalidPath { path: String },

    /// Adding the counter to a query or the first collection failed.
    #[error("failed to set up counter '{path}': {reason}")]
    Setup { path: String, reason: String },

    /// A collection after setup failed. Swallowed by the sampling loop.
    #[error("failed to collect counter '{path}': {reason}")]
    Collection { path: String, reason: String },
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("unable to read physical memory: {0}")]
    PhysicalMemory(String),

    #[error("unable to determine machine id")]
    MachineId,
}

/// Construction / start failures. The aggregator is unusable after one of these.
#[derive(Debug, Error)]
pub enum AggregatorError {
    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Counter(#[from] CounterError),

    #[error("aggregator already started")]
    AlreadyStarted,
}

/// Container-runtime query failures, returned to the immediate caller.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("docker: {0}")]
    Docker(#[from] bollard::errors::Error),

    #[error("container {id} not found")]
    NotFound { id: String },

    #[error("container {id}: no stats returned")]
    NoStats { id: String },
}
