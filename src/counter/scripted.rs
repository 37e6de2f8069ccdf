// Deterministic counter provider: replays a per-path script of ticks.

use super::{Counter, CounterProvider};
use crate::error::CounterError;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One scripted collection result.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedTick {
    Value(f64),
    /// Several instances in one batch.
    Instances(Vec<f64>),
    /// Collection fails for this tick.
    Fail,
}

#[derive(Debug, Clone)]
enum Script {
    Ticks(Vec<ScriptedTick>),
    SetupFailure(String),
}

/// Counter provider driven by scripts instead of the OS.
///
/// Paths without a script are rejected as invalid. Opening a counter consumes
/// the first tick of its script as the setup collection; a failing or missing
/// first tick is a setup error. Once a counter's script is exhausted every
/// further collection fails, so no more samples are emitted.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCounterProvider {
    scripts: HashMap<String, Script>,
    collections: Arc<AtomicUsize>,
}

impl ScriptedCounterProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_counter(
        mut self,
        path: impl Into<String>,
        ticks: impl IntoIterator<Item = ScriptedTick>,
    ) -> Self {
        self.scripts
            .insert(path.into(), Script::Ticks(ticks.into_iter().collect()));
        self
    }

    /// `path` is valid but adding it to a query fails.
    pub fn with_setup_failure(mut self, path: impl Into<String>, reason: impl Into<String>) -> Self {
        self.scripts
            .insert(path.into(), Script::SetupFailure(reason.into()));
        self
    }

    /// Number of post-setup collections performed by counters opened from this provider.
    pub fn collections(&self) -> usize {
        self.collections.load(Ordering::SeqCst)
    }
}

impl CounterProvider for ScriptedCounterProvider {
    fn open_counter(&self, path: &str) -> Result<Box<dyn Counter>, CounterError> {
        match self.scripts.get(path) {
            None => Err(CounterError::InvalidPath {
                path: path.to_string(),
            }),
            Some(Script::SetupFailure(reason)) => Err(CounterError::Setup {
                path: path.to_string(),
                reason: reason.clone(),
            }),
            Some(Script::Ticks(ticks)) => {
                let mut ticks: VecDeque<_> = ticks.iter().cloned().collect();
                let setup_failure = |reason: &str| CounterError::Setup {
                    path: path.to_string(),
                    reason: reason.to_string(),
                };
                match ticks.pop_front() {
                    Some(ScriptedTick::Fail) => return Err(setup_failure("first collection failed")),
                    None => return Err(setup_failure("script exhausted")),
                    Some(_) => {}
                }
                Ok(Box::new(ScriptedCounter {
                    path: path.to_string(),
                    ticks,
                    collections: self.collections.clone(),
                }))
            }
        }
    }
}

struct ScriptedCounter {
    path: String,
    ticks: VecDeque<ScriptedTick>,
    collections: Arc<AtomicUsize>,
}

impl Counter for ScriptedCounter {
    fn collect(&mut self) -> Result<Vec<f64>, CounterError> {
        self.collections.fetch_add(1, Ordering::SeqCst);
        let fail = |reason: &str| CounterError::Collection {
            path: self.path.clone(),
            reason: reason.to_string(),
        };
        match self.ticks.pop_front() {
            Some(ScriptedTick::Value(v)) => Ok(vec![v]),
            Some(ScriptedTick::Instances(values)) => Ok(values),
            Some(ScriptedTick::Fail) => Err(fail("scripted failure")),
            None => Err(fail("script exhausted")),
        }
    }
}
