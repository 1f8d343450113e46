//! Whole-pool operations.
//!
//! Every registered backend is visited in registry order, primary and
//! suppressed ones included. A failing backend is recorded and reported to
//! the observer; the walk always continues.

use std::sync::Arc;

use serde::Serialize;

use crate::backend::{BackendError, BackendHandle, BackendId};
use crate::observability::{PoolEvent, PoolObserver};
use crate::pool::registry::Registry;

/// Outcome of one fan-out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FanOutReport {
    pub operation: String,
    /// Backends visited, in order.
    pub visited: usize,
    /// Per-backend failures, in visit order.
    #[serde(serialize_with = "serialize_failures")]
    pub failures: Vec<(BackendId, BackendError)>,
}

impl FanOutReport {
    fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            visited: 0,
            failures: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed(&self, id: &BackendId) -> bool {
        self.failures.iter().any(|(failed, _)| failed == id)
    }
}

fn serialize_failures<S>(failures: &[(BackendId, BackendError)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeMap;
    let mut map = serializer.serialize_map(Some(failures.len()))?;
    for (id, error) in failures {
        map.serialize_entry(id.as_str(), &error.to_string())?;
    }
    map.end()
}

/// Applies an operation to every backend.
#[derive(Debug, Clone)]
pub struct FanOut {
    registry: Arc<Registry>,
    observer: Arc<dyn PoolObserver>,
}

impl FanOut {
    pub fn new(registry: Arc<Registry>, observer: Arc<dyn PoolObserver>) -> Self {
        Self { registry, observer }
    }

    /// Run `op` on each backend, ignoring results.
    pub fn for_each<F>(&self, operation: &str, op: F) -> FanOutReport
    where
        F: FnMut(&BackendHandle) -> Result<(), BackendError>,
    {
        let ((), report) = self.for_each_collecting(operation, (), op, |(), ()| ());
        report
    }

    /// Run `op` on each backend and fold the successful results into `init`.
    pub fn for_each_collecting<T, R, F, C>(
        &self,
        operation: &str,
        init: T,
        mut op: F,
        mut combine: C,
    ) -> (T, FanOutReport)
    where
        F: FnMut(&BackendHandle) -> Result<R, BackendError>,
        C: FnMut(T, R) -> T,
    {
        let mut report = FanOutReport::new(operation);
        let mut acc = init;

        for backend in self.registry.all() {
            report.visited += 1;
            match op(backend) {
                Ok(value) => acc = combine(acc, value),
                Err(error) => {
                    self.observer.on_event(&PoolEvent::FanOutError {
                        operation: operation.to_string(),
                        backend: backend.id.clone(),
                        error: error.clone(),
                    });
                    report.failures.push((backend.id.clone(), error));
                }
            }
        }

        (acc, report)
    }
}
