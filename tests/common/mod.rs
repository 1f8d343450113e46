//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use db_cluster_pool::config::BackendDescriptor;
use db_cluster_pool::{
    Backend, BackendError, BackendFactory, ClusterPool, PoolEvent, PoolObserver, PoolOptions, RegistryEntry,
};
use serde_json::{json, Value};

/// A backend whose behaviour is scripted by the test.
#[derive(Debug)]
pub struct ScriptedBackend {
    pub name: String,
    active: AtomicBool,
    reconnect_ok: AtomicBool,
    reconnects: AtomicUsize,
    probes: AtomicUsize,
    runtime: Mutex<f64>,
    invoke_error: Mutex<Option<BackendError>>,
    lifecycle_error: Mutex<Option<BackendError>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            active: AtomicBool::new(true),
            reconnect_ok: AtomicBool::new(true),
            reconnects: AtomicUsize::new(0),
            probes: AtomicUsize::new(0),
            runtime: Mutex::new(0.0),
            invoke_error: Mutex::new(None),
            lifecycle_error: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Connection dropped: inactive, failing calls, and reconnects do not help.
    pub fn kill(&self) {
        self.active.store(false, Ordering::SeqCst);
        self.reconnect_ok.store(false, Ordering::SeqCst);
        self.fail_invokes(BackendError::Connectivity("Lost connection to server".into()));
    }

    /// Server back: reconnects succeed and calls go through.
    pub fn revive(&self) {
        self.reconnect_ok.store(true, Ordering::SeqCst);
        *self.invoke_error.lock().unwrap() = None;
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    pub fn set_reconnect_ok(&self, ok: bool) {
        self.reconnect_ok.store(ok, Ordering::SeqCst);
    }

    pub fn set_runtime(&self, secs: f64) {
        *self.runtime.lock().unwrap() = secs;
    }

    pub fn fail_invokes(&self, error: BackendError) {
        *self.invoke_error.lock().unwrap() = Some(error);
    }

    pub fn fail_lifecycle(&self, error: BackendError) {
        *self.lifecycle_error.lock().unwrap() = Some(error);
    }

    pub fn reconnects(&self) -> usize {
        self.reconnects.load(Ordering::SeqCst)
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn lifecycle(&self, call: &str) -> Result<(), BackendError> {
        self.calls.lock().unwrap().push(call.to_string());
        match self.lifecycle_error.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Backend for ScriptedBackend {
    fn is_active(&self) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.active.load(Ordering::SeqCst)
    }

    fn reconnect(&self) -> Result<(), BackendError> {
        self.reconnects.fetch_add(1, Ordering::SeqCst);
        let ok = self.reconnect_ok.load(Ordering::SeqCst);
        self.active.store(ok, Ordering::SeqCst);
        self.lifecycle("reconnect")?;
        if ok {
            Ok(())
        } else {
            Err(BackendError::Connectivity("Can't connect to server".into()))
        }
    }

    fn disconnect(&self) -> Result<(), BackendError> {
        self.lifecycle("disconnect")
    }

    fn reset(&self) -> Result<(), BackendError> {
        self.lifecycle("reset")
    }

    fn verify(&self, args: &[Value]) -> Result<(), BackendError> {
        self.lifecycle(&format!("verify/{}", args.len()))
    }

    fn reset_runtime(&self) -> Result<f64, BackendError> {
        self.lifecycle("reset_runtime")?;
        Ok(std::mem::take(&mut *self.runtime.lock().unwrap()))
    }

    fn invoke(&self, operation: &str, args: &[Value]) -> Result<Value, BackendError> {
        self.calls.lock().unwrap().push(operation.to_string());
        if let Some(e) = self.invoke_error.lock().unwrap().clone() {
            return Err(e);
        }
        Ok(json!({ "backend": self.name, "operation": operation, "args": args }))
    }
}

/// Observer that keeps every event.
#[derive(Debug, Default)]
pub struct Recorder {
    events: Mutex<Vec<PoolEvent>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<PoolEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl PoolObserver for Recorder {
    fn on_event(&self, event: &PoolEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// A pool over scripted backends; the first one is primary.
pub struct Harness {
    pub pool: ClusterPool,
    pub backends: Vec<Arc<ScriptedBackend>>,
    pub recorder: Arc<Recorder>,
}

impl Harness {
    pub fn new(spec: &[(&str, u32)]) -> Self {
        Self::with_options(spec, PoolOptions::default())
    }

    pub fn with_options(spec: &[(&str, u32)], options: PoolOptions) -> Self {
        let backends: Vec<_> = spec.iter().map(|(name, _)| ScriptedBackend::new(name)).collect();
        let entries = backends
            .iter()
            .zip(spec)
            .map(|(b, (name, weight))| RegistryEntry::new(*name, b.clone() as Arc<dyn Backend>, *weight))
            .collect();
        let recorder = Arc::new(Recorder::default());
        let pool = ClusterPool::new(entries, &spec[0].0.into(), options, recorder.clone()).unwrap();
        Self {
            pool,
            backends,
            recorder,
        }
    }

    pub fn backend(&self, name: &str) -> &Arc<ScriptedBackend> {
        self.backends.iter().find(|b| b.name == name).unwrap()
    }

    pub fn candidate_names(&self) -> Vec<String> {
        self.pool.candidates().iter().map(|b| b.id.to_string()).collect()
    }
}

/// Factory that hands out scripted backends and refuses the named hosts.
#[derive(Debug, Default)]
pub struct ScriptedFactory {
    pub unreachable: HashSet<String>,
    pub created: Mutex<Vec<Arc<ScriptedBackend>>>,
}

impl ScriptedFactory {
    pub fn refusing(names: &[&str]) -> Self {
        Self {
            unreachable: names.iter().map(|n| n.to_string()).collect(),
            created: Mutex::new(Vec::new()),
        }
    }
}

impl BackendFactory for ScriptedFactory {
    fn connect(&self, descriptor: &BackendDescriptor) -> Result<Arc<dyn Backend>, BackendError> {
        if self.unreachable.contains(descriptor.name.as_str()) {
            return Err(BackendError::Connectivity(format!("{} refused connection", descriptor.url)));
        }
        let backend = ScriptedBackend::new(descriptor.name.as_str());
        self.created.lock().unwrap().push(backend.clone());
        Ok(backend)
    }
}
