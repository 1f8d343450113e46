//! In-memory backend for unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::backend::{Backend, BackendError};

#[derive(Debug)]
pub(crate) struct MockBackend {
    pub name: &'static str,
    pub active: AtomicBool,
    /// Whether `reconnect` brings the connection back.
    pub reconnect_ok: AtomicBool,
    pub reconnects: AtomicUsize,
    pub active_probes: AtomicUsize,
    pub runtime: Mutex<f64>,
    /// Error returned by the next `invoke` calls, if any.
    pub invoke_error: Mutex<Option<BackendError>>,
    /// Error returned by every lifecycle call, if any.
    pub lifecycle_error: Mutex<Option<BackendError>>,
    pub calls: Mutex<Vec<String>>,
}

impl MockBackend {
    pub fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            active: AtomicBool::new(true),
            reconnect_ok: AtomicBool::new(true),
            reconnects: AtomicUsize::new(0),
            active_probes: AtomicUsize::new(0),
            runtime: Mutex::new(0.0),
            invoke_error: Mutex::new(None),
            lifecycle_error: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    pub fn set_reconnect_ok(&self, ok: bool) {
        self.reconnect_ok.store(ok, Ordering::SeqCst);
    }

    pub fn fail_invokes_with(&self, error: BackendError) {
        *self.invoke_error.lock().unwrap() = Some(error);
    }

    pub fn fail_lifecycle_with(&self, error: BackendError) {
        *self.lifecycle_error.lock().unwrap() = Some(error);
    }

    pub fn reconnect_count(&self) -> usize {
        self.reconnects.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    fn lifecycle(&self, call: &str) -> Result<(), BackendError> {
        self.record(call);
        match self.lifecycle_error.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Backend for MockBackend {
    fn is_active(&self) -> bool {
        self.active_probes.fetch_add(1, Ordering::SeqCst);
        self.active.load(Ordering::SeqCst)
    }

    fn reconnect(&self) -> Result<(), BackendError> {
        self.reconnects.fetch_add(1, Ordering::SeqCst);
        let ok = self.reconnect_ok.load(Ordering::SeqCst);
        self.active.store(ok, Ordering::SeqCst);
        self.lifecycle("reconnect")
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
        let mut runtime = self.runtime.lock().unwrap();
        Ok(std::mem::take(&mut *runtime))
    }

    fn invoke(&self, operation: &str, args: &[Value]) -> Result<Value, BackendError> {
        self.record(operation);
        if let Some(e) = self.invoke_error.lock().unwrap().clone() {
            return Err(e);
        }
        Ok(serde_json::json!({ "backend": self.name, "operation": operation, "args": args }))
    }
}
