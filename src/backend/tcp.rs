//! TCP probe backend.
//!
//! Holds a plain TCP connection to the database host. It speaks no wire
//! protocol; it exists so the pool can be exercised against real hosts
//! (`status` and `watch` commands). Only the `ping` operation is supported.

use std::io::{self, ErrorKind};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::backend::{Backend, BackendError, BackendFactory};
use crate::config::BackendDescriptor;

/// Default port for an adapter when the URL does not carry one.
fn default_port(adapter: &str) -> Option<u16> {
    match adapter {
        "mysql" | "mysql2" | "mariadb" => Some(3306),
        "postgres" | "postgresql" => Some(5432),
        _ => None,
    }
}

#[derive(Debug, Default)]
struct TcpState {
    stream: Option<TcpStream>,
    runtime: Duration,
}

/// A backend that keeps one TCP connection open.
#[derive(Debug)]
pub struct TcpBackend {
    addr: SocketAddr,
    connect_timeout: Duration,
    state: Mutex<TcpState>,
}

impl TcpBackend {
    /// Resolve the descriptor address and open the connection.
    pub fn connect(descriptor: &BackendDescriptor) -> Result<Self, BackendError> {
        let adapter = descriptor.adapter.clone();
        let addr = descriptor
            .url
            .socket_addrs(|| default_port(&adapter))
            .map_err(|e| BackendError::Connectivity(format!("cannot resolve {}: {}", descriptor.url, e)))?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::Connectivity(format!("no address for {}", descriptor.url)))?;

        let backend = Self {
            addr,
            connect_timeout: descriptor.connect_timeout,
            state: Mutex::new(TcpState::default()),
        };
        backend.reconnect()?;
        Ok(backend)
    }

    /// Address this backend connects to.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn state(&self) -> MutexGuard<'_, TcpState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn open(&self) -> io::Result<TcpStream> {
        let stream = TcpStream::connect_timeout(&self.addr, self.connect_timeout)?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}

/// Non-blocking peek: a closed peer reads as zero bytes.
fn stream_alive(stream: &TcpStream) -> bool {
    if stream.set_nonblocking(true).is_err() {
        return false;
    }
    let mut buf = [0u8; 1];
    let alive = match stream.peek(&mut buf) {
        Ok(0) => false,
        Ok(_) => true,
        Err(e) if e.kind() == ErrorKind::WouldBlock => true,
        Err(_) => false,
    };
    stream.set_nonblocking(false).is_ok() && alive
}

impl Backend for TcpBackend {
    fn is_active(&self) -> bool {
        self.state().stream.as_ref().is_some_and(stream_alive)
    }

    fn reconnect(&self) -> Result<(), BackendError> {
        let mut state = self.state();
        if state.stream.as_ref().is_some_and(stream_alive) {
            return Ok(());
        }
        state.stream = None;
        let stream = self
            .open()
            .map_err(|e| BackendError::Connectivity(format!("{}: {}", self.addr, e)))?;
        tracing::debug!(addr = %self.addr, "TCP connection established");
        state.stream = Some(stream);
        Ok(())
    }

    fn disconnect(&self) -> Result<(), BackendError> {
        if let Some(stream) = self.state().stream.take() {
            // Peer may already be gone.
            let _ = stream.shutdown(Shutdown::Both);
        }
        Ok(())
    }

    fn verify(&self, _args: &[Value]) -> Result<(), BackendError> {
        if self.is_active() {
            Ok(())
        } else {
            self.reconnect()
        }
    }

    fn reset_runtime(&self) -> Result<f64, BackendError> {
        let mut state = self.state();
        Ok(std::mem::take(&mut state.runtime).as_secs_f64())
    }

    fn invoke(&self, operation: &str, args: &[Value]) -> Result<Value, BackendError> {
        if operation != "ping" {
            return Err(BackendError::Invocation(format!(
                "TCP probe backend does not support `{}`",
                operation
            )));
        }
        if !args.is_empty() {
            return Err(BackendError::Invocation(format!(
                "`ping` takes no arguments, got {}",
                args.len()
            )));
        }

        let started = Instant::now();
        let alive = self.is_active();
        self.state().runtime += started.elapsed();

        if alive {
            Ok(Value::Bool(true))
        } else {
            Err(BackendError::Connectivity(format!("{} is not reachable", self.addr)))
        }
    }
}

/// Factory producing [`TcpBackend`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpBackendFactory;

impl BackendFactory for TcpBackendFactory {
    fn connect(&self, descriptor: &BackendDescriptor) -> Result<Arc<dyn Backend>, BackendError> {
        Ok(Arc::new(TcpBackend::connect(descriptor)?))
    }
}
