//! Forwardable operations.
//!
//! The pool does not discover what a backend can do. Operations are
//! registered up front with the number of arguments they accept; a call
//! outside that contract is rejected before any backend is touched.

use std::collections::HashMap;
use std::fmt;

use crate::error::PoolError;

/// Accepted argument counts for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    /// Inclusive range.
    Between(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Exact(n) => count == n,
            Arity::Between(min, max) => (min..=max).contains(&count),
            Arity::AtLeast(min) => count >= min,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Arity::Exact(n) => write!(f, "exactly {}", n),
            Arity::Between(min, max) => write!(f, "{} to {}", min, max),
            Arity::AtLeast(min) => write!(f, "at least {}", min),
        }
    }
}

/// Statement API shared by the common SQL adapters.
const STANDARD_OPERATIONS: &[(&str, Arity)] = &[
    ("ping", Arity::Exact(0)),
    ("execute", Arity::Between(1, 2)),
    ("exec_query", Arity::Between(1, 3)),
    ("select_all", Arity::Between(1, 3)),
    ("select_one", Arity::Between(1, 3)),
    ("select_value", Arity::Between(1, 3)),
    ("select_values", Arity::Between(1, 3)),
    ("select_rows", Arity::Between(1, 3)),
    ("insert", Arity::Between(1, 6)),
    ("update", Arity::Between(1, 3)),
    ("delete", Arity::Between(1, 3)),
    ("quote", Arity::Between(1, 2)),
    ("quote_table_name", Arity::Exact(1)),
    ("columns", Arity::Between(1, 2)),
    ("tables", Arity::Between(0, 1)),
    ("table_exists", Arity::Exact(1)),
    ("indexes", Arity::Between(1, 2)),
    ("begin_db_transaction", Arity::Exact(0)),
    ("commit_db_transaction", Arity::Exact(0)),
    ("rollback_db_transaction", Arity::Exact(0)),
];

/// Registered operations and their arities.
#[derive(Debug, Clone, Default)]
pub struct OperationTable {
    operations: HashMap<String, Arity>,
}

impl OperationTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard statement API.
    pub fn standard() -> Self {
        let mut table = Self::new();
        for (name, arity) in STANDARD_OPERATIONS {
            table.register(*name, *arity);
        }
        table
    }

    /// Register or replace an operation.
    pub fn register(&mut self, name: impl Into<String>, arity: Arity) -> &mut Self {
        self.operations.insert(name.into(), arity);
        self
    }

    pub fn arity(&self, name: &str) -> Option<Arity> {
        self.operations.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Reject unknown operations and wrong argument counts.
    pub fn check(&self, name: &str, arg_count: usize) -> Result<(), PoolError> {
        match self.arity(name) {
            None => Err(PoolError::Invocation {
                operation: name.to_string(),
                reason: "operation is not registered".to_string(),
            }),
            Some(arity) if !arity.accepts(arg_count) => Err(PoolError::Invocation {
                operation: name.to_string(),
                reason: format!("expected {} argument(s), got {}", arity, arg_count),
            }),
            Some(_) => Ok(()),
        }
    }
}
