//! Backend registry.
//!
//! # Responsibilities
//! - Hold every backend of the pool in configuration order
//! - Designate the primary
//! - Derive the weighted selection set
//!
//! Built once; immutable afterwards.

use std::collections::HashSet;
use std::sync::Arc;

use crate::backend::{Backend, BackendHandle, BackendId};
use crate::error::PoolError;
use crate::pool::weighted::WeightedSet;

/// One backend to register.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub id: BackendId,
    pub backend: Arc<dyn Backend>,
    pub weight: u32,
}

impl RegistryEntry {
    pub fn new(id: impl Into<BackendId>, backend: Arc<dyn Backend>, weight: u32) -> Self {
        Self {
            id: id.into(),
            backend,
            weight,
        }
    }
}

/// Immutable, ordered set of backends with a designated primary.
#[derive(Debug)]
pub struct Registry {
    backends: Vec<Arc<BackendHandle>>,
    primary: usize,
    weighted: WeightedSet,
}

impl Registry {
    /// Build a registry; `primary` must name one of the entries.
    pub fn build(entries: Vec<RegistryEntry>, primary: &BackendId) -> Result<Self, PoolError> {
        if entries.is_empty() {
            return Err(PoolError::Configuration("backend list is empty".to_string()));
        }

        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.id.clone()) {
                return Err(PoolError::Configuration(format!(
                    "backend `{}` registered more than once",
                    entry.id
                )));
            }
        }

        let primary_index = entries
            .iter()
            .position(|e| &e.id == primary)
            .ok_or_else(|| {
                PoolError::Configuration(format!("primary `{}` is not among the backends", primary))
            })?;

        let weighted = WeightedSet::new(entries.iter().map(|e| e.weight));
        if weighted.total_weight() == 0 {
            return Err(PoolError::Configuration("total backend weight is zero".to_string()));
        }

        let backends = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                Arc::new(BackendHandle::new(
                    entry.id,
                    entry.backend,
                    entry.weight,
                    index,
                    index == primary_index,
                ))
            })
            .collect();

        Ok(Self {
            backends,
            primary: primary_index,
            weighted,
        })
    }

    /// Every backend in registry order.
    pub fn all(&self) -> &[Arc<BackendHandle>] {
        &self.backends
    }

    /// The designated primary.
    pub fn primary(&self) -> &Arc<BackendHandle> {
        &self.backends[self.primary]
    }

    pub fn get(&self, id: &BackendId) -> Option<&Arc<BackendHandle>> {
        self.backends.iter().find(|b| &b.id == id)
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    pub fn weighted_set(&self) -> &WeightedSet {
        &self.weighted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;

    fn entries(weights: &[(&'static str, u32)]) -> Vec<RegistryEntry> {
        weights
            .iter()
            .map(|(name, weight)| RegistryEntry::new(*name, MockBackend::new(*name), *weight))
            .collect()
    }

    #[test]
    fn test_build_preserves_order() {
        let registry = Registry::build(entries(&[("a", 1), ("b", 2), ("c", 3)]), &"b".into()).unwrap();
        let names: Vec<_> = registry.all().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(registry.primary().id.as_str(), "b");
        assert!(registry.primary().is_primary);
        assert_eq!(registry.all().iter().filter(|b| b.is_primary).count(), 1);
        assert_eq!(registry.weighted_set().total_weight(), 6);
        assert_eq!(registry.get(&"c".into()).map(|b| b.index), Some(2));
    }

    #[test]
    fn test_rejects_empty() {
        let err = Registry::build(Vec::new(), &"a".into()).unwrap_err();
        assert!(matches!(err, PoolError::Configuration(_)));
    }

    #[test]
    fn test_rejects_unknown_primary() {
        let err = Registry::build(entries(&[("a", 1)]), &"z".into()).unwrap_err();
        assert!(matches!(err, PoolError::Configuration(msg) if msg.contains("`z`")));
    }

    #[test]
    fn test_rejects_duplicates_and_zero_weight() {
        let err = Registry::build(entries(&[("a", 1), ("a", 1)]), &"a".into()).unwrap_err();
        assert!(matches!(err, PoolError::Configuration(_)));

        let err = Registry::build(entries(&[("a", 0), ("b", 0)]), &"a".into()).unwrap_err();
        assert!(matches!(err, PoolError::Configuration(_)));
    }

    #[test]
    fn test_zero_weight_member_is_kept() {
        let registry = Registry::build(entries(&[("a", 1), ("b", 0)]), &"a".into()).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(!registry.weighted_set().contains(1));
    }
}
