//! Point-in-time pool status for reporting.

use std::time::Instant;

use serde::Serialize;

use crate::backend::{BackendHandle, BackendId};
use crate::pool::availability::Availability;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolStatus {
    pub designated_primary: BackendId,
    pub current_primary: BackendId,
    pub total_weight: u64,
    pub usable: usize,
    pub suppressed: usize,
    pub backends: Vec<BackendStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendStatus {
    pub name: BackendId,
    pub weight: u32,
    /// Fraction of weighted selections this backend receives when all are usable.
    pub share: f64,
    pub primary: bool,
    pub usable: bool,
    /// Milliseconds until the next reconnect attempt, when suppressed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_in_ms: Option<u64>,
    pub suppressions: usize,
    pub recoveries: usize,
}

impl BackendStatus {
    pub(crate) fn new(backend: &BackendHandle, availability: Availability, total_weight: u64, now: Instant) -> Self {
        let share = if total_weight == 0 {
            0.0
        } else {
            f64::from(backend.weight) / total_weight as f64
        };
        let retry_in_ms = match availability {
            Availability::Usable => None,
            Availability::Suppressed { until, .. } => {
                Some(until.saturating_duration_since(now).as_millis() as u64)
            }
        };

        Self {
            name: backend.id.clone(),
            weight: backend.weight,
            share,
            primary: backend.is_primary,
            usable: availability.is_usable(),
            retry_in_ms,
            suppressions: backend.suppression_count(),
            recoveries: backend.recovery_count(),
        }
    }
}
