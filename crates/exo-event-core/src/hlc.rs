//! Hybrid logical clock values carried by every event.
//!
//! The clock is encoded like any other field; ordering rules here are used
//! by authoring code when stamping new events.

use std::cmp::Ordering;

use crate::error::EncodingError;

/// Wall-clock milliseconds plus a tie-breaking counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HybridLogicalClock {
    /// Physical timestamp in milliseconds.
    pub physical_ms: u64,

    /// Logical counter for events at the same physical time.
    pub logical: u32,
}

impl HybridLogicalClock {
    pub const fn new(physical_ms: u64, logical: u32) -> Self {
        Self {
            physical_ms,
            logical,
        }
    }

    /// Build from untyped parts, range-checking `logical` into 32 bits.
    pub fn try_from_parts(physical_ms: u64, logical: u64) -> Result<Self, EncodingError> {
        let logical = u32::try_from(logical).map_err(|_| EncodingError::IntegerOutOfRange {
            field: "logical",
            value: logical.into(),
        })?;
        Ok(Self::new(physical_ms, logical))
    }

    /// Stamp a new event observed at `node_time` after the given parents.
    ///
    /// The result is strictly greater than every parent clock.
    pub fn new_event(node_time: u64, parent_times: &[HybridLogicalClock]) -> Self {
        let max_parent_physical = parent_times
            .iter()
            .map(|h| h.physical_ms)
            .max()
            .unwrap_or(0);

        let physical_ms = node_time.max(max_parent_physical);

        if parent_times.is_empty() || physical_ms != max_parent_physical {
            return Self::new(physical_ms, 0);
        }

        let max_logical = parent_times
            .iter()
            .filter(|h| h.physical_ms == physical_ms)
            .map(|h| h.logical)
            .max()
            .unwrap_or(0);

        match max_logical.checked_add(1) {
            Some(logical) => Self::new(physical_ms, logical),
            // Counter exhausted: move to the next millisecond.
            None => Self::new(physical_ms.saturating_add(1), 0),
        }
    }
}

impl PartialOrd for HybridLogicalClock {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HybridLogicalClock {
    fn cmp(&self, other: &Self) -> Ordering {
        self.physical_ms
            .cmp(&other.physical_ms)
            .then(self.logical.cmp(&other.logical))
    }
}
