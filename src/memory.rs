//! Memory Probe Module
//!
//! Samples system memory utilization for the pressure-aware cache and the
//! background monitor, and estimates the footprint of stored payloads.
//! The probe is a trait so tests can drive eviction deterministically.

use std::fmt;

use serde_json::Value;

// == Memory Probe Trait ==

/// Source of the current system memory utilization.
pub trait MemoryProbe: Send + Sync {
    /// Returns used memory as a percentage of total, in `[0, 100]`.
    ///
    /// Implementations should return `None` when the reading is
    /// unavailable; callers treat that as "no pressure".
    fn utilization_percent(&self) -> Option<f64>;
}

// == System Probe ==

/// Probe backed by the operating system's memory counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemMemoryProbe;

impl SystemMemoryProbe {
    pub fn new() -> Self {
        Self
    }
}

impl MemoryProbe for SystemMemoryProbe {
    fn utilization_percent(&self) -> Option<f64> {
        let mem = sys_info::mem_info().ok()?;
        if mem.total == 0 {
            return None;
        }
        let used = mem.total.saturating_sub(mem.avail) as f64;
        Some(used / mem.total as f64 * 100.0)
    }
}

// == Fixed Probe ==

/// Probe that always reports the same utilization.
///
/// Used by tests to push the pressure cache over its thresholds without
/// depending on the machine the tests run on.
#[derive(Clone, Copy)]
pub struct FixedMemoryProbe(pub f64);

impl MemoryProbe for FixedMemoryProbe {
    fn utilization_percent(&self) -> Option<f64> {
        Some(self.0)
    }
}

impl fmt::Debug for FixedMemoryProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FixedMemoryProbe({}%)", self.0)
    }
}

// == Payload Sizing ==

/// Estimates the in-memory footprint of a payload as the length of its
/// serialized form. Approximate, but consistent across payload shapes,
/// which is all the byte accounting needs.
pub fn estimate_size(value: &Value) -> usize {
    serde_json::to_vec(value).map(|bytes| bytes.len()).unwrap_or(0)
}

// == Unit Tests ==
