//! Background Tasks Module
//!
//! Contains the background workers that run alongside cache instances.
//!
//! # Tasks
//! - Expiry reaper: removes entries whose TTL elapsed, at fixed intervals
//! - Memory monitor: evicts under system memory pressure
//!
//! Both are controlled through a [`WorkerHandle`], which carries the stop
//! signal and join handle for deterministic teardown.

mod monitor;
mod reaper;
mod worker;

pub(crate) use monitor::spawn_monitor_task;
pub(crate) use reaper::spawn_reaper_task;
pub use worker::WorkerHandle;
