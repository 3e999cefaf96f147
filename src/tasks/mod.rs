//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside the cache.
//!
//! # Tasks
//! - Expiry sweep: removes expired cache items at a configured interval

mod sweep;

pub use sweep::spawn_sweep_task;
