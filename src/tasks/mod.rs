//! Background Tasks Module
//!
//! Contains background tasks that run periodically while the cache is in use.
//!
//! # Tasks
//! - TTL Cleanup: Removes expired memory tier entries at configured intervals

mod cleanup;

pub use cleanup::{spawn_cleanup_task, spawn_configured_cleanup};
