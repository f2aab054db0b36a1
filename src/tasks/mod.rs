//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside a cache engine.
//!
//! # Tasks
//! - Reaper: Removes expired cache entries at configured intervals

mod reaper;

pub use reaper::{spawn_reaper_task, PurgeExpired};
