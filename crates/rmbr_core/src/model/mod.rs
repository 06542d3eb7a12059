//! Workspace entity model: pages, boards and comments.
//!
//! # Responsibility
//! - Define plain data records shared by the store and persistence layers.
//! - Keep records serde-compatible with the persisted snapshot shape.
//!
//! # Invariants
//! - Every entity is identified by a random v4 `Uuid`.
//! - Records carry no cross-entity behavior; links are maintained by the
//!   store.

pub mod board;
pub mod comment;
pub mod page;

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in Unix epoch milliseconds.
///
/// Clamps to `0` if the system clock reports a time before the epoch.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
