//! Persistence collaborator contracts and implementations.
//!
//! # Responsibility
//! - Define the load/save contract the session uses to persist snapshots.
//! - Isolate SQLite and JSON details from the in-memory store.
//!
//! # Invariants
//! - Repositories persist whole snapshots; partial writes are never visible.
//! - Read paths reject undecodable data instead of masking it.

pub mod snapshot_repo;
