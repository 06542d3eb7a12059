//! Core workspace document store for rmbr.
//! This crate is the single source of truth for page tree, board linkage
//! and comment invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::board::{
    Board, BoardId, Card, CardId, CardPatch, Column, ColumnId, DEFAULT_COLUMN_TITLE,
};
pub use model::comment::{Comment, CommentId};
pub use model::page::{Page, PageContent, PageId, PagePatch, UNTITLED_PAGE_TITLE};
pub use repo::snapshot_repo::{
    InMemorySnapshotRepository, RepoError, RepoResult, SnapshotRepository,
    SqliteSnapshotRepository, DEFAULT_WORKSPACE_KEY,
};
pub use service::workspace_service::{
    PersistPolicy, ServiceError, ServiceResult, SessionConfig, WorkspaceService,
};
pub use store::{
    DeleteReport, ErrorKind, StoreError, StoreResult, WorkspaceSnapshot, WorkspaceStore,
    SNAPSHOT_VERSION,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
