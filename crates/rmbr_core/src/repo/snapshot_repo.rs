//! Snapshot repository contracts with SQLite and in-memory implementations.
//!
//! # Responsibility
//! - Store one JSON-encoded `WorkspaceSnapshot` per key in `kv_store`.
//! - Offer an in-memory twin with the same encoding for tests and
//!   throwaway sessions.
//!
//! # Invariants
//! - SQLite repositories only accept fully migrated connections.
//! - `save` replaces the stored value in a single statement.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::store::WorkspaceSnapshot;
use log::{debug, error};
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::RefCell;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Key under which the default workspace snapshot is stored.
pub const DEFAULT_WORKSPACE_KEY: &str = "workspace-storage";

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from snapshot persistence.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Snapshot could not be encoded or decoded as JSON.
    Serialization(serde_json::Error),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "invalid snapshot encoding: {err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "snapshot repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "snapshot repository requires table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Load/save contract for workspace snapshots.
pub trait SnapshotRepository {
    /// Returns the stored snapshot, or `None` when nothing was saved yet.
    fn load(&self) -> RepoResult<Option<WorkspaceSnapshot>>;
    /// Replaces the stored snapshot.
    fn save(&self, snapshot: &WorkspaceSnapshot) -> RepoResult<()>;
    /// Removes the stored snapshot. Succeeds when nothing is stored.
    fn clear(&self) -> RepoResult<()>;
}

impl<R: SnapshotRepository + ?Sized> SnapshotRepository for &R {
    fn load(&self) -> RepoResult<Option<WorkspaceSnapshot>> {
        (**self).load()
    }

    fn save(&self, snapshot: &WorkspaceSnapshot) -> RepoResult<()> {
        (**self).save(snapshot)
    }

    fn clear(&self) -> RepoResult<()> {
        (**self).clear()
    }
}

/// SQLite-backed snapshot repository over the `kv_store` table.
pub struct SqliteSnapshotRepository<'conn> {
    conn: &'conn Connection,
    key: String,
}

impl<'conn> SqliteSnapshotRepository<'conn> {
    /// Creates repository for the default workspace key.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Self::try_with_key(conn, DEFAULT_WORKSPACE_KEY)
    }

    /// Creates repository storing its snapshot under `key`.
    pub fn try_with_key(conn: &'conn Connection, key: impl Into<String>) -> RepoResult<Self> {
        ensure_snapshot_connection_ready(conn)?;
        Ok(Self {
            conn,
            key: key.into(),
        })
    }

    pub fn key(&self) -> &str {
        self.key.as_str()
    }
}

impl SnapshotRepository for SqliteSnapshotRepository<'_> {
    fn load(&self) -> RepoResult<Option<WorkspaceSnapshot>> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value
                 FROM kv_store
                 WHERE key = ?1;",
                [self.key.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        let Some(value) = value else {
            debug!("event=snapshot_load module=repo status=empty");
            return Ok(None);
        };

        match serde_json::from_str::<WorkspaceSnapshot>(&value) {
            Ok(snapshot) => {
                debug!(
                    "event=snapshot_load module=repo status=ok pages={} boards={} bytes={}",
                    snapshot.pages.len(),
                    snapshot.boards.len(),
                    value.len()
                );
                Ok(Some(snapshot))
            }
            Err(err) => {
                error!(
                    "event=snapshot_load module=repo status=error error_code=snapshot_decode_failed error={err}"
                );
                Err(err.into())
            }
        }
    }

    fn save(&self, snapshot: &WorkspaceSnapshot) -> RepoResult<()> {
        let value = serde_json::to_string(snapshot)?;
        self.conn.execute(
            "INSERT INTO kv_store (key, value)
             VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![self.key.as_str(), value.as_str()],
        )?;
        debug!(
            "event=snapshot_save module=repo status=ok pages={} boards={} bytes={}",
            snapshot.pages.len(),
            snapshot.boards.len(),
            value.len()
        );
        Ok(())
    }

    fn clear(&self) -> RepoResult<()> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1;", [self.key.as_str()])?;
        debug!("event=snapshot_clear module=repo status=ok");
        Ok(())
    }
}

/// In-memory snapshot repository using the same JSON encoding as SQLite.
#[derive(Debug, Default)]
pub struct InMemorySnapshotRepository {
    value: RefCell<Option<String>>,
    saves: RefCell<usize>,
}

impl InMemorySnapshotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `save` calls so far.
    pub fn save_count(&self) -> usize {
        *self.saves.borrow()
    }

    /// Raw stored JSON, if any.
    pub fn raw(&self) -> Option<String> {
        self.value.borrow().clone()
    }
}

impl SnapshotRepository for InMemorySnapshotRepository {
    fn load(&self) -> RepoResult<Option<WorkspaceSnapshot>> {
        self.value
            .borrow()
            .as_deref()
            .map(serde_json::from_str::<WorkspaceSnapshot>)
            .transpose()
            .map_err(Into::into)
    }

    fn save(&self, snapshot: &WorkspaceSnapshot) -> RepoResult<()> {
        let value = serde_json::to_string(snapshot)?;
        *self.value.borrow_mut() = Some(value);
        *self.saves.borrow_mut() += 1;
        Ok(())
    }

    fn clear(&self) -> RepoResult<()> {
        self.value.borrow_mut().take();
        Ok(())
    }
}

fn ensure_snapshot_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = 'kv_store'
        );",
        [],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(RepoError::MissingRequiredTable("kv_store"));
    }
    Ok(())
}
