//! Workspace session service.
//!
//! # Responsibility
//! - Load the store from a snapshot repository at session start.
//! - Route every persisted mutation through the store and flush according
//!   to the session's persist policy.
//!
//! # Invariants
//! - Failed store operations neither mark the session dirty nor save.
//! - A failed save keeps the session dirty so the next flush retries.
//! - Selection state (active page, sidebar) is never persisted.

use crate::model::board::Board;
use crate::model::comment::{Comment, CommentId};
use crate::model::page::{PageContent, PageId, PagePatch};
use crate::repo::snapshot_repo::{RepoError, SnapshotRepository};
use crate::store::{DeleteReport, StoreError, StoreResult, WorkspaceStore};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// When the session writes snapshots to its repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PersistPolicy {
    /// Save right after every successful mutation.
    #[default]
    EveryMutation,
    /// Save only on explicit `flush` (callers debounce).
    Manual,
}

/// Session configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionConfig {
    pub persist_policy: PersistPolicy,
}

/// Errors from session operations.
#[derive(Debug)]
pub enum ServiceError {
    /// The store rejected the operation; nothing changed.
    Store(StoreError),
    /// Loading or saving the snapshot failed.
    Repo(RepoError),
}

impl ServiceError {
    /// Returns the store error, if this failure came from the store.
    pub fn as_store(&self) -> Option<&StoreError> {
        match self {
            Self::Store(err) => Some(err),
            Self::Repo(_) => None,
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// One workspace session: a store plus its persistence collaborator.
pub struct WorkspaceService<R: SnapshotRepository> {
    store: WorkspaceStore,
    repo: R,
    config: SessionConfig,
    dirty: bool,
}

impl<R: SnapshotRepository> WorkspaceService<R> {
    /// Starts a session from the repository's snapshot, or empty when none
    /// was saved.
    ///
    /// # Errors
    /// - `Repo` when the snapshot cannot be read or decoded.
    /// - `Store` when the snapshot breaks workspace invariants.
    pub fn open(repo: R, config: SessionConfig) -> ServiceResult<Self> {
        let store = match repo.load()? {
            Some(snapshot) => WorkspaceStore::from_snapshot(snapshot)?,
            None => WorkspaceStore::new(),
        };
        info!(
            "event=session_open module=service status=ok pages={} boards={} policy={:?}",
            store.page_count(),
            store.board_count(),
            config.persist_policy
        );
        Ok(Self {
            store,
            repo,
            config,
            dirty: false,
        })
    }

    pub fn store(&self) -> &WorkspaceStore {
        &self.store
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    /// Whether in-memory state has changes not yet saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Runs one store operation and persists per policy.
    ///
    /// On store failure nothing changed and nothing is saved. An `Err` always
    /// means the store is unchanged: when the autosave fails the mutation
    /// stays applied, its result is returned and the session stays dirty
    /// until a later `flush` succeeds.
    pub fn mutate<T>(
        &mut self,
        operation: impl FnOnce(&mut WorkspaceStore) -> StoreResult<T>,
    ) -> ServiceResult<T> {
        let value = operation(&mut self.store)?;
        self.dirty = true;
        if self.config.persist_policy == PersistPolicy::EveryMutation {
            if let Err(err) = self.flush() {
                warn!("event=session_autosave module=service status=deferred error={err}");
            }
        }
        Ok(value)
    }

    /// Saves the current snapshot when dirty. Returns whether it saved.
    pub fn flush(&mut self) -> ServiceResult<bool> {
        if !self.dirty {
            return Ok(false);
        }
        if let Err(err) = self.repo.save(&self.store.to_snapshot()) {
            warn!("event=session_flush module=service status=error error={err}");
            return Err(err.into());
        }
        self.dirty = false;
        Ok(true)
    }

    /// Wipes the store and the persisted snapshot ("Clear All Data").
    pub fn clear_all(&mut self) -> ServiceResult<()> {
        self.repo.clear()?;
        self.store.clear();
        self.dirty = false;
        info!("event=session_clear module=service status=ok");
        Ok(())
    }

    pub fn create_page(&mut self, parent_id: Option<PageId>) -> ServiceResult<PageId> {
        self.mutate(|store| store.create_page(parent_id).map(|page| page.id))
    }

    pub fn update_page(&mut self, page_id: PageId, patch: PagePatch) -> ServiceResult<()> {
        self.mutate(|store| store.update_page(page_id, patch).map(|_| ()))
    }

    pub fn update_page_content(
        &mut self,
        page_id: PageId,
        content: PageContent,
    ) -> ServiceResult<()> {
        self.mutate(|store| store.update_page_content(page_id, content))
    }

    pub fn delete_page(&mut self, page_id: PageId) -> ServiceResult<DeleteReport> {
        self.mutate(|store| store.delete_page(page_id))
    }

    pub fn move_page(
        &mut self,
        page_id: PageId,
        new_parent_id: Option<PageId>,
        index: Option<usize>,
    ) -> ServiceResult<()> {
        self.mutate(|store| store.move_page(page_id, new_parent_id, index))
    }

    pub fn toggle_favorite(&mut self, page_id: PageId) -> ServiceResult<bool> {
        self.mutate(|store| store.toggle_favorite(page_id))
    }

    pub fn create_board(&mut self, page_id: PageId) -> ServiceResult<Board> {
        self.mutate(|store| store.create_board(page_id).cloned())
    }

    pub fn add_comment(
        &mut self,
        page_id: PageId,
        text: impl Into<String>,
        selected_text: impl Into<String>,
    ) -> ServiceResult<CommentId> {
        self.mutate(|store| store.add_comment(page_id, text, selected_text))
    }

    pub fn delete_comment(
        &mut self,
        page_id: PageId,
        comment_id: CommentId,
    ) -> ServiceResult<Comment> {
        self.mutate(|store| store.delete_comment(page_id, comment_id))
    }

    /// Selection only; does not mark the session dirty.
    pub fn set_active_page(&mut self, page_id: Option<PageId>) {
        self.store.set_active_page(page_id);
    }

    /// Selection only; does not mark the session dirty.
    pub fn toggle_sidebar(&mut self) -> bool {
        self.store.toggle_sidebar()
    }

    /// Ends the session, returning the store and repository.
    pub fn into_parts(self) -> (WorkspaceStore, R) {
        (self.store, self.repo)
    }
}
