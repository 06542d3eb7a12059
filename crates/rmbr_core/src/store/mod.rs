//! Workspace document store.
//!
//! # Responsibility
//! - Own every page and board of one session plus the UI selection state.
//! - Route all mutations through one operation set so links never change on
//!   just one side.
//!
//! # Invariants
//! - Every operation either fully applies or returns an error with no
//!   mutation.
//! - `parent_id` and `children` stay mirror images of each other; root pages
//!   are listed exactly once in the root order.
//! - At most one board exists per page and its page always exists.
//!
//! # See also
//! - `store::tree` for cascading delete and re-parenting.

mod board;
mod comment;
mod snapshot;
mod tree;

pub use snapshot::{WorkspaceSnapshot, SNAPSHOT_VERSION};
pub use tree::DeleteReport;

use crate::model::board::{Board, BoardId, CardId, ColumnId};
use crate::model::comment::CommentId;
use crate::model::now_epoch_ms;
use crate::model::page::{Page, PageContent, PageId, PagePatch};
use log::debug;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Coarse error category shared by every store failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced id does not exist.
    NotFound,
    /// The operation would break a uniqueness invariant.
    Conflict,
    /// Input is malformed or would break tree shape.
    InvalidArgument,
}

/// Errors from workspace store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Target page does not exist.
    PageNotFound(PageId),
    /// Requested parent page does not exist.
    ParentNotFound(PageId),
    /// Target board does not exist.
    BoardNotFound(BoardId),
    /// Column does not exist on the board.
    ColumnNotFound {
        board_id: BoardId,
        column_id: ColumnId,
    },
    /// Card does not exist on the board.
    CardNotFound { board_id: BoardId, card_id: CardId },
    /// Comment does not exist on the page.
    CommentNotFound {
        page_id: PageId,
        comment_id: CommentId,
    },
    /// The page already owns a board.
    BoardAlreadyExists { page_id: PageId, board_id: BoardId },
    /// Comment text is blank after trim.
    EmptyCommentText,
    /// Column or card title is blank after trim.
    BlankTitle(&'static str),
    /// Re-parenting would make a page its own ancestor.
    CycleDetected { page_id: PageId, parent_id: PageId },
    /// Loaded state breaks a workspace invariant.
    InvariantViolation(String),
    /// Snapshot was written by a newer format than this build understands.
    UnsupportedSnapshotVersion { version: u32, latest_supported: u32 },
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PageNotFound(_)
            | Self::ParentNotFound(_)
            | Self::BoardNotFound(_)
            | Self::ColumnNotFound { .. }
            | Self::CardNotFound { .. }
            | Self::CommentNotFound { .. } => ErrorKind::NotFound,
            Self::BoardAlreadyExists { .. } => ErrorKind::Conflict,
            Self::EmptyCommentText
            | Self::BlankTitle(_)
            | Self::CycleDetected { .. }
            | Self::InvariantViolation(_)
            | Self::UnsupportedSnapshotVersion { .. } => ErrorKind::InvalidArgument,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PageNotFound(id) => write!(f, "page not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent page not found: {id}"),
            Self::BoardNotFound(id) => write!(f, "board not found: {id}"),
            Self::ColumnNotFound {
                board_id,
                column_id,
            } => write!(f, "column {column_id} not found on board {board_id}"),
            Self::CardNotFound { board_id, card_id } => {
                write!(f, "card {card_id} not found on board {board_id}")
            }
            Self::CommentNotFound {
                page_id,
                comment_id,
            } => write!(f, "comment {comment_id} not found on page {page_id}"),
            Self::BoardAlreadyExists { page_id, board_id } => {
                write!(f, "page {page_id} already has board {board_id}")
            }
            Self::EmptyCommentText => write!(f, "comment text must not be blank"),
            Self::BlankTitle(what) => write!(f, "{what} title must not be blank"),
            Self::CycleDetected { page_id, parent_id } => write!(
                f,
                "move would create cycle: page {page_id} under parent {parent_id}"
            ),
            Self::InvariantViolation(message) => {
                write!(f, "workspace invariant violated: {message}")
            }
            Self::UnsupportedSnapshotVersion {
                version,
                latest_supported,
            } => write!(
                f,
                "snapshot version {version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for StoreError {}

/// Session-scoped aggregate of pages, boards and selection state.
#[derive(Debug, Clone)]
pub struct WorkspaceStore {
    pages: BTreeMap<PageId, Page>,
    boards: BTreeMap<BoardId, Board>,
    root_order: Vec<PageId>,
    active_page: Option<PageId>,
    sidebar_open: bool,
    clock: fn() -> i64,
}

impl Default for WorkspaceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkspaceStore {
    /// Creates an empty workspace with the sidebar open.
    pub fn new() -> Self {
        Self::with_clock(now_epoch_ms)
    }

    /// Creates an empty workspace reading time from `clock`.
    ///
    /// `clock` must return Unix epoch milliseconds.
    pub fn with_clock(clock: fn() -> i64) -> Self {
        Self {
            pages: BTreeMap::new(),
            boards: BTreeMap::new(),
            root_order: Vec::new(),
            active_page: None,
            sidebar_open: true,
            clock,
        }
    }

    fn now(&self) -> i64 {
        (self.clock)()
    }

    /// Creates an empty page, optionally as last child of `parent_id`.
    ///
    /// The new page becomes the active page.
    ///
    /// # Errors
    /// - `ParentNotFound` when `parent_id` is unknown.
    pub fn create_page(&mut self, parent_id: Option<PageId>) -> StoreResult<&Page> {
        if let Some(parent_id) = parent_id {
            if !self.pages.contains_key(&parent_id) {
                return Err(StoreError::ParentNotFound(parent_id));
            }
        }

        let page = Page::new(parent_id, self.now());
        let page_id = page.id;
        self.pages.insert(page_id, page);
        self.link_child(parent_id, page_id, None);
        self.active_page = Some(page_id);

        debug!(
            "event=page_create module=store status=ok page_id={} has_parent={}",
            page_id,
            parent_id.is_some()
        );
        self.page_or_err(page_id)
    }

    /// Merges title/icon/favorite fields into one page and refreshes
    /// `updated_at`.
    ///
    /// An empty patch names no field to update, so it is a no-op: it
    /// succeeds and leaves `updated_at` as it was.
    ///
    /// # Errors
    /// - `PageNotFound` when `page_id` is unknown.
    pub fn update_page(&mut self, page_id: PageId, patch: PagePatch) -> StoreResult<&Page> {
        let now = self.now();
        let page = self.page_mut_or_err(page_id)?;
        if patch.apply_to(page) {
            page.touch(now);
        }
        debug!("event=page_update module=store status=ok page_id={page_id}");
        self.page_or_err(page_id)
    }

    /// Replaces the opaque editor content of one page.
    pub fn update_page_content(&mut self, page_id: PageId, content: PageContent) -> StoreResult<()> {
        let now = self.now();
        let page = self.page_mut_or_err(page_id)?;
        page.content = content;
        page.touch(now);
        debug!("event=page_content_update module=store status=ok page_id={page_id}");
        Ok(())
    }

    /// Flips the favorite flag and returns the new value.
    pub fn toggle_favorite(&mut self, page_id: PageId) -> StoreResult<bool> {
        let now = self.now();
        let page = self.page_mut_or_err(page_id)?;
        page.is_favorite = !page.is_favorite;
        page.touch(now);
        Ok(page.is_favorite)
    }

    /// Points the "currently viewed" selection at `page_id`.
    ///
    /// No existence check: readers treat a dangling pointer as no selection.
    pub fn set_active_page(&mut self, page_id: Option<PageId>) {
        self.active_page = page_id;
    }

    /// Flips sidebar visibility and returns the new value.
    pub fn toggle_sidebar(&mut self) -> bool {
        self.sidebar_open = !self.sidebar_open;
        self.sidebar_open
    }

    /// Drops every page and board and resets selection state.
    pub fn clear(&mut self) {
        let removed_pages = self.pages.len();
        let removed_boards = self.boards.len();
        self.pages.clear();
        self.boards.clear();
        self.root_order.clear();
        self.active_page = None;
        self.sidebar_open = true;
        debug!(
            "event=workspace_clear module=store status=ok removed_pages={removed_pages} removed_boards={removed_boards}"
        );
    }

    pub fn page(&self, page_id: PageId) -> Option<&Page> {
        self.pages.get(&page_id)
    }

    /// Iterates every page in id order.
    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.values()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Root pages in sidebar order.
    pub fn root_pages(&self) -> Vec<&Page> {
        self.root_order
            .iter()
            .filter_map(|page_id| self.pages.get(page_id))
            .collect()
    }

    /// Direct children of one page in sidebar order.
    pub fn child_pages(&self, page_id: PageId) -> StoreResult<Vec<&Page>> {
        let page = self.page_or_err(page_id)?;
        Ok(page
            .children
            .iter()
            .filter_map(|child_id| self.pages.get(child_id))
            .collect())
    }

    /// Favorite pages, most recently updated first.
    pub fn favorite_pages(&self) -> Vec<&Page> {
        let mut favorites: Vec<&Page> = self.pages.values().filter(|p| p.is_favorite).collect();
        favorites.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
        favorites
    }

    /// Raw selection pointer; may name a page that no longer exists.
    pub fn active_page_id(&self) -> Option<PageId> {
        self.active_page
    }

    /// Resolves the selection pointer to a live page.
    pub fn active_page(&self) -> Option<&Page> {
        self.active_page.and_then(|page_id| self.pages.get(&page_id))
    }

    pub fn is_sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    pub fn board(&self, board_id: BoardId) -> Option<&Board> {
        self.boards.get(&board_id)
    }

    /// Iterates every board in id order.
    pub fn boards(&self) -> impl Iterator<Item = &Board> {
        self.boards.values()
    }

    pub fn board_count(&self) -> usize {
        self.boards.len()
    }

    fn page_or_err(&self, page_id: PageId) -> StoreResult<&Page> {
        self.pages
            .get(&page_id)
            .ok_or(StoreError::PageNotFound(page_id))
    }

    fn page_mut_or_err(&mut self, page_id: PageId) -> StoreResult<&mut Page> {
        self.pages
            .get_mut(&page_id)
            .ok_or(StoreError::PageNotFound(page_id))
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, StoreError, WorkspaceStore};
    use crate::model::page::{PageContent, PagePatch};
    use serde_json::json;
    use std::sync::atomic::{AtomicI64, Ordering};
    use uuid::Uuid;

    static CLOCK: AtomicI64 = AtomicI64::new(1_000);

    fn ticking_clock() -> i64 {
        CLOCK.fetch_add(10, Ordering::SeqCst)
    }

    #[test]
    fn create_root_page_sets_active_page() {
        let mut store = WorkspaceStore::new();
        let page_id = store.create_page(None).unwrap().id;

        assert_eq!(store.active_page_id(), Some(page_id));
        assert_eq!(store.root_pages().len(), 1);
        assert!(store.validate().is_ok());
    }

    #[test]
    fn create_child_under_missing_parent_fails_without_mutation() {
        let mut store = WorkspaceStore::new();
        let missing = Uuid::new_v4();

        let err = store.create_page(Some(missing)).unwrap_err();
        assert_eq!(err, StoreError::ParentNotFound(missing));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(store.page_count(), 0);
        assert_eq!(store.active_page_id(), None);
    }

    #[test]
    fn update_page_refreshes_updated_at() {
        let mut store = WorkspaceStore::with_clock(ticking_clock);
        let page_id = store.create_page(None).unwrap().id;
        let created_at = store.page(page_id).unwrap().created_at;

        let page = store.update_page(page_id, PagePatch::title("Plans")).unwrap();
        assert_eq!(page.title, "Plans");
        assert!(page.updated_at > created_at);
    }

    #[test]
    fn empty_patch_keeps_updated_at() {
        let mut store = WorkspaceStore::with_clock(ticking_clock);
        let page_id = store.create_page(None).unwrap().id;
        let before = store.page(page_id).unwrap().updated_at;

        store.update_page(page_id, PagePatch::default()).unwrap();
        assert_eq!(store.page(page_id).unwrap().updated_at, before);
    }

    #[test]
    fn content_is_stored_verbatim() {
        let mut store = WorkspaceStore::new();
        let page_id = store.create_page(None).unwrap().id;
        let blocks = json!([{ "type": "heading", "content": "Hi" }]);

        store
            .update_page_content(page_id, PageContent::from_value(blocks.clone()))
            .unwrap();
        assert_eq!(store.page(page_id).unwrap().content.as_value(), &blocks);
    }

    #[test]
    fn toggles_are_involutions() {
        let mut store = WorkspaceStore::new();
        let page_id = store.create_page(None).unwrap().id;

        assert!(store.toggle_favorite(page_id).unwrap());
        assert!(!store.toggle_favorite(page_id).unwrap());
        assert!(!store.page(page_id).unwrap().is_favorite);

        assert!(store.is_sidebar_open());
        store.toggle_sidebar();
        store.toggle_sidebar();
        assert!(store.is_sidebar_open());
    }

    #[test]
    fn dangling_active_pointer_resolves_to_none() {
        let mut store = WorkspaceStore::new();
        store.set_active_page(Some(Uuid::new_v4()));
        assert!(store.active_page_id().is_some());
        assert!(store.active_page().is_none());
    }

    #[test]
    fn clear_resets_everything() {
        let mut store = WorkspaceStore::new();
        let page_id = store.create_page(None).unwrap().id;
        store.create_board(page_id).unwrap();
        store.toggle_sidebar();

        store.clear();
        assert_eq!(store.page_count(), 0);
        assert_eq!(store.board_count(), 0);
        assert!(store.root_pages().is_empty());
        assert_eq!(store.active_page_id(), None);
        assert!(store.is_sidebar_open());
    }
}
