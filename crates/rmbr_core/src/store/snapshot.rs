//! Snapshot export/import and invariant checking.
//!
//! # Responsibility
//! - Convert the live store to and from the persisted snapshot shape.
//! - Reject loaded state that breaks workspace invariants instead of
//!   repairing it silently.
//!
//! # Invariants
//! - Snapshot JSON keeps camelCase field names.
//! - `rootOrder` is derived data: missing or stale entries are rebuilt,
//!   everything else must already be consistent.

use super::{StoreError, StoreResult, WorkspaceStore};
use crate::model::board::{Board, BoardId};
use crate::model::page::{Page, PageId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Latest snapshot format written by this build.
pub const SNAPSHOT_VERSION: u32 = 1;

fn default_snapshot_version() -> u32 {
    SNAPSHOT_VERSION
}

/// Persisted form of one workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSnapshot {
    #[serde(default = "default_snapshot_version")]
    pub version: u32,
    #[serde(default)]
    pub pages: BTreeMap<PageId, Page>,
    #[serde(default)]
    pub boards: BTreeMap<BoardId, Board>,
    /// Sidebar order of root pages.
    #[serde(default)]
    pub root_order: Vec<PageId>,
}

impl Default for WorkspaceSnapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            pages: BTreeMap::new(),
            boards: BTreeMap::new(),
            root_order: Vec::new(),
        }
    }
}

impl WorkspaceStore {
    /// Rebuilds a store from a persisted snapshot.
    ///
    /// Selection starts empty and the sidebar open.
    ///
    /// # Errors
    /// - `UnsupportedSnapshotVersion` for snapshots newer than this build.
    /// - `InvariantViolation` when pages or boards are inconsistent.
    pub fn from_snapshot(snapshot: WorkspaceSnapshot) -> StoreResult<Self> {
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(StoreError::UnsupportedSnapshotVersion {
                version: snapshot.version,
                latest_supported: SNAPSHOT_VERSION,
            });
        }

        let root_order = normalize_root_order(&snapshot.pages, snapshot.root_order);
        let mut store = Self::new();
        store.pages = snapshot.pages;
        store.boards = snapshot.boards;
        store.root_order = root_order;
        store.validate()?;
        Ok(store)
    }

    /// Copies pages, boards and root order into a snapshot.
    pub fn to_snapshot(&self) -> WorkspaceSnapshot {
        WorkspaceSnapshot {
            version: SNAPSHOT_VERSION,
            pages: self.pages.clone(),
            boards: self.boards.clone(),
            root_order: self.root_order.clone(),
        }
    }

    /// Checks every workspace invariant.
    ///
    /// Returns `InvariantViolation` describing the first problem found.
    pub fn validate(&self) -> StoreResult<()> {
        self.validate_pages().map_err(StoreError::InvariantViolation)?;
        self.validate_boards().map_err(StoreError::InvariantViolation)
    }

    fn validate_pages(&self) -> Result<(), String> {
        for (key, page) in &self.pages {
            if *key != page.id {
                return Err(format!("page stored under {key} has id {}", page.id));
            }
            if page.updated_at < page.created_at {
                return Err(format!("page {key} was updated before it was created"));
            }

            match page.parent_id {
                Some(parent_id) => {
                    let parent = self
                        .pages
                        .get(&parent_id)
                        .ok_or_else(|| format!("page {key} has missing parent {parent_id}"))?;
                    let listed = parent.children.iter().filter(|id| *id == key).count();
                    if listed != 1 {
                        return Err(format!(
                            "page {key} is listed {listed} times in children of {parent_id}"
                        ));
                    }
                }
                None => {
                    let listed = self.root_order.iter().filter(|id| *id == key).count();
                    if listed != 1 {
                        return Err(format!("root page {key} is listed {listed} times as root"));
                    }
                }
            }

            let mut seen = HashSet::new();
            for child_id in &page.children {
                if !seen.insert(*child_id) {
                    return Err(format!("page {key} lists child {child_id} twice"));
                }
                let child = self
                    .pages
                    .get(child_id)
                    .ok_or_else(|| format!("page {key} lists missing child {child_id}"))?;
                if child.parent_id != Some(*key) {
                    return Err(format!("child {child_id} of {key} points at another parent"));
                }
            }

            for (comment_key, comment) in &page.comments {
                if *comment_key != comment.id {
                    return Err(format!(
                        "comment stored under {comment_key} on page {key} has id {}",
                        comment.id
                    ));
                }
                if comment.text.trim().is_empty() {
                    return Err(format!("comment {comment_key} on page {key} has blank text"));
                }
            }
        }

        if let Some(stray) = self
            .root_order
            .iter()
            .find(|id| self.pages.get(*id).map_or(true, |page| !page.is_root()))
        {
            return Err(format!("root order lists non-root page {stray}"));
        }

        self.validate_acyclic()
    }

    fn validate_acyclic(&self) -> Result<(), String> {
        let mut known_acyclic: HashSet<PageId> = HashSet::new();
        for start in self.pages.keys() {
            let mut path = HashSet::new();
            let mut cursor = Some(*start);
            while let Some(current) = cursor {
                if known_acyclic.contains(&current) {
                    break;
                }
                if !path.insert(current) {
                    return Err(format!("page {current} is its own ancestor"));
                }
                cursor = self.pages.get(&current).and_then(|page| page.parent_id);
            }
            known_acyclic.extend(path);
        }
        Ok(())
    }

    fn validate_boards(&self) -> Result<(), String> {
        let mut owners = BTreeSet::new();
        for (key, board) in &self.boards {
            if *key != board.id {
                return Err(format!("board stored under {key} has id {}", board.id));
            }
            if !self.pages.contains_key(&board.page_id) {
                return Err(format!("board {key} links missing page {}", board.page_id));
            }
            if !owners.insert(board.page_id) {
                return Err(format!("page {} owns more than one board", board.page_id));
            }
            board
                .check_cards()
                .map_err(|message| format!("board {key}: {message}"))?;
        }
        Ok(())
    }
}

/// Keeps listed roots in order, drops stale entries, appends unlisted roots
/// by creation time.
fn normalize_root_order(pages: &BTreeMap<PageId, Page>, listed: Vec<PageId>) -> Vec<PageId> {
    let mut seen = HashSet::new();
    let mut order: Vec<PageId> = listed
        .into_iter()
        .filter(|id| pages.get(id).is_some_and(Page::is_root) && seen.insert(*id))
        .collect();

    let mut missing: Vec<&Page> = pages
        .values()
        .filter(|page| page.is_root() && !seen.contains(&page.id))
        .collect();
    missing.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    order.extend(missing.into_iter().map(|page| page.id));
    order
}
