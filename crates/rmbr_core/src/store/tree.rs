//! Page hierarchy operations.
//!
//! # Invariants
//! - `link_child`/`unlink_child` are the only writers of `children` and the
//!   root order.
//! - Cascading delete collects the whole subtree before mutating anything.
//! - Re-parenting never makes a page its own ancestor.

use super::{StoreError, StoreResult, WorkspaceStore};
use crate::model::board::BoardId;
use crate::model::page::PageId;
use log::{debug, info};
use std::collections::{BTreeSet, HashSet};

/// What a cascading page delete removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    /// Removed pages in pre-order, starting with the deleted page.
    pub removed_pages: Vec<PageId>,
    pub removed_boards: Vec<BoardId>,
    /// Number of comments owned by the removed pages.
    pub removed_comments: usize,
}

impl WorkspaceStore {
    /// Deletes one page together with its whole subtree.
    ///
    /// Also drops every comment owned by a removed page and every board
    /// linked to one. When the active page is removed, selection falls back
    /// to the deleted page's parent, or to nothing for a root page.
    ///
    /// # Errors
    /// - `PageNotFound` when `page_id` is unknown. Nothing is removed.
    pub fn delete_page(&mut self, page_id: PageId) -> StoreResult<DeleteReport> {
        let parent_id = self.page_or_err(page_id)?.parent_id;

        let removed_pages = self.collect_subtree(page_id);
        let removed_set: BTreeSet<PageId> = removed_pages.iter().copied().collect();
        let removed_boards: Vec<BoardId> = self
            .boards
            .values()
            .filter(|board| removed_set.contains(&board.page_id))
            .map(|board| board.id)
            .collect();
        let removed_comments: usize = removed_pages
            .iter()
            .filter_map(|id| self.pages.get(id))
            .map(|page| page.comments.len())
            .sum();

        self.unlink_child(parent_id, page_id);
        for id in &removed_pages {
            self.pages.remove(id);
        }
        for board_id in &removed_boards {
            self.boards.remove(board_id);
        }
        if self
            .active_page
            .is_some_and(|active| removed_set.contains(&active))
        {
            self.active_page = parent_id;
        }

        info!(
            "event=page_delete module=store status=ok page_id={} removed_pages={} removed_boards={} removed_comments={}",
            page_id,
            removed_pages.len(),
            removed_boards.len(),
            removed_comments
        );
        Ok(DeleteReport {
            removed_pages,
            removed_boards,
            removed_comments,
        })
    }

    /// Moves one page under `new_parent_id` (root when `None`).
    ///
    /// `index` is the position among the new siblings, clamped to their
    /// count; `None` appends.
    ///
    /// # Errors
    /// - `PageNotFound` / `ParentNotFound` for unknown ids.
    /// - `CycleDetected` when the target parent is the page itself or one of
    ///   its descendants.
    pub fn move_page(
        &mut self,
        page_id: PageId,
        new_parent_id: Option<PageId>,
        index: Option<usize>,
    ) -> StoreResult<()> {
        let old_parent_id = self.page_or_err(page_id)?.parent_id;

        if let Some(parent_id) = new_parent_id {
            if !self.pages.contains_key(&parent_id) {
                return Err(StoreError::ParentNotFound(parent_id));
            }
            if self.would_create_cycle(page_id, parent_id) {
                return Err(StoreError::CycleDetected { page_id, parent_id });
            }
        }

        let now = self.now();
        self.unlink_child(old_parent_id, page_id);
        if let Some(page) = self.pages.get_mut(&page_id) {
            page.parent_id = new_parent_id;
            page.touch(now);
        }
        self.link_child(new_parent_id, page_id, index);

        debug!(
            "event=page_move module=store status=ok page_id={} to_root={}",
            page_id,
            new_parent_id.is_none()
        );
        Ok(())
    }

    /// Returns every descendant of `page_id` in pre-order, excluding itself.
    pub fn descendant_ids(&self, page_id: PageId) -> StoreResult<Vec<PageId>> {
        self.page_or_err(page_id)?;
        let mut subtree = self.collect_subtree(page_id);
        subtree.remove(0);
        Ok(subtree)
    }

    /// Pre-order walk over `children` links, starting at `root_id`.
    ///
    /// Guards against revisits so corrupt input cannot loop forever.
    fn collect_subtree(&self, root_id: PageId) -> Vec<PageId> {
        let mut visited = HashSet::new();
        let mut ordered = Vec::new();
        let mut stack = vec![root_id];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            ordered.push(current);
            if let Some(page) = self.pages.get(&current) {
                stack.extend(page.children.iter().rev().copied());
            }
        }
        ordered
    }

    fn would_create_cycle(&self, page_id: PageId, candidate_parent_id: PageId) -> bool {
        let mut visited = HashSet::new();
        let mut cursor = Some(candidate_parent_id);
        while let Some(current) = cursor {
            if current == page_id || !visited.insert(current) {
                return true;
            }
            cursor = self.pages.get(&current).and_then(|page| page.parent_id);
        }
        false
    }

    /// Inserts `child_id` into the parent's `children` (or the root order).
    pub(super) fn link_child(
        &mut self,
        parent_id: Option<PageId>,
        child_id: PageId,
        index: Option<usize>,
    ) {
        let siblings = match parent_id {
            Some(parent_id) => match self.pages.get_mut(&parent_id) {
                Some(parent) => &mut parent.children,
                None => return,
            },
            None => &mut self.root_order,
        };
        let position = index.unwrap_or(siblings.len()).min(siblings.len());
        siblings.insert(position, child_id);
    }

    /// Removes `child_id` from the parent's `children` (or the root order).
    pub(super) fn unlink_child(&mut self, parent_id: Option<PageId>, child_id: PageId) {
        match parent_id {
            Some(parent_id) => {
                if let Some(parent) = self.pages.get_mut(&parent_id) {
                    parent.children.retain(|id| *id != child_id);
                }
            }
            None => self.root_order.retain(|id| *id != child_id),
        }
    }
}
