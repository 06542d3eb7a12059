//! Comment registration for inline anchors.
//!
//! The store only registers comments. Writing the anchor into page content,
//! and removing it later, belongs to the editor; an anchor whose comment is
//! gone is a tolerated state.

use super::{StoreError, StoreResult, WorkspaceStore};
use crate::model::comment::{Comment, CommentId};
use crate::model::page::PageId;
use log::debug;
use uuid::Uuid;

impl WorkspaceStore {
    /// Registers a comment on `page_id` and returns its anchor id.
    ///
    /// `text` must not be blank after trim but is stored as typed.
    /// `selected_text` is kept verbatim as a snapshot of the commented span.
    ///
    /// # Errors
    /// - `PageNotFound` when the page does not exist.
    /// - `EmptyCommentText` when `text` is blank after trim.
    pub fn add_comment(
        &mut self,
        page_id: PageId,
        text: impl Into<String>,
        selected_text: impl Into<String>,
    ) -> StoreResult<CommentId> {
        let now = self.now();
        let page = self.page_mut_or_err(page_id)?;

        let text = text.into();
        if text.trim().is_empty() {
            return Err(StoreError::EmptyCommentText);
        }

        let mut comment_id = Uuid::new_v4();
        while page.comments.contains_key(&comment_id) {
            comment_id = Uuid::new_v4();
        }

        page.comments.insert(
            comment_id,
            Comment::new(comment_id, text, selected_text.into(), now),
        );
        page.touch(now);

        debug!("event=comment_add module=store status=ok page_id={page_id} comment_id={comment_id}");
        Ok(comment_id)
    }

    /// Removes one comment and returns it. Page content is not touched.
    pub fn delete_comment(&mut self, page_id: PageId, comment_id: CommentId) -> StoreResult<Comment> {
        let now = self.now();
        let page = self.page_mut_or_err(page_id)?;
        let removed = page
            .comments
            .remove(&comment_id)
            .ok_or(StoreError::CommentNotFound {
                page_id,
                comment_id,
            })?;
        page.touch(now);

        debug!(
            "event=comment_delete module=store status=ok page_id={page_id} comment_id={comment_id}"
        );
        Ok(removed)
    }

    pub fn comment(&self, page_id: PageId, comment_id: CommentId) -> Option<&Comment> {
        self.pages
            .get(&page_id)
            .and_then(|page| page.comments.get(&comment_id))
    }

    /// Comments of one page, newest first (ties broken by id).
    pub fn comments(&self, page_id: PageId) -> StoreResult<Vec<&Comment>> {
        let page = self.page_or_err(page_id)?;
        let mut comments: Vec<&Comment> = page.comments.values().collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(comments)
    }
}
