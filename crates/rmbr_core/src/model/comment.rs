//! Inline comment model.
//!
//! A comment id doubles as the anchor token the editor writes into page
//! content. Comments are owned by exactly one page and die with it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for one comment, also used as its anchor token.
pub type CommentId = Uuid;

/// Text annotation attached to a span of page content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    /// Comment body. Never blank once stored.
    pub text: String,
    /// Snapshot of the commented span at creation time. Not re-anchored when
    /// the content changes later.
    #[serde(default)]
    pub selected_text: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl Comment {
    pub(crate) fn new(
        id: CommentId,
        text: String,
        selected_text: String,
        created_at: i64,
    ) -> Self {
        Self {
            id,
            text,
            selected_text,
            created_at,
        }
    }

    /// Returns the anchor token the editor should write into content.
    pub fn anchor_token(&self) -> String {
        self.id.to_string()
    }
}
