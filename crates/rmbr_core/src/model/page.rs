//! Page domain model.
//!
//! # Responsibility
//! - Define the page record that forms one node of the workspace tree.
//! - Carry the opaque editor content and page-owned comments.
//!
//! # Invariants
//! - `id` is generated once and never reused for another page.
//! - `children` mirrors exactly the pages whose `parent_id` is this page.
//!   Only the store's tree operations may change either side.
//! - `updated_at` is never earlier than `created_at`.

use crate::model::comment::{Comment, CommentId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Stable identifier for one page.
pub type PageId = Uuid;

/// Label shown for pages whose title is blank.
pub const UNTITLED_PAGE_TITLE: &str = "Untitled";

/// Opaque structured-content value owned by the external editor.
///
/// The store never interprets the payload. The empty document is an empty
/// block list (`[]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageContent(Value);

impl PageContent {
    /// Returns the empty block list.
    pub fn empty() -> Self {
        Self(Value::Array(Vec::new()))
    }

    /// Wraps an editor-produced value without inspecting it.
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// Borrows the raw editor value.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consumes the wrapper and returns the raw editor value.
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Returns whether the payload holds no blocks.
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::Array(blocks) => blocks.is_empty(),
            _ => false,
        }
    }
}

impl Default for PageContent {
    fn default() -> Self {
        Self::empty()
    }
}

/// One node of the workspace document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: PageId,
    /// Blank titles render as [`UNTITLED_PAGE_TITLE`].
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub content: PageContent,
    /// `None` means root-level page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<PageId>,
    /// Ordered child page ids.
    #[serde(default)]
    pub children: Vec<PageId>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub comments: BTreeMap<CommentId, Comment>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

impl Page {
    /// Creates an empty page with a generated id.
    ///
    /// The page is not linked into any parent's `children`; callers go
    /// through the store so both sides of the link change together.
    pub fn new(parent_id: Option<PageId>, now_ms: i64) -> Self {
        Self::with_id(Uuid::new_v4(), parent_id, now_ms)
    }

    /// Creates an empty page with a caller-provided id.
    ///
    /// Used by import paths and tests where identity already exists.
    pub fn with_id(id: PageId, parent_id: Option<PageId>, now_ms: i64) -> Self {
        Self {
            id,
            title: String::new(),
            icon: None,
            content: PageContent::empty(),
            parent_id,
            children: Vec::new(),
            is_favorite: false,
            comments: BTreeMap::new(),
            created_at: now_ms,
            updated_at: now_ms,
        }
    }

    /// Returns the title, or "Untitled" when it is blank.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            UNTITLED_PAGE_TITLE
        } else {
            self.title.as_str()
        }
    }

    /// Returns whether this page sits at the root of the forest.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Refreshes `updated_at`, never moving it backwards.
    pub fn touch(&mut self, now_ms: i64) {
        self.updated_at = self.updated_at.max(now_ms);
    }
}

/// Partial update for page metadata.
///
/// `None` leaves the field unchanged. `icon: Some(None)` clears the icon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PagePatch {
    pub title: Option<String>,
    pub icon: Option<Option<String>>,
    pub is_favorite: Option<bool>,
}

impl PagePatch {
    pub fn title(value: impl Into<String>) -> Self {
        Self {
            title: Some(value.into()),
            ..Self::default()
        }
    }

    /// Returns whether the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.icon.is_none() && self.is_favorite.is_none()
    }

    /// Applies the set fields and reports whether anything was present.
    pub(crate) fn apply_to(self, page: &mut Page) -> bool {
        let touched = !self.is_empty();
        if let Some(title) = self.title {
            page.title = title;
        }
        if let Some(icon) = self.icon {
            page.icon = icon;
        }
        if let Some(is_favorite) = self.is_favorite {
            page.is_favorite = is_favorite;
        }
        touched
    }
}

#[cfg(test)]
mod tests {
    use super::{Page, PageContent, PagePatch};
    use serde_json::json;

    #[test]
    fn new_page_is_empty_root() {
        let page = Page::new(None, 1_000);
        assert!(page.is_root());
        assert!(page.content.is_empty());
        assert!(page.children.is_empty());
        assert!(page.comments.is_empty());
        assert_eq!(page.created_at, page.updated_at);
    }

    #[test]
    fn display_title_falls_back_for_blank_title() {
        let mut page = Page::new(None, 0);
        assert_eq!(page.display_title(), "Untitled");
        page.title = "   ".to_string();
        assert_eq!(page.display_title(), "Untitled");
        page.title = "Roadmap".to_string();
        assert_eq!(page.display_title(), "Roadmap");
    }

    #[test]
    fn touch_never_moves_backwards() {
        let mut page = Page::new(None, 5_000);
        page.touch(4_000);
        assert_eq!(page.updated_at, 5_000);
        page.touch(6_000);
        assert_eq!(page.updated_at, 6_000);
    }

    #[test]
    fn patch_clears_icon_and_keeps_unset_fields() {
        let mut page = Page::new(None, 0);
        page.title = "Keep".to_string();
        page.icon = Some("📄".to_string());

        let touched = PagePatch {
            icon: Some(None),
            ..PagePatch::default()
        }
        .apply_to(&mut page);

        assert!(touched);
        assert_eq!(page.title, "Keep");
        assert_eq!(page.icon, None);
        assert!(!PagePatch::default().apply_to(&mut page));
    }

    #[test]
    fn page_serializes_with_camel_case_fields() {
        let mut page = Page::new(None, 42);
        page.content = PageContent::from_value(json!([{ "type": "paragraph" }]));
        let value = serde_json::to_value(&page).unwrap();

        assert!(value.get("isFavorite").is_some());
        assert!(value.get("createdAt").is_some());
        assert!(value.get("parentId").is_none());
        assert_eq!(value["content"][0]["type"], "paragraph");

        let decoded: Page = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, page);
    }
}
