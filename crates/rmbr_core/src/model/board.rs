//! Kanban board model.
//!
//! # Responsibility
//! - Define boards, columns and cards linked 1:1 to a page.
//!
//! # Invariants
//! - `page_id` is set at creation and never changes.
//! - Every id in a column's `card_ids` exists in `cards`.
//! - Every card appears in exactly one column, exactly once.

use crate::model::page::PageId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

pub type BoardId = Uuid;
pub type ColumnId = Uuid;
pub type CardId = Uuid;

/// Title of the single column every new board starts with.
pub const DEFAULT_COLUMN_TITLE: &str = "To Do";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: ColumnId,
    pub title: String,
    /// Ordered card ids, top to bottom.
    #[serde(default)]
    pub card_ids: Vec<CardId>,
}

impl Column {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            card_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Partial update for card fields. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardPatch {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Column/card structure owned by exactly one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: BoardId,
    pub page_id: PageId,
    pub columns: Vec<Column>,
    #[serde(default)]
    pub cards: BTreeMap<CardId, Card>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl Board {
    /// Creates a board for `page_id` with one empty default column.
    pub fn new(page_id: PageId, now_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            page_id,
            columns: vec![Column::new(DEFAULT_COLUMN_TITLE)],
            cards: BTreeMap::new(),
            created_at: now_ms,
        }
    }

    pub fn column(&self, column_id: ColumnId) -> Option<&Column> {
        self.columns.iter().find(|column| column.id == column_id)
    }

    pub(crate) fn column_mut(&mut self, column_id: ColumnId) -> Option<&mut Column> {
        self.columns.iter_mut().find(|column| column.id == column_id)
    }

    /// Returns the id of the column currently holding `card_id`.
    pub fn column_of(&self, card_id: CardId) -> Option<ColumnId> {
        self.columns
            .iter()
            .find(|column| column.card_ids.contains(&card_id))
            .map(|column| column.id)
    }

    /// Returns cards of one column in display order.
    pub fn cards_in(&self, column_id: ColumnId) -> Vec<&Card> {
        self.column(column_id)
            .map(|column| {
                column
                    .card_ids
                    .iter()
                    .filter_map(|card_id| self.cards.get(card_id))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Checks the column/card membership invariants.
    ///
    /// Returns a description of the first violation found.
    pub fn check_cards(&self) -> Result<(), String> {
        let mut placed = BTreeSet::new();
        for column in &self.columns {
            for card_id in &column.card_ids {
                if !self.cards.contains_key(card_id) {
                    return Err(format!(
                        "column {} references missing card {card_id}",
                        column.id
                    ));
                }
                if !placed.insert(*card_id) {
                    return Err(format!("card {card_id} is placed more than once"));
                }
            }
        }
        if let Some(orphan) = self.cards.keys().find(|card_id| !placed.contains(card_id)) {
            return Err(format!("card {orphan} belongs to no column"));
        }
        Ok(())
    }
}
