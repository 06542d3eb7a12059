//! Board linkage and Kanban editing.
//!
//! # Invariants
//! - One board per page, checked at creation. Deletion of the owning page is
//!   the only way a board goes away.
//! - Card edits keep every card in exactly one column.

use super::{StoreError, StoreResult, WorkspaceStore};
use crate::model::board::{Board, BoardId, Card, CardId, CardPatch, Column, ColumnId};
use crate::model::page::PageId;
use log::debug;
use uuid::Uuid;

impl WorkspaceStore {
    /// Creates a board with one empty default column for `page_id`.
    ///
    /// # Errors
    /// - `PageNotFound` when the page does not exist.
    /// - `BoardAlreadyExists` when the page already owns a board; the
    ///   existing board is left untouched.
    pub fn create_board(&mut self, page_id: PageId) -> StoreResult<&Board> {
        self.page_or_err(page_id)?;
        if let Some(existing) = self.board_for_page(page_id) {
            return Err(StoreError::BoardAlreadyExists {
                page_id,
                board_id: existing.id,
            });
        }

        let board = Board::new(page_id, self.now());
        let board_id = board.id;
        self.boards.insert(board_id, board);
        debug!("event=board_create module=store status=ok page_id={page_id} board_id={board_id}");
        self.board_or_err(board_id)
    }

    /// Returns the board linked to `page_id`, if any.
    pub fn board_for_page(&self, page_id: PageId) -> Option<&Board> {
        self.boards.values().find(|board| board.page_id == page_id)
    }

    /// Appends a new empty column.
    pub fn add_column(&mut self, board_id: BoardId, title: impl Into<String>) -> StoreResult<ColumnId> {
        let title = normalize_title(title.into(), "column")?;
        let board = self.board_mut_or_err(board_id)?;
        let column = Column::new(title);
        let column_id = column.id;
        board.columns.push(column);
        Ok(column_id)
    }

    /// Appends a new card to the bottom of `column_id`.
    pub fn add_card(
        &mut self,
        board_id: BoardId,
        column_id: ColumnId,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> StoreResult<CardId> {
        let title = normalize_title(title.into(), "card")?;
        let now = self.now();
        let board = self.board_mut_or_err(board_id)?;
        let column = board
            .column_mut(column_id)
            .ok_or(StoreError::ColumnNotFound {
                board_id,
                column_id,
            })?;

        let card_id = Uuid::new_v4();
        column.card_ids.push(card_id);
        board.cards.insert(
            card_id,
            Card {
                id: card_id,
                title,
                description: description.into(),
                created_at: now,
            },
        );
        Ok(card_id)
    }

    pub fn update_card(
        &mut self,
        board_id: BoardId,
        card_id: CardId,
        patch: CardPatch,
    ) -> StoreResult<&Card> {
        let title = patch
            .title
            .map(|value| normalize_title(value, "card"))
            .transpose()?;
        let board = self.board_mut_or_err(board_id)?;
        let card = board
            .cards
            .get_mut(&card_id)
            .ok_or(StoreError::CardNotFound { board_id, card_id })?;
        if let Some(title) = title {
            card.title = title;
        }
        if let Some(description) = patch.description {
            card.description = description;
        }
        Ok(card)
    }

    /// Moves a card into `to_column_id` at `index` (clamped; `None` appends).
    ///
    /// Moving within the same column reorders it.
    pub fn move_card(
        &mut self,
        board_id: BoardId,
        card_id: CardId,
        to_column_id: ColumnId,
        index: Option<usize>,
    ) -> StoreResult<()> {
        let board = self.board_mut_or_err(board_id)?;
        if !board.cards.contains_key(&card_id) {
            return Err(StoreError::CardNotFound { board_id, card_id });
        }
        if board.column(to_column_id).is_none() {
            return Err(StoreError::ColumnNotFound {
                board_id,
                column_id: to_column_id,
            });
        }

        for column in &mut board.columns {
            column.card_ids.retain(|id| *id != card_id);
        }
        if let Some(target) = board.column_mut(to_column_id) {
            let position = index
                .unwrap_or(target.card_ids.len())
                .min(target.card_ids.len());
            target.card_ids.insert(position, card_id);
        }
        Ok(())
    }

    /// Removes one card from its board and returns it.
    pub fn delete_card(&mut self, board_id: BoardId, card_id: CardId) -> StoreResult<Card> {
        let board = self.board_mut_or_err(board_id)?;
        let card = board
            .cards
            .remove(&card_id)
            .ok_or(StoreError::CardNotFound { board_id, card_id })?;
        for column in &mut board.columns {
            column.card_ids.retain(|id| *id != card_id);
        }
        Ok(card)
    }

    fn board_or_err(&self, board_id: BoardId) -> StoreResult<&Board> {
        self.boards
            .get(&board_id)
            .ok_or(StoreError::BoardNotFound(board_id))
    }

    fn board_mut_or_err(&mut self, board_id: BoardId) -> StoreResult<&mut Board> {
        self.boards
            .get_mut(&board_id)
            .ok_or(StoreError::BoardNotFound(board_id))
    }
}

fn normalize_title(value: String, what: &'static str) -> StoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::BlankTitle(what));
    }
    Ok(trimmed.to_string())
}
