use rmbr_core::{
    CardPatch, ErrorKind, StoreError, WorkspaceStore, DEFAULT_COLUMN_TITLE,
};
use uuid::Uuid;

#[test]
fn create_board_links_page_with_one_empty_column() {
    let mut store = WorkspaceStore::new();
    let page = store.create_page(None).unwrap().id;

    let board = store.create_board(page).unwrap().clone();

    assert_eq!(board.page_id, page);
    assert_eq!(board.columns.len(), 1);
    assert_eq!(board.columns[0].title, DEFAULT_COLUMN_TITLE);
    assert!(board.columns[0].card_ids.is_empty());
    assert!(board.cards.is_empty());
    assert_eq!(store.board_for_page(page), Some(&board));
    assert_eq!(store.board(board.id), Some(&board));
}

#[test]
fn second_board_for_same_page_conflicts_and_keeps_original() {
    let mut store = WorkspaceStore::new();
    let page = store.create_page(None).unwrap().id;
    let original = store.create_board(page).unwrap().clone();

    let err = store.create_board(page).unwrap_err();

    assert_eq!(
        err,
        StoreError::BoardAlreadyExists {
            page_id: page,
            board_id: original.id
        }
    );
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(store.board_count(), 1);
    assert_eq!(store.board_for_page(page), Some(&original));
}

#[test]
fn board_for_unknown_page_is_not_found() {
    let mut store = WorkspaceStore::new();
    let missing = Uuid::new_v4();

    let err = store.create_board(missing).unwrap_err();
    assert_eq!(err, StoreError::PageNotFound(missing));
    assert_eq!(store.board_count(), 0);
}

#[test]
fn deleting_page_removes_boards_of_whole_subtree() {
    let mut store = WorkspaceStore::new();
    let root = store.create_page(None).unwrap().id;
    let child = store.create_page(Some(root)).unwrap().id;
    let bystander = store.create_page(None).unwrap().id;
    let root_board = store.create_board(root).unwrap().id;
    let child_board = store.create_board(child).unwrap().id;
    let kept_board = store.create_board(bystander).unwrap().id;

    let report = store.delete_page(root).unwrap();

    let mut removed = report.removed_boards.clone();
    removed.sort();
    let mut expected = vec![root_board, child_board];
    expected.sort();
    assert_eq!(removed, expected);
    assert!(store.board(root_board).is_none());
    assert!(store.board(child_board).is_none());
    assert!(store.board(kept_board).is_some());
    assert!(store.boards().all(|board| store.page(board.page_id).is_some()));
    store.validate().unwrap();
}

#[test]
fn page_can_get_a_new_board_after_recreation() {
    let mut store = WorkspaceStore::new();
    let page = store.create_page(None).unwrap().id;
    store.create_board(page).unwrap();
    store.delete_page(page).unwrap();

    let replacement = store.create_page(None).unwrap().id;
    assert!(store.create_board(replacement).is_ok());
    assert_eq!(store.board_count(), 1);
}

#[test]
fn cards_move_between_columns_and_stay_in_exactly_one() {
    let mut store = WorkspaceStore::new();
    let page = store.create_page(None).unwrap().id;
    let board = store.create_board(page).unwrap();
    let (board_id, todo) = (board.id, board.columns[0].id);
    let done = store.add_column(board_id, "Done").unwrap();

    let first = store.add_card(board_id, todo, "Write", "").unwrap();
    let second = store.add_card(board_id, todo, "Review", "carefully").unwrap();

    store.move_card(board_id, first, done, None).unwrap();
    let board = store.board(board_id).unwrap();
    assert_eq!(board.column(todo).unwrap().card_ids, vec![second]);
    assert_eq!(board.column(done).unwrap().card_ids, vec![first]);
    assert_eq!(board.column_of(first), Some(done));

    store.move_card(board_id, second, done, Some(0)).unwrap();
    let board = store.board(board_id).unwrap();
    assert!(board.column(todo).unwrap().card_ids.is_empty());
    let titles: Vec<&str> = board
        .cards_in(done)
        .into_iter()
        .map(|card| card.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Review", "Write"]);
    store.validate().unwrap();
}

#[test]
fn card_operations_report_unknown_ids() {
    let mut store = WorkspaceStore::new();
    let page = store.create_page(None).unwrap().id;
    let board = store.create_board(page).unwrap();
    let (board_id, column_id) = (board.id, board.columns[0].id);
    let card_id = store.add_card(board_id, column_id, "Task", "").unwrap();
    let missing = Uuid::new_v4();

    assert_eq!(
        store.add_card(missing, column_id, "x", "").unwrap_err(),
        StoreError::BoardNotFound(missing)
    );
    assert_eq!(
        store.add_card(board_id, missing, "x", "").unwrap_err(),
        StoreError::ColumnNotFound {
            board_id,
            column_id: missing
        }
    );
    assert_eq!(
        store.move_card(board_id, card_id, missing, None).unwrap_err(),
        StoreError::ColumnNotFound {
            board_id,
            column_id: missing
        }
    );
    assert_eq!(
        store
            .update_card(board_id, missing, CardPatch::default())
            .unwrap_err()
            .kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        store.board(board_id).unwrap().column_of(card_id),
        Some(column_id)
    );
}

#[test]
fn delete_card_removes_it_from_column() {
    let mut store = WorkspaceStore::new();
    let page = store.create_page(None).unwrap().id;
    let board = store.create_board(page).unwrap();
    let (board_id, column_id) = (board.id, board.columns[0].id);
    let card_id = store.add_card(board_id, column_id, "Task", "").unwrap();

    let removed = store.delete_card(board_id, card_id).unwrap();
    assert_eq!(removed.title, "Task");
    let board = store.board(board_id).unwrap();
    assert!(board.cards.is_empty());
    assert!(board.column(column_id).unwrap().card_ids.is_empty());
    assert!(store.delete_card(board_id, card_id).is_err());
    store.validate().unwrap();
}

#[test]
fn blank_column_title_is_invalid() {
    let mut store = WorkspaceStore::new();
    let page = store.create_page(None).unwrap().id;
    let board_id = store.create_board(page).unwrap().id;

    let err = store.add_column(board_id, "   ").unwrap_err();
    assert_eq!(err, StoreError::BlankTitle("column"));
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(store.board(board_id).unwrap().columns.len(), 1);
}
