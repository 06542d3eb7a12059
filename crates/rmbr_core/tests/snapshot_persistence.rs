use rmbr_core::db::{open_db, open_db_in_memory};
use rmbr_core::{
    ErrorKind, InMemorySnapshotRepository, Page, PageContent, PagePatch, PersistPolicy,
    RepoError, ServiceError, SessionConfig, SnapshotRepository, SqliteSnapshotRepository,
    WorkspaceService, WorkspaceSnapshot, WorkspaceStore,
};
use serde_json::json;

#[test]
fn sqlite_repository_round_trips_full_workspace() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSnapshotRepository::try_new(&conn).unwrap();
    assert!(repo.load().unwrap().is_none());

    let mut store = WorkspaceStore::new();
    let root = store.create_page(None).unwrap().id;
    let child = store.create_page(Some(root)).unwrap().id;
    store
        .update_page_content(child, PageContent::from_value(json!([{ "type": "paragraph" }])))
        .unwrap();
    store.add_comment(child, "remark", "paragraph").unwrap();
    let board_id = store.create_board(root).unwrap().id;

    repo.save(&store.to_snapshot()).unwrap();
    let loaded = repo.load().unwrap().unwrap();
    assert_eq!(loaded, store.to_snapshot());

    let restored = WorkspaceStore::from_snapshot(loaded).unwrap();
    assert_eq!(restored.page(child).unwrap().parent_id, Some(root));
    assert_eq!(restored.board_for_page(root).unwrap().id, board_id);
    assert_eq!(restored.page(child).unwrap().comments.len(), 1);
    assert_eq!(restored.active_page_id(), None);
}

#[test]
fn save_overwrites_previous_snapshot() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSnapshotRepository::try_new(&conn).unwrap();

    let mut store = WorkspaceStore::new();
    store.create_page(None).unwrap();
    repo.save(&store.to_snapshot()).unwrap();
    store.create_page(None).unwrap();
    repo.save(&store.to_snapshot()).unwrap();

    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM kv_store;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
    assert_eq!(repo.load().unwrap().unwrap().pages.len(), 2);
}

#[test]
fn separate_keys_hold_separate_workspaces() {
    let conn = open_db_in_memory().unwrap();
    let work = SqliteSnapshotRepository::try_with_key(&conn, "work").unwrap();
    let home = SqliteSnapshotRepository::try_with_key(&conn, "home").unwrap();

    let mut store = WorkspaceStore::new();
    store.create_page(None).unwrap();
    work.save(&store.to_snapshot()).unwrap();

    assert!(home.load().unwrap().is_none());
    assert_eq!(work.key(), "work");
    work.clear().unwrap();
    assert!(work.load().unwrap().is_none());
}

#[test]
fn corrupt_snapshot_value_is_reported() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSnapshotRepository::try_new(&conn).unwrap();
    conn.execute(
        "INSERT INTO kv_store (key, value) VALUES (?1, '{not json');",
        [repo.key()],
    )
    .unwrap();

    let err = repo.load().unwrap_err();
    assert!(matches!(err, RepoError::Serialization(_)));
}

#[test]
fn session_persists_every_mutation_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rmbr.db");

    let (root, child) = {
        let conn = open_db(&path).unwrap();
        let repo = SqliteSnapshotRepository::try_new(&conn).unwrap();
        let mut service = WorkspaceService::open(repo, SessionConfig::default()).unwrap();

        let root = service.create_page(None).unwrap();
        let child = service.create_page(Some(root)).unwrap();
        service
            .update_page(root, PagePatch::title("Journal"))
            .unwrap();
        service.toggle_favorite(child).unwrap();
        service.create_board(child).unwrap();
        service.add_comment(root, "first", "Journal").unwrap();
        assert!(!service.is_dirty());
        (root, child)
    };

    let conn = open_db(&path).unwrap();
    let repo = SqliteSnapshotRepository::try_new(&conn).unwrap();
    let service = WorkspaceService::open(repo, SessionConfig::default()).unwrap();
    let store = service.store();

    assert_eq!(store.page(root).unwrap().title, "Journal");
    assert_eq!(store.page(root).unwrap().children, vec![child]);
    assert!(store.page(child).unwrap().is_favorite);
    assert!(store.board_for_page(child).is_some());
    assert_eq!(store.comments(root).unwrap().len(), 1);
    store.validate().unwrap();
}

#[test]
fn cascading_delete_is_persisted() {
    let repo = InMemorySnapshotRepository::new();
    let mut service = WorkspaceService::open(&repo, SessionConfig::default()).unwrap();
    let root = service.create_page(None).unwrap();
    let child = service.create_page(Some(root)).unwrap();
    service.create_board(child).unwrap();

    service.delete_page(root).unwrap();

    let snapshot = repo.load().unwrap().unwrap();
    assert!(snapshot.pages.is_empty());
    assert!(snapshot.boards.is_empty());
    assert!(snapshot.root_order.is_empty());
}

#[test]
fn manual_policy_keeps_unflushed_changes_out_of_repository() {
    let repo = InMemorySnapshotRepository::new();
    let config = SessionConfig {
        persist_policy: PersistPolicy::Manual,
    };
    let mut service = WorkspaceService::open(&repo, config).unwrap();
    service.create_page(None).unwrap();
    assert!(repo.load().unwrap().is_none());

    service.flush().unwrap();
    assert_eq!(repo.load().unwrap().unwrap().pages.len(), 1);
}

#[test]
fn clear_all_wipes_store_and_repository() {
    let repo = InMemorySnapshotRepository::new();
    let mut service = WorkspaceService::open(&repo, SessionConfig::default()).unwrap();
    let page = service.create_page(None).unwrap();
    service.create_board(page).unwrap();

    service.clear_all().unwrap();

    assert_eq!(service.store().page_count(), 0);
    assert_eq!(service.store().board_count(), 0);
    assert!(repo.load().unwrap().is_none());
    drop(service);

    let reopened = WorkspaceService::open(&repo, SessionConfig::default()).unwrap();
    assert_eq!(reopened.store().page_count(), 0);
}

#[test]
fn opening_inconsistent_snapshot_fails_with_invalid_argument() {
    let repo = InMemorySnapshotRepository::new();
    let orphan = Page::new(Some(uuid::Uuid::new_v4()), 0);
    let mut snapshot = WorkspaceSnapshot::default();
    snapshot.pages.insert(orphan.id, orphan);
    repo.save(&snapshot).unwrap();

    let err = WorkspaceService::open(&repo, SessionConfig::default())
        .err()
        .unwrap();
    match err {
        ServiceError::Store(store_err) => {
            assert_eq!(store_err.kind(), ErrorKind::InvalidArgument)
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn snapshot_json_uses_camel_case_shape() {
    let mut store = WorkspaceStore::new();
    let root = store.create_page(None).unwrap().id;
    let child = store.create_page(Some(root)).unwrap().id;
    store.create_board(child).unwrap();

    let value = serde_json::to_value(store.to_snapshot()).unwrap();
    let child_json = &value["pages"][child.to_string()];
    assert_eq!(child_json["parentId"], json!(root.to_string()));
    assert_eq!(child_json["isFavorite"], json!(false));
    assert!(value["boards"]
        .as_object()
        .unwrap()
        .values()
        .all(|board| board["pageId"] == json!(child.to_string())));
    assert!(value["rootOrder"].is_array());
}
