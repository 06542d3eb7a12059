//! Workspace inspection CLI.
//!
//! # Responsibility
//! - Verify `rmbr_core` linkage with a deterministic probe.
//! - Print the page tree stored in a workspace database.
//!
//! Usage: `rmbr_cli [DB_PATH] [LOG_DIR]`

use rmbr_core::db::open_db;
use rmbr_core::{
    default_log_level, init_logging, PageId, SessionConfig, SqliteSnapshotRepository,
    WorkspaceService, WorkspaceStore,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("rmbr_core ping={}", rmbr_core::ping());
    println!("rmbr_core version={}", rmbr_core::core_version());

    let mut args = std::env::args().skip(1);
    let Some(db_path) = args.next() else {
        return ExitCode::SUCCESS;
    };
    if let Some(log_dir) = args.next() {
        let log_dir = resolve_log_dir(&log_dir);
        if let Err(err) = init_logging(default_log_level(), &log_dir.to_string_lossy()) {
            eprintln!("logging disabled: {err}");
        }
    }

    match print_workspace(&db_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("event=cli_inspect module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Anchors a relative `LOG_DIR` at the current directory.
fn resolve_log_dir(raw: &str) -> PathBuf {
    let path = Path::new(raw.trim());
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

fn print_workspace(db_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let conn = open_db(db_path)?;
    let repo = SqliteSnapshotRepository::try_new(&conn)?;
    let service = WorkspaceService::open(repo, SessionConfig::default())?;
    let store = service.store();

    println!(
        "pages={} boards={}",
        store.page_count(),
        store.board_count()
    );
    for root in store.root_pages() {
        print_subtree(store, root.id, 0);
    }
    Ok(())
}

fn print_subtree(store: &WorkspaceStore, page_id: PageId, depth: usize) {
    let Some(page) = store.page(page_id) else {
        return;
    };
    let icon = page.icon.as_deref().unwrap_or("-");
    let board = if store.board_for_page(page_id).is_some() {
        " [board]"
    } else {
        ""
    };
    println!(
        "{}{} {} ({} comments){}",
        "  ".repeat(depth),
        icon,
        page.display_title(),
        page.comments.len(),
        board
    );
    for child_id in &page.children {
        print_subtree(store, *child_id, depth + 1);
    }
}
