//! Utility functions for CLI operations.

use crate::forum::{BoardSummary, ForumConfig, ForumStorage};
use crate::Result;
use std::env;
use std::path::PathBuf;
use std::time::{Duration, UNIX_EPOCH};

/// Environment variable naming the data directory.
pub const DATA_DIR_ENV: &str = "FORUMSTORE_DATA_DIR";

/// Resolve the data directory: explicit flag, then environment, then the default
pub fn resolve_data_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| env::var(DATA_DIR_ENV).ok().map(PathBuf::from))
        .unwrap_or_else(|| ForumConfig::default().data_dir)
}

/// Open storage in the given directory
pub fn open_storage(data_dir: PathBuf) -> Result<ForumStorage> {
    ForumStorage::open(ForumConfig::new(data_dir))
}

/// Format a millisecond timestamp for display
pub fn format_timestamp(millis: u64) -> String {
    let datetime = UNIX_EPOCH + Duration::from_millis(millis);
    format!("{:?}", datetime)
}

/// Render a board tree, one line per board, children indented
pub fn render_board_tree(boards: &[BoardSummary]) -> Vec<String> {
    let mut lines = Vec::new();
    for board in boards {
        push_board(board, 0, &mut lines);
    }
    lines
}

fn push_board(summary: &BoardSummary, depth: usize, lines: &mut Vec<String>) {
    let board = &summary.board;
    let mut line = format!(
        "{}{} [{}] threads {}/{} posts {}/{}",
        "  ".repeat(depth),
        board.name,
        board.id,
        summary.thread_count,
        summary.total_thread_count,
        summary.post_count,
        summary.total_post_count,
    );
    if board.deleted {
        line.push_str(" (deleted)");
    }
    lines.push(line);

    for child in &summary.children {
        push_board(child, depth + 1, lines);
    }
}
