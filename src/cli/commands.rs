//! Command implementations for the forumstore CLI.

use crate::{
    cli::utils::{format_timestamp, render_board_tree},
    forum::ForumStorage,
    Result,
};
use tracing::info;

/// Execute boards command
pub fn boards(storage: &ForumStorage) -> Result<()> {
    let boards = storage.all_boards()?;
    info!(top_level = boards.len(), "Listing boards");

    if boards.is_empty() {
        println!("No boards");
        return Ok(());
    }
    for line in render_board_tree(&boards) {
        println!("{}", line);
    }
    Ok(())
}

/// Execute board command
pub fn board(storage: &ForumStorage, id: &str) -> Result<()> {
    let summary = storage.find_board(id)?;
    let board = &summary.board;

    println!("{} [{}]", board.name, board.id);
    if let Some(description) = &board.description {
        println!("  {}", description);
    }
    println!("  parent:   {}", board.parent_id.as_deref().unwrap_or("-"));
    println!("  category: {}", board.category_id.map_or("-".to_string(), |c| c.to_string()));
    println!("  created:  {}", format_timestamp(board.created_at));
    println!(
        "  threads:  {} (total {})",
        summary.thread_count, summary.total_thread_count
    );
    println!(
        "  posts:    {} (total {})",
        summary.post_count, summary.total_post_count
    );
    if let (Some(title), Some(thread_id)) = (&summary.last_thread_title, &summary.last_thread_id) {
        println!("  last thread: {} [{}]", title, thread_id);
    }
    if let Some(username) = &summary.last_post_username {
        println!("  last poster: {}", username);
    }
    for child in &summary.children {
        println!("  child: {} [{}]", child.board.name, child.board.id);
    }
    Ok(())
}

/// Execute threads command
pub fn threads(
    storage: &ForumStorage,
    board_id: &str,
    limit: Option<usize>,
    page: Option<i64>,
) -> Result<()> {
    let request = storage.page_request(limit, page);
    let threads = storage.threads_by_board(board_id, request)?;

    info!(
        board_id,
        limit = request.limit,
        page = request.page,
        found = threads.len(),
        "Listing threads"
    );

    for summary in threads {
        println!(
            "{} {} by {} posts {} views {}{}",
            summary.thread.id,
            summary.title.as_deref().unwrap_or("(untitled)"),
            summary.username.as_deref().unwrap_or("?"),
            summary.post_count,
            summary.view_count,
            if summary.thread.deleted { " (deleted)" } else { "" },
        );
    }
    Ok(())
}

/// Execute posts command
pub fn posts(
    storage: &ForumStorage,
    thread_id: &str,
    limit: Option<usize>,
    page: Option<i64>,
) -> Result<()> {
    let request = storage.page_request(limit, page);
    let posts = storage.posts_by_thread(thread_id, request)?;

    info!(thread_id, found = posts.len(), "Listing posts");

    for post in posts {
        println!(
            "{} {} {} by {}{}",
            post.id,
            format_timestamp(post.created_at),
            post.title,
            post.username.as_deref().unwrap_or(&post.user_id),
            if post.deleted { " (deleted)" } else { "" },
        );
    }
    Ok(())
}

/// Execute categories command
pub fn categories(storage: &ForumStorage) -> Result<()> {
    let categories = storage.all_categories()?;
    if categories.is_empty() {
        println!("No categories");
    }
    for category in categories {
        println!("{}. {}", category.id, category.name);
        for board_id in &category.board_ids {
            match storage.find_board(board_id) {
                Ok(summary) => println!("   {} [{}]", summary.board.name, board_id),
                Err(e) if e.is_not_found() => println!("   (missing) [{}]", board_id),
                Err(e) => return Err(e),
            }
        }
    }
    Ok(())
}

/// Execute stats command
pub fn stats(storage: &ForumStorage) -> Result<()> {
    println!("{}", storage.stats());
    Ok(())
}
