//! Command-line interface for forumstore.
//!
//! A read-only inspector over a data directory: board trees, thread and post
//! pages, categories and RocksDB statistics.

pub mod args;
pub mod commands;
pub mod utils;

use crate::Result;
use std::process;

pub use args::{Command, Invocation};
pub use utils::*;

/// Main entry point for the CLI application
pub fn run() -> Result<()> {
    let Invocation { data_dir, command } = match args::parse_args() {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("Error parsing arguments: {}", e);
            args::print_usage();
            process::exit(1);
        }
    };

    if command == Command::Help {
        args::print_usage();
        return Ok(());
    }

    let storage = open_storage(resolve_data_dir(data_dir))?;

    match command {
        Command::Boards => commands::boards(&storage),
        Command::Board { id } => commands::board(&storage, &id),
        Command::Threads {
            board_id,
            limit,
            page,
        } => commands::threads(&storage, &board_id, limit, page),
        Command::Posts {
            thread_id,
            limit,
            page,
        } => commands::posts(&storage, &thread_id, limit, page),
        Command::Categories => commands::categories(&storage),
        Command::Stats => commands::stats(&storage),
        Command::Help => Ok(()),
    }
}
