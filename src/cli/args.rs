//! Command-line argument parsing for forumstore.

use crate::error::{ForumError, Result};
use std::env;
use std::path::PathBuf;

/// Command-line interface commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print every top-level board with its children.
    Boards,
    Board {
        id: String,
    },
    Threads {
        board_id: String,
        limit: Option<usize>,
        page: Option<i64>,
    },
    Posts {
        thread_id: String,
        limit: Option<usize>,
        page: Option<i64>,
    },
    Categories,
    Stats,
    Help,
}

/// A parsed invocation: the data directory override plus the command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub data_dir: Option<PathBuf>,
    pub command: Command,
}

/// Parse the process arguments into an invocation
pub fn parse_args() -> Result<Invocation> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_from(&args)
}

fn parse_number<T: std::str::FromStr>(value: Option<&String>, what: &str) -> Result<Option<T>> {
    match value {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ForumError::invalid_input(format!("Invalid {} '{}'", what, raw))),
    }
}

/// Parse arguments (without the program name) into an invocation
pub fn parse_from(args: &[String]) -> Result<Invocation> {
    let mut data_dir = None;
    let mut rest = args;

    if let Some(first) = rest.first() {
        if first == "--data-dir" {
            let dir = rest
                .get(1)
                .ok_or_else(|| ForumError::invalid_input("--data-dir requires a path"))?;
            data_dir = Some(PathBuf::from(dir));
            rest = &rest[2..];
        }
    }

    let Some(name) = rest.first() else {
        return Ok(Invocation {
            data_dir,
            command: Command::Help,
        });
    };

    let command = match name.as_str() {
        "boards" => Command::Boards,

        "board" => {
            let id = rest
                .get(1)
                .ok_or_else(|| ForumError::invalid_input("board requires a board id"))?;
            Command::Board { id: id.clone() }
        }

        "threads" => {
            let board_id = rest
                .get(1)
                .ok_or_else(|| ForumError::invalid_input("threads requires a board id"))?;
            Command::Threads {
                board_id: board_id.clone(),
                limit: parse_number(rest.get(2), "limit")?,
                page: parse_number(rest.get(3), "page")?,
            }
        }

        "posts" => {
            let thread_id = rest
                .get(1)
                .ok_or_else(|| ForumError::invalid_input("posts requires a thread id"))?;
            Command::Posts {
                thread_id: thread_id.clone(),
                limit: parse_number(rest.get(2), "limit")?,
                page: parse_number(rest.get(3), "page")?,
            }
        }

        "categories" => Command::Categories,
        "stats" => Command::Stats,
        "help" | "--help" | "-h" => Command::Help,

        other => {
            return Err(ForumError::invalid_input(format!(
                "Unknown command '{}'",
                other
            )))
        }
    };

    Ok(Invocation { data_dir, command })
}

/// Print usage information
pub fn print_usage() {
    println!("forumstore - forum storage inspector");
    println!("====================================");
    println!();
    println!("Usage: forumstore [--data-dir <dir>] <command> [args...]");
    println!();
    println!("Commands:");
    println!("  boards                              Print the board tree with counters");
    println!("  board <id>                          Show one board");
    println!("  threads <board_id> [limit] [page]   List a page of a board's threads");
    println!("  posts <thread_id> [limit] [page]    List a page of a thread's posts");
    println!("  categories                          List categories and their boards");
    println!("  stats                               Print RocksDB statistics");
    println!();
    println!("The data directory defaults to $FORUMSTORE_DATA_DIR, then ./forum_data.");
    println!();
    println!("Examples:");
    println!("  forumstore boards");
    println!("  forumstore --data-dir /var/lib/forum threads 018c2f1e4a00000000017f3a9b2c 20 2");
}
