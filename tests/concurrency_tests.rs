//! Concurrency tests for forum storage
//!
//! Many threads hammer the same counters, parents and indexes through one
//! shared `ForumStorage`; every update must be accounted for afterwards.

use forumstore::forum::{
    BoardUpdate, ForumStorage, NewBoard, NewCategory, NewPost, NewThread, PageRequest,
};
use std::collections::HashSet;
use std::thread;
use tempfile::TempDir;

const WORKERS: usize = 8;

fn create_storage() -> (ForumStorage, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let storage = ForumStorage::new(temp_dir.path()).expect("Failed to open storage");
    (storage, temp_dir)
}

/// Concurrent post counter increments lose no updates
#[test]
fn test_concurrent_post_counts() {
    let (storage, _temp) = create_storage();
    let root = storage.create_board(NewBoard::new("Root")).unwrap();
    let leaf = storage
        .create_board(NewBoard::new("Leaf").with_parent(&root.id))
        .unwrap();

    const PER_WORKER: u64 = 25;
    let handles: Vec<_> = (0..WORKERS)
        .map(|_| {
            let storage = storage.clone();
            let leaf_id = leaf.id.clone();
            thread::spawn(move || {
                for _ in 0..PER_WORKER {
                    storage.inc_post_count(&leaf_id).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("Worker panicked");
    }

    let expected = WORKERS as u64 * PER_WORKER;
    assert_eq!(storage.find_board(&leaf.id).unwrap().post_count, expected);
    assert_eq!(storage.find_board(&leaf.id).unwrap().total_post_count, expected);
    assert_eq!(storage.find_board(&root.id).unwrap().total_post_count, expected);
}

/// Concurrent post creation in one thread keeps counts, ranks and first-post fields straight
#[test]
fn test_concurrent_post_creation() {
    let (storage, _temp) = create_storage();
    let board = storage.create_board(NewBoard::new("Board")).unwrap();
    let thread_record = storage.create_thread(NewThread::new(&board.id)).unwrap();

    const PER_WORKER: usize = 10;
    let handles: Vec<_> = (0..WORKERS)
        .map(|worker| {
            let storage = storage.clone();
            let thread_id = thread_record.id.clone();
            thread::spawn(move || {
                for n in 0..PER_WORKER {
                    storage
                        .create_post(NewPost::new(
                            &thread_id,
                            format!("w{} p{}", worker, n),
                            "body",
                            format!("user-{}", worker),
                        ))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("Worker panicked");
    }

    let total = WORKERS * PER_WORKER;
    let summary = storage.find_thread(&thread_record.id).unwrap();
    assert_eq!(summary.post_count, total as u64);
    assert!(summary.first_post_id.is_some());
    assert_eq!(storage.find_board(&board.id).unwrap().post_count, total as u64);

    let listed = storage
        .posts_by_thread(&thread_record.id, PageRequest::new(total, 1))
        .unwrap();
    let unique: HashSet<String> = listed.into_iter().map(|p| p.id).collect();
    assert_eq!(unique.len(), total);
}

/// Concurrent thread creation hands out every rank exactly once
#[test]
fn test_concurrent_thread_creation() {
    let (storage, _temp) = create_storage();
    let board = storage.create_board(NewBoard::new("Board")).unwrap();

    const PER_WORKER: usize = 5;
    let handles: Vec<_> = (0..WORKERS)
        .map(|_| {
            let storage = storage.clone();
            let board_id = board.id.clone();
            thread::spawn(move || {
                for _ in 0..PER_WORKER {
                    storage.create_thread(NewThread::new(&board_id)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("Worker panicked");
    }

    let total = WORKERS * PER_WORKER;
    assert_eq!(
        storage.find_board(&board.id).unwrap().thread_count,
        total as u64
    );
    let listed = storage
        .threads_by_board(&board.id, PageRequest::new(total + 10, 1))
        .unwrap();
    assert_eq!(listed.len(), total);
}

/// Concurrent child creation under one parent keeps every child
#[test]
fn test_concurrent_child_boards() {
    let (storage, _temp) = create_storage();
    let parent = storage.create_board(NewBoard::new("Parent")).unwrap();

    let handles: Vec<_> = (0..WORKERS)
        .map(|worker| {
            let storage = storage.clone();
            let parent_id = parent.id.clone();
            thread::spawn(move || {
                storage
                    .create_board(NewBoard::new(format!("Child {}", worker)).with_parent(parent_id))
                    .unwrap()
                    .id
            })
        })
        .collect();
    let child_ids: HashSet<String> = handles
        .into_iter()
        .map(|h| h.join().expect("Worker panicked"))
        .collect();

    let summary = storage.find_board(&parent.id).unwrap();
    let stored: HashSet<String> = summary.board.children().iter().cloned().collect();
    assert_eq!(stored, child_ids);
    assert_eq!(summary.children.len(), WORKERS);
}

/// Views counted from many threads all land
#[test]
fn test_concurrent_view_counts() {
    let (storage, _temp) = create_storage();
    let board = storage.create_board(NewBoard::new("Board")).unwrap();
    let thread_record = storage.create_thread(NewThread::new(&board.id)).unwrap();

    const PER_WORKER: u64 = 20;
    let handles: Vec<_> = (0..WORKERS)
        .map(|_| {
            let storage = storage.clone();
            let thread_id = thread_record.id.clone();
            thread::spawn(move || {
                for _ in 0..PER_WORKER {
                    storage.inc_view_count(&thread_id).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("Worker panicked");
    }

    assert_eq!(
        storage.find_thread(&thread_record.id).unwrap().view_count,
        WORKERS as u64 * PER_WORKER
    );
}

/// Category reorders racing with board renames keep both changes
#[test]
fn test_category_reorder_with_concurrent_updates() {
    let (storage, _temp) = create_storage();
    let boards: Vec<String> = (0..4)
        .map(|i| {
            storage
                .create_board(NewBoard::new(format!("Board {}", i)))
                .unwrap()
                .id
        })
        .collect();

    let reorder = {
        let storage = storage.clone();
        let boards = boards.clone();
        thread::spawn(move || {
            for _ in 0..10 {
                storage
                    .update_categories(vec![NewCategory::new("All", boards.iter())])
                    .unwrap();
            }
        })
    };
    let rename = {
        let storage = storage.clone();
        let boards = boards.clone();
        thread::spawn(move || {
            for (i, id) in boards.iter().enumerate() {
                storage
                    .update_board(id, BoardUpdate::name(format!("Renamed {}", i)))
                    .unwrap();
            }
        })
    };
    reorder.join().expect("Reorder panicked");
    rename.join().expect("Rename panicked");

    for (i, id) in boards.iter().enumerate() {
        let board = storage.find_board(id).unwrap().board;
        assert_eq!(board.name, format!("Renamed {}", i));
        assert_eq!(board.category_id, Some(1));
    }
}

/// A purge racing a child create never leaves the child under a purged parent
#[test]
fn test_purge_racing_child_create() {
    let (storage, _temp) = create_storage();
    let mut children = Vec::new();

    for round in 0..20 {
        let parent = storage
            .create_board(NewBoard::new(format!("Parent {}", round)))
            .unwrap();

        let create = {
            let storage = storage.clone();
            let parent_id = parent.id.clone();
            thread::spawn(move || {
                storage.create_board(NewBoard::new("Child").with_parent(parent_id))
            })
        };
        let purge = {
            let storage = storage.clone();
            let parent_id = parent.id.clone();
            thread::spawn(move || storage.purge_board(&parent_id))
        };
        let created = create.join().expect("Create panicked");
        let purged = purge.join().expect("Purge panicked");

        match (created, purged) {
            (Ok(child), Err(e)) => {
                assert!(e.is_precondition_failed());
                let summary = storage.find_board(&parent.id).unwrap();
                assert_eq!(summary.board.children(), &[child.id.clone()]);
                children.push(child.id);
            }
            (Err(e), Ok(_)) => {
                assert!(e.is_not_found());
                assert!(storage.find_board(&parent.id).unwrap_err().is_not_found());
            }
            (created, purged) => panic!(
                "Exactly one of create and purge must succeed: {:?} / {:?}",
                created.map(|b| b.id),
                purged.map(|b| b.id)
            ),
        }
    }

    for child_id in children {
        let child = storage.find_board(&child_id).unwrap().board;
        let parent_id = child.parent_id.expect("Child lost its parent");
        assert!(storage.find_board(&parent_id).is_ok());
    }
}
