//! Integration tests for the live tracker.

use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use eqlog_tracker::combat::{Category, CombatEngine};
use eqlog_tracker::config::TailConfig;
use eqlog_tracker::queue::{BoundedQueue, OverflowPolicy};
use eqlog_tracker::watcher::Tracker;
use tempfile::TempDir;

fn from_start() -> TailConfig {
    TailConfig {
        poll_interval_ms: 10,
        from_start: true,
    }
}

fn append(path: &Path, line: &str) {
    let mut file = std::fs::OpenOptions::new().append(true).open(path).unwrap();
    writeln!(file, "{line}").unwrap();
}

fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    false
}

#[test]
fn tracker_from_start_reads_backlog_then_follows() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("eqlog_Shin_green.txt");
    std::fs::write(
        &path,
        "[Fri Mar 01 20:15:40 2024] Shin scores a critical hit! (40)\n",
    )
    .unwrap();

    let mut tracker = Tracker::new(&path, from_start()).unwrap();
    tracker.install_engine(CombatEngine::new("Shin")).unwrap();
    let categories = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&categories);
    tracker
        .subscribe_to_combat_event(move |e| sink.lock().unwrap().push(e.category))
        .unwrap();
    tracker.start().unwrap();
    assert!(!tracker.is_live());

    append(
        &path,
        "[Fri Mar 01 20:15:41 2024] You pierce an orc pawn for 40 points of damage.",
    );
    assert!(wait_for(|| categories.lock().unwrap().len() == 1));
    tracker.stop();

    assert_eq!(*categories.lock().unwrap(), vec![Category::MeleeCritOut]);
    // Timestamps are in the past, so the tracker never caught up to "now".
    assert!(!tracker.is_live());
}

#[test]
fn tracker_feeds_bounded_queue() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("eqlog_Shin_green.txt");
    std::fs::write(&path, "").unwrap();

    let mut tracker = Tracker::new(&path, from_start()).unwrap();
    tracker.install_engine(CombatEngine::new("Shin")).unwrap();
    let queue = BoundedQueue::new(2, OverflowPolicy::DropOldest);
    let sink = queue.clone();
    tracker
        .subscribe_to_combat_event(move |e| {
            let _ = sink.push(e.value());
        })
        .unwrap();
    tracker.start().unwrap();

    for value in [1, 2, 3] {
        append(
            &path,
            &format!("[Fri Mar 01 20:15:41 2024] You pierce an orc pawn for {value} points of damage."),
        );
    }
    assert!(wait_for(|| {
        tracker
            .with_engine(|e| e.stats().events == 3)
            .unwrap_or(false)
    }));
    tracker.stop();
    queue.close();

    assert_eq!(queue.dropped(), 1);
    assert_eq!(queue.drain(10), vec![Some(2), Some(3)]);
}
