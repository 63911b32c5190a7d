//! Watcher module tests.

mod line_test;
mod tracker_test;
