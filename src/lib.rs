//! EQ Log Tracker - Tail, classify and aggregate EverQuest combat logs.

pub mod combat;
pub mod config;
pub mod display;
pub mod dps;
pub mod loot;
pub mod queue;
pub mod reporter;
pub mod watcher;
