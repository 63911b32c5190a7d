//! Log tracker: poll loop plus the subscription hub.
//!
//! A single background thread tails the log and invokes every subscriber
//! synchronously, in registration order. The hub lock is held while a batch
//! of lines is dispatched, so subscribers must not call back into the
//! tracker.

use std::path::{Path, PathBuf};
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};

use crate::combat::{CombatEngine, CombatEvent};
use crate::config::TailConfig;
use crate::loot::CurrencyEvent;

use super::error::TrackerError;
use super::line::parse_line;
use super::path::player_name;
use super::tailer::LogTailer;

/// Callback receiving `(timestamp, raw line)` for every stamped line.
pub type LineSubscriber = Box<dyn FnMut(NaiveDateTime, &str) + Send>;

/// Callback receiving `(timestamp, zone name)` on zone change.
pub type ZoneSubscriber = Box<dyn FnMut(NaiveDateTime, &str) + Send>;

struct Hub {
    line_subscribers: Vec<LineSubscriber>,
    zone_subscribers: Vec<ZoneSubscriber>,
    engine: Option<CombatEngine>,
    live: bool,
    started_at: NaiveDateTime,
}

impl Hub {
    fn dispatch(&mut self, raw: &str) {
        let Some(line) = parse_line(raw) else {
            tracing::trace!(line = %raw, "Ignoring line without timestamp");
            return;
        };

        if !self.live && line.timestamp > self.started_at {
            self.live = true;
            tracing::info!(at = %line.timestamp, "Caught up with live log");
        }

        for subscriber in &mut self.line_subscribers {
            subscriber(line.timestamp, raw);
        }
        if let Some(engine) = self.engine.as_mut() {
            engine.process(line.timestamp, line.message);
        }

        if let Some(zone) = line.zone {
            tracing::info!(zone = %zone, "Zone changed");
            for subscriber in &mut self.zone_subscribers {
                subscriber(line.timestamp, zone);
            }
            if let Some(engine) = self.engine.as_mut() {
                engine.on_zone(line.timestamp, zone);
            }
        }
    }
}

struct Worker {
    stop_tx: std_mpsc::Sender<()>,
    handle: thread::JoinHandle<()>,
}

/// Tails one log file and fans its lines out to subscribers.
pub struct Tracker {
    path: PathBuf,
    player: String,
    config: TailConfig,
    hub: Arc<Mutex<Hub>>,
    worker: Option<Worker>,
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("path", &self.path)
            .field("player", &self.player)
            .field("config", &self.config)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

fn lock(hub: &Mutex<Hub>) -> MutexGuard<'_, Hub> {
    hub.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Tracker {
    /// Create a tracker for `path`. Nothing is read until [`start`](Self::start).
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::InvalidLogPath` if the file name does not
    /// follow the `eqlog_<Name>_...` convention.
    pub fn new(path: impl Into<PathBuf>, config: TailConfig) -> Result<Self, TrackerError> {
        let path = path.into();
        let player = player_name(&path)?;
        Ok(Self {
            path,
            player,
            config,
            hub: Arc::new(Mutex::new(Hub {
                line_subscribers: Vec::new(),
                zone_subscribers: Vec::new(),
                engine: None,
                live: false,
                started_at: Local::now().naive_local(),
            })),
            worker: None,
        })
    }

    /// Start the background tail.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::AlreadyInitialized` if already running and
    /// `TrackerError::InvalidLogPath` if the file does not exist.
    pub fn start(&mut self) -> Result<(), TrackerError> {
        if self.worker.is_some() {
            return Err(TrackerError::AlreadyInitialized("tail"));
        }
        if !self.path.is_file() {
            return Err(TrackerError::InvalidLogPath {
                path: self.path.clone(),
                reason: "file does not exist",
            });
        }

        let tailer = if self.config.from_start {
            LogTailer::new(self.path.clone())
        } else {
            LogTailer::at_end(self.path.clone())?
        };

        {
            let mut hub = lock(&self.hub);
            hub.started_at = Local::now().naive_local();
            hub.live = !self.config.from_start;
        }

        let (stop_tx, stop_rx) = std_mpsc::channel();
        let hub = Arc::clone(&self.hub);
        let interval = self.config.poll_interval();
        let handle = thread::Builder::new()
            .name("eqlog-tail".to_string())
            .spawn(move || Self::run(tailer, &hub, &stop_rx, interval))?;

        tracing::info!(
            path = %self.path.display(),
            player = %self.player,
            from_start = self.config.from_start,
            "Tracking log"
        );
        self.worker = Some(Worker { stop_tx, handle });
        Ok(())
    }

    fn run(
        mut tailer: LogTailer,
        hub: &Mutex<Hub>,
        stop_rx: &std_mpsc::Receiver<()>,
        interval: Duration,
    ) {
        loop {
            match tailer.read_new_lines() {
                Ok(lines) if !lines.is_empty() => {
                    let mut hub = lock(hub);
                    for line in &lines {
                        hub.dispatch(line);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        path = %tailer.path().display(),
                        error = %e,
                        "Log read failed, retrying"
                    );
                }
            }

            match stop_rx.recv_timeout(interval) {
                Err(std_mpsc::RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(std_mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }
        tracing::debug!(path = %tailer.path().display(), "Tail stopped");
    }

    /// Stop the background tail and wait for it to exit. Subscribers are kept.
    pub fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
            if worker.handle.join().is_err() {
                tracing::warn!(path = %self.path.display(), "Tail thread panicked");
            }
        }
    }

    /// Point the tracker at another log file.
    ///
    /// The running tail (if any) is stopped before the new one starts, so
    /// two tails never run at once. Subscribers and the combat engine are
    /// kept; the engine switches to the new player name.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::InvalidLogPath` if the new path is invalid or
    /// missing. The current tail keeps running in that case.
    pub fn set_path(&mut self, path: impl Into<PathBuf>) -> Result<(), TrackerError> {
        let path = path.into();
        let player = player_name(&path)?;
        if !path.is_file() {
            return Err(TrackerError::InvalidLogPath {
                path,
                reason: "file does not exist",
            });
        }

        self.stop();
        if let Some(engine) = lock(&self.hub).engine.as_mut() {
            engine.set_player(player.clone());
        }
        self.path = path;
        self.player = player;
        self.start()
    }

    pub fn subscribe_to_line<F>(&self, subscriber: F)
    where
        F: FnMut(NaiveDateTime, &str) + Send + 'static,
    {
        lock(&self.hub).line_subscribers.push(Box::new(subscriber));
    }

    pub fn subscribe_to_zone_change<F>(&self, subscriber: F)
    where
        F: FnMut(NaiveDateTime, &str) + Send + 'static,
    {
        lock(&self.hub).zone_subscribers.push(Box::new(subscriber));
    }

    /// Attach the combat engine that classifies each line.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::AlreadyInitialized` if an engine is attached.
    pub fn install_engine(&self, engine: CombatEngine) -> Result<(), TrackerError> {
        let mut hub = lock(&self.hub);
        if hub.engine.is_some() {
            return Err(TrackerError::AlreadyInitialized("combat engine"));
        }
        hub.engine = Some(engine);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `TrackerError::SubscriptionOnUninitialized` if no engine is attached.
    pub fn subscribe_to_combat_event<F>(&self, subscriber: F) -> Result<(), TrackerError>
    where
        F: FnMut(&CombatEvent) + Send + 'static,
    {
        let mut hub = lock(&self.hub);
        let engine = hub
            .engine
            .as_mut()
            .ok_or(TrackerError::SubscriptionOnUninitialized("combat engine"))?;
        engine.subscribe_to_combat_event(subscriber);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `TrackerError::SubscriptionOnUninitialized` if no engine is attached.
    pub fn subscribe_to_currency<F>(&self, subscriber: F) -> Result<(), TrackerError>
    where
        F: FnMut(&CurrencyEvent) + Send + 'static,
    {
        let mut hub = lock(&self.hub);
        let engine = hub
            .engine
            .as_mut()
            .ok_or(TrackerError::SubscriptionOnUninitialized("combat engine"))?;
        engine.subscribe_to_currency(subscriber);
        Ok(())
    }

    /// Run `f` against the attached engine, e.g. to snapshot battles or totals.
    pub fn with_engine<R>(&self, f: impl FnOnce(&CombatEngine) -> R) -> Option<R> {
        lock(&self.hub).engine.as_ref().map(f)
    }

    #[must_use]
    pub fn player_name(&self) -> &str {
        &self.player
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Whether dispatched lines are current: tailing from the end, or a
    /// from-start read has reached lines stamped after the tracker started.
    #[must_use]
    pub fn is_live(&self) -> bool {
        lock(&self.hub).live
    }
}

impl Drop for Tracker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Instant;
    use tempfile::TempDir;

    const HIT: &str = "[Fri Mar 01 20:15:42 2024] You slash a gnoll for 25 points of damage.";

    fn fast() -> TailConfig {
        TailConfig {
            poll_interval_ms: 10,
            from_start: false,
        }
    }

    fn log_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
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
            thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn test_new_extracts_player() {
        let tracker = Tracker::new("/tmp/eqlog_Bob_green.txt", fast()).unwrap();
        assert_eq!(tracker.player_name(), "Bob");
        assert!(!tracker.is_running());
    }

    #[test]
    fn test_start_missing_file_fails() {
        let mut tracker = Tracker::new("/tmp/no-such-dir/eqlog_Bob_green.txt", fast()).unwrap();
        assert!(matches!(
            tracker.start(),
            Err(TrackerError::InvalidLogPath { .. })
        ));
    }

    #[test]
    fn test_start_twice_fails() {
        let dir = TempDir::new().unwrap();
        let path = log_file(&dir, "eqlog_Bob_green.txt", "");
        let mut tracker = Tracker::new(&path, fast()).unwrap();
        tracker.start().unwrap();
        assert!(matches!(
            tracker.start(),
            Err(TrackerError::AlreadyInitialized(_))
        ));
    }

    #[test]
    fn test_combat_subscription_requires_engine() {
        let tracker = Tracker::new("/tmp/eqlog_Bob_green.txt", fast()).unwrap();
        assert!(matches!(
            tracker.subscribe_to_combat_event(|_| {}),
            Err(TrackerError::SubscriptionOnUninitialized(_))
        ));
        tracker.install_engine(CombatEngine::new("Bob")).unwrap();
        assert!(tracker.subscribe_to_combat_event(|_| {}).is_ok());
        assert!(matches!(
            tracker.install_engine(CombatEngine::new("Bob")),
            Err(TrackerError::AlreadyInitialized(_))
        ));
    }

    #[test]
    fn test_only_appended_lines_delivered() {
        let dir = TempDir::new().unwrap();
        let path = log_file(&dir, "eqlog_Bob_green.txt", &format!("{HIT}\n"));
        let mut tracker = Tracker::new(&path, fast()).unwrap();

        let lines = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        tracker.subscribe_to_line(move |_, raw| sink.lock().unwrap().push(raw.to_string()));
        tracker.start().unwrap();
        assert!(tracker.is_live());

        append(&path, "no timestamp here");
        append(&path, "[Fri Mar 01 20:15:43 2024] Your spell fizzles!");

        assert!(wait_for(|| !lines.lock().unwrap().is_empty()));
        tracker.stop();
        assert_eq!(
            *lines.lock().unwrap(),
            vec!["[Fri Mar 01 20:15:43 2024] Your spell fizzles!".to_string()]
        );
    }

    #[test]
    fn test_zone_subscribers_and_engine() {
        let dir = TempDir::new().unwrap();
        let path = log_file(&dir, "eqlog_Bob_green.txt", "");
        let mut tracker = Tracker::new(&path, fast()).unwrap();
        tracker.install_engine(CombatEngine::new("Bob")).unwrap();

        let zones = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&zones);
        tracker.subscribe_to_zone_change(move |_, zone| sink.lock().unwrap().push(zone.to_string()));
        tracker.start().unwrap();

        append(&path, "[Fri Mar 01 20:15:40 2024] You have entered The Bazaar.");
        append(&path, HIT);

        assert!(wait_for(|| {
            tracker
                .with_engine(|e| e.stats().lines == 2)
                .unwrap_or(false)
        }));
        tracker.stop();

        assert_eq!(*zones.lock().unwrap(), vec!["The Bazaar".to_string()]);
        let zone = tracker.with_engine(|e| e.window().zone().map(str::to_string));
        assert_eq!(zone, Some(Some("The Bazaar".to_string())));
    }

    #[test]
    fn test_set_path_keeps_subscribers() {
        let dir = TempDir::new().unwrap();
        let first = log_file(&dir, "eqlog_Bob_green.txt", "");
        let second = log_file(&dir, "eqlog_Shin_green.txt", "");
        let mut tracker = Tracker::new(&first, fast()).unwrap();
        tracker.install_engine(CombatEngine::new("Bob")).unwrap();

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        tracker
            .subscribe_to_combat_event(move |e| sink.lock().unwrap().push(e.source.clone()))
            .unwrap();
        tracker.start().unwrap();

        tracker.set_path(&second).unwrap();
        assert_eq!(tracker.player_name(), "Shin");
        assert!(tracker.is_running());

        append(&first, HIT);
        append(&second, HIT);
        assert!(wait_for(|| !events.lock().unwrap().is_empty()));
        tracker.stop();

        assert_eq!(*events.lock().unwrap(), vec!["Shin".to_string()]);
    }

    #[test]
    fn test_set_path_invalid_keeps_running() {
        let dir = TempDir::new().unwrap();
        let path = log_file(&dir, "eqlog_Bob_green.txt", "");
        let mut tracker = Tracker::new(&path, fast()).unwrap();
        tracker.start().unwrap();

        assert!(tracker.set_path(dir.path().join("notes.txt")).is_err());
        assert!(tracker.is_running());
        assert_eq!(tracker.path(), path.as_path());
    }

    #[test]
    fn test_from_start_is_not_live_for_old_lines() {
        let dir = TempDir::new().unwrap();
        let path = log_file(&dir, "eqlog_Bob_green.txt", &format!("{HIT}\n"));
        let mut tracker = Tracker::new(
            &path,
            TailConfig {
                poll_interval_ms: 10,
                from_start: true,
            },
        )
        .unwrap();

        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        tracker.subscribe_to_line(move |_, _| *sink.lock().unwrap() += 1);
        tracker.start().unwrap();

        assert!(wait_for(|| *count.lock().unwrap() == 1));
        tracker.stop();
        assert!(!tracker.is_live());
    }
}
