// SPDX-License-Identifier: MIT OR Apache-2.0

//! File system watcher for unit file changes.
//!
//! This module provides a watcher that monitors the configuration tree below a root
//! and reports which unit changed. It does not reload anything itself: callers resolve
//! the reported unit again with `reload` set.

use crate::domain::{ConfigError, ConfigPath, EngineSettings, Result};
use crate::ports::{ChangeCallback, ConfigWatcher};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Maps changed files to the unit paths they define.
#[derive(Clone, Debug)]
struct UnitFilter {
    root: PathBuf,
    skip_dirs: Vec<String>,
    extensions: Vec<String>,
}

impl UnitFilter {
    fn is_skipped(&self, name: &str) -> bool {
        name.starts_with('.') || self.skip_dirs.iter().any(|d| d == name)
    }

    /// Returns `configs/models/train` for `<root>/configs/models/train.yaml`.
    fn unit_for(&self, path: &Path) -> Option<ConfigPath> {
        let extension = path.extension()?.to_str()?;
        if !self.extensions.iter().any(|e| e == extension) {
            return None;
        }

        let relative = path.strip_prefix(&self.root).ok()?;
        let mut segments = Vec::new();
        for component in relative.parent()?.components() {
            match component {
                Component::Normal(name) => {
                    let name = name.to_str()?;
                    if self.is_skipped(name) {
                        return None;
                    }
                    segments.push(name.to_string());
                }
                _ => return None,
            }
        }

        let stem = path.file_stem()?.to_str()?;
        if stem.is_empty() || stem.contains('.') {
            return None;
        }
        segments.push(stem.to_string());
        ConfigPath::from_segments(&segments).ok()
    }
}

/// Watcher for unit files below a configuration root.
///
/// Changes are debounced per unit, so an editor writing a file several times in a
/// row produces one notification.
///
/// # Examples
///
/// ```rust,no_run
/// use figtree::adapters::UnitWatcher;
/// use figtree::domain::EngineSettings;
/// use figtree::ports::ConfigWatcher;
/// use std::sync::Arc;
///
/// # fn main() -> figtree::domain::Result<()> {
/// let settings = EngineSettings::new("/srv/app");
/// let mut watcher = UnitWatcher::new(&settings, &["yaml", "yml"], None)?;
///
/// watcher.watch(Arc::new(|unit| {
///     println!("Unit changed: {}", unit);
/// }))?;
///
/// watcher.stop()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct UnitWatcher {
    /// Decides which paths are units
    filter: UnitFilter,
    /// Debounce delay (default 500ms)
    debounce_delay: Duration,
    /// Internal watcher
    watcher: Option<RecommendedWatcher>,
    /// Thread handle for the watcher thread
    watch_thread: Option<JoinHandle<()>>,
    /// Stop signal sender
    stop_tx: Option<Sender<()>>,
}

impl UnitWatcher {
    /// Creates a watcher for the root in `settings`.
    ///
    /// # Arguments
    ///
    /// * `settings` - Supplies the root and the directories to skip
    /// * `extensions` - Unit file extensions to report, without the dot
    /// * `debounce_delay` - Optional debounce delay (default 500ms)
    pub fn new<S: AsRef<str>>(
        settings: &EngineSettings,
        extensions: &[S],
        debounce_delay: Option<Duration>,
    ) -> Result<Self> {
        let root = settings.root();
        if !root.is_dir() {
            return Err(ConfigError::WatcherError {
                message: format!("Root directory does not exist: {}", root.display()),
                source: None,
            });
        }

        // Events carry canonical paths on some platforms
        let root = root.canonicalize()?;

        Ok(Self {
            filter: UnitFilter {
                root,
                skip_dirs: settings.skip_dirs().to_vec(),
                extensions: extensions.iter().map(|e| e.as_ref().to_string()).collect(),
            },
            debounce_delay: debounce_delay.unwrap_or(Duration::from_millis(500)),
            watcher: None,
            watch_thread: None,
            stop_tx: None,
        })
    }

    /// Returns the watched root.
    pub fn root(&self) -> &Path {
        &self.filter.root
    }
}

fn dispatch(
    event_rx: &Receiver<notify::Result<Event>>,
    stop_rx: &Receiver<()>,
    filter: &UnitFilter,
    debounce_delay: Duration,
    callback: &ChangeCallback,
) {
    let mut last_seen: HashMap<ConfigPath, Instant> = HashMap::new();

    loop {
        // Check for stop signal (non-blocking)
        if stop_rx.try_recv().is_ok() {
            break;
        }

        let event = match event_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(Ok(event)) => event,
            Ok(Err(e)) => {
                tracing::warn!("Unit watcher error: {}", e);
                continue;
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => continue,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        };

        if matches!(event.kind, EventKind::Access(_)) {
            continue;
        }

        for unit in event.paths.iter().filter_map(|p| filter.unit_for(p)) {
            // Debounce: only trigger if enough time has passed for this unit
            let now = Instant::now();
            let should_trigger = last_seen
                .get(&unit)
                .map(|last| now.duration_since(*last) >= debounce_delay)
                .unwrap_or(true);

            if should_trigger {
                last_seen.insert(unit.clone(), now);
                tracing::debug!("Unit '{}' changed", unit);
                callback(unit);
            }
        }
    }
}

impl ConfigWatcher for UnitWatcher {
    fn watch(&mut self, callback: ChangeCallback) -> Result<()> {
        if self.watcher.is_some() {
            return Err(ConfigError::WatcherError {
                message: "Watcher is already running".to_string(),
                source: None,
            });
        }

        let (event_tx, event_rx) = channel();
        let (stop_tx, stop_rx) = channel::<()>();

        let mut watcher =
            RecommendedWatcher::new(event_tx, notify::Config::default()).map_err(|e| {
                ConfigError::WatcherError {
                    message: format!("Failed to create unit watcher: {}", e),
                    source: Some(Box::new(e)),
                }
            })?;

        watcher
            .watch(&self.filter.root, RecursiveMode::Recursive)
            .map_err(|e| ConfigError::WatcherError {
                message: format!("Failed to start watching: {}", e),
                source: Some(Box::new(e)),
            })?;

        tracing::info!("Watching units below {}", self.filter.root.display());
        self.watcher = Some(watcher);
        self.stop_tx = Some(stop_tx);

        let filter = self.filter.clone();
        let debounce_delay = self.debounce_delay;
        let watch_thread = thread::spawn(move || {
            dispatch(&event_rx, &stop_rx, &filter, debounce_delay, &callback);
        });

        self.watch_thread = Some(watch_thread);

        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }

        if let Some(handle) = self.watch_thread.take() {
            handle.join().map_err(|_| ConfigError::WatcherError {
                message: "Failed to join watcher thread".to_string(),
                source: None,
            })?;
        }

        self.watcher = None;

        Ok(())
    }
}

impl Drop for UnitWatcher {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
