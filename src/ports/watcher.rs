// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration watcher trait definition.
//!
//! This module defines the `ConfigWatcher` trait, which provides an interface for
//! watching a configuration tree and reporting which units changed. Watchers only
//! report; callers decide when to resolve again with `reload` set.

use crate::domain::{ConfigPath, Result};
use std::sync::Arc;

/// Type alias for change notification callbacks.
///
/// The callback receives the path of the unit that changed, e.g. `configs/models/train`.
pub type ChangeCallback = Arc<dyn Fn(ConfigPath) + Send + Sync>;

/// A trait for watching configuration units for changes.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow for use in multi-threaded contexts.
///
/// # Examples
///
/// ```rust
/// use figtree::domain::{ConfigPath, Result};
/// use figtree::ports::{ChangeCallback, ConfigWatcher};
/// use std::sync::Arc;
///
/// struct ManualWatcher(Option<ChangeCallback>);
///
/// impl ConfigWatcher for ManualWatcher {
///     fn watch(&mut self, callback: ChangeCallback) -> Result<()> {
///         self.0 = Some(callback);
///         Ok(())
///     }
///
///     fn stop(&mut self) -> Result<()> {
///         self.0 = None;
///         Ok(())
///     }
/// }
///
/// let mut watcher = ManualWatcher(None);
/// watcher.watch(Arc::new(|unit: ConfigPath| println!("changed: {}", unit))).unwrap();
/// watcher.stop().unwrap();
/// ```
pub trait ConfigWatcher: Send + Sync {
    /// Starts watching for configuration changes.
    ///
    /// The callback should be non-blocking to avoid delaying the watcher.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The watcher was successfully started
    /// * `Err(ConfigError)` - An error occurred while starting the watcher
    fn watch(&mut self, callback: ChangeCallback) -> Result<()>;

    /// Stops watching for configuration changes.
    ///
    /// After calling this method, no more change notifications will be sent.
    fn stop(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct TestWatcher {
        callback: Option<ChangeCallback>,
    }

    impl TestWatcher {
        fn new() -> Self {
            TestWatcher { callback: None }
        }

        fn touch(&self, unit: &str) {
            if let Some(callback) = &self.callback {
                callback(ConfigPath::parse(unit).unwrap());
            }
        }
    }

    impl ConfigWatcher for TestWatcher {
        fn watch(&mut self, callback: ChangeCallback) -> Result<()> {
            self.callback = Some(callback);
            Ok(())
        }

        fn stop(&mut self) -> Result<()> {
            self.callback = None;
            Ok(())
        }
    }

    #[test]
    fn test_watcher_callback_invocation() {
        let mut watcher = TestWatcher::new();
        let changed = Arc::new(Mutex::new(Vec::new()));
        let changed_clone = Arc::clone(&changed);

        watcher
            .watch(Arc::new(move |unit: ConfigPath| {
                changed_clone.lock().unwrap().push(unit.dotted());
            }))
            .unwrap();

        watcher.touch("configs/models/train");
        watcher.stop().unwrap();
        watcher.touch("configs/models/eval");

        assert_eq!(*changed.lock().unwrap(), vec!["configs.models.train".to_string()]);
    }

    #[test]
    fn test_watcher_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Box<dyn ConfigWatcher>>();
    }
}
