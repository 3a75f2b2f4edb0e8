// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dynamic reload example.
//!
//! This example demonstrates:
//! - Watching a configuration root for unit changes
//! - Re-resolving only the unit that changed, with `reload` set
//! - Debouncing to avoid excessive reloads
//!
//! To run this example:
//! ```bash
//! cargo run --example dynamic_reload --features yaml,reload
//!
//! # In another terminal, modify the unit file printed at startup:
//! printf 'Trainer: !def\n  lr: 0.5\n' > <root>/models/train.yaml
//! ```

use figtree::prelude::*;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    println!("=== figtree: Dynamic Reload Example ===\n");

    let root = tempfile::TempDir::new()?;
    let unit_path = root.path().join("models/train.yaml");
    std::fs::create_dir_all(root.path().join("models"))?;
    std::fs::write(&unit_path, "Trainer: !def\n  lr: 0.1\n  epochs: 10\n")?;
    println!("Created unit at: {}", unit_path.display());

    let settings = EngineSettings::new(root.path());
    let store = Arc::new(Mutex::new(ConfigStore::new(settings.clone())?));
    {
        let mut store = store.lock().map_err(|e| e.to_string())?;
        store.resolve("models/train.Trainer", true)?;
        println!("Initial: {}", store.get("models.train.Trainer")?);
    }

    let mut watcher = UnitWatcher::new(&settings, &["yaml", "yml"], Some(Duration::from_secs(1)))?;

    let store_clone = Arc::clone(&store);
    let callback = Arc::new(move |unit: ConfigPath| {
        println!("\n🔄 Unit changed: {}", unit);

        if let Ok(mut store) = store_clone.lock() {
            // Resolve the changed unit again, bypassing the cache
            if let Err(e) = store.resolve(unit.as_str(), true) {
                eprintln!("Error reloading unit: {}", e);
                return;
            }
            if let Ok(value) = store.get(&unit.dotted()) {
                println!("Updated: {}", value);
            }
        }
    });

    println!("\n=== Starting Unit Watcher ===");
    println!("Watching: {}", root.path().display());
    println!("Debounce delay: 1 second");
    watcher.watch(callback)?;

    println!("\nApplication is running. Press Ctrl+C to exit.");
    for i in 1..=30 {
        thread::sleep(Duration::from_secs(2));
        print!(".");
        std::io::Write::flush(&mut std::io::stdout())?;

        if i % 10 == 0 {
            println!();
        }
    }

    println!("\n\n=== Stopping Watcher ===");
    watcher.stop()?;
    println!("Example complete");

    Ok(())
}
