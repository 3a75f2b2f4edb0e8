// SPDX-License-Identifier: MIT OR Apache-2.0

//! Basic usage example for figtree.
//!
//! This example demonstrates:
//! - Laying out units in directories
//! - Resolving a definition with its inherited fields
//! - Resolving a whole unit and a whole directory
//! - Group names and cross-unit references
//!
//! To run this example:
//! ```bash
//! cargo run --example basic_usage
//! ```

use figtree::prelude::*;
use std::fs;
use std::path::Path;

const BASE_UNIT: &str = r#"
Base: !def
  epochs: 10
  seed: 7
"#;

const TRAIN_UNIT: &str = r#"
batch_size: !group
  name: batch
  value: 32
Trainer: !def
  _extends: !ref models.base.Base
  lr: 0.1
  Optimizer: !def
    _group_name: optimizer
    name: adam
    momentum: 0.9
"#;

fn write_unit(root: &Path, rel: &str, content: &str) -> std::io::Result<()> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt::init();

    println!("=== figtree: Basic Usage ===\n");

    let root = tempfile::TempDir::new()?;
    write_unit(root.path(), "models/base.yaml", BASE_UNIT)?;
    write_unit(root.path(), "models/train.yaml", TRAIN_UNIT)?;
    println!("Configuration root: {}\n", root.path().display());

    let mut store = ConfigStore::new(EngineSettings::new(root.path()))?;

    // Example 1: a definition and everything it inherits
    println!("--- Example 1: Definition ---");
    store.resolve("models/train.Trainer", true)?;
    let trainer = store.get("models.train.Trainer")?;
    println!("models.train.Trainer = {}", trainer);
    let epochs = trainer
        .lookup("epochs")
        .map(|v| v.as_i64("epochs"))
        .transpose()?;
    println!("  epochs (inherited): {:?}", epochs);
    println!(
        "  optimizer.name:     {:?}",
        trainer.lookup("optimizer.name").and_then(ConfigValue::as_str)
    );

    // Example 2: a whole unit, with group names applied
    println!("\n--- Example 2: Unit ---");
    store.resolve("models.train", false)?;
    println!("models.train = {}", store.get("models.train")?);

    // Example 3: a directory tree
    println!("\n--- Example 3: Directory ---");
    store.resolve("models", false)?;
    println!("models = {}", store.get("models")?);

    // Example 4: errors name the missing piece
    println!("\n--- Example 4: Errors ---");
    for path in ["models/eval", "models/train.Scheduler", "datasets/train"] {
        match store.resolve(path, false) {
            Ok(()) => println!("✓ {} resolved", path),
            Err(e) => println!("✗ {}: {}", path, e),
        }
    }

    println!("\nStore keys: {:?}", store.as_mapping().keys().collect::<Vec<_>>());
    println!("\n=== Example Complete ===");
    Ok(())
}
