// SPDX-License-Identifier: MIT OR Apache-2.0

//! Helper utilities for building unit trees in temporary directories.

use figtree::domain::EngineSettings;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A configuration root in a temporary directory, removed on drop.
pub struct Fixture {
    dir: TempDir,
}

#[allow(dead_code)]
impl Fixture {
    /// Creates an empty root.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    /// Writes `content` to `rel` below the root, creating parent directories.
    pub fn unit(self, rel: &str, content: &str) -> Self {
        self.write(rel, content);
        self
    }

    /// Creates an empty directory below the root.
    pub fn dir(self, rel: &str) -> Self {
        fs::create_dir_all(self.path().join(rel)).expect("failed to create dir");
        self
    }

    /// Writes `content` to `rel`, replacing any existing file.
    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent dirs");
        }
        fs::write(&path, content).expect("failed to write unit");
        path
    }

    /// Returns the root path.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Returns default settings rooted at the fixture.
    pub fn settings(&self) -> EngineSettings {
        EngineSettings::new(self.path())
    }
}

/// The `models/train.Trainer` layout used across tests.
#[allow(dead_code)]
pub fn training_fixture() -> Fixture {
    Fixture::new()
        .unit(
            "models/base.yaml",
            r#"
Base: !def
  epochs: 10
  seed: 7
"#,
        )
        .unit(
            "models/train.yaml",
            r#"
Base: !def
  epochs: 10
Trainer: !def
  _extends: Base
  lr: 0.1
"#,
        )
}
