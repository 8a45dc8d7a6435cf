//! Shared test utilities for creating test environments.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::api::{save_snapshot, seed};
use crate::model::Snapshot;
use crate::{utils, Config};
use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;

/// The instant the fixture snapshot is seeded at. The seeded months run from October 2023 to
/// March 2024.
pub fn fixture_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap()
}

/// Test environment that sets up a finboard home directory with a Config and an offline snapshot.
/// Holds TempDir to keep the directory alive for the duration of the test.
pub struct TestEnv {
    _temp_dir: TempDir,
    config: Config,
}

impl TestEnv {
    /// Creates a test environment with a Config and `offline.json` seeded at `fixture_now()`.
    pub async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("finboard");
        let config = Config::create(&root, "http://127.0.0.1:9/api/v1")
            .await
            .unwrap();
        save_snapshot(&config.offline_path(), &seed(fixture_now()))
            .await
            .unwrap();

        Self {
            _temp_dir: temp_dir,
            config,
        }
    }

    /// Returns a clone of the Config.
    pub fn config(&self) -> Config {
        self.config.clone()
    }

    /// Reads the current offline snapshot back from disk.
    pub async fn snapshot(&self) -> Snapshot {
        utils::deserialize(&self.config.offline_path())
            .await
            .unwrap()
    }
}
