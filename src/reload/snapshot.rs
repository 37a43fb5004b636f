//! The built monitoring configuration and its immutable snapshot wrapper.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::clock::Stamp;

/// One configuration input as read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    pub path: PathBuf,
    pub contents: Vec<u8>,
    pub modified: Option<SystemTime>,
}

/// The monitoring configuration automations run against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitoringConfig {
    sources: Vec<ConfigSource>,
}

impl MonitoringConfig {
    pub fn new(mut sources: Vec<ConfigSource>) -> Self {
        sources.sort_by(|a, b| a.path.cmp(&b.path));
        sources.dedup_by(|a, b| a.path == b.path);
        Self { sources }
    }

    pub fn sources(&self) -> &[ConfigSource] {
        &self.sources
    }

    pub fn source(&self, path: &Path) -> Option<&ConfigSource> {
        self.sources
            .binary_search_by(|s| s.path.as_path().cmp(path))
            .ok()
            .map(|i| &self.sources[i])
    }

    pub fn total_bytes(&self) -> usize {
        self.sources.iter().map(|s| s.contents.len()).sum()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// A published, never-mutated build of the monitoring configuration.
#[derive(Debug)]
pub struct ConfigSnapshot {
    config: MonitoringConfig,
    built_at: Stamp,
    generation: u64,
}

impl ConfigSnapshot {
    pub fn new(config: MonitoringConfig, built_at: Stamp, generation: u64) -> Self {
        Self {
            config,
            built_at,
            generation,
        }
    }

    pub fn config(&self) -> &MonitoringConfig {
        &self.config
    }

    /// Changes observed after this stamp are not reflected in the snapshot.
    pub fn built_at(&self) -> Stamp {
        self.built_at
    }

    /// 1 for the startup build, incremented by every successful reload.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
