//! Watch schedules: the locations whose changes invalidate the loaded
//! monitoring configuration.
//!
//! The set is derived once from the site root and never changes for the
//! lifetime of the process.

use std::path::{Path, PathBuf};

/// One watched location and its matching rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSchedule {
    /// Directory to observe.
    pub path: PathBuf,
    /// Also observe entries in subdirectories.
    pub recursive: bool,
    /// Events about directories themselves are not relevant.
    pub ignore_directories: bool,
    /// File name globs; `None` (or empty) matches every entry.
    pub patterns: Option<Vec<String>>,
}

impl WatchSchedule {
    fn new(path: PathBuf, recursive: bool, patterns: &[&str]) -> Self {
        Self {
            path,
            recursive,
            ignore_directories: true,
            patterns: Some(patterns.iter().map(|p| p.to_string()).collect()),
        }
    }
}

/// The immutable set of watch schedules.
#[derive(Debug, Clone, Default)]
pub struct WatchScheduleRegistry {
    schedules: Vec<WatchSchedule>,
}

impl WatchScheduleRegistry {
    pub fn new(schedules: Vec<WatchSchedule>) -> Self {
        Self { schedules }
    }

    /// Schedules for a monitoring site rooted at `root`: the primary
    /// configuration files, the `conf.d` fragments, discovered services and
    /// host labels, and the stored secrets file.
    pub fn from_site_root(root: &Path) -> Self {
        let etc = root.join("etc").join("check_mk");
        let var = root.join("var").join("check_mk");

        Self::new(vec![
            WatchSchedule::new(
                etc.clone(),
                false,
                &["main.mk", "local.mk", "final.mk", "experimental.mk"],
            ),
            WatchSchedule::new(etc.join("conf.d"), true, &["*.mk", "*.pkl"]),
            WatchSchedule::new(var.join("autochecks"), true, &["*.mk"]),
            WatchSchedule::new(var.join("discovered_host_labels"), true, &["*.mk"]),
            WatchSchedule::new(var, false, &["stored_passwords"]),
        ])
    }

    pub fn iter(&self) -> impl Iterator<Item = &WatchSchedule> {
        self.schedules.iter()
    }

    pub fn len(&self) -> usize {
        self.schedules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schedules.is_empty()
    }
}

impl<'a> IntoIterator for &'a WatchScheduleRegistry {
    type Item = &'a WatchSchedule;
    type IntoIter = std::slice::Iter<'a, WatchSchedule>;

    fn into_iter(self) -> Self::IntoIter {
        self.schedules.iter()
    }
}
