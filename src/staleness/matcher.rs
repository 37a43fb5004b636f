//! Compiled matching rule for a single [`WatchSchedule`].

use std::fmt;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::config::WatchSchedule;

/// A watch schedule with its patterns compiled into a [`GlobSet`].
#[derive(Clone)]
pub struct ScheduleMatcher {
    schedule: WatchSchedule,
    /// Canonical form of the schedule path, when it existed at compile time.
    canonical: Option<PathBuf>,
    patterns: Option<GlobSet>,
}

impl fmt::Debug for ScheduleMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduleMatcher")
            .field("path", &self.schedule.path)
            .field("recursive", &self.schedule.recursive)
            .finish_non_exhaustive()
    }
}

impl ScheduleMatcher {
    pub fn compile(schedule: &WatchSchedule) -> Result<Self, globset::Error> {
        let patterns = match schedule.patterns.as_deref() {
            Some(list) if !list.is_empty() => Some(build_globset(list)?),
            _ => None,
        };
        let canonical = schedule
            .path
            .canonicalize()
            .ok()
            .filter(|c| *c != schedule.path);

        Ok(Self {
            schedule: schedule.clone(),
            canonical,
            patterns,
        })
    }

    pub fn schedule(&self) -> &WatchSchedule {
        &self.schedule
    }

    /// Whether a change to `path` is relevant to this schedule.
    ///
    /// `is_dir` tells whether the entry is (or was) a directory; removed
    /// entries can no longer be inspected, so the caller decides.
    pub fn matches(&self, path: &Path, is_dir: bool) -> bool {
        if is_dir && self.schedule.ignore_directories {
            return false;
        }

        let Some(rel) = self.relative(path) else {
            return false;
        };
        let depth = rel.components().count();
        if depth == 0 || (!self.schedule.recursive && depth > 1) {
            return false;
        }

        match (&self.patterns, path.file_name()) {
            (None, _) => true,
            (Some(set), Some(name)) => set.is_match(Path::new(name)),
            (Some(_), None) => false,
        }
    }

    /// Whether `path` names the scheduled directory itself.
    pub fn is_root(&self, path: &Path) -> bool {
        path == self.schedule.path || self.canonical.as_deref() == Some(path)
    }

    fn relative<'p>(&self, path: &'p Path) -> Option<&'p Path> {
        if let Ok(rel) = path.strip_prefix(&self.schedule.path) {
            return Some(rel);
        }
        self.canonical
            .as_deref()
            .and_then(|canonical| path.strip_prefix(canonical).ok())
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(Glob::new(pat)?);
    }
    builder.build()
}
