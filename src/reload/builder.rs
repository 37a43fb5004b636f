//! Building the monitoring configuration from the site's files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use crate::config::WatchScheduleRegistry;
use crate::reload::snapshot::{ConfigSource, MonitoringConfig};
use crate::staleness::ScheduleMatcher;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Produces a fresh [`MonitoringConfig`].
///
/// Builds run on a blocking worker and never concurrently with each other.
pub trait ConfigBuilder: Send + Sync + 'static {
    /// Drop any derived state kept between builds.
    fn clear_caches(&self) {}

    fn build_all(&self) -> Result<MonitoringConfig, BuildError>;
}

/// Reads every file selected by the watch schedules.
#[derive(Debug, Clone)]
pub struct FileConfigBuilder {
    matchers: Vec<ScheduleMatcher>,
}

impl FileConfigBuilder {
    pub fn new(registry: &WatchScheduleRegistry) -> Result<Self, globset::Error> {
        let matchers = registry
            .iter()
            .map(ScheduleMatcher::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { matchers })
    }
}

impl ConfigBuilder for FileConfigBuilder {
    fn build_all(&self) -> Result<MonitoringConfig, BuildError> {
        let mut sources = Vec::new();
        for matcher in &self.matchers {
            let root = &matcher.schedule().path;
            if !root.is_dir() {
                tracing::debug!(path = %root.display(), "Schedule directory missing, skipped");
                continue;
            }
            collect_sources(matcher, root, &mut sources)?;
        }

        let config = MonitoringConfig::new(sources);
        tracing::debug!(
            sources = config.len(),
            bytes = config.total_bytes(),
            "Monitoring configuration read"
        );
        Ok(config)
    }
}

fn collect_sources(
    matcher: &ScheduleMatcher,
    root: &Path,
    out: &mut Vec<ConfigSource>,
) -> Result<(), BuildError> {
    // Links are not followed: a loop under a recursive schedule must not
    // multiply the configuration.
    let mut walker = WalkDir::new(root).follow_links(false);
    if !matcher.schedule().recursive {
        walker = walker.max_depth(1);
    }

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            // Deleted while walking; the watcher reports it.
            Err(e) if e.io_error().map(io::Error::kind) == Some(io::ErrorKind::NotFound) => continue,
            Err(e) => {
                let path = e.path().unwrap_or(root).to_path_buf();
                return Err(BuildError::Read {
                    path,
                    source: e.into(),
                });
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }
        let path = entry.path();
        if entry.path_is_symlink() && !path.is_file() {
            tracing::debug!(path = %path.display(), "Skipping link to non-file");
            continue;
        }
        if !matcher.matches(path, false) {
            continue;
        }

        match fs::read(path) {
            Ok(contents) => {
                let modified = fs::metadata(path).and_then(|m| m.modified()).ok();
                out.push(ConfigSource {
                    path: path.to_path_buf(),
                    contents,
                    modified,
                });
            }
            // Deleted between listing and reading; the watcher reports it.
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(BuildError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_only_scheduled_files() {
        let site = tempfile::tempdir().unwrap();
        let etc = site.path().join("etc/check_mk");
        fs::create_dir_all(etc.join("conf.d/wato/nested")).unwrap();
        fs::write(etc.join("main.mk"), "all_hosts = []").unwrap();
        fs::write(etc.join("unrelated.txt"), "x").unwrap();
        fs::write(etc.join("conf.d/wato/hosts.mk"), "hosts").unwrap();
        fs::write(etc.join("conf.d/wato/nested/rules.pkl"), [0u8, 1, 2]).unwrap();
        fs::write(etc.join("conf.d/wato/README"), "x").unwrap();

        let registry = WatchScheduleRegistry::from_site_root(site.path());
        let config = FileConfigBuilder::new(&registry).unwrap().build_all().unwrap();

        let names: Vec<_> = config
            .sources()
            .iter()
            .map(|s| s.path.strip_prefix(site.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("etc/check_mk/conf.d/wato/hosts.mk"),
                PathBuf::from("etc/check_mk/conf.d/wato/nested/rules.pkl"),
                PathBuf::from("etc/check_mk/main.mk"),
            ]
        );
        assert_eq!(
            config.source(&etc.join("conf.d/wato/nested/rules.pkl")).unwrap().contents,
            vec![0u8, 1, 2]
        );
    }

    #[test]
    fn empty_site_builds_empty_config() {
        let site = tempfile::tempdir().unwrap();
        let registry = WatchScheduleRegistry::from_site_root(site.path());
        let config = FileConfigBuilder::new(&registry).unwrap().build_all().unwrap();
        assert!(config.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn symlink_loops_are_not_followed() {
        let site = tempfile::tempdir().unwrap();
        let conf_d = site.path().join("etc/check_mk/conf.d");
        fs::create_dir_all(&conf_d).unwrap();
        fs::write(conf_d.join("hosts.mk"), "hosts").unwrap();
        std::os::unix::fs::symlink("..", conf_d.join("up")).unwrap();

        let registry = WatchScheduleRegistry::from_site_root(site.path());
        let config = FileConfigBuilder::new(&registry).unwrap().build_all().unwrap();

        assert_eq!(config.len(), 1);
        assert_eq!(config.sources()[0].path, conf_d.join("hosts.mk"));
    }

    #[test]
    fn non_recursive_schedule_reads_direct_children_only() {
        let site = tempfile::tempdir().unwrap();
        let etc = site.path().join("etc/check_mk");
        fs::create_dir_all(etc.join("sub")).unwrap();
        fs::write(etc.join("local.mk"), "x").unwrap();
        fs::write(etc.join("sub/local.mk"), "y").unwrap();

        let registry = WatchScheduleRegistry::from_site_root(site.path());
        let config = FileConfigBuilder::new(&registry).unwrap().build_all().unwrap();

        let paths: Vec<_> = config.sources().iter().map(|s| s.path.clone()).collect();
        assert_eq!(paths, vec![etc.join("local.mk")]);
    }
}
