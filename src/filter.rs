//! Glob-based exclusion of files and directories during scanning.

use crate::error::{Error, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;

/// Configuration for file filtering with glob patterns.
///
/// Patterns are matched against paths relative to the scanned root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileFilterConfig {
    exclude_files: Vec<String>,
    exclude_directories: Vec<String>,
}

impl FileFilterConfig {
    /// Creates an empty configuration that excludes nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets file patterns to skip, e.g. `**/*.bak.png`.
    #[must_use]
    pub fn exclude_files(mut self, patterns: Vec<String>) -> Self {
        self.exclude_files = patterns;
        self
    }

    /// Sets directory patterns to skip, e.g. `originals` or `**/raw`.
    #[must_use]
    pub fn exclude_directories(mut self, patterns: Vec<String>) -> Self {
        self.exclude_directories = patterns;
        self
    }
}

#[derive(Debug, Clone)]
pub(crate) struct FileFilter {
    exclude_files: GlobSet,
    exclude_directories: GlobSet,
}

impl FileFilter {
    /// Compiles the configured patterns.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any pattern is not a valid glob.
    pub(crate) fn new(config: &FileFilterConfig) -> Result<Self> {
        Ok(Self {
            exclude_files: Self::build_globset(&config.exclude_files)?,
            exclude_directories: Self::build_globset(&config.exclude_directories)?,
        })
    }

    fn build_globset(patterns: &[String]) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern)
                .map_err(|e| Error::config(format!("Invalid glob pattern '{pattern}': {e}")))?;
            builder.add(glob);
        }
        builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build glob set: {e}")))
    }

    /// Returns false if the relative path or any of its parent directories is excluded.
    pub(crate) fn should_process(&self, relative: &Path) -> bool {
        if self.exclude_files.is_match(relative) {
            return false;
        }

        !relative
            .ancestors()
            .skip(1)
            .filter(|ancestor| !ancestor.as_os_str().is_empty())
            .any(|ancestor| self.exclude_directories.is_match(ancestor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(files: &[&str], dirs: &[&str]) -> FileFilter {
        let config = FileFilterConfig::new()
            .exclude_files(files.iter().map(ToString::to_string).collect())
            .exclude_directories(dirs.iter().map(ToString::to_string).collect());
        FileFilter::new(&config).unwrap()
    }

    #[test]
    fn test_empty_filter_accepts_everything() {
        let f = filter(&[], &[]);
        assert!(f.should_process(Path::new("1.png")));
        assert!(f.should_process(Path::new("nested/deep/2.png")));
    }

    #[test]
    fn test_exclude_files() {
        let f = filter(&["**/backup-*.png", "0.png"], &[]);
        assert!(!f.should_process(Path::new("0.png")));
        assert!(!f.should_process(Path::new("old/backup-1.png")));
        assert!(f.should_process(Path::new("1.png")));
    }

    #[test]
    fn test_exclude_directories() {
        let f = filter(&[], &["originals", "**/raw"]);
        assert!(!f.should_process(Path::new("originals/1.png")));
        assert!(!f.should_process(Path::new("promo/raw/deep/1.png")));
        assert!(f.should_process(Path::new("promo/1.png")));
    }

    #[test]
    fn test_invalid_glob() {
        let config = FileFilterConfig::new().exclude_files(vec!["[".to_string()]);
        let err = FileFilter::new(&config).unwrap_err();
        assert!(err.is_config());
    }
}
