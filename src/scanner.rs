use crate::{
    asset::ImageAsset,
    config::Config,
    error::Result,
    filter::FileFilter,
};
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};
use walkdir::{DirEntry, WalkDir};

/// Statistics collected during scanning.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScanStats {
    /// Files with the source extension
    pub matched_files: usize,

    /// Matching files dropped by exclusion patterns
    pub excluded_files: usize,

    /// Walk errors and files whose name is not valid UTF-8
    pub errors: usize,
}

/// Recursively collects images with the source extension.
pub(crate) struct Scanner {
    root_dir: PathBuf,
    extension: String,
    file_filter: FileFilter,
}

impl Scanner {
    /// Creates a new scanner from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if an exclusion pattern is invalid.
    pub(crate) fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            root_dir: config.root_dir.clone(),
            extension: config.source_extension.clone(),
            file_filter: FileFilter::new(&config.file_filter_config)?,
        })
    }

    /// Scans the root directory.
    ///
    /// Extension matching is exact and case-sensitive: with `png`, a file
    /// named `1.PNG` is not picked up. Results are sorted by path. Walk
    /// errors are logged and skipped.
    pub(crate) fn scan(&self) -> (Vec<ImageAsset>, ScanStats) {
        let mut stats = ScanStats::default();
        let mut assets = Vec::new();

        debug!("Scanning {} for *.{}", self.root_dir.display(), self.extension);

        for result in WalkDir::new(&self.root_dir).follow_links(false) {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Walk error: {}", e);
                    stats.errors += 1;
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.has_source_extension(&entry) {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.root_dir)
                .unwrap_or_else(|_| entry.path());
            if !self.file_filter.should_process(relative) {
                trace!("Excluded by pattern: {}", relative.display());
                stats.excluded_files += 1;
                continue;
            }

            let relative_display = relative.display().to_string();

            match ImageAsset::from_path(entry.into_path(), &self.root_dir) {
                Some(asset) => {
                    trace!("Found image: {}", asset.relative_path);
                    stats.matched_files += 1;
                    assets.push(asset);
                }
                None => {
                    warn!("Skipping file with a non-UTF-8 name: {}", relative_display);
                    stats.errors += 1;
                }
            }
        }

        // Sort for deterministic ordering
        assets.sort_by(|a, b| a.path.cmp(&b.path));

        debug!(
            "Scan complete: {} images, {} excluded, {} errors",
            stats.matched_files, stats.excluded_files, stats.errors
        );

        (assets, stats)
    }

    fn has_source_extension(&self, entry: &DirEntry) -> bool {
        Path::new(entry.file_name())
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == self.extension)
    }
}
