use crate::{
    asset::{is_numeric_stem, ImageAsset},
    catalog::{Catalog, Series},
    config::{Config, FailurePolicy},
    converter::{CommandConverter, ImageConverter},
    error::{Error, Result},
    naming::NameTemplate,
    report,
    scanner::Scanner,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, trace, warn};

/// An image that was renamed and converted (or would be, in a dry run).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelabeledAsset {
    /// Path before renaming
    pub original: PathBuf,

    /// Path after renaming
    pub renamed: PathBuf,

    /// Converted sibling
    pub converted: PathBuf,
}

/// An image that could not be relabeled.
#[derive(Debug, Clone)]
pub struct FailedAsset {
    /// Image path at the time of failure
    pub path: PathBuf,

    /// What went wrong
    pub error: Error,
}

/// Outcome of a relabeling run.
#[derive(Debug, Clone)]
pub struct RelabelReport {
    /// Codename of the processed series
    pub codename: String,

    /// Label used in the new file names
    pub label: String,

    /// Images with the source extension that were considered
    pub scanned: usize,

    /// Images dropped by exclusion patterns
    pub excluded: usize,

    /// Images left alone because their stem is not a number
    pub skipped: usize,

    /// Unreadable directories and non-UTF-8 file names met while scanning
    pub scan_errors: usize,

    /// Successfully relabeled images
    pub relabeled: Vec<RelabeledAsset>,

    /// Images that failed
    pub failures: Vec<FailedAsset>,

    /// Whether this was a dry run
    pub dry_run: bool,

    /// Total execution time
    pub duration: Duration,
}

impl RelabelReport {
    /// Returns true if no image failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Converts a report with failures into [`Error::Multiple`].
    ///
    /// # Errors
    ///
    /// Returns every per-image error if at least one image failed.
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::multiple(
                self.failures.into_iter().map(|f| f.error).collect(),
            ))
        }
    }

    /// Prints a human-readable summary to stdout.
    pub fn print_summary(&self) {
        let mode = if self.dry_run { " (dry run)" } else { "" };
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║            Relabel Summary{mode:<28}║");
        println!("╠═══════════════════════════════════════════════════════╣");
        println!("║ Series:               {:<32}║", self.codename);
        println!("║ Label:                {:<32}║", self.label);
        println!("║                                                       ║");
        println!("║ Images Scanned:       {:>8}                        ║", self.scanned);
        println!("║   - Excluded:         {:>8}                        ║", self.excluded);
        println!("║   - Skipped:          {:>8}                        ║", self.skipped);
        println!(
            "║   - Scan errors:      {:>8}                        ║",
            self.scan_errors
        );
        println!(
            "║   - Relabeled:        {:>8}                        ║",
            self.relabeled.len()
        );
        println!(
            "║   - Failed:           {:>8}                        ║",
            self.failures.len()
        );
        println!("║                                                       ║");
        println!(
            "║ Total Time:           {:>8.2}s                       ║",
            self.duration.as_secs_f64()
        );
        println!("╚═══════════════════════════════════════════════════════╝\n");

        for failure in &self.failures {
            println!("  ✗ {}", failure.error);
        }
    }
}

enum Outcome {
    Skipped,
    Relabeled(RelabeledAsset),
}

/// Renames numbered card images after their catalog entry and converts them.
///
/// The catalog and series are resolved when the relabeler is created, so a
/// bad catalog or codename fails before any file is touched.
///
/// Rename and conversion are not transactional: if conversion fails (or the
/// process dies in between), the image stays renamed without a converted
/// sibling. A later run will not pick it up again, since its stem is no
/// longer numeric.
pub struct Relabeler {
    config: Config,
    series: Series,
    label: String,
    template: NameTemplate,
    scanner: Scanner,
    converter: Box<dyn ImageConverter>,
}

impl Relabeler {
    /// Creates a relabeler that converts with the configured external command.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration validation fails
    /// - The catalog cannot be loaded
    /// - The series is not in the catalog
    pub fn new(config: Config) -> Result<Self> {
        let converter = CommandConverter::from_config(&config);
        Self::with_converter(config, Box::new(converter))
    }

    /// Creates a relabeler with a custom converter.
    ///
    /// # Errors
    ///
    /// Same as [`Relabeler::new`].
    pub fn with_converter(config: Config, converter: Box<dyn ImageConverter>) -> Result<Self> {
        config.validate()?;

        let template = config.parsed_template()?;
        let scanner = Scanner::new(&config)?;

        let catalog = Catalog::load(&config.catalog_path)?;
        let series = catalog.find_series(&config.codename)?.clone();
        let label = config
            .series_label
            .clone()
            .unwrap_or_else(|| series.label());

        debug!(
            "Series {} has {} cards, label '{}'",
            series.codename,
            series.cards.len(),
            label
        );

        Ok(Self {
            config,
            series,
            label,
            template,
            scanner,
            converter,
        })
    }

    /// Processes every image under the root directory.
    ///
    /// Images whose stem is not a number are skipped. With
    /// [`FailurePolicy::CollectAndReport`] per-image failures end up in the
    /// report; with [`FailurePolicy::FailFast`] the first one is returned.
    ///
    /// # Errors
    ///
    /// Returns an error on the first per-image failure in fail-fast mode, or
    /// if the report file cannot be written.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use card_relabel::{Config, Relabeler};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let config = Config::builder()
    ///     .catalog_path("data/pokemons.json")
    ///     .codename("A1a")
    ///     .root_dir("images/cards/mythical-island")
    ///     .build()?;
    ///
    /// let report = Relabeler::new(config)?.run()?;
    /// report.print_summary();
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(self), fields(series = %self.series.codename, root_dir = %self.config.root_dir.display()))]
    pub fn run(self) -> Result<RelabelReport> {
        let start_time = Instant::now();

        if self.config.dry_run {
            warn!("Dry run mode enabled - no files will be renamed or converted");
        }

        let (assets, scan_stats) = self.scanner.scan();
        info!(
            "Found {} .{} images",
            assets.len(),
            self.config.source_extension
        );

        let mut report = RelabelReport {
            codename: self.series.codename.clone(),
            label: self.label.clone(),
            scanned: assets.len(),
            excluded: scan_stats.excluded_files,
            skipped: 0,
            scan_errors: scan_stats.errors,
            relabeled: Vec::new(),
            failures: Vec::new(),
            dry_run: self.config.dry_run,
            duration: Duration::ZERO,
        };

        let mut aborted = None;
        for asset in &assets {
            match self.process(asset) {
                Ok(Outcome::Skipped) => report.skipped += 1,
                Ok(Outcome::Relabeled(relabeled)) => report.relabeled.push(relabeled),
                Err(e) => {
                    warn!("{}: {}", asset.relative_path, e);
                    let abort = self.config.failure_policy == FailurePolicy::FailFast
                        || !e.is_per_file();
                    report.failures.push(FailedAsset {
                        path: asset.path.clone(),
                        error: e.clone(),
                    });
                    if abort {
                        aborted = Some(e);
                        break;
                    }
                }
            }
        }

        report.duration = start_time.elapsed();

        // Written even when aborting, so already renamed files are on record.
        if let Some(path) = &self.config.report_path {
            report::write_report(path, &report)?;
        }

        if let Some(e) = aborted {
            warn!(
                "Stopped after {} relabeled images",
                report.relabeled.len()
            );
            return Err(e);
        }

        if report.is_success() {
            info!(
                "✓ Relabeled {} images ({} skipped) in {:.2}s",
                report.relabeled.len(),
                report.skipped,
                report.duration.as_secs_f64()
            );
        } else {
            warn!(
                "Relabeled {} images, {} failed",
                report.relabeled.len(),
                report.failures.len()
            );
        }

        Ok(report)
    }

    fn process(&self, asset: &ImageAsset) -> Result<Outcome> {
        if !asset.is_numbered() {
            trace!("Skipping {}: stem is not a card number", asset.relative_path);
            return Ok(Outcome::Skipped);
        }

        let card = self
            .series
            .find_card(&asset.stem)
            .ok_or_else(|| Error::card_not_found(&asset.path, &asset.stem))?;

        let base_name = self.template.render(card, &self.label);
        let renamed = asset.sibling(&base_name, &asset.extension);
        let converted = asset.sibling(&base_name, &self.config.target_extension);

        // An all-digit name would be mistaken for a card number on the next run.
        if is_numeric_stem(&base_name) {
            return Err(Error::rename(
                &asset.path,
                &renamed,
                format!(
                    "template '{}' renders the all-digit name '{base_name}'",
                    self.template.as_str()
                ),
            ));
        }

        ensure_vacant(&asset.path, &renamed)?;

        if self.config.dry_run {
            info!(
                "[dry run] {} -> {}",
                asset.relative_path,
                file_name(&renamed)
            );
        } else {
            fs::rename(&asset.path, &renamed)
                .map_err(|e| Error::rename(&asset.path, &renamed, e.to_string()))?;
            debug!("Renamed {} -> {}", asset.relative_path, file_name(&renamed));

            self.converter.convert(&renamed, &converted)?;
            info!(
                "✓ {} -> {} (+ .{} via {})",
                asset.relative_path,
                file_name(&renamed),
                self.config.target_extension,
                self.converter.name()
            );
        }

        Ok(Outcome::Relabeled(RelabeledAsset {
            original: asset.path.clone(),
            renamed,
            converted,
        }))
    }
}

/// Refuses to rename onto an existing path.
fn ensure_vacant(from: &Path, to: &Path) -> Result<()> {
    match to.try_exists() {
        Ok(false) => Ok(()),
        Ok(true) => Err(Error::rename(from, to, "destination already exists")),
        Err(e) => Err(Error::rename(from, to, e.to_string())),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;
    use std::sync::{Arc, Mutex};

    const CATALOG: &str = r#"[
        {
            "codename": "A1",
            "seriesName": "Genetic Apex",
            "cards": [{ "number": "1", "name": "Bulbasaur" }]
        },
        {
            "codename": "A1a",
            "seriesName": "Mythical Island",
            "cards": [
                { "number": "1", "name": "Mew" },
                { "number": "2", "name": "Mew ex" },
                { "number": "3", "name": "Mr. Mime" },
                { "number": "3", "name": "Shadowed" },
                { "number": "10", "name": "Celebi" }
            ]
        }
    ]"#;

    type Calls = Arc<Mutex<Vec<(PathBuf, PathBuf)>>>;

    /// Copies the input bytes to the output and records every call.
    struct CopyConverter {
        calls: Calls,
    }

    impl ImageConverter for CopyConverter {
        fn convert(&self, input: &Path, output: &Path) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((input.to_path_buf(), output.to_path_buf()));
            fs::copy(input, output)
                .map(|_| ())
                .map_err(|e| Error::conversion(input, output, e.to_string()))
        }

        fn name(&self) -> &str {
            "copy"
        }
    }

    struct FailingConverter;

    impl ImageConverter for FailingConverter {
        fn convert(&self, input: &Path, output: &Path) -> Result<()> {
            Err(Error::conversion(input, output, "exit status: 1"))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn setup() -> TempDir {
        let temp = TempDir::new().unwrap();
        temp.child("catalog.json").write_str(CATALOG).unwrap();
        temp.child("cards").create_dir_all().unwrap();
        temp
    }

    fn builder(temp: &TempDir) -> crate::ConfigBuilder {
        Config::builder()
            .catalog_path(temp.path().join("catalog.json"))
            .codename("A1a")
            .root_dir(temp.path().join("cards"))
    }

    fn relabeler(config: Config) -> (Relabeler, Calls) {
        let calls = Calls::default();
        let converter = CopyConverter {
            calls: Arc::clone(&calls),
        };
        (
            Relabeler::with_converter(config, Box::new(converter)).unwrap(),
            calls,
        )
    }

    fn run(temp: &TempDir) -> (RelabelReport, Calls) {
        let (relabeler, calls) = relabeler(builder(temp).build().unwrap());
        (relabeler.run().unwrap(), calls)
    }

    #[test]
    fn test_relabels_numbered_image() {
        let temp = setup();
        temp.child("cards/1.png").write_binary(b"mew").unwrap();

        let (report, calls) = run(&temp);

        assert!(report.is_success());
        assert_eq!(report.relabeled.len(), 1);
        assert_eq!(report.label, "Mythical-Island");
        assert!(!temp.child("cards/1.png").path().exists());
        assert!(temp.child("cards/1-Mew-Mythical-Island.png").path().exists());
        assert!(temp.child("cards/1-Mew-Mythical-Island.webp").path().exists());
        assert_eq!(
            fs::read(temp.child("cards/1-Mew-Mythical-Island.png").path()).unwrap(),
            b"mew"
        );
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_spaces_become_hyphens_and_punctuation_passes_through() {
        let temp = setup();
        temp.child("cards/2.png").write_binary(b"png").unwrap();
        temp.child("cards/3.png").write_binary(b"png").unwrap();

        let (report, _) = run(&temp);

        assert_eq!(report.relabeled.len(), 2);
        assert!(temp.child("cards/2-Mew-ex-Mythical-Island.png").path().exists());
        assert!(temp.child("cards/3-Mr.-Mime-Mythical-Island.webp").path().exists());
    }

    #[test]
    fn test_duplicate_card_numbers_first_match_wins() {
        let temp = setup();
        temp.child("cards/3.png").write_binary(b"png").unwrap();

        run(&temp);

        assert!(temp.child("cards/3-Mr.-Mime-Mythical-Island.png").path().exists());
        assert!(!temp.child("cards/3-Shadowed-Mythical-Island.png").path().exists());
    }

    #[test]
    fn test_explicit_label_and_template() {
        let temp = setup();
        temp.child("cards/1.png").write_binary(b"png").unwrap();

        let config = builder(&temp)
            .series_label("MI")
            .name_template("{label}_{number}_{name}")
            .target_extension("avif")
            .build()
            .unwrap();
        let (relabeler, _) = relabeler(config);
        relabeler.run().unwrap();

        assert!(temp.child("cards/MI_1_Mew.png").path().exists());
        assert!(temp.child("cards/MI_1_Mew.avif").path().exists());
    }

    #[test]
    fn test_non_numeric_stems_untouched() {
        let temp = setup();
        temp.child("cards/cover.png").write_binary(b"cover").unwrap();
        temp.child("cards/1a.png").write_binary(b"1a").unwrap();

        let (report, calls) = run(&temp);

        assert!(report.is_success());
        assert_eq!(report.skipped, 2);
        assert!(report.relabeled.is_empty());
        assert_eq!(fs::read(temp.child("cards/cover.png").path()).unwrap(), b"cover");
        assert_eq!(fs::read(temp.child("cards/1a.png").path()).unwrap(), b"1a");
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_card_is_collected() {
        let temp = setup();
        temp.child("cards/1.png").write_binary(b"png").unwrap();
        temp.child("cards/999.png").write_binary(b"png").unwrap();

        let (report, calls) = run(&temp);

        assert_eq!(report.relabeled.len(), 1);
        assert_eq!(report.failures.len(), 1);
        let failure = &report.failures[0];
        assert!(matches!(failure.error, Error::CardNotFound { ref number, .. } if number == "999"));
        assert!(failure.error.to_string().contains("999.png"));
        assert!(temp.child("cards/999.png").path().exists());
        assert_eq!(calls.lock().unwrap().len(), 1);

        let err = report.into_result().unwrap_err();
        assert!(matches!(err, Error::Multiple { count: 1, .. }));
    }

    #[test]
    fn test_fail_fast_returns_first_error() {
        let temp = setup();
        temp.child("cards/999.png").write_binary(b"png").unwrap();

        let config = builder(&temp)
            .failure_policy(FailurePolicy::FailFast)
            .build()
            .unwrap();
        let (relabeler, _) = relabeler(config);
        let err = relabeler.run().unwrap_err();

        assert!(matches!(err, Error::CardNotFound { .. }));
        assert!(temp.child("cards/999.png").path().exists());
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let temp = setup();
        temp.child("cards/1.png").write_binary(b"png").unwrap();
        temp.child("cards/2.png").write_binary(b"png").unwrap();

        let (first, _) = run(&temp);
        assert_eq!(first.relabeled.len(), 2);

        let (second, calls) = run(&temp);
        assert!(second.is_success());
        assert!(second.relabeled.is_empty());
        assert_eq!(second.skipped, 2);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_existing_destination_is_not_overwritten() {
        let temp = setup();
        temp.child("cards/1.png").write_binary(b"new").unwrap();
        temp.child("cards/1-Mew-Mythical-Island.png")
            .write_binary(b"old")
            .unwrap();

        let (report, calls) = run(&temp);

        assert_eq!(report.failures.len(), 1);
        assert!(matches!(report.failures[0].error, Error::Rename { .. }));
        assert_eq!(fs::read(temp.child("cards/1.png").path()).unwrap(), b"new");
        assert_eq!(
            fs::read(temp.child("cards/1-Mew-Mythical-Island.png").path()).unwrap(),
            b"old"
        );
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_conversion_failure_leaves_renamed_file() {
        let temp = setup();
        temp.child("cards/1.png").write_binary(b"png").unwrap();

        let config = builder(&temp).build().unwrap();
        let report = Relabeler::with_converter(config, Box::new(FailingConverter))
            .unwrap()
            .run()
            .unwrap();

        assert_eq!(report.failures.len(), 1);
        assert!(matches!(report.failures[0].error, Error::Conversion { .. }));
        assert!(temp.child("cards/1-Mew-Mythical-Island.png").path().exists());
        assert!(!temp.child("cards/1-Mew-Mythical-Island.webp").path().exists());
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let temp = setup();
        temp.child("cards/1.png").write_binary(b"png").unwrap();
        temp.child("cards/999.png").write_binary(b"png").unwrap();

        let config = builder(&temp).dry_run(true).build().unwrap();
        let (relabeler, calls) = relabeler(config);
        let report = relabeler.run().unwrap();

        assert!(report.dry_run);
        assert_eq!(report.relabeled.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(
            report.relabeled[0].renamed.file_name().unwrap(),
            "1-Mew-Mythical-Island.png"
        );
        assert!(temp.child("cards/1.png").path().exists());
        assert!(!temp.child("cards/1-Mew-Mythical-Island.png").path().exists());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_nested_images_renamed_in_place() {
        let temp = setup();
        temp.child("cards/promo/1.png").write_binary(b"png").unwrap();

        run(&temp);

        assert!(temp.child("cards/promo/1-Mew-Mythical-Island.png").path().exists());
        assert!(temp.child("cards/promo/1-Mew-Mythical-Island.webp").path().exists());
        assert!(!temp.child("cards/1-Mew-Mythical-Island.png").path().exists());
    }

    #[test]
    fn test_every_relabeled_asset_has_one_converted_sibling() {
        let temp = setup();
        for n in ["1", "2", "3"] {
            temp.child(format!("cards/{n}.png")).write_binary(b"png").unwrap();
        }

        let (report, calls) = run(&temp);

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), report.relabeled.len());
        for asset in &report.relabeled {
            assert!(asset.converted.exists());
            assert_eq!(asset.converted.file_stem(), asset.renamed.file_stem());
            assert!(calls.contains(&(asset.renamed.clone(), asset.converted.clone())));
        }
    }

    #[test]
    fn test_unknown_series_fails_before_touching_files() {
        let temp = setup();
        temp.child("cards/1.png").write_binary(b"png").unwrap();

        let config = builder(&temp).codename("B9").build().unwrap();
        let result = Relabeler::with_converter(config, Box::new(FailingConverter));

        assert!(matches!(result, Err(Error::SeriesNotFound { .. })));
        assert!(temp.child("cards/1.png").path().exists());
    }

    #[test]
    fn test_missing_catalog() {
        let temp = setup();
        let config = builder(&temp)
            .catalog_path(temp.path().join("missing.json"))
            .build()
            .unwrap();

        let result = Relabeler::with_converter(config, Box::new(FailingConverter));
        assert!(matches!(result, Err(Error::CatalogLoad { .. })));
    }

    #[test]
    fn test_report_file_written() {
        let temp = setup();
        temp.child("cards/1.png").write_binary(b"png").unwrap();
        temp.child("cards/999.png").write_binary(b"png").unwrap();
        let report_path = temp.path().join("out/report.json");

        let config = builder(&temp).report_path(&report_path).build().unwrap();
        let (relabeler, _) = relabeler(config);
        relabeler.run().unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(json["codename"], "A1a");
        assert_eq!(json["relabeled"].as_array().unwrap().len(), 1);
        assert_eq!(json["failures"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_all_digit_names_are_refused() {
        let temp = setup();
        temp.child("cards/1.png").write_binary(b"mew-image").unwrap();

        for _ in 0..2 {
            let config = builder(&temp).name_template("{number}0").build().unwrap();
            let (relabeler, calls) = relabeler(config);
            let report = relabeler.run().unwrap();

            assert!(report.relabeled.is_empty());
            assert_eq!(report.failures.len(), 1);
            assert!(matches!(report.failures[0].error, Error::Rename { .. }));
            assert!(report.failures[0].error.to_string().contains("all-digit"));
            assert!(calls.lock().unwrap().is_empty());
        }

        assert_eq!(fs::read(temp.child("cards/1.png").path()).unwrap(), b"mew-image");
        assert!(!temp.child("cards/10.png").path().exists());
        assert!(!temp.child("cards/100.png").path().exists());
    }

    #[test]
    fn test_fail_fast_still_writes_report() {
        let temp = setup();
        temp.child("cards/1.png").write_binary(b"png").unwrap();
        temp.child("cards/999.png").write_binary(b"png").unwrap();
        temp.child("cards/9999.png").write_binary(b"png").unwrap();
        let report_path = temp.path().join("report.json");

        let config = builder(&temp)
            .failure_policy(FailurePolicy::FailFast)
            .report_path(&report_path)
            .build()
            .unwrap();
        let (relabeler, _) = relabeler(config);
        let err = relabeler.run().unwrap_err();
        assert!(matches!(err, Error::CardNotFound { ref number, .. } if number == "999"));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(json["relabeled"].as_array().unwrap().len(), 1);
        assert_eq!(json["failures"].as_array().unwrap().len(), 1);
        assert!(json["failures"][0]["error"].as_str().unwrap().contains("999.png"));
        assert!(temp.child("cards/9999.png").path().exists());
    }
}
