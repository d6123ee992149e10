use crate::error::{Error, Result};
use crate::filter::{FileFilter, FileFilterConfig};
use crate::naming::{NameTemplate, DEFAULT_NAME_TEMPLATE};
use std::path::PathBuf;

const DEFAULT_SOURCE_EXTENSION: &str = "png";
const DEFAULT_TARGET_EXTENSION: &str = "webp";
const DEFAULT_CONVERTER_PROGRAM: &str = "convert";
const DEFAULT_CONVERTER_ARGS: [&str; 2] = ["{input}", "{output}"];

/// What to do when a single image cannot be relabeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Keep going and report every failed image at the end
    #[default]
    CollectAndReport,
    /// Stop at the first failed image
    FailFast,
}

/// Configuration for a relabeling run.
///
/// Use [`Config::builder()`] to construct a new configuration.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// JSON catalog file
    pub catalog_path: PathBuf,

    /// Codename of the series to match images against
    pub codename: String,

    /// Directory scanned recursively for images
    pub root_dir: PathBuf,

    /// Label used in file names; defaults to the series' own label
    pub series_label: Option<String>,

    /// Base name template (supports {number}, {name}, {label})
    pub name_template: String,

    /// Extension of images to relabel, without the dot (matched case-sensitively)
    pub source_extension: String,

    /// Extension of converted copies, without the dot
    pub target_extension: String,

    /// External program invoked for conversion
    pub converter_program: String,

    /// Converter arguments (supports {input}, {output})
    pub converter_args: Vec<String>,

    /// Exclusion patterns applied while scanning
    pub file_filter_config: FileFilterConfig,

    /// Behaviour on per-image failures
    pub failure_policy: FailurePolicy,

    /// Dry run mode (no renames, no conversions)
    pub dry_run: bool,

    /// Optional path for a JSON run report
    pub report_path: Option<PathBuf>,
}

impl Config {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use card_relabel::Config;
    ///
    /// let config = Config::builder()
    ///     .catalog_path("data/pokemons.json")
    ///     .codename("A1a")
    ///     .root_dir(".")
    ///     .build()
    ///     .expect("valid configuration");
    /// assert_eq!(config.target_extension, "webp");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// The catalog itself is not opened here; a missing catalog surfaces as
    /// [`Error::CatalogLoad`] when the run starts.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Root directory doesn't exist or is not a directory
    /// - Codename is empty
    /// - Extensions are empty, dotted, contain separators, or are equal
    /// - Name template is invalid
    /// - Converter program is empty
    /// - An exclusion pattern is not a valid glob
    pub fn validate(&self) -> Result<()> {
        if !self.root_dir.exists() {
            return Err(Error::config(format!(
                "Root directory does not exist: {}",
                self.root_dir.display()
            )));
        }

        if !self.root_dir.is_dir() {
            return Err(Error::config(format!(
                "Root path is not a directory: {}",
                self.root_dir.display()
            )));
        }

        if self.codename.trim().is_empty() {
            return Err(Error::config("codename must not be empty"));
        }

        validate_extension("source_extension", &self.source_extension)?;
        validate_extension("target_extension", &self.target_extension)?;

        if self.source_extension == self.target_extension {
            return Err(Error::config(format!(
                "source_extension and target_extension must differ (both '{}')",
                self.source_extension
            )));
        }

        NameTemplate::new(self.name_template.as_str())?;

        if let Some(label) = &self.series_label {
            if label.trim().is_empty() {
                return Err(Error::config("series_label must not be empty"));
            }

            if label.contains('/') || label.contains('\\') {
                return Err(Error::config(format!(
                    "series_label must not contain path separators: {label}"
                )));
            }
        }

        if self.converter_program.trim().is_empty() {
            return Err(Error::config("converter_program must not be empty"));
        }

        if !self.converter_args.iter().any(|arg| arg.contains("{output}")) {
            tracing::warn!(
                "converter_args do not reference {{output}}; the converter must infer the output path"
            );
        }

        FileFilter::new(&self.file_filter_config)?;

        Ok(())
    }

    /// Returns the parsed name template.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTemplate`] if the template is invalid.
    pub fn parsed_template(&self) -> Result<NameTemplate> {
        NameTemplate::new(self.name_template.as_str())
    }
}

fn validate_extension(field: &str, extension: &str) -> Result<()> {
    if extension.is_empty() {
        return Err(Error::config(format!("{field} must not be empty")));
    }

    if extension.starts_with('.') {
        return Err(Error::config(format!(
            "{field} must not include the leading dot: '{extension}'"
        )));
    }

    if extension.contains('/') || extension.contains('\\') {
        return Err(Error::config(format!(
            "{field} must not contain path separators: '{extension}'"
        )));
    }

    Ok(())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::new(),
            codename: String::new(),
            root_dir: PathBuf::from("."),
            series_label: None,
            name_template: DEFAULT_NAME_TEMPLATE.to_string(),
            source_extension: DEFAULT_SOURCE_EXTENSION.to_string(),
            target_extension: DEFAULT_TARGET_EXTENSION.to_string(),
            converter_program: DEFAULT_CONVERTER_PROGRAM.to_string(),
            converter_args: DEFAULT_CONVERTER_ARGS.iter().map(ToString::to_string).collect(),
            file_filter_config: FileFilterConfig::default(),
            failure_policy: FailurePolicy::default(),
            dry_run: false,
            report_path: None,
        }
    }
}

/// Builder for creating a [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    catalog_path: Option<PathBuf>,
    codename: Option<String>,
    root_dir: Option<PathBuf>,
    series_label: Option<String>,
    name_template: Option<String>,
    source_extension: Option<String>,
    target_extension: Option<String>,
    converter_program: Option<String>,
    converter_args: Option<Vec<String>>,
    file_filter_config: Option<FileFilterConfig>,
    failure_policy: Option<FailurePolicy>,
    dry_run: bool,
    report_path: Option<PathBuf>,
}

impl ConfigBuilder {
    /// Sets the catalog file.
    #[must_use]
    pub fn catalog_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.catalog_path = Some(path.into());
        self
    }

    /// Sets the series codename.
    #[must_use]
    pub fn codename(mut self, codename: impl Into<String>) -> Self {
        self.codename = Some(codename.into());
        self
    }

    /// Sets the directory to scan.
    #[must_use]
    pub fn root_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.root_dir = Some(path.into());
        self
    }

    /// Overrides the series label used in file names.
    #[must_use]
    pub fn series_label(mut self, label: impl Into<String>) -> Self {
        self.series_label = Some(label.into());
        self
    }

    /// Sets the base name template.
    ///
    /// Template must contain the `{number}` placeholder.
    #[must_use]
    pub fn name_template(mut self, template: impl Into<String>) -> Self {
        self.name_template = Some(template.into());
        self
    }

    /// Sets the extension of images to relabel.
    #[must_use]
    pub fn source_extension(mut self, ext: impl Into<String>) -> Self {
        self.source_extension = Some(ext.into());
        self
    }

    /// Sets the extension of converted copies.
    #[must_use]
    pub fn target_extension(mut self, ext: impl Into<String>) -> Self {
        self.target_extension = Some(ext.into());
        self
    }

    /// Sets the converter program and its argument template.
    #[must_use]
    pub fn converter_command(mut self, program: impl Into<String>, args: Vec<String>) -> Self {
        self.converter_program = Some(program.into());
        self.converter_args = Some(args);
        self
    }

    /// Sets the converter program, keeping the default arguments.
    #[must_use]
    pub fn converter_program(mut self, program: impl Into<String>) -> Self {
        self.converter_program = Some(program.into());
        self
    }

    /// Sets the exclusion patterns.
    #[must_use]
    pub fn file_filter_config(mut self, config: FileFilterConfig) -> Self {
        self.file_filter_config = Some(config);
        self
    }

    /// Sets the per-image failure policy.
    #[must_use]
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = Some(policy);
        self
    }

    /// Enables dry run mode (no renames, no conversions).
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Sets the JSON report path.
    #[must_use]
    pub fn report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_path = Some(path.into());
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog path or codename is missing, or if
    /// validation fails.
    pub fn build(self) -> Result<Config> {
        let defaults = Config::default();

        let catalog_path = self
            .catalog_path
            .ok_or_else(|| Error::config("catalog_path is required"))?;
        let codename = self
            .codename
            .ok_or_else(|| Error::config("codename is required"))?;

        let config = Config {
            catalog_path,
            codename,
            root_dir: self.root_dir.unwrap_or(defaults.root_dir),
            series_label: self.series_label,
            name_template: self.name_template.unwrap_or(defaults.name_template),
            source_extension: self.source_extension.unwrap_or(defaults.source_extension),
            target_extension: self.target_extension.unwrap_or(defaults.target_extension),
            converter_program: self.converter_program.unwrap_or(defaults.converter_program),
            converter_args: self.converter_args.unwrap_or(defaults.converter_args),
            file_filter_config: self
                .file_filter_config
                .unwrap_or(defaults.file_filter_config),
            failure_policy: self.failure_policy.unwrap_or(defaults.failure_policy),
            dry_run: self.dry_run,
            report_path: self.report_path,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> ConfigBuilder {
        Config::builder().catalog_path("catalog.json").codename("A1a").root_dir(".")
    }

    #[test]
    fn test_default_config() {
        let config = builder().build().unwrap();
        assert_eq!(config.source_extension, "png");
        assert_eq!(config.target_extension, "webp");
        assert_eq!(config.name_template, DEFAULT_NAME_TEMPLATE);
        assert_eq!(config.converter_program, "convert");
        assert_eq!(config.converter_args, vec!["{input}", "{output}"]);
        assert_eq!(config.failure_policy, FailurePolicy::CollectAndReport);
        assert!(!config.dry_run);
    }

    #[test]
    fn test_builder_requires_catalog_and_codename() {
        assert!(Config::builder().codename("A1a").build().unwrap_err().is_config());
        assert!(Config::builder().catalog_path("c.json").build().unwrap_err().is_config());
    }

    #[test]
    fn test_empty_codename() {
        assert!(builder().codename("  ").build().is_err());
    }

    #[test]
    fn test_missing_root_dir() {
        let result = builder().root_dir("/nonexistent/card/images").build();
        assert!(result.unwrap_err().to_string().contains("does not exist"));
    }

    #[test]
    fn test_root_dir_is_file() {
        let temp = assert_fs::NamedTempFile::new("1.png").unwrap();
        std::fs::write(temp.path(), b"png").unwrap();
        let result = builder().root_dir(temp.path()).build();
        assert!(result.unwrap_err().to_string().contains("not a directory"));
    }

    #[test]
    fn test_extension_validation() {
        assert!(builder().source_extension("").build().is_err());
        assert!(builder().target_extension(".webp").build().is_err());
        assert!(builder().target_extension("a/b").build().is_err());
        assert!(builder().source_extension("webp").build().is_err());
        assert!(builder().source_extension("jpg").target_extension("avif").build().is_ok());
    }

    #[test]
    fn test_invalid_template() {
        let err = builder().name_template("{name}").build().unwrap_err();
        assert!(matches!(err, Error::InvalidTemplate { .. }));
    }

    #[test]
    fn test_label_with_separator() {
        assert!(builder().series_label("Mythical/Island").build().is_err());
    }

    #[test]
    fn test_empty_label() {
        assert!(builder().series_label("").build().unwrap_err().is_config());
        assert!(builder().series_label("   ").build().is_err());
        assert!(builder().series_label("Mythical-Island").build().is_ok());
    }

    #[test]
    fn test_empty_converter_program() {
        assert!(builder().converter_program("").build().is_err());
    }

    #[test]
    fn test_invalid_exclude_pattern() {
        let filter = FileFilterConfig::new().exclude_directories(vec!["[".to_string()]);
        assert!(builder().file_filter_config(filter).build().is_err());
    }

    #[test]
    fn test_converter_command() {
        let config = builder()
            .converter_command("cwebp", vec!["{input}".into(), "-o".into(), "{output}".into()])
            .build()
            .unwrap();
        assert_eq!(config.converter_program, "cwebp");
        assert_eq!(config.converter_args.len(), 3);
    }
}
