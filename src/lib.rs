//! # card-relabel
//!
//! Renames numbered trading-card images after their catalog entry and
//! produces a converted copy of each one.
//!
//! ## Features
//!
//! - Recursive scan for images of one source format (e.g. `png`)
//! - Card lookup by file stem in one series of a JSON catalog
//! - Configurable name template, e.g. `1-Mew-Mythical-Island.png`
//! - Conversion through any external tool (ImageMagick by default)
//! - Collect-and-report or fail-fast handling of per-image failures
//! - Dry runs and JSON run reports
//!
//! ## Quick Start
//!
//! ```no_run
//! use card_relabel::{Config, Relabeler};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::builder()
//!     .catalog_path("data/pokemons.json")
//!     .codename("A1a")
//!     .root_dir("images/cards/mythical-island")
//!     .target_extension("webp")
//!     .build()?;
//!
//! Relabeler::new(config)?.run()?.into_result()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! 1. **Catalog**: loads the JSON catalog and selects one series
//! 2. **Scanner**: finds candidate images under the root directory
//! 3. **Relabeler**: matches stems to cards, renames, and converts
//! 4. **Report**: summarizes the run, optionally as JSON

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod asset;
mod config;
mod converter;
mod error;
mod filter;
mod naming;
mod relabel;
mod report;
mod scanner;

pub mod catalog;

pub use asset::{is_numeric_stem, ImageAsset};
pub use catalog::{Card, Catalog, Series};
pub use config::{Config, ConfigBuilder, FailurePolicy};
pub use converter::{CommandConverter, ImageConverter};
pub use error::{Error, Result};
pub use filter::FileFilterConfig;
pub use naming::{slugify, NameTemplate, DEFAULT_NAME_TEMPLATE};
pub use relabel::{FailedAsset, RelabelReport, RelabeledAsset, Relabeler};

/// Runs a complete relabeling pass with the given configuration.
///
/// Per-image failures are returned inside the report; use
/// [`RelabelReport::into_result`] to turn them into an error.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration is invalid
/// - The catalog cannot be loaded or lacks the series
/// - A per-image step fails under [`FailurePolicy::FailFast`]
/// - The report file cannot be written
///
/// # Examples
///
/// ```no_run
/// use card_relabel::{Config, run};
///
/// # fn main() -> anyhow::Result<()> {
/// let config = Config::builder()
///     .catalog_path("data/pokemons.json")
///     .codename("A1a")
///     .root_dir(".")
///     .dry_run(true)
///     .build()?;
///
/// let report = run(config)?;
/// report.print_summary();
/// # Ok(())
/// # }
/// ```
pub fn run(config: Config) -> Result<RelabelReport> {
    Relabeler::new(config)?.run()
}
