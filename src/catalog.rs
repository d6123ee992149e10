//! Card catalog model and lookups.
//!
//! The catalog is a JSON array of series, each listing its cards. Lookups are
//! plain linear scans where the first match wins; catalogs hold a few hundred
//! cards at most.

use crate::error::{Error, Result};
use crate::naming::slugify;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

/// One catalog entry describing a single card.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Card {
    /// Card number within its series, matched against image stems
    pub number: String,

    /// Human-readable card name (may contain spaces)
    pub name: String,
}

/// A named set of cards identified by a short codename.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Series {
    /// Unique short identifier, e.g. `A1a`
    pub codename: String,

    /// Display name, e.g. `Mythical Island`
    #[serde(rename = "seriesName", default)]
    pub series_name: Option<String>,

    /// Cards in catalog order
    #[serde(default)]
    pub cards: Vec<Card>,
}

impl Series {
    /// Returns the first card whose number equals `number`.
    #[must_use]
    pub fn find_card(&self, number: &str) -> Option<&Card> {
        self.cards.iter().find(|card| card.number == number)
    }

    /// Returns the label used in generated file names.
    ///
    /// Falls back to the slugged series name, then to the codename.
    #[must_use]
    pub fn label(&self) -> String {
        self.series_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map_or_else(|| self.codename.clone(), slugify)
    }
}

/// Ordered collection of series loaded from a JSON file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    /// Series in file order
    pub series: Vec<Series>,
}

impl Catalog {
    /// Loads and parses a catalog file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CatalogLoad`] if the file cannot be read or is not a
    /// valid catalog.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::catalog_load(path, e))?;
        let catalog = Self::from_json(&content).map_err(|e| Error::catalog_load(path, e))?;

        debug!(
            "Loaded catalog {} ({} series)",
            path.display(),
            catalog.series.len()
        );
        Ok(catalog)
    }

    /// Parses a catalog from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns the underlying parse error if the JSON does not match the schema.
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    /// Returns the first series with the given codename.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SeriesNotFound`] if no series matches.
    pub fn find_series(&self, codename: &str) -> Result<&Series> {
        self.series
            .iter()
            .find(|series| series.codename == codename)
            .ok_or_else(|| Error::series_not_found(codename))
    }
}
