use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the card-relabel library.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// The catalog file is missing, unreadable, or not valid JSON.
    #[error("Failed to load catalog '{path}': {message}")]
    CatalogLoad {
        /// Catalog path
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// No series in the catalog carries the requested codename.
    #[error("Series '{codename}' not found in catalog")]
    SeriesNotFound {
        /// Requested codename
        codename: String,
    },

    /// A numbered image has no card with a matching number.
    #[error("No card numbered '{number}' for image '{path}'")]
    CardNotFound {
        /// Offending image
        path: PathBuf,
        /// Stem that was looked up
        number: String,
    },

    /// Renaming an image failed or would overwrite an existing file.
    #[error("Failed to rename '{from}' to '{to}': {message}")]
    Rename {
        /// Original path
        from: PathBuf,
        /// Destination path
        to: PathBuf,
        /// Error message
        message: String,
    },

    /// The external converter failed to produce the output file.
    #[error("Failed to convert '{input}' to '{output}': {message}")]
    Conversion {
        /// Image handed to the converter
        input: PathBuf,
        /// Requested output
        output: PathBuf,
        /// Error message
        message: String,
    },

    /// IO error with context about the file path.
    #[error("IO error accessing '{path}': {message}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Configuration validation error.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Detailed error message
        message: String,
    },

    /// Invalid naming template.
    #[error("Invalid name template '{template}': {reason}")]
    InvalidTemplate {
        /// The invalid template
        template: String,
        /// Reason why it's invalid
        reason: String,
    },

    /// JSON serialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message
        message: String,
    },

    /// Multiple errors occurred during processing.
    #[error("Multiple errors occurred during processing ({count} errors)")]
    Multiple {
        /// Number of errors
        count: usize,
        /// Collection of errors
        errors: Vec<Error>,
    },
}

impl Error {
    /// Creates an IO error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a catalog load error.
    #[must_use]
    pub fn catalog_load(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::CatalogLoad {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Creates a series-not-found error.
    #[must_use]
    pub fn series_not_found(codename: impl Into<String>) -> Self {
        Self::SeriesNotFound {
            codename: codename.into(),
        }
    }

    /// Creates a card-not-found error.
    #[must_use]
    pub fn card_not_found(path: impl Into<PathBuf>, number: impl Into<String>) -> Self {
        Self::CardNotFound {
            path: path.into(),
            number: number.into(),
        }
    }

    /// Creates a rename error.
    #[must_use]
    pub fn rename(
        from: impl Into<PathBuf>,
        to: impl Into<PathBuf>,
        message: impl Into<String>,
    ) -> Self {
        Self::Rename {
            from: from.into(),
            to: to.into(),
            message: message.into(),
        }
    }

    /// Creates a conversion error.
    #[must_use]
    pub fn conversion(
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        message: impl Into<String>,
    ) -> Self {
        Self::Conversion {
            input: input.into(),
            output: output.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid template error.
    #[must_use]
    pub fn invalid_template(template: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTemplate {
            template: template.into(),
            reason: reason.into(),
        }
    }

    /// Combines multiple errors into a single error.
    #[must_use]
    pub fn multiple(errors: Vec<Self>) -> Self {
        let count = errors.len();
        Self::Multiple { count, errors }
    }

    /// Returns true if this error concerns a single image rather than the whole run.
    #[must_use]
    pub const fn is_per_file(&self) -> bool {
        matches!(
            self,
            Self::CardNotFound { .. } | Self::Rename { .. } | Self::Conversion { .. }
        )
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::InvalidTemplate { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::config("test message");
        assert!(err.is_config());
        assert!(err.to_string().contains("test message"));
    }

    #[test]
    fn test_card_not_found_names_file() {
        let err = Error::card_not_found("cards/999.png", "999");
        assert!(err.is_per_file());
        assert!(err.to_string().contains("999.png"));
    }

    #[test]
    fn test_fatal_errors_are_not_per_file() {
        assert!(!Error::series_not_found("A1a").is_per_file());
        assert!(!Error::catalog_load("data.json", "missing").is_per_file());
    }

    #[test]
    fn test_conversion_reports_both_paths() {
        let err = Error::conversion("1-Mew.png", "1-Mew.webp", "exit status: 1");
        let msg = err.to_string();
        assert!(msg.contains("1-Mew.png"));
        assert!(msg.contains("1-Mew.webp"));
    }

    #[test]
    fn test_multiple_errors() {
        let errors = vec![
            Error::card_not_found("1.png", "1"),
            Error::card_not_found("2.png", "2"),
        ];
        let combined = Error::multiple(errors);
        assert!(combined.to_string().contains("2 errors"));
    }

    #[test]
    fn test_serialization_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: Error = json_err.into();
        assert!(err.to_string().contains("Serialization error"));
    }
}
