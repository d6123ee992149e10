use std::path::{Path, PathBuf};

/// An image file found under the target directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    /// Absolute (or root-joined) path to the file
    pub path: PathBuf,

    /// Path relative to the scanned root, for logs and reports
    pub relative_path: String,

    /// File name without extension
    pub stem: String,

    /// Extension without the leading dot
    pub extension: String,
}

impl ImageAsset {
    /// Builds an asset from a path, or `None` if the file name has no
    /// UTF-8 stem and extension.
    #[must_use]
    pub fn from_path(path: PathBuf, root: &Path) -> Option<Self> {
        let stem = path.file_stem()?.to_str()?.to_string();
        let extension = path.extension()?.to_str()?.to_string();
        let relative_path = pathdiff::diff_paths(&path, root)
            .unwrap_or_else(|| path.clone())
            .to_string_lossy()
            .to_string();

        Some(Self {
            path,
            relative_path,
            stem,
            extension,
        })
    }

    /// Returns true if the stem is a card number.
    #[must_use]
    pub fn is_numbered(&self) -> bool {
        is_numeric_stem(&self.stem)
    }

    /// Returns the sibling path `{base_name}.{extension}` next to this asset.
    #[must_use]
    pub fn sibling(&self, base_name: &str, extension: &str) -> PathBuf {
        self.path.with_file_name(format!("{base_name}.{extension}"))
    }
}

/// Returns true if `stem` is non-empty and made only of ASCII digits.
#[must_use]
pub fn is_numeric_stem(stem: &str) -> bool {
    !stem.is_empty() && stem.bytes().all(|b| b.is_ascii_digit())
}
