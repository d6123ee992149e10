//! File name templates for relabeled images.

use crate::catalog::Card;
use crate::error::{Error, Result};

/// Default template producing e.g. `1-Mew-Mythical-Island`.
pub const DEFAULT_NAME_TEMPLATE: &str = "{number}-{name}-{label}";

const NUMBER_PLACEHOLDER: &str = "{number}";
const NAME_PLACEHOLDER: &str = "{name}";
const LABEL_PLACEHOLDER: &str = "{label}";

/// Replaces spaces with hyphens.
///
/// Nothing else is touched: existing hyphens, punctuation and non-ASCII
/// characters pass through as-is.
#[must_use]
pub fn slugify(name: &str) -> String {
    name.replace(' ', "-")
}

/// Template for the base name (without extension) of a relabeled image.
///
/// Supported placeholders:
/// - `{number}`: the card number
/// - `{name}`: the card name, slugged
/// - `{label}`: the series label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTemplate {
    template: String,
}

impl NameTemplate {
    /// Parses and validates a template.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTemplate`] if the template lacks `{number}`,
    /// consists of nothing but `{number}`, or contains a path separator.
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();

        if !template.contains(NUMBER_PLACEHOLDER) {
            return Err(Error::invalid_template(
                &template,
                "Template must contain the {number} placeholder",
            ));
        }

        // Other all-digit results are refused per image when rendered.
        if template.trim() == NUMBER_PLACEHOLDER {
            return Err(Error::invalid_template(
                &template,
                "Template must add something besides {number}",
            ));
        }

        if template.contains('/') || template.contains('\\') {
            return Err(Error::invalid_template(
                &template,
                "Template must not contain path separators",
            ));
        }

        Ok(Self { template })
    }

    /// Returns the raw template string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Renders the base name for a card.
    ///
    /// Placeholders are substituted in a single pass, so braces inside card
    /// names or labels are copied verbatim.
    #[must_use]
    pub fn render(&self, card: &Card, label: &str) -> String {
        let name = slugify(&card.name);
        let mut rendered = String::with_capacity(self.template.len() + name.len() + label.len());
        let mut rest = self.template.as_str();

        while let Some(pos) = rest.find('{') {
            rendered.push_str(&rest[..pos]);
            let tail = &rest[pos..];

            let (value, consumed) = if tail.starts_with(NUMBER_PLACEHOLDER) {
                (card.number.as_str(), NUMBER_PLACEHOLDER.len())
            } else if tail.starts_with(NAME_PLACEHOLDER) {
                (name.as_str(), NAME_PLACEHOLDER.len())
            } else if tail.starts_with(LABEL_PLACEHOLDER) {
                (label, LABEL_PLACEHOLDER.len())
            } else {
                ("{", 1)
            };

            rendered.push_str(value);
            rest = &tail[consumed..];
        }

        rendered.push_str(rest);
        rendered
    }
}

impl Default for NameTemplate {
    fn default() -> Self {
        Self {
            template: DEFAULT_NAME_TEMPLATE.to_string(),
        }
    }
}
