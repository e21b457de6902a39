//! Color literal values.
//!
//! The editor's color controls and the style system both speak hex color
//! literals.  A [`ColorValue`] is a validated literal: `#` followed by 3, 4, 6
//! or 8 hexadecimal digits.  The original spelling is kept verbatim (no case
//! folding, no expansion of the short forms) so that what an operator typed is
//! exactly what the page receives and what is persisted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a string is not accepted as a color literal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("color literal is empty")]
    Empty,

    #[error("color literal {0:?} must start with '#'")]
    MissingHash(String),

    #[error("color literal {0:?} must have 3, 4, 6 or 8 hex digits")]
    BadLength(String),

    #[error("color literal {0:?} contains a non-hex digit")]
    NotHex(String),
}

/// A validated hex color literal such as `#F8FAFC`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ColorValue(String);

impl ColorValue {
    /// Validates `literal` and wraps it.
    ///
    /// Surrounding whitespace is trimmed; everything else is kept as written.
    ///
    /// # Errors
    ///
    /// Returns [`ColorParseError`] describing the first problem found.
    pub fn parse(literal: &str) -> Result<Self, ColorParseError> {
        let trimmed = literal.trim();
        if trimmed.is_empty() {
            return Err(ColorParseError::Empty);
        }
        let Some(digits) = trimmed.strip_prefix('#') else {
            return Err(ColorParseError::MissingHash(trimmed.to_string()));
        };
        if !matches!(digits.len(), 3 | 4 | 6 | 8) {
            return Err(ColorParseError::BadLength(trimmed.to_string()));
        }
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorParseError::NotHex(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Wraps a compiled-in literal.  Only used for the default table, whose
    /// entries are covered by `test_every_default_color_is_a_valid_literal`.
    pub(crate) fn from_static(literal: &'static str) -> Self {
        Self(literal.to_string())
    }

    /// The literal exactly as it will be written to the style target.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ColorValue {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ColorValue {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ColorValue> for String {
    fn from(value: ColorValue) -> Self {
        value.0
    }
}
