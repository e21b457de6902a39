//! The fixed key sets of the configuration record.
//!
//! Both sub-mappings of the record are keyed by closed enums.  Adding a key
//! means adding a variant, an entry in `ALL`, a wire name and a default; the
//! editor then grows a new control automatically because it iterates `ALL`.
//!
//! Wire names are camelCase (`primaryButton`).  The style system receives the
//! dashed lowercase form produced by [`style_property_name`]
//! (`--primary-button`).

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use thiserror::Error;

use super::color::ColorValue;

/// A key name that is not part of the compiled key set.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {section} key: {name:?}")]
pub struct UnknownKeyError {
    /// `"colors"` or `"texts"`.
    pub section: &'static str,
    /// The name as supplied.
    pub name: String,
}

/// Behaviour shared by [`ColorKey`] and [`TextKey`].
///
/// [`FieldMap`](super::record::FieldMap) is generic over this trait so that the
/// colors and texts mappings share one storage, serde and overlay
/// implementation.
pub trait FieldKey: Copy + Eq + Ord + Hash + fmt::Debug + Send + Sync + 'static {
    /// The value stored under each key.
    type Value: Clone + PartialEq + Eq + fmt::Debug + Send + Sync;

    /// Every key, in editor display order.
    const ALL: &'static [Self];

    /// Name of the record section holding these keys (`"colors"` / `"texts"`).
    const SECTION: &'static str;

    /// The camelCase wire name.
    fn as_str(self) -> &'static str;

    /// Position of this key in [`FieldKey::ALL`].
    fn index(self) -> usize;

    /// The compiled-in default value.
    fn default_value(self) -> Self::Value;

    /// Converts a loosely-typed remote value into a field value.
    ///
    /// Returns a short reason when the value has the wrong shape.
    fn accept(raw: &serde_json::Value) -> Result<Self::Value, String>;

    /// Looks a key up by its wire name.
    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_str() == name)
    }
}

// ── Colors ────────────────────────────────────────────────────────────────────

/// Semantic color roles of the site theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColorKey {
    SiteBg,
    HeaderBg,
    FooterBg,
    PrimaryButton,
    PrimaryText,
    HeaderText,
    FooterText,
}

impl FieldKey for ColorKey {
    type Value = ColorValue;

    const ALL: &'static [Self] = &[
        ColorKey::SiteBg,
        ColorKey::HeaderBg,
        ColorKey::FooterBg,
        ColorKey::PrimaryButton,
        ColorKey::PrimaryText,
        ColorKey::HeaderText,
        ColorKey::FooterText,
    ];

    const SECTION: &'static str = "colors";

    fn as_str(self) -> &'static str {
        match self {
            ColorKey::SiteBg => "siteBg",
            ColorKey::HeaderBg => "headerBg",
            ColorKey::FooterBg => "footerBg",
            ColorKey::PrimaryButton => "primaryButton",
            ColorKey::PrimaryText => "primaryText",
            ColorKey::HeaderText => "headerText",
            ColorKey::FooterText => "footerText",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    fn default_value(self) -> ColorValue {
        ColorValue::from_static(match self {
            ColorKey::SiteBg => "#F8FAFC",
            ColorKey::HeaderBg => "#FFFFFF",
            ColorKey::FooterBg => "#0F172A",
            ColorKey::PrimaryButton => "#2563EB",
            ColorKey::PrimaryText => "#0F172A",
            ColorKey::HeaderText => "#0F172A",
            ColorKey::FooterText => "#F8FAFC",
        })
    }

    fn accept(raw: &serde_json::Value) -> Result<ColorValue, String> {
        let literal = raw
            .as_str()
            .ok_or_else(|| format!("expected a color string, found {}", json_kind(raw)))?;
        ColorValue::parse(literal).map_err(|e| e.to_string())
    }
}

impl ColorKey {
    /// The custom-property name this color is mirrored under.
    pub fn style_property(self) -> String {
        style_property_name(self.as_str())
    }
}

// ── Texts ─────────────────────────────────────────────────────────────────────

/// Semantic copy slots of the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TextKey {
    SiteName,
    HeroTitle,
    HeroSubtitle,
    PrimaryCta,
    SecondaryCta,
    Slogan,
    FooterNote,
}

impl FieldKey for TextKey {
    type Value = String;

    const ALL: &'static [Self] = &[
        TextKey::SiteName,
        TextKey::HeroTitle,
        TextKey::HeroSubtitle,
        TextKey::PrimaryCta,
        TextKey::SecondaryCta,
        TextKey::Slogan,
        TextKey::FooterNote,
    ];

    const SECTION: &'static str = "texts";

    fn as_str(self) -> &'static str {
        match self {
            TextKey::SiteName => "siteName",
            TextKey::HeroTitle => "heroTitle",
            TextKey::HeroSubtitle => "heroSubtitle",
            TextKey::PrimaryCta => "primaryCta",
            TextKey::SecondaryCta => "secondaryCta",
            TextKey::Slogan => "slogan",
            TextKey::FooterNote => "footerNote",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    fn default_value(self) -> String {
        match self {
            TextKey::SiteName => "Northwind Supply",
            TextKey::HeroTitle => "Everything your workshop needs",
            TextKey::HeroSubtitle => "Tools, parts and materials delivered within 48 hours.",
            TextKey::PrimaryCta => "Browse catalog",
            TextKey::SecondaryCta => "Contact us",
            TextKey::Slogan => "Built to last.",
            TextKey::FooterNote => "All rights reserved.",
        }
        .to_string()
    }

    fn accept(raw: &serde_json::Value) -> Result<String, String> {
        raw.as_str()
            .map(str::to_string)
            .ok_or_else(|| format!("expected a string, found {}", json_kind(raw)))
    }
}

// ── Shared impls ──────────────────────────────────────────────────────────────

impl fmt::Display for ColorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorKey {
    type Err = UnknownKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_key(s)
    }
}

impl FromStr for TextKey {
    type Err = UnknownKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_key(s)
    }
}

fn parse_key<K: FieldKey>(name: &str) -> Result<K, UnknownKeyError> {
    K::from_name(name.trim()).ok_or_else(|| UnknownKeyError {
        section: K::SECTION,
        name: name.to_string(),
    })
}

fn json_kind(raw: &serde_json::Value) -> &'static str {
    match raw {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Converts a camelCase key into a dashed lowercase custom-property name.
///
/// Every ASCII uppercase letter starts a new dash-separated segment and is
/// lowercased; the result is prefixed with `--`.
///
/// ```rust
/// use theme_core::style_property_name;
///
/// assert_eq!(style_property_name("primaryButton"), "--primary-button");
/// assert_eq!(style_property_name("siteBg"), "--site-bg");
/// ```
pub fn style_property_name(key: &str) -> String {
    let mut name = String::with_capacity(key.len() + 6);
    name.push_str("--");
    for (i, c) in key.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                name.push('-');
            }
            name.push(c.to_ascii_lowercase());
        } else {
            name.push(c);
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_is_ordered_by_index() {
        for (i, key) in ColorKey::ALL.iter().enumerate() {
            assert_eq!(key.index(), i);
        }
        for (i, key) in TextKey::ALL.iter().enumerate() {
            assert_eq!(key.index(), i);
        }
    }

    #[test]
    fn test_wire_names_round_trip_through_from_str() {
        for key in ColorKey::ALL {
            assert_eq!(key.as_str().parse::<ColorKey>().unwrap(), *key);
        }
        for key in TextKey::ALL {
            assert_eq!(key.as_str().parse::<TextKey>().unwrap(), *key);
        }
    }

    #[test]
    fn test_unknown_key_reports_section() {
        let err = "navBg".parse::<ColorKey>().unwrap_err();
        assert_eq!(err.section, "colors");
        assert_eq!(err.name, "navBg");
        assert!("title".parse::<TextKey>().is_err());
    }

    #[test]
    fn test_every_default_color_is_a_valid_literal() {
        for key in ColorKey::ALL {
            let value = key.default_value();
            assert_eq!(ColorValue::parse(value.as_str()).as_ref(), Ok(&value));
        }
    }

    #[test]
    fn test_site_bg_default_matches_brand_palette() {
        assert_eq!(ColorKey::SiteBg.default_value().as_str(), "#F8FAFC");
    }

    #[test]
    fn test_style_property_name_splits_camel_case() {
        assert_eq!(style_property_name("primaryButton"), "--primary-button");
        assert_eq!(style_property_name("headerBg"), "--header-bg");
        assert_eq!(style_property_name("footerText"), "--footer-text");
    }

    #[test]
    fn test_style_property_name_handles_edge_shapes() {
        assert_eq!(style_property_name("slogan"), "--slogan");
        assert_eq!(style_property_name("Accent"), "--accent");
        assert_eq!(style_property_name("h1Color"), "--h1-color");
    }

    #[test]
    fn test_style_property_names_are_unique() {
        let names: HashSet<String> = ColorKey::ALL.iter().map(|k| k.style_property()).collect();
        assert_eq!(names.len(), ColorKey::ALL.len());
    }

    #[test]
    fn test_accept_rejects_wrong_shapes() {
        assert!(ColorKey::accept(&serde_json::json!(12)).is_err());
        assert!(ColorKey::accept(&serde_json::json!("teal")).is_err());
        assert!(TextKey::accept(&serde_json::json!(null)).is_err());
        assert_eq!(TextKey::accept(&serde_json::json!("")).unwrap(), "");
    }
}
