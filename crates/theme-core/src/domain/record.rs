//! The global configuration record and the overlay merge.
//!
//! [`ConfigRecord`] is the one record shared by the whole site.  Its two
//! sub-mappings are [`FieldMap`]s: dense, complete maps with exactly one value
//! per compiled key, so "a key without a value" cannot be represented.
//!
//! Remote data arrives as a [`RemoteRecord`], which is deliberately loose (any
//! JSON shape).  [`ConfigRecord::overlay`] folds it onto a base record one
//! field at a time:
//!
//! ```text
//!   base (defaults)      remote                 result
//!   siteBg   #F8FAFC  +  siteBg  "#111111"  ->  siteBg   #111111
//!   headerBg #FFFFFF     (absent)               headerBg #FFFFFF
//!   footerBg #0F172A     footerBg 42            footerBg #0F172A   (rejected)
//!                        navBg "#000"           (ignored, unknown key)
//! ```
//!
//! Nothing in a remote record can make the merge fail; problems are collected
//! in an [`OverlayReport`] for the caller to log.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::marker::PhantomData;

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::color::ColorValue;
use super::keys::{ColorKey, FieldKey, TextKey, UnknownKeyError};

// ── FieldMap ──────────────────────────────────────────────────────────────────

/// A complete mapping from every key of `K` to a value.
///
/// Values are stored densely in `K::ALL` order, which is also the iteration
/// order and therefore the editor's field order.
pub struct FieldMap<K: FieldKey> {
    values: Vec<K::Value>,
    _keys: PhantomData<K>,
}

/// The `colors` sub-mapping.
pub type ColorMap = FieldMap<ColorKey>;

/// The `texts` sub-mapping.
pub type TextMap = FieldMap<TextKey>;

impl<K: FieldKey> FieldMap<K> {
    /// Every key mapped to its compiled default.
    pub fn defaults() -> Self {
        Self {
            values: K::ALL.iter().map(|k| k.default_value()).collect(),
            _keys: PhantomData,
        }
    }

    /// Builds a map from explicit entries.
    ///
    /// Keys that do not appear in `entries` take their compiled default; they
    /// are not inherited from any other map.  Later entries win over earlier
    /// ones for the same key.
    pub fn from_entries(entries: impl IntoIterator<Item = (K, K::Value)>) -> Self {
        let mut map = Self::defaults();
        for (key, value) in entries {
            map.set(key, value);
        }
        map
    }

    /// The value for `key`.
    pub fn get(&self, key: K) -> &K::Value {
        &self.values[key.index()]
    }

    /// Replaces the value for `key`.
    pub fn set(&mut self, key: K, value: K::Value) {
        self.values[key.index()] = value;
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, key: K, value: K::Value) -> Self {
        self.set(key, value);
        self
    }

    /// Iterates `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &K::Value)> + '_ {
        K::ALL.iter().copied().zip(self.values.iter())
    }

    /// Number of keys (always `K::ALL.len()`).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ColorMap {
    /// The style-system projection: `(custom-property name, literal)` per key.
    pub fn style_properties(&self) -> impl Iterator<Item = (String, &ColorValue)> + '_ {
        self.iter().map(|(key, value)| (key.style_property(), value))
    }
}

impl<K: FieldKey> Default for FieldMap<K> {
    fn default() -> Self {
        Self::defaults()
    }
}

impl<K: FieldKey> Clone for FieldMap<K> {
    fn clone(&self) -> Self {
        Self {
            values: self.values.clone(),
            _keys: PhantomData,
        }
    }
}

impl<K: FieldKey> PartialEq for FieldMap<K> {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl<K: FieldKey> Eq for FieldMap<K> {}

impl<K: FieldKey> fmt::Debug for FieldMap<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(k, v)| (k.as_str(), v)))
            .finish()
    }
}

impl<K: FieldKey> Serialize for FieldMap<K>
where
    K::Value: Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key.as_str(), value)?;
        }
        map.end()
    }
}

/// Strict deserialization: unknown keys and invalid values are errors, missing
/// keys take their defaults.  Remote data goes through [`RemoteRecord`] instead.
impl<'de, K: FieldKey> Deserialize<'de> for FieldMap<K>
where
    K::Value: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, K::Value>::deserialize(deserializer)?;
        let mut map = Self::defaults();
        for (name, value) in raw {
            let key = K::from_name(&name).ok_or_else(|| {
                D::Error::custom(UnknownKeyError {
                    section: K::SECTION,
                    name,
                })
            })?;
            map.set(key, value);
        }
        Ok(map)
    }
}

// ── ConfigRecord ──────────────────────────────────────────────────────────────

/// The single global configuration record: colors plus texts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRecord {
    #[serde(default)]
    pub colors: ColorMap,
    #[serde(default)]
    pub texts: TextMap,
}

impl ConfigRecord {
    /// The compiled-in record.
    pub fn defaults() -> Self {
        Self::default()
    }

    /// Builds a record from a remote one, overlaid onto the compiled defaults.
    pub fn from_remote(remote: &RemoteRecord) -> (Self, OverlayReport) {
        Self::defaults().overlay(remote, &EditedKeys::default())
    }

    /// Overlays `remote` onto `self`, field by field.
    ///
    /// For every well-formed field in `remote` whose key is known and not in
    /// `keep`, the remote value replaces the value in `self`.  Everything else
    /// keeps the value from `self`.  The returned report lists what was
    /// applied, kept, rejected and ignored.
    pub fn overlay(&self, remote: &RemoteRecord, keep: &EditedKeys) -> (Self, OverlayReport) {
        let mut next = self.clone();
        let mut report = OverlayReport::default();

        match &remote.root {
            Value::Null => {}
            Value::Object(root) => {
                overlay_section(&mut next.colors, root.get(ColorKey::SECTION), &keep.colors, &mut report);
                overlay_section(&mut next.texts, root.get(TextKey::SECTION), &keep.texts, &mut report);
                report.unknown.extend(
                    root.keys()
                        .filter(|name| *name != ColorKey::SECTION && *name != TextKey::SECTION)
                        .cloned(),
                );
            }
            _ => report.rejected.push(FieldRejection {
                path: "record".to_string(),
                reason: "expected an object".to_string(),
            }),
        }

        (next, report)
    }
}

fn overlay_section<K: FieldKey>(
    map: &mut FieldMap<K>,
    section: Option<&Value>,
    keep: &BTreeSet<K>,
    report: &mut OverlayReport,
) {
    let fields = match section {
        None | Some(Value::Null) => return,
        Some(Value::Object(fields)) => fields,
        Some(_) => {
            report.rejected.push(FieldRejection {
                path: K::SECTION.to_string(),
                reason: "expected an object".to_string(),
            });
            return;
        }
    };

    for (name, raw) in fields {
        let path = format!("{}.{}", K::SECTION, name);
        match K::from_name(name) {
            None => report.unknown.push(path),
            Some(key) if keep.contains(&key) => report.kept_local.push(path),
            Some(key) => match K::accept(raw) {
                Ok(value) => {
                    map.set(key, value);
                    report.applied += 1;
                }
                Err(reason) => report.rejected.push(FieldRejection { path, reason }),
            },
        }
    }
}

// ── RemoteRecord ──────────────────────────────────────────────────────────────

/// A configuration record as returned by a persistence backend.
///
/// The payload is kept as untyped JSON so that missing keys, unknown keys and
/// wrong-shaped values survive until the overlay merge, where each of them is
/// handled individually.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RemoteRecord {
    root: Value,
}

impl RemoteRecord {
    /// Wraps an already-decoded JSON value.
    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// Decodes a JSON document.
    ///
    /// # Errors
    ///
    /// Only syntax errors fail; any well-formed JSON value is accepted.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text).map(Self::from_value)
    }

    /// The raw payload.
    pub fn as_value(&self) -> &Value {
        &self.root
    }
}

impl From<&ConfigRecord> for RemoteRecord {
    fn from(record: &ConfigRecord) -> Self {
        let colors = record
            .colors
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), Value::String(v.to_string())))
            .collect();
        let texts = record
            .texts
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), Value::String(v.clone())))
            .collect();

        let mut root = serde_json::Map::new();
        root.insert(ColorKey::SECTION.to_string(), Value::Object(colors));
        root.insert(TextKey::SECTION.to_string(), Value::Object(texts));
        Self::from_value(Value::Object(root))
    }
}

// ── Overlay bookkeeping ───────────────────────────────────────────────────────

/// Keys edited locally since a load started.  The overlay never touches them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditedKeys {
    pub colors: BTreeSet<ColorKey>,
    pub texts: BTreeSet<TextKey>,
}

impl EditedKeys {
    /// `true` when no key was edited.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty() && self.texts.is_empty()
    }
}

/// A remote field that was not applied because of its shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRejection {
    /// Dotted path such as `colors.siteBg`.
    pub path: String,
    pub reason: String,
}

/// Outcome of one overlay merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlayReport {
    /// Number of remote fields written into the result.
    pub applied: usize,
    /// Remote fields ignored because the key was edited locally.
    pub kept_local: Vec<String>,
    /// Remote fields ignored because of their shape.
    pub rejected: Vec<FieldRejection>,
    /// Remote fields or sections that are not part of the key set.
    pub unknown: Vec<String>,
}

impl OverlayReport {
    /// `true` when every remote field was either applied or kept locally.
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty() && self.unknown.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
