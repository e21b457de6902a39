//! # theme-core
//!
//! Shared domain library for the live site theme editor: the fixed key sets,
//! color literals, the global [`ConfigRecord`], the overlay merge that folds a
//! loosely-shaped remote record onto compiled defaults, and the role /
//! privilege classification that gates editing.
//!
//! This crate has zero dependencies on I/O, async runtimes, or UI frameworks.
//!
//! # Architecture overview
//!
//! A running site carries exactly one configuration record made of two
//! sub-mappings:
//!
//! - **colors** – semantic color roles (`siteBg`, `primaryButton`, ...) mapped
//!   to color literals such as `#2563EB`.  Each color is mirrored into the
//!   page's style system as a CSS custom property (`--primary-button`).
//! - **texts** – semantic copy slots (`siteName`, `heroTitle`, ...) mapped to
//!   arbitrary strings.
//!
//! Both key sets are fixed at build time.  Every key always carries a value:
//! the maps in this crate are complete by construction, and anything missing
//! from a remote record falls back to the compiled default.
//!
//! The engine that owns the live record (store, access gate, editor) lives in
//! the `theme-editor` crate.

pub mod domain;

// Re-export the most-used types at the crate root so callers can write
// `theme_core::ConfigRecord` instead of `theme_core::domain::record::ConfigRecord`.
pub use domain::access::{Privilege, Role, RolePolicy};
pub use domain::color::{ColorParseError, ColorValue};
pub use domain::keys::{style_property_name, ColorKey, FieldKey, TextKey, UnknownKeyError};
pub use domain::record::{
    ColorMap, ConfigRecord, EditedKeys, FieldMap, FieldRejection, OverlayReport, RemoteRecord,
    TextMap,
};
