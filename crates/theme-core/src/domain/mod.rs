//! Domain entities for the theme editor.
//!
//! Everything in here is plain data plus pure functions.  The application
//! layer in `theme-editor` owns the mutable, shared state; this layer only
//! defines what a valid configuration looks like and how records combine.

/// Role classification and the tri-state editing privilege.
pub mod access;

/// Color literal validation.
pub mod color;

/// The fixed color and text key sets, and the style-property naming rule.
pub mod keys;

/// The configuration record, its complete key maps, and the overlay merge.
pub mod record;
