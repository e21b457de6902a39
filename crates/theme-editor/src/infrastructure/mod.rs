//! Infrastructure layer for the theme editor.
//!
//! Contains the concrete adapters: file and in-memory record storage, the app
//! config file, local identity backends, the document style target, and the
//! command bridge used by frontends.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `theme_core`, but MUST NOT be imported by the `application` layer.

pub mod identity;
pub mod storage;
pub mod style;
pub mod ui_bridge;
