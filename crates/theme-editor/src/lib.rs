//! theme-editor library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does theme-editor do?
//!
//! It keeps one site-wide configuration record (a color palette plus named
//! copy texts) live in memory, mirrors the palette into the page's style
//! system, lets privileged operators edit it, and persists it on request.
//!
//! ```text
//!             ┌──────────────┐  load()/save()  ┌────────────────────┐
//!  page  ───► │ ConfigStore  │ ◄─────────────► │ PersistenceAdapter │
//!  views      └──────┬───────┘                 └────────────────────┘
//!                    │ set_property(--site-bg, …)
//!                    ▼
//!             ┌──────────────┐
//!             │ StyleTarget  │  (one writer: the store)
//!             └──────────────┘
//!
//!             ┌──────────────┐  Privilege   ┌───────────────┐
//!  session ─► │ AccessGate   │ ───────────► │ EditorSurface │ ─► ConfigStore
//!             └──────────────┘              └───────────────┘
//! ```

/// Application layer: the store, the gate, the editor and the seams they use.
pub mod application;

/// Infrastructure layer: storage, identity, style target and command bridge.
pub mod infrastructure;
