//! Application layer use cases.
//!
//! Everything in here depends on traits (`PersistenceAdapter`,
//! `IdentityProvider`, `RoleLookup`, `StyleTarget`) rather than concrete
//! backends, so each piece can be driven from tests with in-memory doubles.
//!
//! # Sub-modules
//!
//! - **`config_store`** – Owns the live `ConfigRecord`, publishes snapshots,
//!   mirrors colors into the style target, and runs the single initial load.
//!
//! - **`access_gate`** – Resolves whether the current session may edit, and
//!   keeps that answer current as the session changes.
//!
//! - **`editor_surface`** – The privileged-only editing panel: UI state, one
//!   control per key, and the save trigger.
//!
//! - **`persistence`** – The boundary to whatever stores the record remotely.

pub mod access_gate;
pub mod config_store;
pub mod editor_surface;
pub mod persistence;
