//! Storage infrastructure: the app config file and the site record backends.
//!
//! - `config`: the editor's own TOML settings, read once at startup.
//! - `record_file`: the site record as a TOML file on disk.
//! - `memory`: the site record held in process.
//!
//! Both record backends implement
//! [`PersistenceAdapter`](crate::application::persistence::PersistenceAdapter),
//! so the application layer never learns where the record lives.

pub mod config;
pub mod memory;
pub mod record_file;
