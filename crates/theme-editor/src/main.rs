//! theme-editor: command-line front end for the live site configuration.
//!
//! # Usage
//!
//! ```text
//! theme-editor [OPTIONS] <COMMAND>
//!
//! Commands:
//!   show                    Print the live record as JSON
//!   css                     Print the mirrored colors as a :root stylesheet
//!   editor                  Print the editor view for the signed-in identity
//!   set-color <KEY> <VALUE> Edit one color and save the record
//!   set-text  <KEY> <VALUE> Edit one text and save the record
//!
//! Options:
//!   --config <PATH>   App config file [default: platform config dir]
//!   --store  <PATH>   Site record file [default: from config]
//!   --as <IDENTITY>   Sign in as IDENTITY before running the command
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable             | Description                       |
//! |----------------------|-----------------------------------|
//! | `LIVETHEME_CONFIG`   | App config file path              |
//! | `LIVETHEME_STORE`    | Site record file path             |
//! | `LIVETHEME_IDENTITY` | Identity to sign in as            |
//! | `RUST_LOG`           | Log filter, overrides `[logging]` |
//!
//! Roles come from the `[profiles]` table of the app config; only identities
//! whose role is listed in `[access].privileged_roles` may edit.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use theme_editor::application::access_gate::{IdentityId, IdentityProvider};
use theme_editor::application::persistence::PersistenceAdapter;
use theme_editor::infrastructure::identity::{LocalSessions, ProfileTable};
use theme_editor::infrastructure::storage::config::{load_config, load_config_from, AppConfig};
use theme_editor::infrastructure::storage::record_file::RecordFile;
use theme_editor::infrastructure::ui_bridge::{self, AppState, CommandResult};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Live site theme and copy editor.
#[derive(Debug, Parser)]
#[command(name = "theme-editor", about = "Inspect and edit the live site theme and copy", version)]
struct Cli {
    /// Path of the app config file.
    #[arg(long, global = true, env = "LIVETHEME_CONFIG")]
    config: Option<PathBuf>,

    /// Path of the site record file.  Overrides `[site].record_path`.
    #[arg(long, global = true, env = "LIVETHEME_STORE")]
    store: Option<PathBuf>,

    /// Identity to sign in as.  Without it the session is anonymous.
    #[arg(long = "as", global = true, env = "LIVETHEME_IDENTITY")]
    identity: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the live record as JSON.
    Show,
    /// Print the mirrored colors as a `:root` stylesheet.
    Css,
    /// Open the editor and print what it shows.
    Editor,
    /// Set one color (e.g. `primaryButton '#ff0000'`) and save.
    SetColor { key: String, value: String },
    /// Set one text (e.g. `heroTitle 'Spring sale'`) and save.
    SetText { key: String, value: String },
}

impl Cli {
    fn load_app_config(&self) -> anyhow::Result<AppConfig> {
        match &self.config {
            Some(path) => load_config_from(path)
                .with_context(|| format!("loading config from {}", path.display())),
            None => load_config().context("loading config from the platform config dir"),
        }
    }

    fn record_path(&self, config: &AppConfig) -> anyhow::Result<PathBuf> {
        match &self.store {
            Some(path) => Ok(path.clone()),
            None => config.record_path().context("resolving the site record path"),
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_app_config()?;

    // `RUST_LOG` wins; otherwise the configured level applies.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let record_path = cli.record_path(&config)?;
    info!("site record: {}", record_path.display());

    let sessions = match &cli.identity {
        Some(id) => LocalSessions::signed_in(IdentityId::new(id.trim())),
        None => LocalSessions::new(),
    };
    let profiles = ProfileTable::new(config.profiles.clone());
    debug!("{} profile(s) configured", profiles.len());

    let state = AppState::new(
        &config,
        Arc::new(RecordFile::new(record_path)) as Arc<dyn PersistenceAdapter>,
        Arc::new(sessions) as Arc<dyn IdentityProvider>,
        Arc::new(profiles),
    );
    state.initialize().await;
    let privilege = state.gate.resolved().await;
    debug!("edit privilege: {privilege:?}");

    let outcome = run(cli.command, Arc::clone(&state)).await;
    state.shutdown();
    outcome
}

async fn run(command: Command, state: Arc<AppState>) -> anyhow::Result<()> {
    match command {
        Command::Show => print_json(ui_bridge::get_site_config(state).await),
        Command::Css => {
            let css = into_data(ui_bridge::get_stylesheet(state).await)?;
            print!("{css}");
            Ok(())
        }
        Command::Editor => {
            // Hidden for non-privileged sessions; the toggle error is expected then.
            let _ = ui_bridge::toggle_editor(Arc::clone(&state)).await;
            print_json(ui_bridge::get_editor_view(state).await)
        }
        Command::SetColor { key, value } => {
            into_data(ui_bridge::update_color(Arc::clone(&state), key, value).await)?;
            into_data(ui_bridge::save_site_config(Arc::clone(&state)).await)?;
            print_json(ui_bridge::get_site_config(state).await)
        }
        Command::SetText { key, value } => {
            into_data(ui_bridge::update_text(Arc::clone(&state), key, value).await)?;
            into_data(ui_bridge::save_site_config(Arc::clone(&state)).await)?;
            print_json(ui_bridge::get_site_config(state).await)
        }
    }
}

fn into_data<T: Serialize>(result: CommandResult<T>) -> anyhow::Result<T> {
    match (result.success, result.data) {
        (true, Some(data)) => Ok(data),
        _ => bail!(result.error.unwrap_or_else(|| "command failed".to_string())),
    }
}

fn print_json<T: Serialize>(result: CommandResult<T>) -> anyhow::Result<()> {
    let data = into_data(result)?;
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_set_color_with_identity() {
        // Arrange / Act
        let cli = Cli::parse_from([
            "theme-editor",
            "--as",
            "alice",
            "set-color",
            "primaryButton",
            "#ff0000",
        ]);

        // Assert
        assert_eq!(cli.identity.as_deref(), Some("alice"));
        assert!(matches!(
            cli.command,
            Command::SetColor { ref key, ref value } if key == "primaryButton" && value == "#ff0000"
        ));
    }

    #[test]
    fn test_global_options_may_follow_subcommand() {
        let cli = Cli::parse_from(["theme-editor", "css", "--store", "/tmp/site.toml"]);

        assert!(matches!(cli.command, Command::Css));
        assert_eq!(cli.store, Some(PathBuf::from("/tmp/site.toml")));
    }

    #[test]
    fn test_store_flag_overrides_config() {
        let cli = Cli::parse_from(["theme-editor", "--store", "/tmp/a.toml", "show"]);
        let mut config = AppConfig::default();
        config.site.record_path = Some(PathBuf::from("/tmp/b.toml"));

        assert_eq!(cli.record_path(&config).unwrap(), PathBuf::from("/tmp/a.toml"));
    }

    #[test]
    fn test_into_data_surfaces_command_error() {
        let err = into_data::<()>(CommandResult::err("save failed: disk full")).unwrap_err();
        assert_eq!(err.to_string(), "save failed: disk full");
    }

    #[test]
    fn test_into_data_accepts_unit_success() {
        assert!(into_data(CommandResult::ok(())).is_ok());
    }
}
