//! Command bridge: exposes the editor engine to a web or desktop frontend.
//!
//! Every command takes the shared [`AppState`] and returns a
//! [`CommandResult`], so the frontend always receives the same JSON shape:
//! `{ success: bool, data: T | null, error: string | null }`.
//!
//! # Data Transfer Objects (DTOs)
//!
//! Internal types (`ColorKey`, `ColorValue`, `EditorView`) are converted into
//! plain serialisable structs here.  Field keys travel as their camelCase wire
//! names (`"primaryButton"`), colors as their literal (`"#2563EB"`).
//!
//! The bridge is the only place where untrusted strings from the frontend are
//! turned into typed keys and colors; bad input comes back as
//! `success: false` with a message, never as a panic.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use theme_core::{ColorKey, ConfigRecord, TextKey};
use tracing::{debug, info};

use crate::application::{
    access_gate::{AccessGate, IdentityProvider, RoleLookup},
    config_store::{ConfigStore, LoadOutcome, StyleTarget},
    editor_surface::{EditorError, EditorSurface, EditorView, NoticeKind, SaveOutcome, Section},
    persistence::PersistenceAdapter,
};
use crate::infrastructure::{storage::config::AppConfig, style::DocumentStyle};

// ── Shared application state ──────────────────────────────────────────────────

/// Everything one mounted site needs, wired together.
///
/// Construction must happen inside a tokio runtime because the access gate
/// starts its observer task immediately.
pub struct AppState {
    pub store: Arc<ConfigStore>,
    pub style: Arc<DocumentStyle>,
    pub gate: AccessGate,
    pub editor: EditorSurface,
    persistence: Arc<dyn PersistenceAdapter>,
}

impl AppState {
    /// Wires store, gate and editor around the given backends.
    pub fn new(
        config: &AppConfig,
        persistence: Arc<dyn PersistenceAdapter>,
        identity: Arc<dyn IdentityProvider>,
        roles: Arc<dyn RoleLookup>,
    ) -> Arc<Self> {
        let style = Arc::new(DocumentStyle::new());
        let store = Arc::new(ConfigStore::new(Arc::clone(&style) as Arc<dyn StyleTarget>));
        let gate = AccessGate::activate(identity, roles, config.role_policy());
        let editor = EditorSurface::new(Arc::clone(&store), gate.subscribe(), Arc::clone(&persistence))
            .with_notice_ttl(config.notice_ttl());

        Arc::new(Self {
            store,
            style,
            gate,
            editor,
            persistence,
        })
    }

    /// Runs the store's single initial load.
    pub async fn initialize(&self) -> LoadOutcome {
        let outcome = self.store.initialize(self.persistence.as_ref()).await;
        debug!("initial load outcome: {outcome:?}");
        outcome
    }

    /// Stops the gate and the store; late results are discarded.
    pub fn shutdown(&self) {
        self.gate.deactivate();
        self.store.deactivate();
        info!("site state shut down");
    }
}

// ── Data Transfer Objects ─────────────────────────────────────────────────────

/// One field of the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDto {
    pub key: String,
    pub value: String,
}

/// The whole record, in editor order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfigDto {
    pub colors: Vec<FieldDto>,
    pub texts: Vec<FieldDto>,
}

impl From<&ConfigRecord> for SiteConfigDto {
    fn from(record: &ConfigRecord) -> Self {
        Self {
            colors: record
                .colors
                .iter()
                .map(|(key, value)| FieldDto {
                    key: key.to_string(),
                    value: value.to_string(),
                })
                .collect(),
            texts: record
                .texts
                .iter()
                .map(|(key, value)| FieldDto {
                    key: key.to_string(),
                    value: value.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeDto {
    pub kind: NoticeKind,
    pub message: String,
}

/// What the frontend should draw for the editor.
///
/// `visible == false` means draw nothing at all; the other fields are then
/// empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorViewDto {
    pub visible: bool,
    pub open: bool,
    pub active_section: Option<Section>,
    pub colors: Vec<FieldDto>,
    pub texts: Vec<FieldDto>,
    pub save_enabled: bool,
    pub notice: Option<NoticeDto>,
}

impl From<&EditorView> for EditorViewDto {
    fn from(view: &EditorView) -> Self {
        let closed = |visible| Self {
            visible,
            open: false,
            active_section: None,
            colors: Vec::new(),
            texts: Vec::new(),
            save_enabled: false,
            notice: None,
        };
        match view {
            EditorView::Hidden => closed(false),
            EditorView::Collapsed => closed(true),
            EditorView::Panel(panel) => Self {
                visible: true,
                open: true,
                active_section: Some(panel.active_section),
                colors: panel
                    .colors
                    .iter()
                    .map(|c| FieldDto {
                        key: c.key.to_string(),
                        value: c.value.to_string(),
                    })
                    .collect(),
                texts: panel
                    .texts
                    .iter()
                    .map(|t| FieldDto {
                        key: t.key.to_string(),
                        value: t.value.clone(),
                    })
                    .collect(),
                save_enabled: panel.save_enabled,
                notice: panel.notice.as_ref().map(|n| NoticeDto {
                    kind: n.kind,
                    message: n.message.clone(),
                }),
            },
        }
    }
}

/// Unified response wrapper used by every command.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResult<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

impl<T: Serialize> From<Result<T, EditorError>> for CommandResult<T> {
    fn from(result: Result<T, EditorError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::err(e.to_string()),
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Returns the live record.  Available to every visitor.
///
/// # Example (frontend)
/// ```ts
/// const { data } = await invoke<SiteConfigDto>('get_site_config');
/// ```
pub async fn get_site_config(state: Arc<AppState>) -> CommandResult<SiteConfigDto> {
    CommandResult::ok(SiteConfigDto::from(state.store.snapshot().as_ref()))
}

/// Returns the mirrored colors as a `:root { ... }` stylesheet.
pub async fn get_stylesheet(state: Arc<AppState>) -> CommandResult<String> {
    CommandResult::ok(state.style.to_css())
}

/// Returns the editor view for the current session.
pub async fn get_editor_view(state: Arc<AppState>) -> CommandResult<EditorViewDto> {
    CommandResult::ok(EditorViewDto::from(&state.editor.render()))
}

/// Opens or closes the panel; returns whether it is now open.
pub async fn toggle_editor(state: Arc<AppState>) -> CommandResult<bool> {
    state.editor.toggle().into()
}

pub async fn select_section(state: Arc<AppState>, section: String) -> CommandResult<()> {
    match Section::from_name(&section) {
        Some(section) => state.editor.select_section(section).into(),
        None => CommandResult::err(format!("unknown editor section: {section:?}")),
    }
}

/// Sets one color by wire name, e.g. `("primaryButton", "#ff0000")`.
pub async fn update_color(state: Arc<AppState>, key: String, value: String) -> CommandResult<()> {
    let result = key
        .parse::<ColorKey>()
        .map_err(EditorError::from)
        .and_then(|key| state.editor.set_color(key, &value));
    result.into()
}

/// Sets one text by wire name, e.g. `("heroTitle", "Spring sale")`.
pub async fn update_text(state: Arc<AppState>, key: String, value: String) -> CommandResult<()> {
    let result = key
        .parse::<TextKey>()
        .map_err(EditorError::from)
        .and_then(|key| state.editor.set_text(key, value));
    result.into()
}

/// Persists the whole live record.
pub async fn save_site_config(state: Arc<AppState>) -> CommandResult<()> {
    match state.editor.save().await {
        SaveOutcome::Saved => CommandResult::ok(()),
        SaveOutcome::AlreadyInFlight => CommandResult::err("a save is already in progress"),
        SaveOutcome::NotPermitted => CommandResult::err("saving requires a privileged session"),
        SaveOutcome::Failed(reason) => CommandResult::err(format!("save failed: {reason}")),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::access_gate::IdentityId;
    use crate::infrastructure::identity::{LocalSessions, ProfileTable};
    use crate::infrastructure::storage::memory::MemoryStore;
    use theme_core::{FieldKey, Privilege};

    /// Builds a state signed in as `identity` with alice as the only admin.
    async fn make_state(identity: Option<&str>) -> (Arc<AppState>, Arc<MemoryStore>) {
        let memory = Arc::new(MemoryStore::new());
        let sessions = match identity {
            Some(id) => LocalSessions::signed_in(IdentityId::new(id)),
            None => LocalSessions::new(),
        };
        let state = AppState::new(
            &AppConfig::default(),
            Arc::clone(&memory) as Arc<dyn PersistenceAdapter>,
            Arc::new(sessions),
            Arc::new(ProfileTable::new([("alice", "admin"), ("bob", "customer")])),
        );
        state.initialize().await;
        state.gate.resolved().await;
        (state, memory)
    }

    #[tokio::test]
    async fn test_get_site_config_lists_every_key() {
        // Arrange
        let (state, _) = make_state(None).await;

        // Act
        let result = get_site_config(state).await;

        // Assert
        assert!(result.success);
        let dto = result.data.unwrap();
        assert_eq!(dto.colors.len(), ColorKey::ALL.len());
        assert_eq!(dto.texts.len(), TextKey::ALL.len());
        assert_eq!(dto.colors[0], FieldDto { key: "siteBg".into(), value: "#F8FAFC".into() });
    }

    #[tokio::test]
    async fn test_editor_view_is_invisible_for_visitors() {
        let (state, _) = make_state(Some("bob")).await;

        let dto = get_editor_view(Arc::clone(&state)).await.data.unwrap();

        assert!(!dto.visible);
        assert!(dto.colors.is_empty() && dto.texts.is_empty());
        assert!(!toggle_editor(state).await.success);
    }

    #[tokio::test]
    async fn test_admin_can_open_edit_and_save() {
        // Arrange
        let (state, memory) = make_state(Some("alice")).await;
        assert_eq!(state.gate.privilege(), Privilege::Granted);

        // Act
        assert_eq!(toggle_editor(Arc::clone(&state)).await.data, Some(true));
        let color = update_color(Arc::clone(&state), "primaryButton".into(), "#ff0000".into()).await;
        let text = update_text(Arc::clone(&state), "heroTitle".into(), "Spring sale".into()).await;
        let saved = save_site_config(Arc::clone(&state)).await;

        // Assert
        assert!(color.success && text.success && saved.success);
        let payload = memory.payload().await.unwrap();
        assert_eq!(payload["colors"]["primaryButton"], "#ff0000");
        assert_eq!(payload["texts"]["heroTitle"], "Spring sale");
        let css = get_stylesheet(Arc::clone(&state)).await.data.unwrap();
        assert!(css.contains("--primary-button: #ff0000;"));
        let view = get_editor_view(state).await.data.unwrap();
        assert_eq!(view.notice.map(|n| n.kind), Some(NoticeKind::Success));
    }

    #[tokio::test]
    async fn test_update_color_rejects_unknown_key_and_bad_literal() {
        let (state, _) = make_state(Some("alice")).await;

        let unknown = update_color(Arc::clone(&state), "navBg".into(), "#000".into()).await;
        let bad = update_color(Arc::clone(&state), "siteBg".into(), "red".into()).await;

        assert!(!unknown.success);
        assert!(unknown.error.unwrap().contains("navBg"));
        assert!(!bad.success);
        assert_eq!(state.store.snapshot().colors.get(ColorKey::SiteBg).as_str(), "#F8FAFC");
    }

    #[tokio::test]
    async fn test_select_section_by_name() {
        let (state, _) = make_state(Some("alice")).await;
        toggle_editor(Arc::clone(&state)).await;

        assert!(select_section(Arc::clone(&state), "Texts".into()).await.success);
        assert!(!select_section(Arc::clone(&state), "layout".into()).await.success);

        let view = get_editor_view(state).await.data.unwrap();
        assert_eq!(view.active_section, Some(Section::Texts));
    }

    #[tokio::test]
    async fn test_failed_save_is_reported_and_retryable() {
        let (state, memory) = make_state(Some("alice")).await;
        memory.set_fail_saves(true);

        let first = save_site_config(Arc::clone(&state)).await;
        memory.set_fail_saves(false);
        let second = save_site_config(state).await;

        assert!(!first.success);
        assert!(first.error.unwrap().starts_with("save failed"));
        assert!(second.success);
    }

    #[tokio::test]
    async fn test_shutdown_hides_editor() {
        let (state, _) = make_state(Some("alice")).await;

        state.shutdown();

        assert!(!get_editor_view(state).await.data.unwrap().visible);
    }

    #[test]
    fn test_command_result_ok_sets_success_true() {
        let r: CommandResult<i32> = CommandResult::ok(42);
        assert!(r.success);
        assert_eq!(r.data.unwrap(), 42);
        assert!(r.error.is_none());
    }

    #[test]
    fn test_command_result_err_sets_success_false() {
        let r: CommandResult<i32> = CommandResult::err("something went wrong");
        assert!(!r.success);
        assert!(r.data.is_none());
        assert_eq!(r.error.unwrap(), "something went wrong");
    }

    #[test]
    fn test_command_result_serializes_to_uniform_shape() {
        let r: CommandResult<()> = CommandResult::err("nope");
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json, serde_json::json!({ "success": false, "data": null, "error": "nope" }));
    }
}
