//! EditorSurface: the privileged editing panel.
//!
//! The surface is always constructed, but [`EditorSurface::render`] returns
//! [`EditorView::Hidden`] unless the live privilege is `Granted`.  Privilege is
//! read on every render, so losing it mid-visit removes the editor on the next
//! render without any reload.
//!
//! # View states
//!
//! ```text
//!  Hidden ──(granted)──► Collapsed ──toggle/open──► Panel
//!    ▲                        ▲                       │
//!    └──(unknown / denied)────┴─────toggle/close──────┘
//! ```
//!
//! The panel holds one control per color key and one per text key, built by
//! iterating the current mappings.  A new key in the compiled defaults shows up
//! as a new control with no change here.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use theme_core::{
    ColorKey, ColorParseError, ColorValue, Privilege, TextKey, UnknownKeyError,
};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::config_store::ConfigStore;
use super::persistence::PersistenceAdapter;

/// How long save confirmations and errors stay visible unless configured.
pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(3);

/// Error type for editor interactions.
#[derive(Debug, Error)]
pub enum EditorError {
    /// The session is not (or not yet) privileged.
    #[error("editing requires a privileged session (privilege: {0:?})")]
    NotPermitted(Privilege),

    #[error("invalid color: {0}")]
    InvalidColor(#[from] ColorParseError),

    #[error(transparent)]
    UnknownKey(#[from] UnknownKeyError),
}

/// Tabs of the editor panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    #[default]
    Colors,
    Texts,
}

impl Section {
    pub const ALL: [Section; 2] = [Section::Colors, Section::Texts];

    pub fn as_str(self) -> &'static str {
        match self {
            Section::Colors => "colors",
            Section::Texts => "texts",
        }
    }

    /// Case-insensitive lookup by name.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(name))
    }
}

/// A color picker bound to one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorControl {
    pub key: ColorKey,
    pub value: ColorValue,
}

/// A free-text field bound to one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextControl {
    pub key: TextKey,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

/// A transient message shown after a save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    expires_at: Instant,
}

impl Notice {
    fn is_visible(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// The open panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelView {
    pub active_section: Section,
    pub colors: Vec<ColorControl>,
    pub texts: Vec<TextControl>,
    /// `false` while a save is outstanding.
    pub save_enabled: bool,
    pub notice: Option<Notice>,
}

impl PanelView {
    /// Number of bound field controls (colors plus texts).
    pub fn control_count(&self) -> usize {
        self.colors.len() + self.texts.len()
    }
}

/// What the host should draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorView {
    /// Nothing at all, not even a launcher.
    Hidden,
    /// Only the toggle that opens the panel.
    Collapsed,
    Panel(PanelView),
}

/// Result of a save attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// The backend failed; local state is untouched and the save can be retried.
    Failed(String),
    /// Another save was still outstanding; no backend call was made.
    AlreadyInFlight,
    NotPermitted,
}

#[derive(Debug, Default)]
struct UiState {
    open: bool,
    section: Section,
    notice: Option<Notice>,
}

/// The editor panel controller.
pub struct EditorSurface {
    store: Arc<ConfigStore>,
    privilege: watch::Receiver<Privilege>,
    persistence: Arc<dyn PersistenceAdapter>,
    ui: Mutex<UiState>,
    saving: AtomicBool,
    notice_ttl: Duration,
}

impl EditorSurface {
    /// Creates a closed surface on the `Colors` section.
    ///
    /// `privilege` is usually [`AccessGate::subscribe`](super::access_gate::AccessGate::subscribe).
    pub fn new(
        store: Arc<ConfigStore>,
        privilege: watch::Receiver<Privilege>,
        persistence: Arc<dyn PersistenceAdapter>,
    ) -> Self {
        Self {
            store,
            privilege,
            persistence,
            ui: Mutex::new(UiState::default()),
            saving: AtomicBool::new(false),
            notice_ttl: DEFAULT_NOTICE_TTL,
        }
    }

    /// Overrides how long notices stay visible.
    pub fn with_notice_ttl(mut self, ttl: Duration) -> Self {
        self.notice_ttl = ttl;
        self
    }

    /// The privilege last published by the gate.
    pub fn privilege(&self) -> Privilege {
        *self.privilege.borrow()
    }

    /// `true` while a save is in flight.
    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    /// Builds the current view.
    ///
    /// A non-granted privilege also closes the panel, so a later grant starts
    /// from the collapsed launcher.
    pub fn render(&self) -> EditorView {
        let mut ui = self.lock_ui();
        if !self.privilege().allows_editing() {
            ui.open = false;
            return EditorView::Hidden;
        }
        if !ui.open {
            return EditorView::Collapsed;
        }

        let now = Instant::now();
        if ui.notice.as_ref().is_some_and(|n| !n.is_visible(now)) {
            ui.notice = None;
        }

        let record = self.store.snapshot();
        EditorView::Panel(PanelView {
            active_section: ui.section,
            colors: record
                .colors
                .iter()
                .map(|(key, value)| ColorControl { key, value: value.clone() })
                .collect(),
            texts: record
                .texts
                .iter()
                .map(|(key, value)| TextControl { key, value: value.clone() })
                .collect(),
            save_enabled: !self.is_saving(),
            notice: ui.notice.clone(),
        })
    }

    // ── Panel state ───────────────────────────────────────────────────────────

    /// Flips the panel and returns whether it is now open.
    pub fn toggle(&self) -> Result<bool, EditorError> {
        self.require_granted()?;
        let mut ui = self.lock_ui();
        ui.open = !ui.open;
        Ok(ui.open)
    }

    pub fn open(&self) -> Result<(), EditorError> {
        self.require_granted()?;
        self.lock_ui().open = true;
        Ok(())
    }

    pub fn close(&self) {
        self.lock_ui().open = false;
    }

    pub fn select_section(&self, section: Section) -> Result<(), EditorError> {
        self.require_granted()?;
        self.lock_ui().section = section;
        Ok(())
    }

    // ── Field edits ───────────────────────────────────────────────────────────

    /// Writes one color through the store, which mirrors it immediately.
    pub fn set_color(&self, key: ColorKey, literal: &str) -> Result<(), EditorError> {
        self.require_granted()?;
        let value = ColorValue::parse(literal)?;
        debug!("editor: {key} = {value}");
        self.store.update_color(key, value);
        Ok(())
    }

    /// Writes one text through the store.  Any string is accepted.
    pub fn set_text(&self, key: TextKey, value: impl Into<String>) -> Result<(), EditorError> {
        self.require_granted()?;
        let value = value.into();
        debug!("editor: {key} = {value:?}");
        self.store.update_text(key, value);
        Ok(())
    }

    // ── Persistence ───────────────────────────────────────────────────────────

    /// Sends the whole current record to the persistence backend.
    ///
    /// Only one save runs at a time; a call made while another is outstanding
    /// returns [`SaveOutcome::AlreadyInFlight`] without touching the backend.
    pub async fn save(&self) -> SaveOutcome {
        if self.require_granted().is_err() {
            return SaveOutcome::NotPermitted;
        }
        let Some(_guard) = SaveGuard::acquire(&self.saving) else {
            debug!("save requested while another save is outstanding; ignoring");
            return SaveOutcome::AlreadyInFlight;
        };

        let record = self.store.snapshot();
        match self.persistence.save(&record).await {
            Ok(()) => {
                info!("site configuration saved");
                self.show_notice(NoticeKind::Success, "Site configuration saved.".to_string());
                SaveOutcome::Saved
            }
            Err(e) => {
                warn!("site configuration save failed: {e}");
                self.show_notice(NoticeKind::Error, format!("Save failed: {e}"));
                SaveOutcome::Failed(e.to_string())
            }
        }
    }

    fn show_notice(&self, kind: NoticeKind, message: String) {
        self.lock_ui().notice = Some(Notice {
            kind,
            message,
            expires_at: Instant::now() + self.notice_ttl,
        });
    }

    fn require_granted(&self) -> Result<(), EditorError> {
        match self.privilege() {
            Privilege::Granted => Ok(()),
            other => Err(EditorError::NotPermitted(other)),
        }
    }

    fn lock_ui(&self) -> MutexGuard<'_, UiState> {
        self.ui.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Holds the single save slot; released on drop, including cancellation.
struct SaveGuard<'a>(&'a AtomicBool);

impl<'a> SaveGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for SaveGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
