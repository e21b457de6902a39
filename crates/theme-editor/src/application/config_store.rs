//! ConfigStore: the single source of truth for the site configuration.
//!
//! The store owns the live [`ConfigRecord`] and is shared (`Arc<ConfigStore>`)
//! with every consumer that renders colors or copy.  Any consumer may read,
//! write, or subscribe.  Each write replaces the record with a new immutable
//! snapshot, so readers never observe a half-applied edit.
//!
//! # Style mirroring
//!
//! Colors reach views that do not hold the store through the page's style
//! system.  Every color write re-projects the whole palette onto the
//! [`StyleTarget`]: one `set_property` call per color key, unconditionally,
//! even when a value did not change.  Text writes have no mirror effect.
//! The store is the only writer of the style target.
//!
//! # Initial load and ordering
//!
//! ```text
//! new()            defaults published + mirrored
//!   │
//! begin_load()     ticket #n issued, phase = Loading
//!   │   ...        local edits are recorded in `EditedKeys`
//! complete_load()  ticket still current and store active?
//!                    yes → overlay remote onto current, skipping edited keys
//!                    no  → result discarded
//! ```
//!
//! There is exactly one load per store.  A load failure or an absent record
//! leaves the store on its defaults; neither is surfaced beyond a log line.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use theme_core::{
    ColorKey, ColorMap, ColorValue, ConfigRecord, EditedKeys, FieldKey, OverlayReport, RemoteRecord,
    TextKey, TextMap,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::persistence::{PersistenceAdapter, PersistenceError};

/// The document-level style target colors are mirrored into.
///
/// Infrastructure implementations write CSS custom properties; test
/// implementations record calls.
pub trait StyleTarget: Send + Sync {
    /// Sets one custom property, e.g. `("--site-bg", "#F8FAFC")`.
    fn set_property(&self, name: &str, value: &str);
}

/// Proof that a load was started; required to apply its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

/// Where the store is in its initial-load lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    /// No load has been issued.
    NotStarted,
    /// A load is outstanding.
    Loading,
    /// The load finished (applied, absent, failed or discarded on deactivate).
    Settled,
}

/// What happened to a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The remote record was overlaid onto the live record.
    Applied(OverlayReport),
    /// Nothing is stored yet; the store stays on its current values.
    Absent,
    /// The backend failed; the store stays on its current values.
    Failed(String),
    /// The result arrived for a stale ticket or after deactivation.
    Discarded,
    /// A load was already issued for this store.
    AlreadyInitialized,
}

struct StoreState {
    phase: LoadPhase,
    generation: u64,
    active: bool,
    /// Keys written locally before the load settled.
    edited: EditedKeys,
}

/// The live configuration store.
pub struct ConfigStore {
    record: watch::Sender<Arc<ConfigRecord>>,
    state: Mutex<StoreState>,
    style: Arc<dyn StyleTarget>,
}

impl ConfigStore {
    /// Creates a store on the compiled defaults and mirrors them once.
    pub fn new(style: Arc<dyn StyleTarget>) -> Self {
        let record = Arc::new(ConfigRecord::defaults());
        mirror_colors(style.as_ref(), &record.colors);
        let (tx, _rx) = watch::channel(record);
        Self {
            record: tx,
            state: Mutex::new(StoreState {
                phase: LoadPhase::NotStarted,
                generation: 0,
                active: true,
                edited: EditedKeys::default(),
            }),
            style,
        }
    }

    // ── Reading ───────────────────────────────────────────────────────────────

    /// The current record.  Cheap: clones an `Arc`.
    pub fn snapshot(&self) -> Arc<ConfigRecord> {
        Arc::clone(&self.record.borrow())
    }

    /// A receiver that is notified on every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<ConfigRecord>> {
        self.record.subscribe()
    }

    /// Where the initial load currently stands.
    pub fn phase(&self) -> LoadPhase {
        self.lock_state().phase
    }

    // ── Writing ───────────────────────────────────────────────────────────────

    /// Replaces the whole `colors` mapping and re-mirrors every color.
    ///
    /// The mapping is taken as-is: keys that were built with their default
    /// (see [`ColorMap::from_entries`]) do not inherit the previous values.
    pub fn set_colors(&self, colors: ColorMap) {
        let touched = |edited: &mut EditedKeys| edited.colors.extend(ColorKey::ALL);
        self.write(true, touched, |current| ConfigRecord {
            colors,
            texts: current.texts.clone(),
        });
    }

    /// Replaces the whole `texts` mapping.
    pub fn set_texts(&self, texts: TextMap) {
        let touched = |edited: &mut EditedKeys| edited.texts.extend(TextKey::ALL);
        self.write(false, touched, |current| ConfigRecord {
            colors: current.colors.clone(),
            texts,
        });
    }

    /// Spreads the current colors and overrides one key.
    pub fn update_color(&self, key: ColorKey, value: ColorValue) {
        let touched = |edited: &mut EditedKeys| {
            edited.colors.insert(key);
        };
        self.write(true, touched, |current| ConfigRecord {
            colors: current.colors.clone().with(key, value),
            texts: current.texts.clone(),
        });
    }

    /// Spreads the current texts and overrides one key.
    pub fn update_text(&self, key: TextKey, value: String) {
        let touched = |edited: &mut EditedKeys| {
            edited.texts.insert(key);
        };
        self.write(false, touched, |current| ConfigRecord {
            colors: current.colors.clone(),
            texts: current.texts.clone().with(key, value),
        });
    }

    /// Read-compute-publish under the state lock so writes never interleave.
    ///
    /// Until the load settles, every key `touched` names is kept from the
    /// load response, even when the write left its value unchanged.
    fn write(
        &self,
        mirror: bool,
        touched: impl FnOnce(&mut EditedKeys),
        next: impl FnOnce(&ConfigRecord) -> ConfigRecord,
    ) {
        let mut state = self.lock_state();
        let current = self.snapshot();
        let next = next(&current);

        if state.phase != LoadPhase::Settled {
            touched(&mut state.edited);
        }

        self.publish(next, mirror);
    }

    fn publish(&self, next: ConfigRecord, mirror: bool) {
        if mirror {
            mirror_colors(self.style.as_ref(), &next.colors);
        }
        self.record.send_replace(Arc::new(next));
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Runs the single initial load against `adapter`.
    ///
    /// Never fails: backend errors and absent records leave the store on its
    /// current values and are reported through the returned [`LoadOutcome`].
    pub async fn initialize(&self, adapter: &dyn PersistenceAdapter) -> LoadOutcome {
        let Some(ticket) = self.begin_load() else {
            return if self.lock_state().active {
                LoadOutcome::AlreadyInitialized
            } else {
                LoadOutcome::Discarded
            };
        };
        info!("loading site configuration");
        let result = adapter.load().await;
        self.complete_load(ticket, result)
    }

    /// Runs [`initialize`](Self::initialize) on a background task.
    pub fn spawn_initialize(
        self: &Arc<Self>,
        adapter: Arc<dyn PersistenceAdapter>,
    ) -> JoinHandle<LoadOutcome> {
        let store = Arc::clone(self);
        tokio::spawn(async move { store.initialize(adapter.as_ref()).await })
    }

    /// Starts the initial load.  Returns `None` if a load was already issued
    /// or the store has been deactivated.
    pub fn begin_load(&self) -> Option<LoadTicket> {
        let mut state = self.lock_state();
        if !state.active || state.phase != LoadPhase::NotStarted {
            return None;
        }
        state.phase = LoadPhase::Loading;
        state.generation += 1;
        Some(LoadTicket {
            generation: state.generation,
        })
    }

    /// Applies the result of the load identified by `ticket`.
    pub fn complete_load(
        &self,
        ticket: LoadTicket,
        result: Result<Option<RemoteRecord>, PersistenceError>,
    ) -> LoadOutcome {
        let mut state = self.lock_state();
        if !state.active
            || state.phase != LoadPhase::Loading
            || state.generation != ticket.generation
        {
            debug!(ticket = ticket.generation, "discarding late config load result");
            return LoadOutcome::Discarded;
        }
        state.phase = LoadPhase::Settled;
        let edited = std::mem::take(&mut state.edited);

        match result {
            Err(e) => {
                warn!(error = %e, "site configuration load failed; keeping defaults");
                LoadOutcome::Failed(e.to_string())
            }
            Ok(None) => {
                info!("no stored site configuration; keeping defaults");
                LoadOutcome::Absent
            }
            Ok(Some(remote)) => {
                let current = self.snapshot();
                let (next, report) = current.overlay(&remote, &edited);
                log_report(&report);
                self.publish(next, true);
                LoadOutcome::Applied(report)
            }
        }
    }

    /// Stops accepting load results.  Edits remain possible.
    pub fn deactivate(&self) {
        let mut state = self.lock_state();
        state.active = false;
        state.generation += 1;
        if state.phase == LoadPhase::Loading {
            state.phase = LoadPhase::Settled;
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Projects every color onto the style target.
fn mirror_colors(target: &dyn StyleTarget, colors: &ColorMap) {
    for (name, value) in colors.style_properties() {
        target.set_property(&name, value.as_str());
    }
}

fn log_report(report: &OverlayReport) {
    for rejection in &report.rejected {
        warn!(
            field = %rejection.path,
            reason = %rejection.reason,
            "ignoring malformed field in stored configuration"
        );
    }
    if !report.unknown.is_empty() {
        debug!(fields = ?report.unknown, "ignoring unknown fields in stored configuration");
    }
    info!(
        applied = report.applied,
        kept_local = report.kept_local.len(),
        "site configuration loaded"
    );
}

// ── Tests ─────────────────────────────────────────────────────────────────────
