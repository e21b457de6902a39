//! Integration tests for the store's initial load.
//!
//! These drive `ConfigStore` through the public API with the shipped
//! `MemoryStore` and `RecordFile` backends and the `DocumentStyle` target,
//! covering fallback, overlay, and the ordering rules between the load and
//! local edits.

use std::sync::Arc;

use serde_json::json;
use theme_core::{ColorKey, ColorValue, ConfigRecord, FieldKey, TextKey};
use theme_editor::application::config_store::{ConfigStore, LoadOutcome, LoadPhase, StyleTarget};
use theme_editor::application::persistence::PersistenceAdapter;
use theme_editor::infrastructure::storage::memory::MemoryStore;
use theme_editor::infrastructure::storage::record_file::RecordFile;
use theme_editor::infrastructure::style::DocumentStyle;

fn store_with_style() -> (Arc<ConfigStore>, Arc<DocumentStyle>) {
    let style = Arc::new(DocumentStyle::new());
    let store = Arc::new(ConfigStore::new(Arc::clone(&style) as Arc<dyn StyleTarget>));
    (store, style)
}

#[tokio::test]
async fn test_load_failure_keeps_every_default() {
    // Arrange
    let (store, style) = store_with_style();
    let backend = MemoryStore::with_payload(json!({ "colors": { "siteBg": "#111111" } }));
    backend.set_fail_loads(true);

    // Act
    let outcome = store.initialize(&backend).await;

    // Assert
    assert!(matches!(outcome, LoadOutcome::Failed(_)));
    for key in ColorKey::ALL {
        assert_eq!(store.snapshot().colors.get(*key), &key.default_value());
        assert_eq!(
            style.get_property(&key.style_property()).as_deref(),
            Some(key.default_value().as_str())
        );
    }
}

#[tokio::test]
async fn test_site_bg_scenario() {
    // Arrange
    let (store, style) = store_with_style();
    let backend = MemoryStore::with_payload(json!({ "colors": { "siteBg": "#111111" } }));

    // Act
    store.initialize(&backend).await;

    // Assert
    let snap = store.snapshot();
    assert_eq!(snap.colors.get(ColorKey::SiteBg).as_str(), "#111111");
    assert_eq!(snap.colors.get(ColorKey::HeaderBg).as_str(), "#FFFFFF");
    assert_eq!(style.get_property("--site-bg").as_deref(), Some("#111111"));
}

#[tokio::test]
async fn test_subset_record_yields_full_key_sets() {
    // Arrange: one key from each section, plus a malformed one.
    let (store, _style) = store_with_style();
    let backend = MemoryStore::with_payload(json!({
        "colors": { "footerBg": "#222", "headerText": false },
        "texts": { "heroTitle": "Autumn range" }
    }));

    // Act
    let outcome = store.initialize(&backend).await;

    // Assert
    let snap = store.snapshot();
    assert_eq!(snap.colors.len(), ColorKey::ALL.len());
    assert_eq!(snap.texts.len(), TextKey::ALL.len());
    assert_eq!(snap.colors.get(ColorKey::FooterBg).as_str(), "#222");
    assert_eq!(snap.colors.get(ColorKey::HeaderText), &ColorKey::HeaderText.default_value());
    assert_eq!(snap.texts.get(TextKey::HeroTitle), "Autumn range");
    assert_eq!(snap.texts.get(TextKey::Slogan), &TextKey::Slogan.default_value());
    match outcome {
        LoadOutcome::Applied(report) => {
            assert_eq!(report.applied, 2);
            assert_eq!(report.rejected.len(), 1);
            assert_eq!(report.rejected[0].path, "colors.headerText");
        }
        other => panic!("expected Applied, got {other:?}"),
    }
}

#[tokio::test]
async fn test_absent_record_keeps_defaults() {
    let (store, _style) = store_with_style();

    let outcome = store.initialize(&MemoryStore::new()).await;

    assert_eq!(outcome, LoadOutcome::Absent);
    assert_eq!(*store.snapshot(), ConfigRecord::defaults());
}

#[tokio::test]
async fn test_exactly_one_load_per_store() {
    let (store, _style) = store_with_style();
    let backend = Arc::new(MemoryStore::new());

    let first = store
        .spawn_initialize(Arc::clone(&backend) as Arc<dyn PersistenceAdapter>)
        .await
        .expect("load task panicked");
    let second = store.initialize(backend.as_ref()).await;

    assert_eq!(first, LoadOutcome::Absent);
    assert_eq!(second, LoadOutcome::AlreadyInitialized);
    assert_eq!(backend.load_count(), 1);
    assert_eq!(store.phase(), LoadPhase::Settled);
}

#[tokio::test]
async fn test_edit_racing_the_load_is_not_overwritten() {
    // Arrange: the host fetches the record itself while the operator edits.
    let (store, style) = store_with_style();
    let backend = MemoryStore::with_payload(json!({
        "colors": { "primaryButton": "#00aa00", "siteBg": "#111111" },
        "texts": { "siteName": "Remote name" }
    }));
    let ticket = store.begin_load().expect("first load");
    let fetched = backend.load().await;

    // Act
    store.update_color(ColorKey::PrimaryButton, ColorValue::parse("#ff0000").unwrap());
    store.update_text(TextKey::SiteName, "Local name".to_string());
    store.complete_load(ticket, fetched);

    // Assert
    let snap = store.snapshot();
    assert_eq!(snap.colors.get(ColorKey::PrimaryButton).as_str(), "#ff0000");
    assert_eq!(snap.colors.get(ColorKey::SiteBg).as_str(), "#111111");
    assert_eq!(snap.texts.get(TextKey::SiteName), "Local name");
    assert_eq!(style.get_property("--primary-button").as_deref(), Some("#ff0000"));
}

#[tokio::test]
async fn test_late_load_after_deactivate_is_dropped() {
    let (store, _style) = store_with_style();
    let backend = MemoryStore::with_payload(json!({ "texts": { "slogan": "late" } }));
    let ticket = store.begin_load().expect("first load");

    store.deactivate();
    let outcome = store.complete_load(ticket, backend.load().await);

    assert_eq!(outcome, LoadOutcome::Discarded);
    assert_eq!(store.snapshot().texts.get(TextKey::Slogan), &TextKey::Slogan.default_value());
}

#[tokio::test]
async fn test_record_file_round_trip_through_store() {
    // Arrange: save a modified record with one store, load it with another.
    let path = std::env::temp_dir()
        .join(format!("livetheme-it-{}", uuid::Uuid::new_v4()))
        .join("site.toml");
    let file = RecordFile::new(&path);
    let (writer, _style) = store_with_style();
    writer.update_color(ColorKey::HeaderBg, ColorValue::parse("#ABCDEF").unwrap());
    file.save(&writer.snapshot()).await.expect("save");

    // Act
    let (reader, style) = store_with_style();
    reader.initialize(&file).await;

    // Assert
    assert_eq!(*reader.snapshot(), *writer.snapshot());
    assert_eq!(style.get_property("--header-bg").as_deref(), Some("#ABCDEF"));
    if let Some(dir) = path.parent() {
        let _ = std::fs::remove_dir_all(dir);
    }
}
