//! The document-level style target.
//!
//! [`DocumentStyle`] is the in-process stand-in for a page's root style
//! declaration: an ordered set of CSS custom properties.  `ConfigStore` is its
//! only writer; renderers read it or export it with [`DocumentStyle::to_css`].

use std::fmt::Write as _;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::application::config_store::StyleTarget;

/// Ordered CSS custom properties for the document root.
#[derive(Debug, Default)]
pub struct DocumentStyle {
    /// First-write order is kept so exported CSS is stable.
    properties: Mutex<Vec<(String, String)>>,
    writes: AtomicUsize,
}

impl DocumentStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_property(&self, name: &str) -> Option<String> {
        self.lock()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    /// All properties in first-write order.
    pub fn properties(&self) -> Vec<(String, String)> {
        self.lock().clone()
    }

    /// Total `set_property` calls so far, including ones that did not change
    /// the value.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    /// Renders the properties as a `:root` rule.
    ///
    /// ```rust
    /// use theme_editor::application::config_store::StyleTarget;
    /// use theme_editor::infrastructure::style::DocumentStyle;
    ///
    /// let style = DocumentStyle::new();
    /// style.set_property("--site-bg", "#F8FAFC");
    /// assert_eq!(style.to_css(), ":root {\n  --site-bg: #F8FAFC;\n}\n");
    /// ```
    pub fn to_css(&self) -> String {
        let mut css = String::from(":root {\n");
        for (name, value) in self.lock().iter() {
            let _ = writeln!(css, "  {name}: {value};");
        }
        css.push_str("}\n");
        css
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(String, String)>> {
        self.properties.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StyleTarget for DocumentStyle {
    fn set_property(&self, name: &str, value: &str) {
        self.writes.fetch_add(1, Ordering::Relaxed);
        let mut properties = self.lock();
        match properties.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => properties.push((name.to_string(), value.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::config_store::ConfigStore;
    use std::sync::Arc;
    use theme_core::{ColorKey, ColorValue, FieldKey};

    #[test]
    fn test_set_property_overwrites_in_place() {
        let style = DocumentStyle::new();

        style.set_property("--a", "#000");
        style.set_property("--b", "#111");
        style.set_property("--a", "#222");

        assert_eq!(
            style.properties(),
            vec![
                ("--a".to_string(), "#222".to_string()),
                ("--b".to_string(), "#111".to_string()),
            ]
        );
        assert_eq!(style.write_count(), 3);
    }

    #[test]
    fn test_store_mirrors_every_color_into_document() {
        // Arrange
        let style = Arc::new(DocumentStyle::new());
        let store = ConfigStore::new(Arc::clone(&style) as Arc<dyn StyleTarget>);

        // Act
        store.update_color(ColorKey::PrimaryButton, ColorValue::parse("#ff0000").unwrap());

        // Assert
        assert_eq!(style.properties().len(), ColorKey::ALL.len());
        assert_eq!(style.get_property("--primary-button").as_deref(), Some("#ff0000"));
        assert_eq!(style.get_property("--footer-bg").as_deref(), Some("#0F172A"));
        assert_eq!(style.write_count(), 2 * ColorKey::ALL.len());
    }

    #[test]
    fn test_css_lists_properties_in_key_order() {
        let style = Arc::new(DocumentStyle::new());
        let _store = ConfigStore::new(Arc::clone(&style) as Arc<dyn StyleTarget>);

        let css = style.to_css();

        assert!(css.starts_with(":root {\n  --site-bg: #F8FAFC;\n  --header-bg: #FFFFFF;"));
        assert!(css.ends_with("  --footer-text: #F8FAFC;\n}\n"));
    }
}
