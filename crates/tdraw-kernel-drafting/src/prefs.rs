//! User preferences consulted when views are created.
//!
//! Preferences are grouped by path (`"Mod/TechDraw/Colors"`) and looked up
//! through the [`Preferences`] trait so hosts can plug in their own store.
//! [`MemoryPreferences`] is an in-memory store that can be loaded from TOML:
//!
//! ```toml
//! ["Mod/TechDraw/Colors"]
//! CutSurfaceColor = 0xC8C8C800
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::types::Color;

/// Preference group holding drawing colours.
pub const COLORS_GROUP: &str = "Mod/TechDraw/Colors";

/// Key of the cut surface colour in [`COLORS_GROUP`].
pub const CUT_SURFACE_COLOR_KEY: &str = "CutSurfaceColor";

/// Cut surface colour used when no preference is set (light grey).
pub const DEFAULT_CUT_SURFACE_COLOR: u32 = 0xC8C8_C800;

/// Errors from loading a preference file.
#[derive(Error, Debug)]
pub enum PrefsError {
    /// The file could not be read.
    #[error("failed to read preferences: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid preference TOML.
    #[error("failed to parse preferences: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Read access to user preferences.
pub trait Preferences: Send + Sync {
    /// Unsigned integer stored under `group`/`key`, if any.
    fn get_unsigned(&self, group: &str, key: &str) -> Option<u32>;
}

/// In-memory preference store.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct MemoryPreferences {
    groups: BTreeMap<String, BTreeMap<String, toml::Value>>,
}

impl MemoryPreferences {
    /// Empty store; every lookup falls back to its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a store from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, PrefsError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a store from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PrefsError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Set an unsigned value.
    pub fn set_unsigned(&mut self, group: &str, key: &str, value: u32) {
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(key.to_string(), toml::Value::Integer(i64::from(value)));
    }
}

impl Preferences for MemoryPreferences {
    fn get_unsigned(&self, group: &str, key: &str) -> Option<u32> {
        self.groups
            .get(group)?
            .get(key)?
            .as_integer()
            .and_then(|v| u32::try_from(v).ok())
    }
}

/// Cut surface colour from preferences, or [`DEFAULT_CUT_SURFACE_COLOR`].
pub fn cut_surface_color(prefs: &dyn Preferences) -> Color {
    let packed = prefs
        .get_unsigned(COLORS_GROUP, CUT_SURFACE_COLOR_KEY)
        .unwrap_or(DEFAULT_CUT_SURFACE_COLOR);
    Color::from_packed(packed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_uses_default() {
        let color = cut_surface_color(&MemoryPreferences::new());
        assert_eq!(color.to_packed(), DEFAULT_CUT_SURFACE_COLOR);
        assert!((color.r - 200.0 / 255.0).abs() < 1e-6);
        assert_eq!(color.a, 0.0);
    }

    #[test]
    fn test_set_and_get() {
        let mut prefs = MemoryPreferences::new();
        prefs.set_unsigned(COLORS_GROUP, CUT_SURFACE_COLOR_KEY, 0xFF00_00FF);
        assert_eq!(
            prefs.get_unsigned(COLORS_GROUP, CUT_SURFACE_COLOR_KEY),
            Some(0xFF00_00FF)
        );
        let color = cut_surface_color(&prefs);
        assert_eq!(color, Color::new(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_parse_toml() {
        let prefs = MemoryPreferences::from_toml_str(
            r#"
            ["Mod/TechDraw/Colors"]
            CutSurfaceColor = 0x336699FF
            Name = "not a number"
            "#,
        )
        .unwrap();
        assert_eq!(cut_surface_color(&prefs).to_packed(), 0x3366_99FF);
        assert_eq!(prefs.get_unsigned(COLORS_GROUP, "Name"), None);
        assert_eq!(prefs.get_unsigned("Mod/TechDraw/General", "Other"), None);
    }

    #[test]
    fn test_parse_error() {
        let err = MemoryPreferences::from_toml_str("[[[").unwrap_err();
        assert!(matches!(err, PrefsError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = MemoryPreferences::load("/nonexistent/tdraw-prefs.toml").unwrap_err();
        assert!(matches!(err, PrefsError::Io(_)));
    }
}
