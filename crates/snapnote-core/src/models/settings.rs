//! Application settings model

use serde::{Deserialize, Serialize};

use super::category::DEFAULT_CATEGORY_ID;

/// Theme mode options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    /// Light theme
    Light,
    /// Dark theme
    Dark,
    /// Follow system preference
    #[default]
    System,
}

/// Last known position of the capture panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelPosition {
    pub x: i32,
    pub y: i32,
}

impl Default for PanelPosition {
    fn default() -> Self {
        Self { x: 24, y: 24 }
    }
}

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// JPEG quality for screenshots, between 0 and 1
    pub screenshot_quality: f64,
    /// Category assigned to newly captured notes
    pub default_category: String,
    /// Theme mode
    pub theme: ThemeMode,
    /// Capture panel position
    pub panel_position: PanelPosition,
}

impl Settings {
    /// Clamp values into their valid ranges.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if !self.screenshot_quality.is_finite() {
            self.screenshot_quality = Self::default().screenshot_quality;
        }
        self.screenshot_quality = self.screenshot_quality.clamp(0.0, 1.0);
        let category = self.default_category.trim();
        self.default_category = if category.is_empty() {
            DEFAULT_CATEGORY_ID.to_string()
        } else {
            category.to_string()
        };
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            screenshot_quality: 0.92,
            default_category: DEFAULT_CATEGORY_ID.to_string(),
            theme: ThemeMode::System,
            panel_position: PanelPosition::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert!((settings.screenshot_quality - 0.92).abs() < f64::EPSILON);
        assert_eq!(settings.theme, ThemeMode::System);
        assert_eq!(settings.default_category, DEFAULT_CATEGORY_ID);
    }

    #[test]
    fn test_settings_partial_json_uses_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"theme":"dark"}"#).unwrap();
        assert_eq!(settings.theme, ThemeMode::Dark);
        assert_eq!(settings.panel_position, PanelPosition::default());
    }

    #[test]
    fn test_settings_normalized_clamps_quality() {
        let settings = Settings {
            screenshot_quality: 3.0,
            default_category: "  ".to_string(),
            ..Settings::default()
        }
        .normalized();
        assert!((settings.screenshot_quality - 1.0).abs() < f64::EPSILON);
        assert_eq!(settings.default_category, DEFAULT_CATEGORY_ID);
    }
}
