//! Settings repository implementation

use crate::error::Result;
use crate::models::{PanelPosition, Settings, ThemeMode};
use rusqlite::{params, Connection, OptionalExtension};

const SCREENSHOT_QUALITY: &str = "screenshot_quality";
const DEFAULT_CATEGORY: &str = "default_category";
const THEME: &str = "theme";
const PANEL_POSITION: &str = "panel_position";

/// Trait for settings storage operations
pub trait SettingsRepository {
    /// Load settings, using defaults for missing or unreadable keys
    fn load(&self) -> Result<Settings>;

    /// Save settings to the database
    fn save(&self, settings: &Settings) -> Result<()>;
}

/// `SQLite` implementation of `SettingsRepository`
pub struct SqliteSettingsRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteSettingsRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl SettingsRepository for SqliteSettingsRepository<'_> {
    fn load(&self) -> Result<Settings> {
        let mut settings = Settings::default();

        if let Some(value) = self.get_setting(SCREENSHOT_QUALITY)? {
            if let Ok(quality) = value.parse() {
                settings.screenshot_quality = quality;
            }
        }

        if let Some(value) = self.get_setting(DEFAULT_CATEGORY)? {
            settings.default_category = value;
        }

        if let Some(value) = self.get_setting(THEME)? {
            settings.theme =
                serde_json::from_str::<ThemeMode>(&format!("\"{value}\"")).unwrap_or_default();
        }

        if let Some(value) = self.get_setting(PANEL_POSITION)? {
            settings.panel_position =
                serde_json::from_str::<PanelPosition>(&value).unwrap_or_default();
        }

        Ok(settings.normalized())
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        let settings = settings.clone().normalized();

        self.set_setting(SCREENSHOT_QUALITY, &settings.screenshot_quality.to_string())?;
        self.set_setting(DEFAULT_CATEGORY, &settings.default_category)?;
        let theme = serde_json::to_string(&settings.theme)?;
        self.set_setting(THEME, theme.trim_matches('"'))?;
        self.set_setting(
            PANEL_POSITION,
            &serde_json::to_string(&settings.panel_position)?,
        )?;
        Ok(())
    }
}
