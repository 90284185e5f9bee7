//! Browser settings
//!
//! A single flat record of toggles, persisted as its own partition and
//! mutated through typed partial-merge patches.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub dark_mode: bool,
    pub night_mode: bool,
    /// Suppresses automatic history recording only; bookmarks and
    /// downloads are explicit user actions and are never gated.
    pub incognito_mode: bool,
    pub desktop_mode: bool,
    pub ad_block_enabled: bool,
    /// Search engine id (see `aura_navigation::SearchEngine`)
    pub search_engine: String,
    pub homepage: String,
    pub auto_save_history: bool,
    pub max_history_items: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dark_mode: false,
            night_mode: false,
            incognito_mode: false,
            desktop_mode: false,
            ad_block_enabled: true,
            search_engine: "google".to_string(),
            homepage: "https://www.google.com".to_string(),
            auto_save_history: true,
            max_history_items: 1000,
        }
    }
}

/// Optional-field patch, shallow-merged field by field into `Settings`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsPatch {
    pub dark_mode: Option<bool>,
    pub night_mode: Option<bool>,
    pub incognito_mode: Option<bool>,
    pub desktop_mode: Option<bool>,
    pub ad_block_enabled: Option<bool>,
    pub search_engine: Option<String>,
    pub homepage: Option<String>,
    pub auto_save_history: Option<bool>,
    pub max_history_items: Option<usize>,
}

impl SettingsPatch {
    pub fn apply(self, settings: &mut Settings) {
        if let Some(v) = self.dark_mode {
            settings.dark_mode = v;
        }
        if let Some(v) = self.night_mode {
            settings.night_mode = v;
        }
        if let Some(v) = self.incognito_mode {
            settings.incognito_mode = v;
        }
        if let Some(v) = self.desktop_mode {
            settings.desktop_mode = v;
        }
        if let Some(v) = self.ad_block_enabled {
            settings.ad_block_enabled = v;
        }
        if let Some(v) = self.search_engine {
            settings.search_engine = v;
        }
        if let Some(v) = self.homepage {
            settings.homepage = v;
        }
        if let Some(v) = self.auto_save_history {
            settings.auto_save_history = v;
        }
        if let Some(v) = self.max_history_items {
            settings.max_history_items = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_merges_only_present_fields() {
        let mut settings = Settings::default();

        let patch = SettingsPatch {
            incognito_mode: Some(true),
            search_engine: Some("duckduckgo".to_string()),
            ..Default::default()
        };
        patch.apply(&mut settings);

        assert!(settings.incognito_mode);
        assert_eq!(settings.search_engine, "duckduckgo");
        // Untouched fields keep their values
        assert!(settings.ad_block_enabled);
        assert_eq!(settings.max_history_items, 1000);
    }

    #[test]
    fn test_missing_fields_deserialize_to_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"dark_mode": true}"#).unwrap();
        assert!(settings.dark_mode);
        assert_eq!(settings.homepage, "https://www.google.com");
    }
}
