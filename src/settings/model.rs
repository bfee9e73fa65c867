//! Persisted user settings.
//!
//! Field names serialize in camelCase so data written by earlier versions of
//! the start page loads unchanged.

use crate::config;
use serde::{Deserialize, Serialize};

/// A user-facing search engine entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEngine {
    pub name: String,
    /// Destination pattern; `%s` is replaced by the query, otherwise appended to.
    pub url_pattern: String,
    /// Sanitized SVG markup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Symbolic icon used when no markup is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_key: Option<String>,
}

impl SearchEngine {
    pub fn new(name: impl Into<String>, url_pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url_pattern: url_pattern.into(),
            icon: None,
            icon_key: None,
        }
    }

    /// Set sanitized icon markup, clearing the symbolic icon.
    pub fn with_icon(mut self, icon: String) -> Self {
        self.icon = Some(icon);
        self.icon_key = None;
        self
    }

    /// Set a symbolic icon, clearing any markup.
    pub fn with_icon_key(mut self, key: impl Into<String>) -> Self {
        self.icon_key = Some(key.into());
        self.icon = None;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundType {
    Image,
    Video,
}

impl BackgroundType {
    fn from_preset(kind: &str) -> Self {
        match kind {
            "video" => BackgroundType::Video,
            _ => BackgroundType::Image,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WallpaperFit {
    #[default]
    Cover,
    Contain,
    Fill,
    Repeat,
    Center,
}

impl std::str::FromStr for WallpaperFit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cover" => Ok(WallpaperFit::Cover),
            "contain" => Ok(WallpaperFit::Contain),
            "fill" => Ok(WallpaperFit::Fill),
            "repeat" => Ok(WallpaperFit::Repeat),
            "center" => Ok(WallpaperFit::Center),
            other => Err(format!("unknown wallpaper fit: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Zh,
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "zh" => Ok(Language::Zh),
            other => Err(format!("unsupported language: {}", other)),
        }
    }
}

/// A wallpaper entry. Custom entries carry an id; `url` may be remote or a data URI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallpaper {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: BackgroundType,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_custom: Option<bool>,
}

/// The single root settings object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    #[serde(rename = "use24HourFormat")]
    pub use_24_hour_format: bool,
    pub show_seconds: bool,
    pub background_blur: f64,
    pub search_engines: Vec<SearchEngine>,
    pub selected_engine: String,
    pub theme_color: String,
    pub search_opacity: f64,
    pub enable_mask_blur: bool,
    pub mask_opacity: f64,
    pub background_url: String,
    pub background_type: BackgroundType,
    pub wallpaper_fit: WallpaperFit,
    pub custom_wallpapers: Vec<Wallpaper>,
    pub enable_search_history: bool,
    pub search_history: Vec<String>,
    pub language: Language,
}

impl Default for UserSettings {
    fn default() -> Self {
        let engines = default_search_engines();
        let selected_engine = engines
            .first()
            .map(|engine| engine.name.clone())
            .unwrap_or_default();
        let wallpaper = default_wallpaper();
        let theme_color = config::THEMES
            .first()
            .map(|(_, hex)| hex.to_string())
            .unwrap_or_else(|| "#ffffff".to_string());

        Self {
            use_24_hour_format: true,
            show_seconds: true,
            background_blur: 8.0,
            search_engines: engines,
            selected_engine,
            theme_color,
            search_opacity: 0.8,
            enable_mask_blur: false,
            mask_opacity: 0.2,
            background_url: wallpaper.url,
            background_type: wallpaper.kind,
            wallpaper_fit: WallpaperFit::Cover,
            custom_wallpapers: Vec::new(),
            enable_search_history: true,
            search_history: Vec::new(),
            language: Language::En,
        }
    }
}

impl UserSettings {
    /// The selected engine, or the first one if the selection is stale.
    pub fn selected_engine(&self) -> Option<&SearchEngine> {
        self.search_engines
            .iter()
            .find(|engine| engine.name == self.selected_engine)
            .or_else(|| self.search_engines.first())
    }

    pub fn engine(&self, name: &str) -> Option<&SearchEngine> {
        self.search_engines.iter().find(|engine| engine.name == name)
    }
}

/// The built-in search engine list.
pub fn default_search_engines() -> Vec<SearchEngine> {
    config::SEARCH_ENGINES
        .iter()
        .map(|(name, pattern, icon_key)| SearchEngine::new(*name, *pattern).with_icon_key(*icon_key))
        .collect()
}

/// The built-in wallpapers, in display order.
pub fn preset_wallpapers() -> Vec<Wallpaper> {
    config::PRESET_WALLPAPERS
        .iter()
        .map(|(name, kind, url)| Wallpaper {
            id: None,
            name: name.to_string(),
            kind: BackgroundType::from_preset(kind),
            url: url.to_string(),
            thumbnail: None,
            is_custom: None,
        })
        .collect()
}

/// The wallpaper used for fresh settings and after deleting the active one.
pub fn default_wallpaper() -> Wallpaper {
    preset_wallpapers()
        .into_iter()
        .next()
        .unwrap_or_else(|| Wallpaper {
            id: None,
            name: String::new(),
            kind: BackgroundType::Image,
            url: String::new(),
            thumbnail: None,
            is_custom: None,
        })
}
