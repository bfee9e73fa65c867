use super::model::{BackgroundType, Language, SearchEngine, UserSettings, Wallpaper, WallpaperFit};

/// A partial settings object: every `Some` field replaces the current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsPartial {
    pub use_24_hour_format: Option<bool>,
    pub show_seconds: Option<bool>,
    pub background_blur: Option<f64>,
    pub search_engines: Option<Vec<SearchEngine>>,
    pub selected_engine: Option<String>,
    pub theme_color: Option<String>,
    pub search_opacity: Option<f64>,
    pub enable_mask_blur: Option<bool>,
    pub mask_opacity: Option<f64>,
    pub background_url: Option<String>,
    pub background_type: Option<BackgroundType>,
    pub wallpaper_fit: Option<WallpaperFit>,
    pub custom_wallpapers: Option<Vec<Wallpaper>>,
    pub enable_search_history: Option<bool>,
    pub search_history: Option<Vec<String>>,
    pub language: Option<Language>,
}

impl SettingsPartial {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Shallow-merge onto `current`, producing a new settings value.
    pub fn apply_to(self, current: &UserSettings) -> UserSettings {
        let current = current.clone();
        UserSettings {
            use_24_hour_format: self.use_24_hour_format.unwrap_or(current.use_24_hour_format),
            show_seconds: self.show_seconds.unwrap_or(current.show_seconds),
            background_blur: self.background_blur.unwrap_or(current.background_blur),
            search_engines: self.search_engines.unwrap_or(current.search_engines),
            selected_engine: self.selected_engine.unwrap_or(current.selected_engine),
            theme_color: self.theme_color.unwrap_or(current.theme_color),
            search_opacity: self.search_opacity.unwrap_or(current.search_opacity),
            enable_mask_blur: self.enable_mask_blur.unwrap_or(current.enable_mask_blur),
            mask_opacity: self.mask_opacity.unwrap_or(current.mask_opacity),
            background_url: self.background_url.unwrap_or(current.background_url),
            background_type: self.background_type.unwrap_or(current.background_type),
            wallpaper_fit: self.wallpaper_fit.unwrap_or(current.wallpaper_fit),
            custom_wallpapers: self.custom_wallpapers.unwrap_or(current.custom_wallpapers),
            enable_search_history: self
                .enable_search_history
                .unwrap_or(current.enable_search_history),
            search_history: self.search_history.unwrap_or(current.search_history),
            language: self.language.unwrap_or(current.language),
        }
    }
}

/// A settings update: either fields to set, or a function deriving them from
/// the current value at the moment the patch is applied.
pub enum SettingsPatch {
    Partial(SettingsPartial),
    Derive(Box<dyn FnOnce(&UserSettings) -> SettingsPartial>),
}

impl SettingsPatch {
    pub fn derive<F>(f: F) -> Self
    where
        F: FnOnce(&UserSettings) -> SettingsPartial + 'static,
    {
        SettingsPatch::Derive(Box::new(f))
    }

    /// Resolve against `current` and merge.
    pub fn apply(self, current: &UserSettings) -> UserSettings {
        let partial = match self {
            SettingsPatch::Partial(partial) => partial,
            SettingsPatch::Derive(f) => f(current),
        };
        partial.apply_to(current)
    }
}

impl From<SettingsPartial> for SettingsPatch {
    fn from(partial: SettingsPartial) -> Self {
        SettingsPatch::Partial(partial)
    }
}

impl std::fmt::Debug for SettingsPatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsPatch::Partial(partial) => f.debug_tuple("Partial").field(partial).finish(),
            SettingsPatch::Derive(_) => f.write_str("Derive(..)"),
        }
    }
}
