//! User settings: the data model, repair of persisted data, and the store
//! that owns the live value.

mod model;
mod normalize;
mod patch;
mod persist;
mod store;

pub use model::{
    default_search_engines, default_wallpaper, preset_wallpapers, BackgroundType, Language,
    SearchEngine, UserSettings, Wallpaper, WallpaperFit,
};
pub use normalize::normalize;
pub use patch::{SettingsPartial, SettingsPatch};
pub use persist::{clear_settings, load_settings, save_settings};
pub use store::SettingsStore;
