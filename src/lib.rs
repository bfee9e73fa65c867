//! aerostart: a new tab start page backend.
//!
//! Search suggestions from several providers, the user's engine list and
//! wallpapers, and settings that survive restarts.

pub mod config;
pub mod debounce;
pub mod engines;
pub mod history;
pub mod i18n;
pub mod navigation;
pub mod sanitize;
pub mod settings;
pub mod storage;
pub mod suggest;
pub mod wallpaper;
