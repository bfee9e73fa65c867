//! Repair untrusted persisted settings into a well-formed [`UserSettings`].

use super::model::{SearchEngine, UserSettings, Wallpaper};
use crate::sanitize::sanitize_svg_markup;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Merge a raw persisted value over `defaults` and repair it.
///
/// * absent or non-object input yields `defaults`
/// * fields present in the input override defaults one by one; a field with
///   an unusable value keeps its default
/// * the engine list is never empty, icons are sanitized, list fields are
///   real lists and the selected engine exists
///
/// Normalizing an already normalized value returns it unchanged.
pub fn normalize(defaults: &UserSettings, raw: Option<&Value>) -> UserSettings {
    let Some(Value::Object(raw)) = raw else {
        return defaults.clone();
    };

    let mut merged = UserSettings {
        use_24_hour_format: field(raw, "use24HourFormat", &defaults.use_24_hour_format),
        show_seconds: field(raw, "showSeconds", &defaults.show_seconds),
        background_blur: field(raw, "backgroundBlur", &defaults.background_blur),
        search_engines: defaults.search_engines.clone(),
        selected_engine: field(raw, "selectedEngine", &defaults.selected_engine),
        theme_color: field(raw, "themeColor", &defaults.theme_color),
        search_opacity: field(raw, "searchOpacity", &defaults.search_opacity),
        enable_mask_blur: field(raw, "enableMaskBlur", &defaults.enable_mask_blur),
        mask_opacity: field(raw, "maskOpacity", &defaults.mask_opacity),
        background_url: field(raw, "backgroundUrl", &defaults.background_url),
        background_type: field(raw, "backgroundType", &defaults.background_type),
        wallpaper_fit: field(raw, "wallpaperFit", &defaults.wallpaper_fit),
        custom_wallpapers: defaults.custom_wallpapers.clone(),
        enable_search_history: field(raw, "enableSearchHistory", &defaults.enable_search_history),
        search_history: defaults.search_history.clone(),
        language: field(raw, "language", &defaults.language),
    };

    merged.search_engines = match raw.get("searchEngines") {
        None => defaults.search_engines.clone(),
        Some(value) => match repair_engines(value) {
            Some(engines) => engines,
            None => {
                log::debug!("Persisted engine list unusable, restoring defaults");
                defaults.search_engines.clone()
            }
        },
    };

    merged.custom_wallpapers = match raw.get("customWallpapers") {
        None => defaults.custom_wallpapers.clone(),
        Some(value) => list_entries::<Wallpaper>(value),
    };

    merged.search_history = match raw.get("searchHistory") {
        None => defaults.search_history.clone(),
        Some(value) => list_entries::<String>(value),
    };

    let has_selected = merged
        .search_engines
        .iter()
        .any(|engine| engine.name == merged.selected_engine);
    if !has_selected {
        merged.selected_engine = merged
            .search_engines
            .first()
            .map(|engine| engine.name.clone())
            .unwrap_or_else(|| defaults.selected_engine.clone());
    }

    merged
}

/// Deserialize one field, falling back to the default on absence or type mismatch
fn field<T: DeserializeOwned + Clone>(raw: &Map<String, Value>, key: &str, fallback: &T) -> T {
    match raw.get(key) {
        Some(value) => T::deserialize(value).unwrap_or_else(|e| {
            log::debug!("Ignoring persisted {}: {}", key, e);
            fallback.clone()
        }),
        None => fallback.clone(),
    }
}

/// Entries of a list field that deserialize; a non-list yields an empty list
fn list_entries<T: DeserializeOwned>(value: &Value) -> Vec<T> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| T::deserialize(item).ok())
        .collect()
}

/// Usable engines with sanitized icons, or `None` if nothing usable remains
fn repair_engines(value: &Value) -> Option<Vec<SearchEngine>> {
    let mut seen = HashSet::new();
    let engines: Vec<SearchEngine> = list_entries::<SearchEngine>(value)
        .into_iter()
        .filter(|engine| seen.insert(engine.name.clone()))
        .map(sanitize_engine_icon)
        .collect();

    if engines.is_empty() {
        None
    } else {
        Some(engines)
    }
}

fn sanitize_engine_icon(engine: SearchEngine) -> SearchEngine {
    let icon = engine.icon.as_deref().and_then(|raw| {
        let sanitized = sanitize_svg_markup(raw);
        if sanitized.is_none() {
            log::warn!("Dropping unsafe icon for engine '{}'", engine.name);
        }
        sanitized
    });
    let icon_key = if icon.is_some() { None } else { engine.icon_key };

    SearchEngine {
        icon,
        icon_key,
        ..engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::model::{BackgroundType, Language};
    use serde_json::json;

    fn defaults() -> UserSettings {
        UserSettings::default()
    }

    fn renormalize(settings: &UserSettings) -> UserSettings {
        let value = serde_json::to_value(settings).unwrap();
        normalize(&defaults(), Some(&value))
    }

    #[test]
    fn test_absent_returns_defaults() {
        assert_eq!(normalize(&defaults(), None), defaults());
    }

    #[test]
    fn test_non_object_returns_defaults() {
        for raw in [json!(null), json!(42), json!("text"), json!([1, 2])] {
            assert_eq!(normalize(&defaults(), Some(&raw)), defaults());
        }
    }

    #[test]
    fn test_raw_fields_override_defaults() {
        let raw = json!({ "showSeconds": false, "language": "zh", "backgroundBlur": 3 });
        let settings = normalize(&defaults(), Some(&raw));
        assert!(!settings.show_seconds);
        assert_eq!(settings.language, Language::Zh);
        assert_eq!(settings.background_blur, 3.0);
        assert_eq!(settings.theme_color, defaults().theme_color);
    }

    #[test]
    fn test_wrong_typed_field_keeps_default() {
        let raw = json!({ "showSeconds": "yes", "backgroundType": "hologram", "maskOpacity": null });
        let settings = normalize(&defaults(), Some(&raw));
        assert_eq!(settings.show_seconds, defaults().show_seconds);
        assert_eq!(settings.background_type, BackgroundType::Image);
        assert_eq!(settings.mask_opacity, defaults().mask_opacity);
    }

    #[test]
    fn test_unknown_selected_engine_reset() {
        let raw = json!({ "selectedEngine": "NonExistent" });
        let settings = normalize(&defaults(), Some(&raw));
        assert_eq!(settings.selected_engine, defaults().search_engines[0].name);
    }

    #[test]
    fn test_empty_or_invalid_engine_list_restored() {
        for engines in [json!([]), json!("Google"), json!({ "name": "x" }), json!([1, "two"])] {
            let raw = json!({ "searchEngines": engines });
            let settings = normalize(&defaults(), Some(&raw));
            assert_eq!(settings.search_engines, defaults().search_engines);
        }
    }

    #[test]
    fn test_selection_follows_repaired_list() {
        let raw = json!({
            "searchEngines": [{ "name": "Mine", "urlPattern": "https://mine.test/?q=%s" }],
            "selectedEngine": "Google"
        });
        let settings = normalize(&defaults(), Some(&raw));
        assert_eq!(settings.search_engines.len(), 1);
        assert_eq!(settings.selected_engine, "Mine");
    }

    #[test]
    fn test_engine_icons_sanitized() {
        let raw = json!({
            "searchEngines": [
                { "name": "Safe", "urlPattern": "https://a.test/?q=%s",
                  "icon": "<svg onload=\"x()\"><path d=\"M0\"/></svg>", "iconKey": "globe" },
                { "name": "Unsafe", "urlPattern": "https://b.test/?q=%s",
                  "icon": "<img src=x onerror=alert(1)>", "iconKey": "globe" },
                { "name": "Plain", "urlPattern": "https://c.test/?q=%s", "iconKey": "star" }
            ]
        });
        let settings = normalize(&defaults(), Some(&raw));
        let engines = &settings.search_engines;

        let safe_icon = engines[0].icon.as_deref().unwrap();
        assert!(!safe_icon.contains("onload"));
        assert!(engines[0].icon_key.is_none());

        assert!(engines[1].icon.is_none());
        assert_eq!(engines[1].icon_key.as_deref(), Some("globe"));

        assert!(engines[2].icon.is_none());
        assert_eq!(engines[2].icon_key.as_deref(), Some("star"));
    }

    #[test]
    fn test_duplicate_engine_names_first_wins() {
        let raw = json!({
            "searchEngines": [
                { "name": "A", "urlPattern": "https://first.test/?q=%s" },
                { "name": "A", "urlPattern": "https://second.test/?q=%s" }
            ]
        });
        let settings = normalize(&defaults(), Some(&raw));
        assert_eq!(settings.search_engines.len(), 1);
        assert_eq!(settings.search_engines[0].url_pattern, "https://first.test/?q=%s");
    }

    #[test]
    fn test_list_fields_repaired() {
        let raw = json!({ "customWallpapers": "nope", "searchHistory": { "0": "a" } });
        let settings = normalize(&defaults(), Some(&raw));
        assert!(settings.custom_wallpapers.is_empty());
        assert!(settings.search_history.is_empty());

        let raw = json!({ "searchHistory": ["rust", 7, "glib"] });
        let settings = normalize(&defaults(), Some(&raw));
        assert_eq!(settings.search_history, vec!["rust", "glib"]);
    }

    #[test]
    fn test_idempotent() {
        let raws = [
            json!({}),
            json!({ "selectedEngine": "NonExistent", "searchHistory": "bad" }),
            json!({
                "searchEngines": [
                    { "name": "X", "urlPattern": "https://x.test/", "icon": "<svg><script/><g/></svg>", "iconKey": "k" },
                    { "name": "X", "urlPattern": "https://dup.test/" },
                    "garbage"
                ],
                "customWallpapers": [{ "id": "1", "name": "w", "type": "video", "url": "https://w.test/a.mp4" }, 5],
                "themeColor": 12
            }),
        ];
        for raw in raws {
            let once = normalize(&defaults(), Some(&raw));
            let twice = renormalize(&once);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_round_trip_preserves_settings() {
        let mut settings = defaults();
        settings.search_history = vec!["one".into(), "two".into()];
        settings.search_engines.push(
            SearchEngine::new("Icon", "https://icon.test/?q=%s")
                .with_icon(sanitize_svg_markup("<svg><circle r=\"1\"/></svg>").unwrap()),
        );
        settings.selected_engine = "Icon".into();

        let stored = serde_json::to_string(&settings).unwrap();
        let loaded: Value = serde_json::from_str(&stored).unwrap();
        assert_eq!(normalize(&defaults(), Some(&loaded)), settings);
    }
}
