use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application ID (reverse domain notation)
pub const APP_ID: &str = "dev.myyc.aerostart";

/// Application name
pub const APP_NAME: &str = "aerostart";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// User agent string for suggestion requests
pub const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/605.1.15 (KHTML, like Gecko) aerostart/",
    env!("CARGO_PKG_VERSION")
);

/// Storage slot holding the serialized user settings
pub const STORAGE_KEY: &str = "aerostart_settings";

/// Storage database filename
pub const STORAGE_DB: &str = "storage.db";

/// Config filename inside the config directory
pub const CONFIG_FILE: &str = "config.toml";

// ============================================================================
// Suggestions
// ============================================================================

/// Upper bound for a single suggestion request (milliseconds)
pub const SUGGESTION_TIMEOUT_MS: u64 = 3000;

/// Quiet period after the last keystroke before suggestions are requested
pub const SEARCH_DEBOUNCE_MS: u64 = 100;

/// Maximum suggestions shown below the search box
pub const MAX_DISPLAYED_SUGGESTIONS: usize = 8;

/// Prefix of generated script callback names
pub const CALLBACK_PREFIX: &str = "jsonp_cb";

// ============================================================================
// Persistence
// ============================================================================

/// Quiet period after the last settings change before it is written
pub const PERSIST_DEBOUNCE_MS: u64 = 100;

/// Practical storage ceiling across all slots (bytes)
pub const STORAGE_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Maximum remembered search queries
pub const MAX_SEARCH_HISTORY: usize = 20;

/// Maximum uploaded wallpaper size before encoding (bytes)
pub const MAX_WALLPAPER_FILE_BYTES: usize = 3_670_016; // 3.5 MiB

/// Maximum accepted icon markup length (characters)
pub const MAX_ICON_MARKUP_LEN: usize = 20_000;

// ============================================================================
// Search Engines
// ============================================================================

/// Default search engines: (name, url_pattern, icon_key)
/// `%s` is replaced by the query; patterns without it get the query appended
pub const SEARCH_ENGINES: &[(&str, &str, &str)] = &[
    ("Google", "https://www.google.com/search?q=%s", "google"),
    ("Baidu", "https://www.baidu.com/s?wd=%s", "baidu"),
    ("Bing", "https://www.bing.com/search?q=%s", "bing"),
    ("DuckDuckGo", "https://duckduckgo.com/?q=%s", "duckduckgo"),
    ("Bilibili", "https://search.bilibili.com/all?keyword=%s", "bilibili"),
];

// ============================================================================
// Appearance
// ============================================================================

/// Theme colors: (name, hex)
pub const THEMES: &[(&str, &str)] = &[
    ("Ocean", "#3b82f6"),
    ("Violet", "#8b5cf6"),
    ("Rose", "#f43f5e"),
    ("Amber", "#f59e0b"),
    ("Emerald", "#10b981"),
    ("Slate", "#94a3b8"),
];

/// Preset wallpapers: (name, type, url)
pub const PRESET_WALLPAPERS: &[(&str, &str, &str)] = &[
    (
        "Mountains",
        "image",
        "https://images.unsplash.com/photo-1506744038136-46273834b3fb?w=1920&q=80",
    ),
    (
        "Aurora",
        "image",
        "https://images.unsplash.com/photo-1531366936337-7c912a4589a7?w=1920&q=80",
    ),
    (
        "Coast",
        "image",
        "https://images.unsplash.com/photo-1507525428034-b723cf961d3e?w=1920&q=80",
    ),
];

// ============================================================================
// Runtime configuration (config.toml)
// ============================================================================

/// A same-origin path that is forwarded to a remote endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProxyRoute {
    /// Path prefix, e.g. `/api/bilibili`
    pub path: String,
    /// Replacement for the prefix, e.g. `https://s.search.bilibili.com/main/suggest`
    pub target: String,
}

impl ProxyRoute {
    /// Rewrite a same-origin path-and-query if it starts with this route's prefix.
    pub fn rewrite(&self, path_and_query: &str) -> Option<String> {
        let rest = path_and_query.strip_prefix(&self.path)?;
        if !(rest.is_empty() || rest.starts_with('?') || rest.starts_with('/')) {
            return None;
        }
        Some(format!("{}{}", self.target, rest))
    }
}

fn default_proxy_routes() -> Vec<ProxyRoute> {
    vec![ProxyRoute {
        path: "/api/bilibili".to_string(),
        target: "https://s.search.bilibili.com/main/suggest".to_string(),
    }]
}

fn default_suggestion_timeout_ms() -> u64 {
    SUGGESTION_TIMEOUT_MS
}

fn default_persist_debounce_ms() -> u64 {
    PERSIST_DEBOUNCE_MS
}

fn default_search_debounce_ms() -> u64 {
    SEARCH_DEBOUNCE_MS
}

/// Settings read from `config.toml`. Every field is optional in the file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default = "default_suggestion_timeout_ms")]
    pub suggestion_timeout_ms: u64,
    #[serde(default = "default_persist_debounce_ms")]
    pub persist_debounce_ms: u64,
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
    /// Origin that same-origin proxy paths are joined onto. When unset the
    /// proxy routes are applied in-process.
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default = "default_proxy_routes", rename = "proxy")]
    pub proxy_routes: Vec<ProxyRoute>,
    /// Overrides the storage database location
    #[serde(default)]
    pub storage_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            suggestion_timeout_ms: SUGGESTION_TIMEOUT_MS,
            persist_debounce_ms: PERSIST_DEBOUNCE_MS,
            search_debounce_ms: SEARCH_DEBOUNCE_MS,
            origin: None,
            proxy_routes: default_proxy_routes(),
            storage_path: None,
        }
    }
}

impl AppConfig {
    /// Load config from the given file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let config = Self::parse(&contents)?;
        log::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Parse config from TOML text
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn suggestion_timeout(&self) -> Duration {
        Duration::from_millis(self.suggestion_timeout_ms)
    }

    pub fn persist_debounce(&self) -> Duration {
        Duration::from_millis(self.persist_debounce_ms)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// Where the storage database lives
    pub fn storage_path(&self, dirs: &AppDirs) -> PathBuf {
        self.storage_path
            .clone()
            .unwrap_or_else(|| dirs.data_dir.join(STORAGE_DB))
    }
}

/// Per-user directories for config and data
#[derive(Debug, Clone)]
pub struct AppDirs {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl AppDirs {
    /// Resolve XDG directories, falling back to `~/.config` and `~/.local/share`
    pub fn resolve() -> Self {
        if let Some(dirs) = directories::ProjectDirs::from("dev", "myyc", APP_NAME) {
            return Self {
                config_dir: dirs.config_dir().to_path_buf(),
                data_dir: dirs.data_dir().to_path_buf(),
            };
        }

        let home = std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            config_dir: home.join(".config").join(APP_NAME),
            data_dir: home.join(".local/share").join(APP_NAME),
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }
}

/// Errors reading the config file
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Invalid config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config.suggestion_timeout_ms, SUGGESTION_TIMEOUT_MS);
        assert_eq!(config.persist_debounce_ms, PERSIST_DEBOUNCE_MS);
        assert_eq!(config.proxy_routes, default_proxy_routes());
        assert!(config.origin.is_none());
    }

    #[test]
    fn test_config_overrides() {
        let config = AppConfig::parse(
            r#"
            suggestion_timeout_ms = 500
            origin = "http://localhost:3000"

            [[proxy]]
            path = "/api/custom"
            target = "https://example.com/suggest"
            "#,
        )
        .unwrap();

        assert_eq!(config.suggestion_timeout(), Duration::from_millis(500));
        assert_eq!(config.origin.as_deref(), Some("http://localhost:3000"));
        assert_eq!(config.proxy_routes.len(), 1);
        assert_eq!(config.proxy_routes[0].path, "/api/custom");
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(AppConfig::parse("timeout = 5").is_err());
    }

    #[test]
    fn test_proxy_rewrite() {
        let route = &default_proxy_routes()[0];
        assert_eq!(
            route.rewrite("/api/bilibili?term=rust").as_deref(),
            Some("https://s.search.bilibili.com/main/suggest?term=rust")
        );
        assert!(route.rewrite("/api/bilibilix?term=rust").is_none());
        assert!(route.rewrite("/other?term=rust").is_none());
    }

    #[test]
    fn test_default_tables_not_empty() {
        assert!(!SEARCH_ENGINES.is_empty());
        assert!(!THEMES.is_empty());
        assert!(!PRESET_WALLPAPERS.is_empty());
    }
}
