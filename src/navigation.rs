use crate::history::record_search;
use crate::settings::{SettingsPartial, UserSettings};
use url::Url;

/// Build the destination URL for a search.
///
/// The text is percent-encoded and substituted for the first `%s` in the
/// pattern, or appended when the pattern has none. Only http and https
/// destinations are allowed.
pub fn build_search_url(url_pattern: &str, text: &str) -> Result<Url, NavigationError> {
    let encoded = urlencoding::encode(text);
    let url_str = if url_pattern.contains("%s") {
        url_pattern.replacen("%s", &encoded, 1)
    } else {
        format!("{}{}", url_pattern, encoded)
    };

    let url = Url::parse(&url_str).map_err(|e| {
        log::error!("Invalid search URL {}: {}", url_str, e);
        NavigationError::InvalidUrl(url_str.clone())
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => {
            log::error!("Unsafe URL protocol: {}", scheme);
            Err(NavigationError::UnsupportedProtocol(scheme.to_string()))
        }
    }
}

/// What submitting a search produces
#[derive(Debug)]
pub struct SearchOutcome {
    /// Where to navigate, or why not
    pub destination: Result<Url, NavigationError>,
    /// Settings change recording the query, when history is enabled
    pub history: Option<SettingsPartial>,
}

/// Submit `text` with the selected engine. Blank text does nothing.
///
/// History is recorded even when the destination turns out to be unusable.
pub fn perform_search(settings: &UserSettings, text: &str) -> Option<SearchOutcome> {
    if text.trim().is_empty() {
        return None;
    }

    let history = record_search(&settings.search_history, text, settings.enable_search_history)
        .map(|search_history| SettingsPartial {
            search_history: Some(search_history),
            ..Default::default()
        });

    let destination = match settings.selected_engine() {
        Some(engine) => build_search_url(&engine.url_pattern, text),
        None => Err(NavigationError::InvalidUrl(String::new())),
    };

    Some(SearchOutcome {
        destination,
        history,
    })
}

/// Why a search destination was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    /// The URL uses a scheme other than http or https
    UnsupportedProtocol(String),
    /// The URL does not parse
    InvalidUrl(String),
}

impl std::fmt::Display for NavigationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NavigationError::UnsupportedProtocol(scheme) => {
                write!(f, "Unsupported protocol: {}", scheme)
            }
            NavigationError::InvalidUrl(url) => write!(f, "Invalid URL: {}", url),
        }
    }
}

impl std::error::Error for NavigationError {}
