//! Editing the user's search engine list.
//!
//! Each operation validates against the current settings and returns the
//! settings change to apply.

use crate::sanitize::sanitize_svg_markup;
use crate::settings::{SearchEngine, SettingsPartial, UserSettings};

/// User input for a new or edited engine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineDraft {
    pub name: String,
    pub url_pattern: String,
    /// Raw SVG markup, empty for none
    pub icon: String,
}

impl EngineDraft {
    pub fn new(name: impl Into<String>, url_pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url_pattern: url_pattern.into(),
            icon: String::new(),
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }
}

struct ValidDraft {
    name: String,
    url_pattern: String,
    icon: Option<String>,
}

fn validate(draft: &EngineDraft) -> Result<ValidDraft, EngineEditError> {
    let name = draft.name.trim();
    let url_pattern = draft.url_pattern.trim();
    if name.is_empty() || url_pattern.is_empty() {
        return Err(EngineEditError::EmptyField);
    }

    let raw_icon = draft.icon.trim();
    let icon = if raw_icon.is_empty() {
        None
    } else {
        Some(sanitize_svg_markup(raw_icon).ok_or(EngineEditError::InvalidIcon)?)
    };

    Ok(ValidDraft {
        name: name.to_string(),
        url_pattern: url_pattern.to_string(),
        icon,
    })
}

fn name_taken(current: &UserSettings, name: &str) -> bool {
    current.search_engines.iter().any(|engine| engine.name == name)
}

pub fn add_engine(current: &UserSettings, draft: &EngineDraft) -> Result<SettingsPartial, EngineEditError> {
    let draft = validate(draft)?;
    if name_taken(current, &draft.name) {
        return Err(EngineEditError::DuplicateName(draft.name));
    }

    let mut engines = current.search_engines.clone();
    engines.push(SearchEngine {
        name: draft.name,
        url_pattern: draft.url_pattern,
        icon: draft.icon,
        icon_key: None,
    });
    log::info!("Search engine added");

    Ok(SettingsPartial {
        search_engines: Some(engines),
        ..Default::default()
    })
}

/// Replace the engine named `original_name`. Without new icon markup the
/// previous symbolic icon is kept; the selection follows a rename.
pub fn update_engine(
    current: &UserSettings,
    original_name: &str,
    draft: &EngineDraft,
) -> Result<SettingsPartial, EngineEditError> {
    let draft = validate(draft)?;
    if draft.name != original_name && name_taken(current, &draft.name) {
        return Err(EngineEditError::DuplicateName(draft.name));
    }

    let index = current
        .search_engines
        .iter()
        .position(|engine| engine.name == original_name)
        .ok_or_else(|| EngineEditError::NotFound(original_name.to_string()))?;

    let previous = &current.search_engines[index];
    let icon_key = if draft.icon.is_some() {
        None
    } else {
        previous.icon_key.clone()
    };

    let selected_engine = if current.selected_engine == original_name {
        draft.name.clone()
    } else {
        current.selected_engine.clone()
    };

    let mut engines = current.search_engines.clone();
    engines[index] = SearchEngine {
        name: draft.name,
        url_pattern: draft.url_pattern,
        icon: draft.icon,
        icon_key,
    };

    Ok(SettingsPartial {
        search_engines: Some(engines),
        selected_engine: Some(selected_engine),
        ..Default::default()
    })
}

/// Remove an engine. Yields `None` when no engine has that name or when it
/// is the last one left.
pub fn delete_engine(current: &UserSettings, name: &str) -> Option<SettingsPartial> {
    if current.search_engines.len() <= 1 || current.engine(name).is_none() {
        return None;
    }

    let engines: Vec<SearchEngine> = current
        .search_engines
        .iter()
        .filter(|engine| engine.name != name)
        .cloned()
        .collect();

    let selected_engine = if current.selected_engine == name {
        engines.first().map(|engine| engine.name.clone()).unwrap_or_default()
    } else {
        current.selected_engine.clone()
    };

    Some(SettingsPartial {
        search_engines: Some(engines),
        selected_engine: Some(selected_engine),
        ..Default::default()
    })
}

pub fn set_default(name: &str) -> SettingsPartial {
    SettingsPartial {
        selected_engine: Some(name.to_string()),
        ..Default::default()
    }
}

/// Move the engine at `from` to position `to`
pub fn move_engine(current: &UserSettings, from: usize, to: usize) -> Option<SettingsPartial> {
    let len = current.search_engines.len();
    if from >= len || to >= len || from == to {
        return None;
    }

    let mut engines = current.search_engines.clone();
    let engine = engines.remove(from);
    engines.insert(to, engine);

    Some(SettingsPartial {
        search_engines: Some(engines),
        ..Default::default()
    })
}

/// Why an engine edit was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEditError {
    /// Name or URL pattern is blank
    EmptyField,
    DuplicateName(String),
    /// Icon markup failed sanitization
    InvalidIcon,
    NotFound(String),
}

impl std::fmt::Display for EngineEditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineEditError::EmptyField => write!(f, "Name and URL pattern are required"),
            EngineEditError::DuplicateName(name) => {
                write!(f, "A search engine named {} already exists", name)
            }
            EngineEditError::InvalidIcon => write!(f, "Icon is not a safe SVG"),
            EngineEditError::NotFound(name) => write!(f, "No search engine named {}", name),
        }
    }
}

impl std::error::Error for EngineEditError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> UserSettings {
        UserSettings::default()
    }

    fn names(partial: &SettingsPartial) -> Vec<String> {
        partial
            .search_engines
            .as_ref()
            .unwrap()
            .iter()
            .map(|engine| engine.name.clone())
            .collect()
    }

    #[test]
    fn test_add_trims_and_appends() {
        let partial = add_engine(&settings(), &EngineDraft::new("  Mine ", " https://mine.test/?q=%s ")).unwrap();
        let engines = partial.search_engines.unwrap();
        let added = engines.last().unwrap();
        assert_eq!(added.name, "Mine");
        assert_eq!(added.url_pattern, "https://mine.test/?q=%s");
        assert!(added.icon.is_none());
        assert!(partial.selected_engine.is_none());
    }

    #[test]
    fn test_add_rejects_blank_and_duplicates() {
        assert_eq!(
            add_engine(&settings(), &EngineDraft::new(" ", "https://x.test/")),
            Err(EngineEditError::EmptyField)
        );
        assert_eq!(
            add_engine(&settings(), &EngineDraft::new("Google", "https://x.test/")),
            Err(EngineEditError::DuplicateName("Google".into()))
        );
    }

    #[test]
    fn test_add_sanitizes_icon() {
        let draft = EngineDraft::new("Iconic", "https://i.test/?q=%s")
            .with_icon("<svg onclick=\"x()\"><path d=\"M0 0\"/></svg>");
        let partial = add_engine(&settings(), &draft).unwrap();
        let icon = partial.search_engines.unwrap().last().unwrap().icon.clone().unwrap();
        assert!(!icon.contains("onclick"));

        let bad = EngineDraft::new("Bad", "https://b.test/").with_icon("<img src=x>");
        assert_eq!(add_engine(&settings(), &bad), Err(EngineEditError::InvalidIcon));
    }

    #[test]
    fn test_update_rename_moves_selection() {
        let current = settings();
        let partial = update_engine(&current, "Google", &EngineDraft::new("G", "https://g.test/?q=%s")).unwrap();
        assert_eq!(names(&partial)[0], "G");
        assert_eq!(partial.selected_engine.as_deref(), Some("G"));
        // Symbolic icon carried over
        assert_eq!(
            partial.search_engines.unwrap()[0].icon_key,
            current.search_engines[0].icon_key
        );
    }

    #[test]
    fn test_update_same_name_allowed() {
        let partial = update_engine(&settings(), "Bing", &EngineDraft::new("Bing", "https://bing.test/?q=%s")).unwrap();
        let engines = partial.search_engines.unwrap();
        assert_eq!(engines[2].url_pattern, "https://bing.test/?q=%s");
    }

    #[test]
    fn test_update_errors() {
        assert_eq!(
            update_engine(&settings(), "Bing", &EngineDraft::new("Google", "https://x.test/")),
            Err(EngineEditError::DuplicateName("Google".into()))
        );
        assert_eq!(
            update_engine(&settings(), "Nope", &EngineDraft::new("New", "https://x.test/")),
            Err(EngineEditError::NotFound("Nope".into()))
        );
    }

    #[test]
    fn test_delete_selected_falls_back_to_first() {
        let mut current = settings();
        current.selected_engine = "Bing".into();
        let partial = delete_engine(&current, "Bing").unwrap();
        assert!(!names(&partial).contains(&"Bing".to_string()));
        assert_eq!(partial.selected_engine.as_deref(), Some("Google"));
    }

    #[test]
    fn test_delete_last_engine_refused() {
        let mut current = settings();
        current.search_engines.truncate(1);
        assert!(delete_engine(&current, "Google").is_none());
    }

    #[test]
    fn test_delete_unknown_engine() {
        assert!(delete_engine(&settings(), "Nope").is_none());
    }

    #[test]
    fn test_move_engine() {
        let partial = move_engine(&settings(), 0, 2).unwrap();
        assert_eq!(names(&partial)[..3], ["Baidu", "Bing", "Google"]);
        assert!(move_engine(&settings(), 0, 99).is_none());
    }

    #[test]
    fn test_set_default() {
        assert_eq!(set_default("Bing").selected_engine.as_deref(), Some("Bing"));
    }
}
