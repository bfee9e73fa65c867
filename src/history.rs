//! Search history, most recent first.

use crate::config::MAX_SEARCH_HISTORY;
use crate::settings::SettingsPartial;

/// The history after searching for `text`, or `None` when history is off.
///
/// `text` moves to the front, earlier copies are removed and the oldest
/// entries are dropped past the limit.
pub fn record_search(history: &[String], text: &str, enabled: bool) -> Option<Vec<String>> {
    if !enabled {
        return None;
    }

    let mut updated = Vec::with_capacity(MAX_SEARCH_HISTORY);
    updated.push(text.to_string());
    updated.extend(history.iter().filter(|entry| *entry != text).cloned());
    updated.truncate(MAX_SEARCH_HISTORY);
    Some(updated)
}

pub fn clear_history() -> SettingsPartial {
    SettingsPartial {
        search_history: Some(Vec::new()),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|entry| entry.to_string()).collect()
    }

    #[test]
    fn test_new_entry_goes_first() {
        let updated = record_search(&history(&["b", "c"]), "a", true).unwrap();
        assert_eq!(updated, history(&["a", "b", "c"]));
    }

    #[test]
    fn test_duplicate_moves_to_front() {
        let updated = record_search(&history(&["b", "a", "c", "a"]), "a", true).unwrap();
        assert_eq!(updated, history(&["a", "b", "c"]));
    }

    #[test]
    fn test_limit() {
        let full: Vec<String> = (0..MAX_SEARCH_HISTORY).map(|i| i.to_string()).collect();
        let updated = record_search(&full, "new", true).unwrap();
        assert_eq!(updated.len(), MAX_SEARCH_HISTORY);
        assert_eq!(updated[0], "new");
        assert_eq!(updated.last().map(String::as_str), Some("18"));
    }

    #[test]
    fn test_disabled() {
        assert_eq!(record_search(&history(&["a"]), "b", false), None);
    }

    #[test]
    fn test_clear() {
        assert_eq!(clear_history().search_history, Some(Vec::new()));
    }
}
