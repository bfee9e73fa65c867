use super::client::SuggestionClient;
use crate::config;
use crate::debounce::Debouncer;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

/// Drives suggestion lookups for a search box as the user types.
///
/// Queries are debounced. Each issued request is tagged with a sequence
/// number and its results are delivered only if no newer request was issued
/// (or the box was cleared) in the meantime.
pub struct SuggestionSession {
    client: Rc<SuggestionClient>,
    debouncer: Debouncer,
    latest: Rc<Cell<u64>>,
    max_results: usize,
}

impl SuggestionSession {
    pub fn new(client: SuggestionClient, delay: Duration) -> Self {
        Self {
            client: Rc::new(client),
            debouncer: Debouncer::new(delay),
            latest: Rc::new(Cell::new(0)),
            max_results: config::MAX_DISPLAYED_SUGGESTIONS,
        }
    }

    /// Handle a new search box value.
    ///
    /// `on_result` receives at most eight suggestions, or an empty list right
    /// away when `query` is blank. It is not called for superseded queries.
    pub fn update_query<F>(&self, engine: &str, query: &str, on_result: F)
    where
        F: FnOnce(Vec<String>) + 'static,
    {
        if query.trim().is_empty() {
            self.invalidate();
            on_result(Vec::new());
            return;
        }

        let client = Rc::clone(&self.client);
        let latest = Rc::clone(&self.latest);
        let max_results = self.max_results;
        let engine = engine.to_string();
        let query = query.to_string();

        self.debouncer.schedule(move || {
            let sequence = latest.get() + 1;
            latest.set(sequence);

            glib::spawn_future_local(async move {
                let mut suggestions = client.fetch_suggestions(&engine, &query).await;
                if latest.get() != sequence {
                    log::debug!("Discarding stale suggestions for '{}'", query);
                    return;
                }
                suggestions.truncate(max_results);
                on_result(suggestions);
            });
        });
    }

    /// Drop any pending query and ignore results still in flight.
    pub fn invalidate(&self) {
        self.debouncer.cancel();
        self.latest.set(self.latest.get() + 1);
    }

    /// Sequence number of the most recent request or invalidation
    pub fn latest_sequence(&self) -> u64 {
        self.latest.get()
    }
}

impl Drop for SuggestionSession {
    fn drop(&mut self) {
        self.invalidate();
    }
}
