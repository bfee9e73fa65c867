use super::model::UserSettings;
use super::patch::SettingsPatch;
use super::persist::{load_settings, save_settings};
use crate::debounce::Debouncer;
use crate::storage::{Storage, StorageError};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

type Listener = Rc<dyn Fn(&UserSettings)>;
type ErrorHandler = Rc<dyn Fn(&StorageError)>;

/// Owner of the live settings value.
///
/// Every change schedules a debounced write of the value current when the
/// write fires, so a burst of changes produces one write. Dropping the store
/// discards a write that has not fired yet.
pub struct SettingsStore {
    inner: Rc<StoreInner>,
}

struct StoreInner {
    state: RefCell<UserSettings>,
    storage: Rc<dyn Storage>,
    writer: Debouncer,
    listeners: RefCell<Vec<Listener>>,
    error_handlers: RefCell<Vec<ErrorHandler>>,
}

impl SettingsStore {
    /// Load the initial value from `storage`. Loading never writes.
    pub fn new(storage: Rc<dyn Storage>, defaults: &UserSettings, persist_delay: Duration) -> Self {
        let initial = load_settings(storage.as_ref(), defaults);
        Self {
            inner: Rc::new(StoreInner {
                state: RefCell::new(initial),
                storage,
                writer: Debouncer::new(persist_delay),
                listeners: RefCell::new(Vec::new()),
                error_handlers: RefCell::new(Vec::new()),
            }),
        }
    }

    /// A snapshot of the current settings
    pub fn settings(&self) -> UserSettings {
        self.inner.state.borrow().clone()
    }

    pub fn with_settings<R>(&self, f: impl FnOnce(&UserSettings) -> R) -> R {
        f(&self.inner.state.borrow())
    }

    pub fn replace(&self, value: UserSettings) {
        self.transition(value);
    }

    pub fn patch(&self, patch: impl Into<SettingsPatch>) {
        let patch: SettingsPatch = patch.into();
        let next = {
            let current = self.inner.state.borrow();
            patch.apply(&current)
        };
        self.transition(next);
    }

    /// Write a pending change now instead of waiting for the delay. Does
    /// nothing when no change is pending.
    pub fn flush(&self) -> Result<(), StorageError> {
        if !self.inner.writer.is_pending() {
            return Ok(());
        }
        self.inner.writer.cancel();
        let state = self.inner.state.borrow();
        save_settings(self.inner.storage.as_ref(), &state)
    }

    pub fn has_pending_write(&self) -> bool {
        self.inner.writer.is_pending()
    }

    /// Notify `listener` after every change
    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&UserSettings) + 'static,
    {
        self.inner.listeners.borrow_mut().push(Rc::new(listener));
    }

    /// Receive errors from debounced writes
    pub fn subscribe_errors<F>(&self, handler: F)
    where
        F: Fn(&StorageError) + 'static,
    {
        self.inner.error_handlers.borrow_mut().push(Rc::new(handler));
    }

    fn transition(&self, next: UserSettings) {
        *self.inner.state.borrow_mut() = next;
        self.schedule_write();
        self.notify();
    }

    fn schedule_write(&self) {
        let weak: Weak<StoreInner> = Rc::downgrade(&self.inner);
        self.inner.writer.schedule(move || {
            if let Some(inner) = weak.upgrade() {
                inner.write();
            }
        });
    }

    fn notify(&self) {
        let listeners: Vec<Listener> = self.inner.listeners.borrow().clone();
        if listeners.is_empty() {
            return;
        }
        let snapshot = self.settings();
        for listener in listeners {
            listener(&snapshot);
        }
    }
}

impl StoreInner {
    fn write(&self) {
        let result = {
            let state = self.state.borrow();
            save_settings(self.storage.as_ref(), &state)
        };

        if let Err(e) = result {
            log::error!("Failed to save settings: {}", e);
            let handlers: Vec<ErrorHandler> = self.error_handlers.borrow().clone();
            for handler in handlers {
                handler(&e);
            }
        }
    }
}
