use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Runs the most recently scheduled action once `delay` has passed without
/// another `schedule` call.
///
/// Actions run on the thread-default main context.
pub struct Debouncer {
    delay: Duration,
    pending: Rc<RefCell<Option<glib::JoinHandle<()>>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Rc::new(RefCell::new(None)),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace any pending action with `action` and restart the delay.
    pub fn schedule<F>(&self, action: F)
    where
        F: FnOnce() + 'static,
    {
        self.cancel();

        let pending = Rc::clone(&self.pending);
        let delay = self.delay;
        let handle = glib::spawn_future_local(async move {
            glib::timeout_future(delay).await;
            // Clear before running so the action may reschedule
            *pending.borrow_mut() = None;
            action();
        });
        *self.pending.borrow_mut() = Some(handle);
    }

    pub fn cancel(&self) {
        let pending = self.pending.borrow_mut().take();
        if let Some(handle) = pending {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.borrow().is_some()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn sleep(ms: u64) -> impl std::future::Future<Output = ()> {
        glib::timeout_future(Duration::from_millis(ms))
    }

    #[test]
    fn test_burst_runs_last_action_once() {
        glib::MainContext::new().block_on(async {
            let debouncer = Debouncer::new(Duration::from_millis(20));
            let runs = Rc::new(Cell::new(0));
            let last = Rc::new(Cell::new(0));

            for i in 1..=5 {
                let runs = Rc::clone(&runs);
                let last = Rc::clone(&last);
                debouncer.schedule(move || {
                    runs.set(runs.get() + 1);
                    last.set(i);
                });
            }
            assert!(debouncer.is_pending());

            sleep(80).await;
            assert_eq!(runs.get(), 1);
            assert_eq!(last.get(), 5);
            assert!(!debouncer.is_pending());
        });
    }

    #[test]
    fn test_cancel_prevents_action() {
        glib::MainContext::new().block_on(async {
            let debouncer = Debouncer::new(Duration::from_millis(10));
            let ran = Rc::new(Cell::new(false));
            let flag = Rc::clone(&ran);
            debouncer.schedule(move || flag.set(true));
            debouncer.cancel();

            sleep(50).await;
            assert!(!ran.get());
        });
    }

    #[test]
    fn test_drop_cancels() {
        glib::MainContext::new().block_on(async {
            let ran = Rc::new(Cell::new(false));
            {
                let debouncer = Debouncer::new(Duration::from_millis(10));
                let flag = Rc::clone(&ran);
                debouncer.schedule(move || flag.set(true));
            }

            sleep(50).await;
            assert!(!ran.get());
        });
    }
}
