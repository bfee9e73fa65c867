//! Remote script emulation for callback-style (JSONP) providers.
//!
//! Two pieces of thread-local state stand in for the page: a registry of
//! callback functions and a document of mounted script elements. Mounting a
//! script loads its source through a [`Transport`]; if the element is still
//! mounted once the load finishes, the body is evaluated and every call of a
//! registered callback in it is dispatched with its literal argument.

use super::literal::{is_ident_char, parse_literal};
use super::transport::Transport;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

type Callback = Box<dyn FnOnce(Value)>;

thread_local! {
    static CALLBACKS: RefCell<HashMap<String, Callback>> = RefCell::new(HashMap::new());
    static DOCUMENT: RefCell<ScriptDocument> = RefCell::new(ScriptDocument::new());
}

/// Handle to a mounted script element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScriptId(u64);

struct MountedScript {
    src: String,
    load: Option<glib::JoinHandle<()>>,
}

struct ScriptDocument {
    scripts: HashMap<u64, MountedScript>,
    next_id: u64,
}

impl ScriptDocument {
    fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            next_id: 1,
        }
    }
}

/// Register a one-shot callback under `name`, replacing any previous one.
pub fn register_callback<F>(name: &str, callback: F)
where
    F: FnOnce(Value) + 'static,
{
    CALLBACKS.with(|callbacks| {
        callbacks
            .borrow_mut()
            .insert(name.to_string(), Box::new(callback));
    });
}

/// Returns true if a callback was registered under `name`.
pub fn unregister_callback(name: &str) -> bool {
    CALLBACKS.with(|callbacks| callbacks.borrow_mut().remove(name).is_some())
}

pub fn is_registered(name: &str) -> bool {
    CALLBACKS.with(|callbacks| callbacks.borrow().contains_key(name))
}

#[cfg(test)]
pub(crate) fn registered_count() -> usize {
    CALLBACKS.with(|callbacks| callbacks.borrow().len())
}

/// Call the callback registered under `name` with `data`, consuming it.
/// Returns false if nothing is registered under that name.
pub fn invoke_callback(name: &str, data: Value) -> bool {
    let callback = CALLBACKS.with(|callbacks| callbacks.borrow_mut().remove(name));
    match callback {
        Some(callback) => {
            callback(data);
            true
        }
        None => {
            log::debug!("Ignoring call of unregistered callback {}", name);
            false
        }
    }
}

/// Mount a script element that loads `src`.
///
/// `on_error` runs if the load fails or returns a non-success status while
/// the element is still mounted.
pub fn mount_script<F>(transport: Rc<dyn Transport>, src: &str, on_error: F) -> ScriptId
where
    F: FnOnce() + 'static,
{
    let id = DOCUMENT.with(|document| {
        let mut document = document.borrow_mut();
        let id = document.next_id;
        document.next_id += 1;
        document.scripts.insert(
            id,
            MountedScript {
                src: src.to_string(),
                load: None,
            },
        );
        id
    });

    let request = transport.get(src);
    let handle = glib::spawn_future_local(async move {
        let result = request.await;

        // Detach from the element so unmounting no longer aborts this task
        let mounted = DOCUMENT.with(|document| {
            document
                .borrow_mut()
                .scripts
                .get_mut(&id)
                .map(|script| script.load.take())
                .is_some()
        });
        if !mounted {
            return;
        }

        match result {
            Ok(response) if response.is_success() => {
                let invoked = evaluate(&response.text());
                log::debug!("Script {} evaluated, {} callback(s) invoked", id, invoked);
            }
            Ok(response) => {
                log::debug!("Script {} failed to load: status {}", id, response.status);
                on_error();
            }
            Err(e) => {
                log::debug!("Script {} failed to load: {}", id, e);
                on_error();
            }
        }
    });

    DOCUMENT.with(|document| {
        if let Some(script) = document.borrow_mut().scripts.get_mut(&id) {
            script.load = Some(handle);
        }
    });

    ScriptId(id)
}

/// Remove a script element, abandoning its load if still in flight.
/// Returns false if it was not mounted.
pub fn unmount_script(id: ScriptId) -> bool {
    let removed = DOCUMENT.with(|document| document.borrow_mut().scripts.remove(&id.0));
    match removed {
        Some(script) => {
            if let Some(load) = script.load {
                load.abort();
            }
            true
        }
        None => false,
    }
}

pub fn is_mounted(id: ScriptId) -> bool {
    DOCUMENT.with(|document| document.borrow().scripts.contains_key(&id.0))
}

#[cfg(test)]
pub(crate) fn mounted_count() -> usize {
    DOCUMENT.with(|document| document.borrow().scripts.len())
}

#[cfg(test)]
pub(crate) fn script_src(id: ScriptId) -> Option<String> {
    DOCUMENT.with(|document| {
        document
            .borrow()
            .scripts
            .get(&id.0)
            .map(|script| script.src.clone())
    })
}

/// Dispatch every `name(<literal>)` call in `body` whose name is a
/// registered callback. Returns the number of callbacks invoked.
pub fn evaluate(body: &str) -> usize {
    let bytes = body.as_bytes();
    let mut invoked = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        if !is_ident_char(bytes[pos]) || (pos > 0 && is_ident_char(bytes[pos - 1])) {
            pos += 1;
            continue;
        }

        let start = pos;
        while pos < bytes.len() && is_ident_char(bytes[pos]) {
            pos += 1;
        }
        let name = &body[start..pos];

        let mut open = pos;
        while open < bytes.len() && bytes[open].is_ascii_whitespace() {
            open += 1;
        }
        if bytes.get(open) != Some(&b'(') || !is_registered(name) {
            continue;
        }

        match parse_literal(&body[open + 1..]) {
            Ok((data, consumed)) => {
                pos = open + 1 + consumed;
                if invoke_callback(name, data) {
                    invoked += 1;
                }
            }
            Err(e) => {
                log::warn!("Unreadable argument in call of {}: {}", name, e);
                pos = open + 1;
            }
        }
    }

    invoked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggest::transport::{HttpResponse, TransportError};
    use futures::future::{FutureExt, LocalBoxFuture};
    use serde_json::json;
    use std::cell::Cell;
    use std::time::Duration;

    struct StaticTransport(Result<HttpResponse, TransportError>);

    impl Transport for StaticTransport {
        fn get(&self, _url: &str) -> LocalBoxFuture<'static, Result<HttpResponse, TransportError>> {
            let result = self.0.clone();
            async move {
                glib::timeout_future(Duration::from_millis(5)).await;
                result
            }
            .boxed_local()
        }
    }

    fn capture(name: &str) -> Rc<RefCell<Option<Value>>> {
        let slot = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&slot);
        register_callback(name, move |data| *sink.borrow_mut() = Some(data));
        slot
    }

    #[test]
    fn test_evaluate_dispatches_registered_calls() {
        let slot = capture("cb_eval_1");
        let body = "/**/ cb_eval_1 ({q:'x',s:['x1','x2']});";
        assert_eq!(evaluate(body), 1);
        assert_eq!(*slot.borrow(), Some(json!({ "q": "x", "s": ["x1", "x2"] })));
        assert!(!is_registered("cb_eval_1"));
    }

    #[test]
    fn test_evaluate_ignores_unregistered_and_prefixed_names() {
        let slot = capture("cb_eval_2");
        assert_eq!(evaluate("other([1]); xcb_eval_2([2]); cb_eval_2_x([3])"), 0);
        assert!(slot.borrow().is_none());
        assert!(unregister_callback("cb_eval_2"));
    }

    #[test]
    fn test_second_invocation_is_noop() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        register_callback("cb_once", move |_| counter.set(counter.get() + 1));

        assert_eq!(evaluate("cb_once([1]); cb_once([2]);"), 1);
        assert!(!invoke_callback("cb_once", json!(null)));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_mounted_script_is_evaluated() {
        glib::MainContext::new().block_on(async {
            let slot = capture("cb_mount_ok");
            let transport: Rc<dyn Transport> =
                Rc::new(StaticTransport(Ok(HttpResponse::new(200, "cb_mount_ok([\"q\",[\"a\"]])"))));

            let id = mount_script(transport, "https://provider.test/s", || panic!("no error expected"));
            assert!(is_mounted(id));
            assert_eq!(script_src(id).as_deref(), Some("https://provider.test/s"));

            glib::timeout_future(Duration::from_millis(40)).await;
            assert_eq!(*slot.borrow(), Some(json!(["q", ["a"]])));
            assert!(unmount_script(id));
            assert!(!unmount_script(id));
        });
    }

    #[test]
    fn test_load_failure_reports_error() {
        glib::MainContext::new().block_on(async {
            let failed = Rc::new(Cell::new(0));
            for result in [
                Err(TransportError::Network("refused".into())),
                Ok(HttpResponse::new(404, "")),
            ] {
                let counter = Rc::clone(&failed);
                let id = mount_script(Rc::new(StaticTransport(result)), "https://x.test/", move || {
                    counter.set(counter.get() + 1)
                });
                glib::timeout_future(Duration::from_millis(40)).await;
                unmount_script(id);
            }
            assert_eq!(failed.get(), 2);
        });
    }

    #[test]
    fn test_unmounted_script_is_not_evaluated() {
        glib::MainContext::new().block_on(async {
            let slot = capture("cb_unmounted");
            let transport: Rc<dyn Transport> =
                Rc::new(StaticTransport(Ok(HttpResponse::new(200, "cb_unmounted([1])"))));

            let id = mount_script(transport, "https://x.test/", || {});
            assert!(unmount_script(id));

            glib::timeout_future(Duration::from_millis(40)).await;
            assert!(slot.borrow().is_none());
            assert!(unregister_callback("cb_unmounted"));
        });
    }
}
