//! Scripted transports for tests.

use super::transport::{HttpResponse, Transport, TransportError};
use futures::future::{FutureExt, LocalBoxFuture};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use url::Url;

pub type Reply = LocalBoxFuture<'static, Result<HttpResponse, TransportError>>;

/// Records requested URLs and answers each with the responder's future
pub struct FakeTransport {
    requests: RefCell<Vec<String>>,
    respond: Box<dyn Fn(&str) -> Reply>,
}

impl FakeTransport {
    pub fn new<F>(respond: F) -> Rc<Self>
    where
        F: Fn(&str) -> Reply + 'static,
    {
        Rc::new(Self {
            requests: RefCell::new(Vec::new()),
            respond: Box::new(respond),
        })
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl Transport for FakeTransport {
    fn get(&self, url: &str) -> Reply {
        self.requests.borrow_mut().push(url.to_string());
        (self.respond)(url)
    }
}

pub fn reply(delay_ms: u64, result: Result<HttpResponse, TransportError>) -> Reply {
    async move {
        glib::timeout_future(Duration::from_millis(delay_ms)).await;
        result
    }
    .boxed_local()
}

/// Reply with `<callback>(<payload>)` like a JSONP endpoint would
pub fn jsonp_reply(url: &str, payload: &str) -> Reply {
    jsonp_reply_after(5, url, payload)
}

pub fn jsonp_reply_after(delay_ms: u64, url: &str, payload: &str) -> Reply {
    let callback = query_param(url, &["jsonp", "cb", "JsonCallback", "callback"]).unwrap_or_default();
    reply(
        delay_ms,
        Ok(HttpResponse::new(200, format!("{}({});", callback, payload))),
    )
}

pub fn query_param(url: &str, keys: &[&str]) -> Option<String> {
    let url = Url::parse(url).ok()?;
    url.query_pairs()
        .find(|(key, _)| keys.contains(&key.as_ref()))
        .map(|(_, value)| value.into_owned())
}
