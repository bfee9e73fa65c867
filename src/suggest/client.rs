use super::registry::{self, ProviderDescriptor, RegistryError, TransportKind};
use super::script::{self, ScriptId};
use super::transport::{Transport, TransportError};
use crate::config::{self, AppConfig, ProxyRoute};
use futures::channel::oneshot;
use futures::future::{self, Either};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use url::Url;

static CALLBACK_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Fetches search suggestions from the built-in providers.
///
/// Every request is bounded by the configured timeout. Failures of any kind
/// are logged and produce an empty list.
#[derive(Clone)]
pub struct SuggestionClient {
    transport: Rc<dyn Transport>,
    timeout: Duration,
    origin: Option<Url>,
    proxy_routes: Vec<ProxyRoute>,
}

impl SuggestionClient {
    pub fn new(transport: Rc<dyn Transport>, config: &AppConfig) -> Self {
        let origin = config.origin.as_deref().and_then(|origin| match Url::parse(origin) {
            Ok(url) => Some(url),
            Err(e) => {
                log::warn!("Ignoring invalid origin {}: {}", origin, e);
                None
            }
        });

        Self {
            transport,
            timeout: config.suggestion_timeout(),
            origin,
            proxy_routes: config.proxy_routes.clone(),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Suggestions for `query` from the provider named `engine_name`.
    pub async fn fetch_suggestions(&self, engine_name: &str, query: &str) -> Vec<String> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }

        let Some(descriptor) = registry::lookup(engine_name) else {
            log::debug!("No suggestion provider for {}", engine_name);
            return Vec::new();
        };

        let result = match descriptor.transport {
            TransportKind::DirectFetch { .. } => self.fetch_direct(descriptor, query).await,
            TransportKind::RemoteScript { .. } => self.fetch_remote_script(descriptor, query).await,
        };

        match result {
            Ok(suggestions) => {
                log::debug!(
                    "{} returned {} suggestions for '{}'",
                    descriptor.name,
                    suggestions.len(),
                    query
                );
                suggestions
            }
            Err(SuggestError::Timeout) => {
                log::debug!("{} suggestions timed out for '{}'", descriptor.name, query);
                Vec::new()
            }
            Err(e) => {
                log::warn!("Failed to fetch {} suggestions: {}", descriptor.name, e);
                Vec::new()
            }
        }
    }

    async fn fetch_direct(
        &self,
        descriptor: &'static ProviderDescriptor,
        query: &str,
    ) -> Result<Vec<String>, SuggestError> {
        let relative = registry::build_fetch_url(descriptor, query)?;
        let url = self.resolve_proxy_url(&relative)?;

        let request = self.transport.get(&url);
        let response = match future::select(request, glib::timeout_future(self.timeout)).await {
            Either::Left((result, _)) => result?,
            Either::Right(_) => return Err(SuggestError::Timeout),
        };

        if !response.is_success() {
            return Err(SuggestError::Status(response.status));
        }

        let data: serde_json::Value = serde_json::from_slice(&response.body)?;
        Ok(descriptor.parse_response(&data))
    }

    async fn fetch_remote_script(
        &self,
        descriptor: &'static ProviderDescriptor,
        query: &str,
    ) -> Result<Vec<String>, SuggestError> {
        let callback_name = next_callback_name();
        let url = registry::build_remote_script_url(descriptor, query, &callback_name)?;

        let (sender, receiver) = oneshot::channel();
        let pending = PendingGuard(Rc::new(RefCell::new(PendingRequest {
            sender: Some(sender),
            script: None,
            callback_name: callback_name.clone(),
        })));

        let on_data = Rc::clone(&pending.0);
        script::register_callback(&callback_name, move |data| {
            conclude(&on_data, Ok(descriptor.parse_response(&data)));
        });

        let on_error = Rc::clone(&pending.0);
        let script_id = script::mount_script(Rc::clone(&self.transport), &url, move || {
            conclude(&on_error, Err(SuggestError::ScriptLoad));
        });
        pending.0.borrow_mut().script = Some(script_id);
        log::debug!("Requesting {} suggestions via {}", descriptor.name, callback_name);

        match future::select(receiver, glib::timeout_future(self.timeout)).await {
            Either::Left((Ok(result), _)) => result,
            Either::Left((Err(_), _)) => Err(SuggestError::ScriptLoad),
            Either::Right(_) => {
                conclude(&pending.0, Err(SuggestError::Timeout));
                Err(SuggestError::Timeout)
            }
        }
    }

    fn resolve_proxy_url(&self, relative: &str) -> Result<String, SuggestError> {
        if let Some(origin) = &self.origin {
            return origin
                .join(relative)
                .map(String::from)
                .map_err(|e| SuggestError::Proxy(format!("{}: {}", relative, e)));
        }

        self.proxy_routes
            .iter()
            .find_map(|route| route.rewrite(relative))
            .ok_or_else(|| SuggestError::Proxy(format!("no route for {}", relative)))
    }
}

/// A unique callback name: `<prefix>_<unix millis>_<counter>`
pub fn next_callback_name() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    let count = CALLBACK_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}_{}_{}", config::CALLBACK_PREFIX, millis, count)
}

struct PendingRequest {
    sender: Option<oneshot::Sender<Result<Vec<String>, SuggestError>>>,
    script: Option<ScriptId>,
    callback_name: String,
}

/// Concludes the request when the fetch future is dropped early
struct PendingGuard(Rc<RefCell<PendingRequest>>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        conclude(&self.0, Err(SuggestError::Timeout));
    }
}

/// Remove the script and callback and deliver `result`. Only the first call
/// for a request has any effect.
fn conclude(pending: &Rc<RefCell<PendingRequest>>, result: Result<Vec<String>, SuggestError>) {
    let (sender, script_id, callback_name) = {
        let mut request = pending.borrow_mut();
        let Some(sender) = request.sender.take() else {
            return;
        };
        (sender, request.script.take(), request.callback_name.clone())
    };

    if let Some(script_id) = script_id {
        script::unmount_script(script_id);
    }
    script::unregister_callback(&callback_name);
    // The receiver is gone if the fetch was abandoned
    let _ = sender.send(result);
}

#[derive(Debug)]
enum SuggestError {
    Registry(RegistryError),
    Transport(TransportError),
    Status(u16),
    Decode(serde_json::Error),
    Proxy(String),
    ScriptLoad,
    Timeout,
}

impl std::fmt::Display for SuggestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestError::Registry(e) => write!(f, "{}", e),
            SuggestError::Transport(e) => write!(f, "{}", e),
            SuggestError::Status(status) => write!(f, "HTTP status {}", status),
            SuggestError::Decode(e) => write!(f, "Invalid response body: {}", e),
            SuggestError::Proxy(e) => write!(f, "Cannot resolve proxy URL: {}", e),
            SuggestError::ScriptLoad => write!(f, "Script failed to load"),
            SuggestError::Timeout => write!(f, "Request timed out"),
        }
    }
}

impl From<RegistryError> for SuggestError {
    fn from(e: RegistryError) -> Self {
        SuggestError::Registry(e)
    }
}

impl From<TransportError> for SuggestError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Timeout => SuggestError::Timeout,
            other => SuggestError::Transport(other),
        }
    }
}

impl From<serde_json::Error> for SuggestError {
    fn from(e: serde_json::Error) -> Self {
        SuggestError::Decode(e)
    }
}
