//! HTTP access for suggestion requests.

use crate::config;
use futures::future::{FutureExt, LocalBoxFuture};
use soup::prelude::*;

/// A completed HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Issues GET requests on the main context.
pub trait Transport {
    fn get(&self, url: &str) -> LocalBoxFuture<'static, Result<HttpResponse, TransportError>>;
}

/// libsoup-backed transport sharing one session
pub struct SoupTransport {
    session: soup::Session,
}

impl SoupTransport {
    pub fn new() -> Self {
        let session = soup::Session::new();
        session.set_user_agent(config::USER_AGENT);
        Self { session }
    }
}

impl Default for SoupTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for SoupTransport {
    fn get(&self, url: &str) -> LocalBoxFuture<'static, Result<HttpResponse, TransportError>> {
        let session = self.session.clone();
        let url = url.to_string();

        async move {
            let message = soup::Message::new("GET", &url)
                .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", url, e)))?;

            let bytes = session
                .send_and_read_future(&message, soup::glib::Priority::DEFAULT)
                .await
                .map_err(|e| TransportError::Network(e.to_string()))?;

            let status = status_code(message.status());
            log::debug!("GET {} -> {}", url, status);
            Ok(HttpResponse::new(status, bytes.to_vec()))
        }
        .boxed_local()
    }
}

fn status_code(status: soup::Status) -> u16 {
    use soup::glib::translate::IntoGlib;
    u16::try_from(status.into_glib()).unwrap_or(0)
}

/// Why a request produced no response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    InvalidUrl(String),
    Network(String),
    Timeout,
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::InvalidUrl(url) => write!(f, "Invalid URL: {}", url),
            TransportError::Network(e) => write!(f, "Request failed: {}", e),
            TransportError::Timeout => write!(f, "Request timed out"),
        }
    }
}

impl std::error::Error for TransportError {}
