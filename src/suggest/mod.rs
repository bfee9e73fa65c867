//! Search suggestions from third-party providers.
//!
//! Providers are reached either by a direct JSON request (through a
//! same-origin proxy) or by a callback script (JSONP). Both paths share a
//! timeout and degrade to an empty list on any failure.

mod client;
mod literal;
mod registry;
mod script;
mod session;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{next_callback_name, SuggestionClient};
pub use literal::{parse_literal, LiteralError};
pub use registry::{
    build_fetch_url, build_remote_script_url, lookup, providers, ProviderDescriptor, RegistryError,
    TransportKind,
};
pub use script::{
    evaluate, invoke_callback, is_mounted, is_registered, mount_script, register_callback,
    unmount_script, ScriptId,
};
pub use session::SuggestionSession;
pub use transport::{HttpResponse, SoupTransport, Transport, TransportError};
