// clash-auto-api: HTTP transport for fetching proxy subscription feeds.

pub mod client;
pub mod error;
pub mod transport;

pub use client::{SubscriptionClient, redact};
pub use error::Error;
pub use transport::{DEFAULT_USER_AGENT, TlsMode, TransportConfig};
