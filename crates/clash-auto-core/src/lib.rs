// clash-auto-core: subscription decoding, keyword filtering and the
// template merge engine, plus the pipeline tying them together.

pub mod decode;
pub mod error;
pub mod filter;
pub mod merge;
pub mod model;
pub mod pipeline;

// ── Primary re-exports ──────────────────────────────────────────────
pub use decode::{Subscription, decode};
pub use error::{DecodeError, GenerateError, RunError};
pub use filter::{KeywordFilter, filter_proxies};
pub use merge::{DEFAULT_TARGET_GROUP, generate, merge_rules, render, render_merged};
pub use model::{ClashConfig, Proxy, ProxyGroup};
pub use pipeline::{
    Collected, GenerateOptions, Prepared, RunSummary, SourceOutcome, SourceReport, collect,
    prepare, run,
};

pub use clash_auto_api::{
    DEFAULT_USER_AGENT, Error as FetchError, SubscriptionClient, TlsMode, TransportConfig,
};
