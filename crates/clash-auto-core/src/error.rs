// ── Core error types ──
//
// Decode errors are per-source and never abort a run. Generate and run
// errors are fatal; the binary maps them onto diagnostics and exit codes.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A subscription body that is not a usable YAML document.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("subscription is not a valid Clash document: {0}")]
    Malformed(#[from] serde_yaml::Error),
}

/// Failures of the merge engine.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("failed to read template {}: {source}", .path.display())]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse template {}: {source}", .path.display())]
    TemplateParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to serialize merged config: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Fatal outcomes of a whole generate run.
#[derive(Debug, Error)]
pub enum RunError {
    // ── Data sufficiency ─────────────────────────────────────────────
    #[error("no proxies were parsed from any of the {sources} subscription(s)")]
    NoProxies { sources: usize },

    #[error("no proxies left after filtering {total} proxies by keywords {keywords:?}")]
    EmptyAfterFilter { total: usize, keywords: Vec<String> },

    // ── Merge ────────────────────────────────────────────────────────
    #[error(transparent)]
    Generate(#[from] GenerateError),
}
