//! CLI error types with miette diagnostics.
//!
//! Maps core and settings errors into user-facing errors with actionable
//! help text and a stable exit code.

use miette::Diagnostic;
use thiserror::Error;

use clash_auto_config::ConfigError;
use clash_auto_core::{FetchError, GenerateError, RunError};

/// Process exit codes. `0` is success and `2` is left to clap for usage
/// errors.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const CONFIG: i32 = 3;
    pub const NO_DATA: i32 = 4;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Settings ─────────────────────────────────────────────────────

    #[error("Settings file not found at {path}")]
    #[diagnostic(
        code(clash_auto::no_config),
        help(
            "Create one with: clash-auto config init\n\
             Or point at an existing file with --config <PATH>."
        )
    )]
    NoConfig { path: String },

    #[error("Settings file already exists at {path}")]
    #[diagnostic(
        code(clash_auto::config_exists),
        help("Use --force to overwrite it.")
    )]
    ConfigExists { path: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(clash_auto::validation))]
    Validation { field: String, reason: String },

    #[error("Could not load settings")]
    #[diagnostic(code(clash_auto::config))]
    Config(#[source] ConfigError),

    // ── Data sufficiency ─────────────────────────────────────────────

    #[error("No proxies were parsed from any of the {sources} subscription(s)")]
    #[diagnostic(
        code(clash_auto::no_proxies),
        help(
            "Check that the subscription URLs are reachable and return Clash YAML.\n\
             Run with -v to see why each source was skipped."
        )
    )]
    NoProxies { sources: usize },

    #[error("No proxies left after filtering {total} proxies")]
    #[diagnostic(
        code(clash_auto::empty_after_filter),
        help(
            "None of the proxy names contain any of: {keywords}\n\
             Adjust filter_rules.include_keywords or pass --keyword."
        )
    )]
    EmptyAfterFilter { total: usize, keywords: String },

    // ── Template / output ────────────────────────────────────────────

    #[error("Could not read template {path}")]
    #[diagnostic(
        code(clash_auto::template_read),
        help("Set template_path in the settings file or pass --template.")
    )]
    TemplateRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Template {path} is not a valid Clash config: {reason}")]
    #[diagnostic(
        code(clash_auto::template_parse),
        help("The template needs `proxy-groups` entries with `name` and `type`.")
    )]
    TemplateParse { path: String, reason: String },

    #[error("Could not write {path}")]
    #[diagnostic(code(clash_auto::write))]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not serialize the merged config: {reason}")]
    #[diagnostic(code(clash_auto::serialize))]
    Serialize { reason: String },

    // ── HTTP ─────────────────────────────────────────────────────────

    #[error("Could not set up the HTTP client: {reason}")]
    #[diagnostic(code(clash_auto::http_client))]
    HttpClient { reason: String },
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoConfig { .. }
            | Self::ConfigExists { .. }
            | Self::Validation { .. }
            | Self::Config(_) => exit_code::CONFIG,
            Self::NoProxies { .. } | Self::EmptyAfterFilter { .. } => exit_code::NO_DATA,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotFound { path } => CliError::NoConfig {
                path: path.display().to_string(),
            },
            ConfigError::AlreadyExists { path } => CliError::ConfigExists {
                path: path.display().to_string(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}

// ── Core → CliError mapping ──────────────────────────────────────────

impl From<GenerateError> for CliError {
    fn from(err: GenerateError) -> Self {
        match err {
            GenerateError::TemplateRead { path, source } => CliError::TemplateRead {
                path: path.display().to_string(),
                source,
            },
            GenerateError::TemplateParse { path, source } => CliError::TemplateParse {
                path: path.display().to_string(),
                reason: source.to_string(),
            },
            GenerateError::Serialize(source) => CliError::Serialize {
                reason: source.to_string(),
            },
            GenerateError::Write { path, source } => CliError::Write {
                path: path.display().to_string(),
                source,
            },
        }
    }
}

impl From<RunError> for CliError {
    fn from(err: RunError) -> Self {
        match err {
            RunError::NoProxies { sources } => CliError::NoProxies { sources },
            RunError::EmptyAfterFilter { total, keywords } => CliError::EmptyAfterFilter {
                total,
                keywords: keywords.join(", "),
            },
            RunError::Generate(inner) => inner.into(),
        }
    }
}

impl From<FetchError> for CliError {
    fn from(err: FetchError) -> Self {
        CliError::HttpClient {
            reason: err.to_string(),
        }
    }
}
