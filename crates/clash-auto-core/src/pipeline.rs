// ── Generate pipeline ──
//
// fetch -> decode -> collect -> filter -> merge, one source at a time in
// configured order. A source that fails to fetch or decode is reported and
// skipped; everything after collection is fatal on failure.

use std::path::PathBuf;

use tracing::{info, warn};
use url::Url;

use clash_auto_api::{SubscriptionClient, redact};

use crate::decode::decode;
use crate::error::RunError;
use crate::filter::KeywordFilter;
use crate::merge::{self, DEFAULT_TARGET_GROUP};
use crate::model::Proxy;

/// Everything a generate run needs, already validated by the caller.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub subscriptions: Vec<Url>,
    pub include_keywords: Vec<String>,
    pub template_path: PathBuf,
    pub output_path: PathBuf,
    pub target_group: String,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            subscriptions: Vec::new(),
            include_keywords: Vec::new(),
            template_path: PathBuf::from("config/template.yaml"),
            output_path: PathBuf::from("output/config.yaml"),
            target_group: DEFAULT_TARGET_GROUP.into(),
        }
    }
}

/// What happened to one subscription source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Parsed { proxies: usize, rules: usize },
    FetchFailed { reason: String },
    DecodeFailed { reason: String },
}

impl SourceOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Parsed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    /// Redacted source URL (scheme + host).
    pub source: String,
    pub outcome: SourceOutcome,
}

/// The aggregate of every source that fetched and decoded.
#[derive(Debug, Clone, Default)]
pub struct Collected {
    pub proxies: Vec<Proxy>,
    pub rules: Vec<String>,
    pub sources: Vec<SourceReport>,
}

/// Fetch and decode every subscription in order.
///
/// Never fails: per-source errors are logged and recorded in `sources`.
pub async fn collect(client: &SubscriptionClient, urls: &[Url]) -> Collected {
    let mut collected = Collected::default();
    let total = urls.len();

    for (index, url) in urls.iter().enumerate() {
        let source = redact(url);
        info!(source = %source, index = index + 1, total, "downloading subscription");

        let outcome = match client.fetch(url).await {
            Err(e) => {
                warn!(
                    source = %source,
                    error = %e,
                    transient = e.is_transient(),
                    "failed to download subscription, skipping"
                );
                SourceOutcome::FetchFailed {
                    reason: e.to_string(),
                }
            }
            Ok(body) => match decode(&body) {
                Err(e) => {
                    warn!(source = %source, error = %e, "failed to parse subscription, skipping");
                    SourceOutcome::DecodeFailed {
                        reason: e.to_string(),
                    }
                }
                Ok(sub) => {
                    let (proxies, rules) = (sub.proxies.len(), sub.rules.len());
                    info!(source = %source, proxies, rules, "parsed subscription");
                    collected.proxies.extend(sub.proxies);
                    collected.rules.extend(sub.rules);
                    SourceOutcome::Parsed { proxies, rules }
                }
            },
        };

        collected.sources.push(SourceReport { source, outcome });
    }

    collected
}

/// Proxies and rules ready to merge.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub sources: Vec<SourceReport>,
    /// Proxy count before filtering.
    pub collected: usize,
    /// Filtered proxies, in source order.
    pub proxies: Vec<Proxy>,
    /// Subscription rules, in source order, not yet deduplicated.
    pub rules: Vec<String>,
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub sources: Vec<SourceReport>,
    pub collected: usize,
    pub filtered: usize,
    pub output_path: PathBuf,
}

/// Collect and filter, stopping before the merge.
pub async fn prepare(
    client: &SubscriptionClient,
    options: &GenerateOptions,
) -> Result<Prepared, RunError> {
    let Collected {
        proxies,
        rules,
        sources,
    } = collect(client, &options.subscriptions).await;

    if proxies.is_empty() {
        return Err(RunError::NoProxies {
            sources: options.subscriptions.len(),
        });
    }
    let collected = proxies.len();
    info!(proxies = collected, rules = rules.len(), "total proxies collected");

    let filtered = KeywordFilter::new(&options.include_keywords).apply(proxies);
    info!(remaining = filtered.len(), "filtered proxies");
    if filtered.is_empty() {
        return Err(RunError::EmptyAfterFilter {
            total: collected,
            keywords: options.include_keywords.clone(),
        });
    }

    Ok(Prepared {
        sources,
        collected,
        proxies: filtered,
        rules,
    })
}

impl Prepared {
    /// Render the merged config without writing it.
    pub fn render(&self, options: &GenerateOptions) -> Result<String, RunError> {
        Ok(merge::render_merged(
            &options.template_path,
            self.proxies.clone(),
            &self.rules,
            &options.target_group,
        )?)
    }

    /// Merge into the template and write the output file.
    pub fn write(self, options: &GenerateOptions) -> Result<RunSummary, RunError> {
        let filtered = self.proxies.len();
        merge::generate(
            &options.template_path,
            &options.output_path,
            self.proxies,
            &self.rules,
            &options.target_group,
        )?;
        info!(path = %options.output_path.display(), "generated config file");

        Ok(RunSummary {
            sources: self.sources,
            collected: self.collected,
            filtered,
            output_path: options.output_path.clone(),
        })
    }
}

/// Run the whole pipeline and write the output file.
pub async fn run(
    client: &SubscriptionClient,
    options: &GenerateOptions,
) -> Result<RunSummary, RunError> {
    prepare(client, options).await?.write(options)
}
