// ── Keyword filter for proxy lists ──

use crate::model::Proxy;

/// Case-insensitive "name contains any keyword" predicate.
///
/// An empty keyword list is a pass-through, not a reject-all.
#[derive(Debug, Clone, Default)]
pub struct KeywordFilter {
    needles: Vec<String>,
}

impl KeywordFilter {
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Self {
        Self {
            needles: keywords.iter().map(|k| k.as_ref().to_lowercase()).collect(),
        }
    }

    pub fn is_pass_through(&self) -> bool {
        self.needles.is_empty()
    }

    /// Whether `name` contains at least one keyword, ignoring case.
    pub fn matches_name(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.needles.iter().any(|needle| name.contains(needle.as_str()))
    }

    /// Proxies without a string `name` never match.
    pub fn matches(&self, proxy: &Proxy) -> bool {
        proxy.name().is_some_and(|name| self.matches_name(name))
    }

    /// Keep matching proxies in input order, untouched.
    pub fn apply(&self, proxies: Vec<Proxy>) -> Vec<Proxy> {
        if self.is_pass_through() {
            return proxies;
        }
        proxies.into_iter().filter(|p| self.matches(p)).collect()
    }
}

/// Filter `proxies` down to those whose name contains one of `keywords`.
pub fn filter_proxies<S: AsRef<str>>(proxies: Vec<Proxy>, keywords: &[S]) -> Vec<Proxy> {
    KeywordFilter::new(keywords).apply(proxies)
}
