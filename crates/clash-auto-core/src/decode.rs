// ── Subscription decoding ──
//
// Clash subscriptions are YAML documents with `proxies` and usually
// `rules`. Some providers ship rule lists the full schema rejects; those
// still yield their proxies.

use serde::Deserialize;
use tracing::debug;

use crate::error::DecodeError;
use crate::model::{Proxy, null_as_default};

/// The useful content of one subscription.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Subscription {
    pub proxies: Vec<Proxy>,
    pub rules: Vec<String>,
}

#[derive(Deserialize)]
struct SubscriptionDoc {
    #[serde(default, deserialize_with = "null_as_default")]
    proxies: Vec<Proxy>,
    #[serde(default, deserialize_with = "null_as_default")]
    rules: Vec<String>,
}

#[derive(Deserialize)]
struct ProxiesOnly {
    #[serde(default, deserialize_with = "null_as_default")]
    proxies: Vec<Proxy>,
}

/// Decode a raw subscription body.
///
/// Missing `proxies`/`rules` fields decode as empty. If the full document
/// does not fit, only `proxies` is extracted and rules come back empty.
/// Fails only when neither reading works; the error is the one from the
/// full read.
pub fn decode(raw: &[u8]) -> Result<Subscription, DecodeError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(Subscription::default());
    }

    match serde_yaml::from_slice::<Option<SubscriptionDoc>>(raw) {
        Ok(doc) => Ok(doc.map_or_else(Subscription::default, |doc| Subscription {
            proxies: doc.proxies,
            rules: doc.rules,
        })),
        Err(full) => match serde_yaml::from_slice::<Option<ProxiesOnly>>(raw) {
            Ok(doc) => {
                debug!(error = %full, "full subscription read failed, kept proxies only");
                Ok(Subscription {
                    proxies: doc.map(|d| d.proxies).unwrap_or_default(),
                    rules: Vec::new(),
                })
            }
            Err(_) => Err(DecodeError::Malformed(full)),
        },
    }
}
