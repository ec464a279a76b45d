// ── Clash document model ──
//
// Only the parts the merge engine inspects are typed. Everything else is
// kept in insertion-ordered `serde_yaml::Mapping`s so templates and proxy
// records round-trip without loss.

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::{Mapping, Value};

/// A single proxy definition from a subscription.
///
/// Fields vary per protocol (`ss`, `vmess`, `trojan`, ...), so the record is
/// an open mapping. `name` is the only field anything here looks at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Proxy(pub Mapping);

impl Proxy {
    /// The display name, if present and a string.
    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    pub fn fields(&self) -> &Mapping {
        &self.0
    }
}

impl From<Mapping> for Proxy {
    fn from(fields: Mapping) -> Self {
        Self(fields)
    }
}

/// A `proxy-groups` entry.
///
/// `proxies` is optional because provider-backed groups (`use:`) may omit
/// it; keeping it `None` means such groups serialize exactly as they came in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyGroup {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxies: Option<Vec<String>>,

    /// `url`, `interval`, `use`, `filter`, ... in template order.
    #[serde(flatten)]
    pub extra: Mapping,
}

impl ProxyGroup {
    /// Member proxy names (empty when the group declares none).
    pub fn members(&self) -> &[String] {
        self.proxies.as_deref().unwrap_or_default()
    }
}

/// A Clash configuration document: the template going in, the merged
/// config coming out.
///
/// Field order here is the serialized order: top-level settings first (in
/// template order), then `proxies`, `proxy-groups` and `rules`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClashConfig {
    /// `port`, `mode`, `log-level`, `dns`, ... opaque to the merge engine.
    #[serde(flatten)]
    pub settings: Mapping,

    #[serde(default, deserialize_with = "null_as_default")]
    pub proxies: Vec<Proxy>,

    #[serde(
        rename = "proxy-groups",
        default,
        deserialize_with = "null_as_default"
    )]
    pub proxy_groups: Vec<ProxyGroup>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub rules: Vec<String>,
}

impl ClashConfig {
    /// Look up a proxy group by exact name.
    pub fn group(&self, name: &str) -> Option<&ProxyGroup> {
        self.proxy_groups.iter().find(|g| g.name == name)
    }

    /// Replace the proxy list wholesale. Template proxies are discarded.
    pub fn replace_proxies(&mut self, proxies: Vec<Proxy>) {
        self.proxies = proxies;
    }

    /// Set the member list of the first group named `target`.
    ///
    /// Returns `false` (and changes nothing) when no such group exists.
    pub fn populate_group(&mut self, target: &str, names: Vec<String>) -> bool {
        match self.proxy_groups.iter_mut().find(|g| g.name == target) {
            Some(group) => {
                group.proxies = Some(names);
                true
            }
            None => false,
        }
    }
}

/// Treat an explicit YAML `null` (e.g. a bare `proxies:` key) like a
/// missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
