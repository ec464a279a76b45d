//! Settings for clash-auto.
//!
//! A YAML (or TOML) settings file layered with `CLASH_AUTO_*` environment
//! variables, and translation to `clash_auto_core::GenerateOptions`. Core
//! never sees these types -- it receives pre-validated options.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml, Yaml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use clash_auto_core::{
    DEFAULT_TARGET_GROUP, DEFAULT_USER_AGENT, GenerateOptions, TlsMode, TransportConfig,
};

/// Path tried first, relative to the working directory.
pub const LOCAL_CONFIG_PATH: &str = "config/config.yaml";

/// Prefix for environment overrides; nested keys are separated by `__`.
pub const ENV_PREFIX: &str = "CLASH_AUTO_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("settings file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("settings file already exists: {}", .path.display())]
    AlreadyExists { path: PathBuf },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize settings: {0}")]
    Serialization(String),

    #[error("settings loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Settings structs ────────────────────────────────────────────────

/// Top-level settings document.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    /// Subscription URLs, fetched in this order.
    #[serde(default)]
    pub subscriptions: Vec<String>,

    #[serde(default)]
    pub filter_rules: FilterRules,

    /// Template the merged config starts from.
    #[serde(default = "default_template_path")]
    pub template_path: PathBuf,

    /// Where the merged config is written.
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    /// Proxy group that receives every subscription proxy.
    #[serde(default = "default_target_group")]
    pub target_group: String,

    #[serde(default)]
    pub http: HttpSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            subscriptions: Vec::new(),
            filter_rules: FilterRules::default(),
            template_path: default_template_path(),
            output_path: default_output_path(),
            target_group: default_target_group(),
            http: HttpSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct FilterRules {
    /// Keep proxies whose name contains any of these (case-insensitive).
    /// Empty keeps everything.
    #[serde(default)]
    pub include_keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HttpSettings {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Some providers pick the response format from the user agent.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Accept self-signed certificates.
    #[serde(default)]
    pub insecure: bool,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            user_agent: default_user_agent(),
            insecure: false,
        }
    }
}

fn default_template_path() -> PathBuf {
    PathBuf::from("config/template.yaml")
}
fn default_output_path() -> PathBuf {
    PathBuf::from("output/config.yaml")
}
fn default_target_group() -> String {
    DEFAULT_TARGET_GROUP.into()
}
fn default_timeout() -> u64 {
    30
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.into()
}

// ── Settings file path ──────────────────────────────────────────────

/// `config/config.yaml` in the working directory if present, otherwise the
/// platform config directory.
pub fn default_config_path() -> PathBuf {
    let local = PathBuf::from(LOCAL_CONFIG_PATH);
    if local.exists() {
        return local;
    }
    platform_config_path().unwrap_or(local)
}

/// e.g. `~/.config/clash-auto/config.yaml` on Linux.
pub fn platform_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "clash-auto", "clash-auto")
        .map(|dirs| dirs.config_dir().join("config.yaml"))
}

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}

// ── Settings loading ────────────────────────────────────────────────

/// The provider stack for `path`: defaults, then the file, then env.
pub fn figment(path: &Path) -> Figment {
    let figment = Figment::new().merge(Serialized::defaults(Settings::default()));
    let figment = if is_toml(path) {
        figment.merge(Toml::file(path))
    } else {
        figment.merge(Yaml::file(path))
    };
    figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load settings from `path` plus environment overrides.
///
/// A missing file is an error rather than silently falling back to
/// defaults, which would produce a run with no subscriptions.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(figment(path).extract()?)
}

// ── Settings saving ─────────────────────────────────────────────────

/// Serialize settings in the format implied by `path`'s extension.
pub fn render_settings(settings: &Settings, path: &Path) -> Result<String, ConfigError> {
    if is_toml(path) {
        toml::to_string_pretty(settings).map_err(|e| ConfigError::Serialization(e.to_string()))
    } else {
        serde_yaml::to_string(settings).map_err(|e| ConfigError::Serialization(e.to_string()))
    }
}

/// Write settings to `path`, refusing to overwrite unless `force` is set.
pub fn save_settings(settings: &Settings, path: &Path, force: bool) -> Result<(), ConfigError> {
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists {
            path: path.to_path_buf(),
        });
    }
    let text = render_settings(settings, path)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, text)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

impl Settings {
    /// Validate and convert to the options core runs with.
    pub fn to_options(&self) -> Result<GenerateOptions, ConfigError> {
        let subscriptions = self
            .subscriptions
            .iter()
            .map(|raw| parse_subscription_url(raw))
            .collect::<Result<Vec<_>, _>>()?;

        if self.target_group.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "target_group".into(),
                reason: "must not be empty".into(),
            });
        }

        Ok(GenerateOptions {
            subscriptions,
            include_keywords: self.filter_rules.include_keywords.clone(),
            template_path: self.template_path.clone(),
            output_path: self.output_path.clone(),
            target_group: self.target_group.clone(),
        })
    }

    /// HTTP transport for fetching subscriptions.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: if self.http.insecure {
                TlsMode::DangerAcceptInvalid
            } else {
                TlsMode::System
            },
            timeout: Duration::from_secs(self.http.timeout),
            user_agent: self.http.user_agent.clone(),
        }
    }

    /// A starter settings file for `config init`.
    pub fn example() -> Self {
        Self {
            subscriptions: vec!["https://example.com/api/v1/client/subscribe?token=CHANGE-ME".into()],
            filter_rules: FilterRules {
                include_keywords: vec!["HK".into(), "SG".into(), "JP".into()],
            },
            ..Self::default()
        }
    }
}

fn parse_subscription_url(raw: &str) -> Result<Url, ConfigError> {
    let url: Url = raw.trim().parse().map_err(|e| ConfigError::Validation {
        field: "subscriptions".into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Validation {
            field: "subscriptions".into(),
            reason: format!("unsupported scheme '{other}' in '{raw}', expected http or https"),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn loads_yaml_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "config.yaml",
            "\
subscriptions:
  - https://a.example.com/sub?token=1
  - https://b.example.com/sub?token=2
filter_rules:
  include_keywords: [HK, 美国]
template_path: ./config/template.yaml
output_path: /etc/clash/config.yaml
",
        );

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.subscriptions.len(), 2);
        assert_eq!(settings.filter_rules.include_keywords, ["HK", "美国"]);
        assert_eq!(settings.output_path, PathBuf::from("/etc/clash/config.yaml"));
        assert_eq!(settings.target_group, DEFAULT_TARGET_GROUP);
        assert_eq!(settings.http, HttpSettings::default());
    }

    #[test]
    fn loads_toml_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "config.toml",
            "\
subscriptions = [\"https://a.example.com/sub\"]
target_group = \"Proxy\"

[http]
timeout = 5
insecure = true
",
        );

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.target_group, "Proxy");
        assert_eq!(settings.http.timeout, 5);
        assert!(settings.http.insecure);
        assert!(settings.filter_rules.include_keywords.is_empty());

        let transport = settings.transport();
        assert_eq!(transport.tls, TlsMode::DangerAcceptInvalid);
        assert_eq!(transport.timeout, Duration::from_secs(5));
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_settings(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }), "{err:?}");
    }

    #[test]
    fn wrong_shape_is_figment_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "config.yaml", "subscriptions: {not: a list}\n");
        let err = load_settings(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Figment(_)), "{err:?}");
    }

    #[test]
    fn to_options_keeps_order_and_fields() {
        let settings = Settings {
            subscriptions: vec![
                "https://b.example.com/2".into(),
                " https://a.example.com/1 ".into(),
            ],
            filter_rules: FilterRules {
                include_keywords: vec!["us".into()],
            },
            target_group: "Proxy".into(),
            ..Settings::default()
        };

        let opts = settings.to_options().unwrap();
        let hosts: Vec<_> = opts.subscriptions.iter().map(|u| u.host_str().unwrap()).collect();
        assert_eq!(hosts, ["b.example.com", "a.example.com"]);
        assert_eq!(opts.include_keywords, ["us"]);
        assert_eq!(opts.target_group, "Proxy");
        assert_eq!(opts.template_path, PathBuf::from("config/template.yaml"));
    }

    #[test]
    fn to_options_rejects_bad_urls() {
        for bad in ["not a url", "ftp://example.com/sub", "file:///etc/passwd"] {
            let settings = Settings {
                subscriptions: vec![bad.into()],
                ..Settings::default()
            };
            let err = settings.to_options().unwrap_err();
            assert!(
                matches!(err, ConfigError::Validation { ref field, .. } if field == "subscriptions"),
                "{bad}: {err:?}"
            );
        }
    }

    #[test]
    fn to_options_rejects_blank_target_group() {
        let settings = Settings {
            target_group: "  ".into(),
            ..Settings::default()
        };
        assert!(matches!(
            settings.to_options(),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn saved_settings_load_back() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["nested/config.yaml", "config.toml"] {
            let path = dir.path().join(name);
            save_settings(&Settings::example(), &path, false).unwrap();
            assert_eq!(load_settings(&path).unwrap(), Settings::example());
        }
    }

    #[test]
    fn save_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "config.yaml", "subscriptions: []\n");

        let err = save_settings(&Settings::example(), &path, false).unwrap_err();
        assert!(matches!(err, ConfigError::AlreadyExists { .. }));

        save_settings(&Settings::example(), &path, true).unwrap();
        assert_eq!(load_settings(&path).unwrap(), Settings::example());
    }
}
