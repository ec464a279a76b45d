// ── Template merge engine ──
//
// template + proxies + rules -> one Clash config on disk. All mutation
// happens in memory; the output file is only touched once the merged
// document has been rendered.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::Path;

use indexmap::IndexSet;
use tracing::{debug, warn};

use crate::error::GenerateError;
use crate::model::{ClashConfig, Proxy};

/// Group populated with the subscription proxies unless configured otherwise.
pub const DEFAULT_TARGET_GROUP: &str = "线路选择";

/// Read and parse the template document.
///
/// Merge keys (`<<: *anchor`) are resolved before the schema is applied.
pub fn load_template(path: &Path) -> Result<ClashConfig, GenerateError> {
    let raw = fs::read(path).map_err(|source| GenerateError::TemplateRead {
        path: path.to_path_buf(),
        source,
    })?;
    let parse_err = |source: serde_yaml::Error| GenerateError::TemplateParse {
        path: path.to_path_buf(),
        source,
    };

    let mut doc: serde_yaml::Value = serde_yaml::from_slice(&raw).map_err(parse_err)?;
    doc.apply_merge().map_err(parse_err)?;
    serde_yaml::from_value(doc).map_err(parse_err)
}

/// Names of `proxies` in order. Records without a string `name` are skipped.
pub fn proxy_names(proxies: &[Proxy]) -> Vec<String> {
    proxies
        .iter()
        .filter_map(Proxy::name)
        .map(str::to_owned)
        .collect()
}

/// Union of two rule lists, first occurrence wins.
///
/// Duplicates inside `template` are collapsed too, so `merge_rules` applied
/// to its own output with the same `extra` returns it unchanged.
pub fn merge_rules<A, B>(template: &[A], extra: &[B]) -> Vec<String>
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    let merged: IndexSet<&str> = template
        .iter()
        .map(AsRef::as_ref)
        .chain(extra.iter().map(AsRef::as_ref))
        .collect();
    merged.into_iter().map(str::to_owned).collect()
}

/// Apply proxies, group membership and extra rules to a parsed template.
pub fn merge(
    mut config: ClashConfig,
    proxies: Vec<Proxy>,
    extra_rules: &[String],
    target_group: &str,
) -> ClashConfig {
    let names = proxy_names(&proxies);
    warn_duplicate_names(&names);

    config.replace_proxies(proxies);

    let member_count = names.len();
    if config.populate_group(target_group, names) {
        debug!(group = target_group, members = member_count, "populated proxy group");
    } else {
        warn!(group = target_group, "target proxy group not found in template, groups left unchanged");
    }

    config.rules = merge_rules(&config.rules, extra_rules);
    config
}

/// Serialize a config as YAML.
///
/// `serde_yaml` writes printable non-ASCII as literal UTF-8, so names such
/// as `🇭🇰 HK` come out as-is rather than as `\U0001F1ED` escapes. Only
/// non-printable code points like U+FEFF are still escaped.
pub fn render(config: &ClashConfig) -> Result<String, GenerateError> {
    serde_yaml::to_string(config).map_err(GenerateError::Serialize)
}

/// Load, merge and render without touching the filesystem beyond the read.
pub fn render_merged(
    template_path: &Path,
    proxies: Vec<Proxy>,
    extra_rules: &[String],
    target_group: &str,
) -> Result<String, GenerateError> {
    let template = load_template(template_path)?;
    render(&merge(template, proxies, extra_rules, target_group))
}

/// Merge `proxies` and `extra_rules` into the template at `template_path`
/// and write the result to `output_path`.
pub fn generate(
    template_path: &Path,
    output_path: &Path,
    proxies: Vec<Proxy>,
    extra_rules: &[String],
    target_group: &str,
) -> Result<(), GenerateError> {
    let rendered = render_merged(template_path, proxies, extra_rules, target_group)?;
    write_output(output_path, &rendered)
}

/// Replace `path` with `contents`, creating parent directories as needed.
///
/// The bytes go to a temporary file beside the target which is then renamed
/// over it, so a failed write never leaves a truncated config or a stray
/// temporary file.
pub fn write_output(path: &Path, contents: &str) -> Result<(), GenerateError> {
    let write_err = |source: std::io::Error| GenerateError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(write_err)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".clash-auto-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(write_err)?;
    tmp.write_all(contents.as_bytes()).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))
            .map_err(write_err)?;
    }

    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

fn warn_duplicate_names(names: &[String]) {
    let mut seen = HashSet::new();
    let duplicates: IndexSet<&str> = names
        .iter()
        .map(String::as_str)
        .filter(|name| !seen.insert(*name))
        .collect();
    if !duplicates.is_empty() {
        warn!(?duplicates, "several proxies share a name");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_yaml::Value;

    use super::*;

    const TEMPLATE: &str = "\
port: 7890
socks-port: 7891
allow-lan: false
mode: rule
log-level: info
external-controller: 127.0.0.1:9090
proxies:
  - {name: stale, type: ss, server: old.example.com, port: 1}
proxy-groups:
  - name: 线路选择
    type: select
    proxies: [stale]
  - name: 自动选择
    type: url-test
    proxies: [DIRECT]
    url: http://www.gstatic.com/generate_204
    interval: 300
rules:
  - DOMAIN-SUFFIX,local,DIRECT
  - MATCH,线路选择
";

    fn template() -> ClashConfig {
        serde_yaml::from_str(TEMPLATE).unwrap()
    }

    fn proxies(yaml: &str) -> Vec<Proxy> {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn rules(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    // ── merge_rules ─────────────────────────────────────────────────

    #[test]
    fn merge_rules_appends_unseen_rules_in_order() {
        assert_eq!(merge_rules(&["A", "B"], &["B", "C"]), ["A", "B", "C"]);
    }

    #[test]
    fn merge_rules_is_idempotent() {
        let once = merge_rules(&["A", "B"], &["B", "C"]);
        let twice = merge_rules(&once, &["B", "C"]);
        assert_eq!(twice, once);
    }

    #[test]
    fn merge_rules_collapses_template_duplicates() {
        assert_eq!(merge_rules(&["A", "A", "B"], &["A"]), ["A", "B"]);
    }

    #[test]
    fn merge_rules_is_exact_match() {
        assert_eq!(
            merge_rules(&["MATCH,DIRECT"], &["match,direct", "MATCH,DIRECT "]),
            ["MATCH,DIRECT", "match,direct", "MATCH,DIRECT "]
        );
    }

    // ── merge ───────────────────────────────────────────────────────

    #[test]
    fn merge_replaces_proxies_and_populates_target_group() {
        let input = proxies("[{name: X, type: ss}, {name: Y, type: trojan}]");
        let merged = merge(template(), input.clone(), &[], DEFAULT_TARGET_GROUP);

        assert_eq!(merged.proxies, input);
        assert_eq!(merged.group(DEFAULT_TARGET_GROUP).unwrap().members(), ["X", "Y"]);
    }

    #[test]
    fn merge_leaves_other_groups_untouched() {
        let original = template();
        let merged = merge(
            original.clone(),
            proxies("[{name: X}]"),
            &[],
            DEFAULT_TARGET_GROUP,
        );

        assert_eq!(merged.proxy_groups.len(), original.proxy_groups.len());
        assert_eq!(merged.proxy_groups[1], original.proxy_groups[1]);
        assert_eq!(merged.proxy_groups[0].extra, original.proxy_groups[0].extra);
        assert_eq!(merged.proxy_groups[0].kind, "select");
        assert_eq!(merged.settings, original.settings);
    }

    #[test]
    fn merge_without_target_group_changes_no_group() {
        let original = template();
        let merged = merge(original.clone(), proxies("[{name: X}]"), &[], "missing");

        assert_eq!(merged.proxy_groups, original.proxy_groups);
        assert_eq!(merged.proxies.len(), 1);
    }

    #[test]
    fn unnamed_proxies_stay_in_list_but_not_in_group() {
        let input = proxies("[{name: X}, {type: ss}, {name: 3}, {name: Y}]");
        let merged = merge(template(), input, &[], DEFAULT_TARGET_GROUP);

        assert_eq!(merged.proxies.len(), 4);
        assert_eq!(merged.group(DEFAULT_TARGET_GROUP).unwrap().members(), ["X", "Y"]);
    }

    #[test]
    fn duplicate_names_are_kept() {
        let input = proxies("[{name: X, server: a}, {name: X, server: b}]");
        let merged = merge(template(), input, &[], DEFAULT_TARGET_GROUP);

        assert_eq!(merged.group(DEFAULT_TARGET_GROUP).unwrap().members(), ["X", "X"]);
    }

    #[test]
    fn merge_appends_subscription_rules_after_template_rules() {
        let extra = rules(&["MATCH,线路选择", "DOMAIN-SUFFIX,google.com,线路选择"]);
        let merged = merge(template(), Vec::new(), &extra, DEFAULT_TARGET_GROUP);

        assert_eq!(
            merged.rules,
            [
                "DOMAIN-SUFFIX,local,DIRECT",
                "MATCH,线路选择",
                "DOMAIN-SUFFIX,google.com,线路选择",
            ]
        );
    }

    // ── render ──────────────────────────────────────────────────────

    #[test]
    fn render_orders_top_level_keys_like_the_template() {
        let merged = merge(template(), proxies("[{name: X}]"), &[], DEFAULT_TARGET_GROUP);
        let out = render(&merged).unwrap();

        let doc: serde_yaml::Mapping = serde_yaml::from_str(&out).unwrap();
        let keys: Vec<&str> = doc.keys().filter_map(Value::as_str).collect();
        assert_eq!(
            keys,
            [
                "port",
                "socks-port",
                "allow-lan",
                "mode",
                "log-level",
                "external-controller",
                "proxies",
                "proxy-groups",
                "rules",
            ]
        );
    }

    #[test]
    fn render_orders_group_fields_name_type_proxies_first() {
        let out = render(&template()).unwrap();
        let doc: Value = serde_yaml::from_str(&out).unwrap();

        let group = doc["proxy-groups"][1].as_mapping().unwrap();
        let keys: Vec<&str> = group.keys().filter_map(Value::as_str).collect();
        assert_eq!(keys, ["name", "type", "proxies", "url", "interval"]);
    }

    #[test]
    fn render_writes_non_ascii_literally() {
        let merged = merge(
            template(),
            proxies("[{name: \"🇨🇳 HK\", type: ss}, {name: \"🇯🇵 東京\", type: ss}]"),
            &[],
            DEFAULT_TARGET_GROUP,
        );
        let out = render(&merged).unwrap();

        assert!(out.contains("🇨🇳 HK"), "{out}");
        assert!(out.contains("🇯🇵 東京"), "{out}");
        assert!(out.contains("线路选择"), "{out}");
        assert!(!out.contains("\\u") && !out.contains("\\U"), "{out}");
    }

    #[test]
    fn render_round_trips() {
        let merged = merge(
            template(),
            proxies("[{name: X, type: ss, port: 443, udp: true, plugin-opts: {mode: websocket}}]"),
            &rules(&["GEOIP,CN,DIRECT"]),
            DEFAULT_TARGET_GROUP,
        );
        let reparsed: ClashConfig = serde_yaml::from_str(&render(&merged).unwrap()).unwrap();
        assert_eq!(reparsed, merged);
    }

    // ── filesystem ──────────────────────────────────────────────────

    #[test]
    fn load_template_distinguishes_read_and_parse_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = load_template(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(missing, GenerateError::TemplateRead { .. }), "{missing:?}");

        let bad = dir.path().join("bad.yaml");
        fs::write(&bad, "proxy-groups: [{name: only-a-name}]").unwrap();
        let invalid = load_template(&bad).unwrap_err();
        assert!(matches!(invalid, GenerateError::TemplateParse { .. }), "{invalid:?}");
    }

    #[test]
    fn load_template_resolves_merge_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anchored.yaml");
        fs::write(
            &path,
            "\
pg: &pg {type: select, proxies: [DIRECT]}
proxies: []
proxy-groups:
  - {name: 线路选择, <<: *pg}
  - {name: Other, <<: *pg, type: url-test}
rules: []
",
        )
        .unwrap();

        let cfg = load_template(&path).unwrap();
        assert_eq!(cfg.proxy_groups.len(), 2);
        let target = cfg.group(DEFAULT_TARGET_GROUP).unwrap();
        assert_eq!(target.kind, "select");
        assert_eq!(target.members(), ["DIRECT"]);
        assert_eq!(cfg.group("Other").unwrap().kind, "url-test");

        let merged = merge(cfg, proxies("[{name: X, type: ss}]"), &[], DEFAULT_TARGET_GROUP);
        assert_eq!(merged.group(DEFAULT_TARGET_GROUP).unwrap().members(), ["X"]);
        assert_eq!(merged.group("Other").unwrap().members(), ["DIRECT"]);
    }

    #[test]
    fn load_template_rejects_non_mapping_merge_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad-merge.yaml");
        fs::write(&path, "proxy-groups:\n  - {name: A, type: select, <<: 5}\n").unwrap();

        let err = load_template(&path).unwrap_err();
        assert!(matches!(err, GenerateError::TemplateParse { .. }), "{err:?}");
    }

    #[test]
    fn generate_writes_merged_config_into_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let template_path = dir.path().join("template.yaml");
        fs::write(&template_path, TEMPLATE).unwrap();
        let output_path = dir.path().join("out").join("nested").join("config.yaml");

        generate(
            &template_path,
            &output_path,
            proxies("[{name: \"🇨🇳 HK\", type: ss}]"),
            &rules(&["GEOIP,CN,DIRECT"]),
            DEFAULT_TARGET_GROUP,
        )
        .unwrap();

        let written = fs::read_to_string(&output_path).unwrap();
        let cfg: ClashConfig = serde_yaml::from_str(&written).unwrap();
        assert_eq!(cfg.group(DEFAULT_TARGET_GROUP).unwrap().members(), ["🇨🇳 HK"]);
        assert_eq!(cfg.rules.last().map(String::as_str), Some("GEOIP,CN,DIRECT"));

        let leftovers: Vec<_> = fs::read_dir(output_path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, [std::ffi::OsString::from("config.yaml")]);
    }

    #[test]
    fn generate_replaces_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        let template_path = dir.path().join("template.yaml");
        fs::write(&template_path, TEMPLATE).unwrap();
        let output_path = dir.path().join("config.yaml");
        fs::write(&output_path, "previous: run\n".repeat(100)).unwrap();

        generate(
            &template_path,
            &output_path,
            proxies("[{name: X}]"),
            &[],
            DEFAULT_TARGET_GROUP,
        )
        .unwrap();

        let written = fs::read_to_string(&output_path).unwrap();
        assert!(!written.contains("previous"));
        assert!(written.contains("name: X"));
    }

    #[test]
    fn failed_template_read_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output_path = dir.path().join("out").join("config.yaml");

        let err = generate(
            &dir.path().join("missing.yaml"),
            &output_path,
            proxies("[{name: X}]"),
            &[],
            DEFAULT_TARGET_GROUP,
        )
        .unwrap_err();

        assert!(matches!(err, GenerateError::TemplateRead { .. }));
        assert!(!output_path.exists());
        assert!(!output_path.parent().unwrap().exists());
    }

    #[test]
    fn write_output_reports_unwritable_target() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();

        let err = write_output(&blocker.join("config.yaml"), "x: 1\n").unwrap_err();
        assert!(matches!(err, GenerateError::Write { .. }), "{err:?}");
    }
}
