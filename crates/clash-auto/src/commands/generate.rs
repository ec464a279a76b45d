//! The `generate` command: fetch, filter, merge, write.

use clash_auto_config::Settings;
use clash_auto_core::{SourceOutcome, SubscriptionClient, pipeline};

use crate::cli::{GenerateArgs, GlobalOpts};
use crate::commands::settings_path;
use crate::error::CliError;

/// Layer command-line flags over the loaded settings.
fn apply_overrides(settings: &mut Settings, args: &GenerateArgs) {
    if let Some(template) = &args.template {
        settings.template_path.clone_from(template);
    }
    if let Some(output) = &args.output {
        settings.output_path.clone_from(output);
    }
    if !args.keywords.is_empty() {
        settings.filter_rules.include_keywords.clone_from(&args.keywords);
    }
    if let Some(group) = &args.group {
        settings.target_group.clone_from(group);
    }
    if args.insecure {
        settings.http.insecure = true;
    }
    if let Some(timeout) = args.timeout {
        settings.http.timeout = timeout;
    }
}

pub async fn handle(args: &GenerateArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = settings_path(global);
    let mut settings = clash_auto_config::load_settings(&path)?;
    apply_overrides(&mut settings, args);
    tracing::debug!(path = %path.display(), "settings loaded");

    let options = settings.to_options()?;
    let client = SubscriptionClient::new(&settings.transport())?;

    let prepared = pipeline::prepare(&client, &options).await?;

    if args.dry_run {
        print!("{}", prepared.render(&options)?);
        return Ok(());
    }

    let summary = prepared.write(&options)?;
    if !global.quiet {
        let ok = summary.sources.iter().filter(|s| s.outcome.is_ok()).count();
        println!(
            "Wrote {} proxies ({} collected from {ok}/{} subscriptions) to {}",
            summary.filtered,
            summary.collected,
            summary.sources.len(),
            summary.output_path.display()
        );
        for report in &summary.sources {
            match &report.outcome {
                SourceOutcome::Parsed { .. } => {}
                SourceOutcome::FetchFailed { reason } | SourceOutcome::DecodeFailed { reason } => {
                    println!("  skipped {}: {reason}", report.source);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn overrides_replace_only_given_fields() {
        let mut settings = Settings::default();
        settings.filter_rules.include_keywords = vec!["hk".into()];
        settings.http.timeout = 10;

        let args = GenerateArgs {
            output: Some(PathBuf::from("/tmp/out.yaml")),
            group: Some("Proxy".into()),
            ..GenerateArgs::default()
        };
        apply_overrides(&mut settings, &args);

        assert_eq!(settings.output_path, PathBuf::from("/tmp/out.yaml"));
        assert_eq!(settings.target_group, "Proxy");
        assert_eq!(settings.template_path, Settings::default().template_path);
        assert_eq!(settings.filter_rules.include_keywords, ["hk"]);
        assert_eq!(settings.http.timeout, 10);
        assert!(!settings.http.insecure);
    }

    #[test]
    fn keyword_flags_replace_configured_keywords() {
        let mut settings = Settings::default();
        settings.filter_rules.include_keywords = vec!["hk".into(), "us".into()];

        let args = GenerateArgs {
            keywords: vec!["jp".into()],
            timeout: Some(3),
            insecure: true,
            ..GenerateArgs::default()
        };
        apply_overrides(&mut settings, &args);

        assert_eq!(settings.filter_rules.include_keywords, ["jp"]);
        assert_eq!(settings.http.timeout, 3);
        assert!(settings.http.insecure);
    }
}
