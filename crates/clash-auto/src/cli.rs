//! Clap derive structures for the `clash-auto` CLI.
//!
//! Also compiled by `build.rs` for man page generation, so this module may
//! only depend on `clap` and `clap_complete`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// clash-auto -- build one Clash config from many subscriptions
#[derive(Debug, Parser)]
#[command(
    name = "clash-auto",
    version,
    about = "Merge Clash proxy subscriptions into a template config",
    long_about = "Downloads every configured subscription, keeps the proxies whose names\n\
        match the include keywords, and merges them into a template: the proxy\n\
        list is replaced, the target proxy group is populated, and subscription\n\
        rules are appended without duplicates.\n\n\
        Runs `generate` when no subcommand is given.",
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Option<Command>,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Settings file (defaults to ./config/config.yaml, then the user config dir)
    #[arg(long, short = 'c', env = "CLASH_AUTO_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch subscriptions and write the merged config
    #[command(alias = "gen", alias = "g")]
    Generate(GenerateArgs),

    /// Manage the settings file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Generate ─────────────────────────────────────────────────────────

#[derive(Debug, Default, Args)]
pub struct GenerateArgs {
    /// Template to merge into (overrides template_path)
    #[arg(long, short = 't')]
    pub template: Option<PathBuf>,

    /// Output file (overrides output_path)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Include keyword, repeatable (replaces filter_rules.include_keywords)
    #[arg(long = "keyword", short = 'k', value_name = "KEYWORD")]
    pub keywords: Vec<String>,

    /// Proxy group to populate (overrides target_group)
    #[arg(long, short = 'g')]
    pub group: Option<String>,

    /// Accept self-signed TLS certificates from subscription servers
    #[arg(long)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides http.timeout)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Print the merged config to stdout instead of writing it
    #[arg(long)]
    pub dry_run: bool,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a starter settings file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the resolved settings (file + environment)
    Show,

    /// Print the settings file path in use
    Path,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
