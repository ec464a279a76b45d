// Build-time assets: man pages and shell completions, written under
// $OUT_DIR/{man,completions} for packagers to pick up.

use std::fs;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::Shell;

#[path = "src/cli.rs"]
#[allow(dead_code)]
mod cli;

const BIN_NAME: &str = "clash-auto";

fn main() {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let out_dir: PathBuf = std::env::var_os("OUT_DIR")
        .expect("OUT_DIR not set by Cargo")
        .into();

    let mut cmd = cli::Cli::command();
    cmd.build();

    let man_dir = create(&out_dir.join("man"));
    render_man(&cmd, BIN_NAME, &man_dir);

    let completions_dir = create(&out_dir.join("completions"));
    for shell in [Shell::Bash, Shell::Zsh, Shell::Fish, Shell::PowerShell] {
        clap_complete::generate_to(shell, &mut cmd, BIN_NAME, &completions_dir)
            .unwrap_or_else(|e| panic!("failed to write {shell} completions: {e}"));
    }
}

fn create(dir: &Path) -> PathBuf {
    fs::create_dir_all(dir).unwrap_or_else(|e| panic!("failed to create {}: {e}", dir.display()));
    dir.to_path_buf()
}

/// One page per command path: `clash-auto.1`, `clash-auto-config-init.1`, ...
fn render_man(cmd: &clap::Command, page: &str, dir: &Path) {
    let mut buf = Vec::new();
    clap_mangen::Man::new(cmd.clone().name(page.to_owned()))
        .render(&mut buf)
        .unwrap_or_else(|e| panic!("failed to render man page `{page}`: {e}"));
    fs::write(dir.join(format!("{page}.1")), buf)
        .unwrap_or_else(|e| panic!("failed to write man page `{page}`: {e}"));

    for sub in cmd.get_subcommands() {
        if sub.is_hide_set() || sub.get_name() == "help" {
            continue;
        }
        render_man(sub, &format!("{page}-{}", sub.get_name()), dir);
    }
}
