//! Config subcommand handlers.

use clash_auto_config::{Settings, load_settings, render_settings, save_settings};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::commands::settings_path;
use crate::error::CliError;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = settings_path(global);

    match args.command {
        ConfigCommand::Init { force } => {
            save_settings(&Settings::example(), &path, force)?;
            if !global.quiet {
                eprintln!("Wrote starter settings to {}", path.display());
                eprintln!("Edit `subscriptions` and `template_path`, then run: clash-auto");
            }
            Ok(())
        }

        ConfigCommand::Show => {
            let settings = load_settings(&path)?;
            print!("{}", render_settings(&settings, &path)?);
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}
