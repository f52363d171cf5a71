use anyhow::Result;
use clap::Parser;
use covmetrics::cli::{init_logging, Cli, Commands};
use covmetrics::commands::{list_checkers, run_check};
use covmetrics::config::CheckSettings;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbosity);

    match cli.command {
        Commands::Check(args) => {
            let settings = CheckSettings::from_args(&args)?;
            run_check(&settings, cli.verbosity)?;
        }
        Commands::ListCheckers {
            config_dir,
            config_file,
        } => list_checkers(config_dir.as_deref(), config_file.as_deref())?,
    }

    Ok(())
}
