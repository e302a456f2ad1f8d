//! Wavelet Estimate - Command-line gas estimator for Wavelet contracts.

pub mod commands;
pub mod config;
pub mod output;
pub mod telemetry;

use clap::Parser;
use colored::Colorize;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = commands::Cli::parse();

    let config = config::CliConfig::load(cli.config.as_deref())?
        .with_overrides(cli.node, cli.log_level);
    config.validate()?;

    telemetry::init_telemetry(&config.log_level, config.json_logs)?;

    if let Err(e) = commands::execute(cli.command, &config).await {
        if e.downcast_ref::<commands::Reported>().is_none() {
            eprintln!("{}", format!("Error: {:#}", e).red());
        }
        std::process::exit(1);
    }

    Ok(())
}
