mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config_dir = commands::resolve_config_dir(cli.config_dir);

    let code = match cli.command {
        Command::Validate { seed } => commands::validate(seed)?,
        Command::Create { seed, key_name, subnet_id, no_wait } => {
            commands::create(config_dir, seed, key_name, subnet_id, no_wait).await?
        }
        Command::Delete { cluster_name } => commands::delete(config_dir, cli.region, cluster_name).await?,
        Command::List => commands::list(config_dir).await?,
        Command::Status { cluster_name } => commands::status(config_dir, cluster_name).await?,
    };

    std::process::exit(code);
}
