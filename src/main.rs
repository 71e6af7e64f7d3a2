use anyhow::Result;
use clap::Parser;

use ct_sentinel::cli::commands::run;
use ct_sentinel::cli::flags::Cli;
use ct_sentinel::core::hash::git_hash;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!(build = %git_hash(), "starting ctsentinel");

    let cli = Cli::parse();
    run(cli).await
}
