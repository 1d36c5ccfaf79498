use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

mod telemetry;

/// Relays GitLab merge request webhooks to Jira transitions and comments.
#[derive(Debug, Parser)]
#[command(name = "mr-jira-trigger", version, about)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, env = "MR_JIRA_TRIGGER_CONFIG", default_value = "config.yml")]
    config: PathBuf,

    /// Validate the configuration and exit without serving.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // A missing .env is fine; a broken one is reported once logging is up.
    let dotenv = dotenvy::dotenv();

    telemetry::init("info").context("installing tracing subscriber")?;

    if let Err(err) = dotenv {
        if !err.not_found() {
            warn!(%err, ".env file ignored");
        }
    }

    let config = trigger_config::load_from_path(&cli.config)
        .with_context(|| format!("YAML file configs validate error: {}", cli.config.display()))?;

    info!(
        config = %cli.config.display(),
        patterns = config.trigger.regex.len(),
        port = config.server.port,
        path = %config.server.path,
        "configuration loaded"
    );

    if cli.check {
        info!("configuration is valid");
        return Ok(());
    }

    api::start(config).await?;

    Ok(())
}
