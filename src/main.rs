use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, Instrument};

mod cli;
mod config;
mod domain;
mod error;
mod infrastructure;
mod logging;
mod services;
mod ui;

use cli::Cli;
use config::TaggerConfig;
use domain::build::BuildIdentifier;
use error::{ConfigError, TagError};
use infrastructure::http::build_client;
use infrastructure::{BitbucketClient, BitbucketCredentials, TeamCityClient, TeamCityCredentials};
use services::{ReleaseRequest, RunReport, TagService};

/// Load the config file and apply command-line overrides
fn load_config(cli: &Cli) -> Result<TaggerConfig> {
    let config = TaggerConfig::load(cli.config.as_deref())
        .context("Failed to load configuration")?
        .with_overrides(cli.overrides());

    if let Err(errors) = config.validate() {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        let message = errors
            .iter()
            .map(ConfigError::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        anyhow::bail!("Invalid configuration: {}", message);
    }
    Ok(config)
}

async fn run(cli: &Cli, config: &TaggerConfig) -> Result<RunReport, TagError> {
    let client = build_client(config.network.connect_timeout()?)?;
    let ci = TeamCityClient::new(
        client.clone(),
        config.ci_base_url()?,
        TeamCityCredentials::new(&cli.tc_token),
    );
    let vcs = BitbucketClient::new(
        client,
        config.vcs.base_url.as_str(),
        BitbucketCredentials::new(&cli.bb_username, &cli.bb_password),
    );
    info!(teamcity = %ci.base_url(), bitbucket = %vcs.base_url(), "Using REST endpoints");

    let service = TagService::new(
        Arc::new(ci),
        Arc::new(vcs),
        config.mapping.clone(),
        config.network.pool_size(),
    );
    let request = ReleaseRequest {
        build: BuildIdentifier::new(&config.ci.build_type, &cli.build),
        release: cli.release.clone(),
        mode: cli.mode(),
    };

    service.execute(&request).await.map_err(TagError::from)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    let config = load_config(&cli)?;

    let run_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("run", run_id = %run_id, release = %cli.release);

    // Partial fan-out failures are reported in the summary, not the exit status
    let report = run(&cli, &config)
        .instrument(span)
        .await
        .with_context(|| format!("Release tagging for build {} failed", cli.build))?;

    ui::print_summary(
        &format!("Release {} ({})", cli.release, cli.mode().verb()),
        &report,
    );
    Ok(())
}
