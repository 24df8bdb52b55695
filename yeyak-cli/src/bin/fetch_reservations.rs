//! Fetch every education reservation listing and write the filtered artifacts.

use std::process::ExitCode;

use anyhow::{Context as _, Result};
use yeyak_cli::{EXIT_CONFIG, EXIT_FAILURE, fatal, init_tracing};
use yeyak_core::{Artifacts, Env, FetchConfig, ListingService};
use yeyak_provider_seoul as seoul;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();

    // Load .env for local runs; never overrides variables already set
    let env = Env::load();
    let config = match FetchConfig::from_env(&env) {
        Ok(config) => config,
        Err(err) => return fatal(EXIT_CONFIG, &err.into()),
    };

    match run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => fatal(EXIT_FAILURE, &err),
    }
}

async fn run(config: &FetchConfig) -> Result<()> {
    let client = seoul::client(config.request_timeout).context("failed to build HTTP client")?;
    let service = ListingService::new(seoul::port(client, config), config.page_size, config.retry);

    let records = service.fetch_all().await.context("fetch aborted")?;

    Artifacts::build(records, &config.criteria)
        .write(&config.artifacts)
        .context("failed to write artifacts")
}
