//! `create-job-template` binary.

use anyhow::Context;
use clap::Parser;
use tracing::debug;

use transcoder_cli::{create_job_template, logging, Args};
use transcoder_client::{TranscoderClient, TranscoderConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Err means a provider is already installed
    let _ = rustls::crypto::ring::default_provider().install_default();

    dotenvy::dotenv().ok();

    logging::init();

    let args = Args::parse();

    let config = TranscoderConfig::from_env();
    debug!(endpoint = %config.endpoint, "Transcoder config loaded");

    let client = TranscoderClient::new(config)
        .await
        .context("failed to create Transcoder client")?;

    let response = create_job_template(&client, &args).await?;
    println!("Job template: {}", response.name);

    Ok(())
}
