//! CLI entry point for Flowsmith.
//!
//! This binary provides the `flowsmith` command: generate a workflow, show
//! usage statistics, or test the connection to the completion endpoint.

mod cli;
mod helpers;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use flowsmith_agent::{GenerationService, WorkflowGenerator, spawn_service};
use flowsmith_workflow::GenerationRequest;
use tracing::info;

use crate::cli::{Cli, Commands};
use crate::helpers::{format_stats, generation_failed, init_tracing, load_client, open_usage};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the key may come from the environment or config.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { ref prompt, ref output } => {
            cmd_generate(&cli, prompt, output.as_deref()).await
        }
        Commands::Stats => cmd_stats(&cli).await,
        Commands::Ping => cmd_ping(&cli).await,
    }
}

// ---------------------------------------------------------------------------
// Subcommand: generate
// ---------------------------------------------------------------------------

async fn cmd_generate(cli: &Cli, prompt: &str, output: Option<&std::path::Path>) -> Result<()> {
    init_tracing("info");

    let (config, client) = load_client(&cli.config)?;
    let usage = open_usage(&cli.db).await?;

    let generator = WorkflowGenerator::new(Arc::new(client), config.generation());
    let service = GenerationService::new(generator).with_usage(usage);
    let (broker, handle) = spawn_service(service, 1);

    let response = broker
        .send(GenerationRequest::generate(prompt))
        .await
        .context("background service unavailable")?;
    handle.shutdown().await;

    let workflow = match response.into_result() {
        Ok(workflow) => workflow,
        Err(message) => return Err(generation_failed(&message)),
    };
    let json = workflow
        .to_pretty_json()
        .context("failed to serialize workflow")?;

    match output {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), nodes = workflow.nodes.len(), "workflow written");
            eprintln!("Import it in n8n: click \"+\" then \"From clipboard\" and paste the file contents.");
        }
        None => println!("{json}"),
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Subcommand: stats
// ---------------------------------------------------------------------------

async fn cmd_stats(cli: &Cli) -> Result<()> {
    init_tracing("warn");

    let usage = open_usage(&cli.db).await?;
    let stats = usage.load().await.context("failed to read usage statistics")?;

    println!();
    println!("  Flowsmith Usage");
    println!("  ===============");
    println!("{}", format_stats(&stats));
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// Subcommand: ping
// ---------------------------------------------------------------------------

async fn cmd_ping(cli: &Cli) -> Result<()> {
    init_tracing("warn");

    let (config, client) = load_client(&cli.config)?;
    client
        .ping()
        .await
        .with_context(|| format!("connection test against {} failed", config.base_url))?;

    println!("Connection successful ({})", config.model);
    Ok(())
}
