//! Shared helpers for the CLI binary.

use std::path::Path;

use anyhow::{Context, Result};
use flowsmith_agent::{GeminiClient, GeneratorConfig};
use flowsmith_store::{Database, UsageStats, UsageStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Initialize the global tracing subscriber.
///
/// Respects `RUST_LOG` if set, otherwise uses `default_level`.  Logs go to
/// stderr so generated JSON on stdout stays clean.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

/// Load the generator configuration and build the endpoint client.
pub fn load_client(config_path: &Path) -> Result<(GeneratorConfig, GeminiClient)> {
    let config = GeneratorConfig::load(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    let client = GeminiClient::new(&config).context(
        "failed to create completion client (set GEMINI_API_KEY or [generator].api_key)",
    )?;
    info!(model = %config.model, "generator configured");
    Ok((config, client))
}

/// Open (creating if needed) the usage database.
pub async fn open_usage(db_path: &Path) -> Result<UsageStore> {
    if let Some(dir) = db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    let db = Database::open(db_path.to_path_buf())
        .await
        .context("failed to open database")?;
    Ok(UsageStore::new(db))
}

/// Error returned from `main` when the service answered `{success: false}`.
///
/// `main` already prefixes the report with `Error: `, so the message carries
/// only the reason.
pub fn generation_failed(message: &str) -> anyhow::Error {
    anyhow::anyhow!("workflow generation failed: {message}")
}

/// Human-readable usage report.
pub fn format_stats(stats: &UsageStats) -> String {
    format!(
        "  Workflows generated: {}\n  Successful:          {}\n  Success rate:        {}%\n  Last used:           {}",
        stats.generated,
        stats.successful,
        stats.success_rate,
        stats.last_used.as_deref().unwrap_or("never"),
    )
}
