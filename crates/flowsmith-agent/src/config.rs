//! Generator configuration.
//!
//! Reads the `[generator]` section of a TOML file (by default
//! `config/default.toml`) and lets the environment override the credential.
//! Missing files, sections and keys fall back to defaults one field at a
//! time.  The credential is never part of the defaults: it must come from
//! the file or from [`API_KEY_ENV`].

use std::path::Path;

use tracing::{debug, warn};

use crate::error::{AgentError, Result};
use crate::llm::types::{DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_TEMPERATURE, GenerationConfig};

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Environment variable holding the completion endpoint credential.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Default Gemini API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Default HTTP timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Settings for the completion endpoint and the generation request.
#[derive(Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Endpoint credential.  Empty means "not configured".
    pub api_key: String,
    /// Base URL of the endpoint.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Output token ceiling.
    pub max_output_tokens: u32,
    /// HTTP timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            model: DEFAULT_MODEL.to_owned(),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

// The credential must never end up in logs.
impl std::fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl GeneratorConfig {
    /// Load from `path`, then apply the process environment.
    ///
    /// A missing file yields defaults; an unparsable one is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = match std::fs::read_to_string(path) {
            Ok(content) => {
                let table: toml::Table = content.parse().map_err(|e| AgentError::Config {
                    reason: format!("invalid TOML in {}: {e}", path.display()),
                })?;
                debug!(path = %path.display(), "generator configuration loaded");
                Self::from_table(&table)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no configuration file, using defaults");
                Self::default()
            }
            Err(e) => {
                return Err(AgentError::Config {
                    reason: format!("failed to read {}: {e}", path.display()),
                });
            }
        };

        let config = config.with_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Build from a parsed TOML document, reading its `[generator]` table.
    pub fn from_table(table: &toml::Table) -> Self {
        let defaults = Self::default();

        let generator = match table.get("generator") {
            Some(toml::Value::Table(g)) => g,
            Some(_) => {
                warn!("`generator` is not a table, using defaults");
                return defaults;
            }
            None => return defaults,
        };

        let string = |key: &str, fallback: String| {
            generator
                .get(key)
                .and_then(|v| v.as_str())
                .map(str::to_owned)
                .unwrap_or(fallback)
        };

        Self {
            api_key: string("api_key", defaults.api_key),
            base_url: string("base_url", defaults.base_url),
            model: string("model", defaults.model),
            temperature: generator
                .get("temperature")
                .and_then(|v| v.as_float().or_else(|| v.as_integer().map(|i| i as f64)))
                .unwrap_or(defaults.temperature),
            max_output_tokens: generator
                .get("max_output_tokens")
                .and_then(|v| v.as_integer())
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(defaults.max_output_tokens),
            timeout_secs: generator
                .get("timeout_secs")
                .and_then(|v| v.as_integer())
                .and_then(|v| u64::try_from(v).ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }

    /// Override the credential from an environment lookup.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            debug!(source = API_KEY_ENV, "api key taken from environment");
            self.api_key = key.trim().to_owned();
        }
        self
    }

    /// Reject values the endpoint would refuse.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AgentError::Config {
                reason: format!("temperature must be within 0.0..=2.0, got {}", self.temperature),
            });
        }
        if self.max_output_tokens == 0 {
            return Err(AgentError::Config {
                reason: "max_output_tokens must be positive".into(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(AgentError::Config {
                reason: "timeout_secs must be positive".into(),
            });
        }
        Ok(())
    }

    /// The generation settings sent with each request.
    pub fn generation(&self) -> GenerationConfig {
        GenerationConfig {
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
