use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use stackgraph::RetryConfig;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("stackplan"))
}

/// Expand `~` and environment variables in a user-supplied path
pub fn expand_path(path: &str) -> Result<PathBuf> {
    let expanded =
        shellexpand::full(path).with_context(|| format!("Could not expand path: {path}"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

// ============================================================================
// User Settings
// ============================================================================

/// Optional user settings from ~/.config/stackplan/config.toml
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub apply: ApplySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplySettings {
    /// Default number of parallel jobs
    pub jobs: usize,
    /// Attempts per node for retryable errors
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds
    pub base_delay_ms: u64,
    /// Multiplier applied to the delay after each retry
    pub backoff_factor: f64,
    /// Upper bound on a single delay, in milliseconds
    pub max_delay_ms: u64,
}

impl Default for ApplySettings {
    fn default() -> Self {
        let retry = RetryConfig::default();
        Self {
            jobs: 4,
            max_attempts: retry.max_attempts,
            base_delay_ms: millis(retry.base_delay),
            backoff_factor: retry.backoff_factor,
            max_delay_ms: millis(retry.max_delay),
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl ApplySettings {
    /// Build the retry policy, letting a CLI flag override the attempt count
    pub fn retry_config(&self, max_attempts: Option<u32>) -> RetryConfig {
        RetryConfig {
            max_attempts: max_attempts.unwrap_or(self.max_attempts).max(1),
            base_delay: Duration::from_millis(self.base_delay_ms),
            backoff_factor: self.backoff_factor,
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }

    /// Reject retry settings that cannot produce a delay
    pub fn validate(&self) -> Result<()> {
        if !self.backoff_factor.is_finite() || self.backoff_factor < 0.0 {
            bail!(
                "backoff_factor must be a finite, non-negative number (got {})",
                self.backoff_factor
            );
        }
        Ok(())
    }

    /// Job count, letting a CLI flag override the configured default
    pub fn jobs(&self, jobs: Option<usize>) -> usize {
        jobs.unwrap_or(self.jobs).max(1)
    }
}

impl Settings {
    /// Load settings from the default location, or defaults if missing
    pub fn load() -> Result<Self> {
        Self::load_from(&config_dir()?.join("config.toml"))
    }

    /// Load settings from a specific file, or defaults if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read settings file: {}", path.display()))?;
        let settings: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid TOML format in {}", path.display()))?;
        settings
            .apply
            .validate()
            .with_context(|| format!("Invalid [apply] settings in {}", path.display()))?;
        Ok(settings)
    }
}
