use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use synd_entity::{NestedDescriptorPolicy, OutputShape};

use crate::error::{RootError, RootResult};

/// Identity of the syndicating host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Hostname used to mint syndicated entity ids.
    #[serde(default = "default_hostname")]
    pub hostname: String,
}

fn default_hostname() -> String {
    "localhost".to_string()
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            hostname: default_hostname(),
        }
    }
}

/// Resolution settings shared by the batch resolver and the scanner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Treatment of embedded object descriptors.
    #[serde(default)]
    pub nested_descriptors: NestedDescriptorPolicy,

    /// Shape used when a batch does not name one.
    #[serde(default)]
    pub output_shape: OutputShape,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive, overridden by `RUST_LOG`.
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "synd=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

/// Top-level configuration, loaded from a TOML file
/// (typically `~/.synd/config.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RootConfig {
    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Returns `$HOME/<suffix>` if HOME is available, otherwise `./<suffix>`.
fn dirs_or_default(suffix: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(suffix))
        .unwrap_or_else(|_| PathBuf::from(suffix))
}

impl RootConfig {
    /// Load configuration from a TOML file. If the file does not exist,
    /// returns a default configuration.
    pub fn load(path: &Path) -> RootResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let config: RootConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> RootResult<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| RootError::Config(format!("TOML serialize error: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn validate(&self) -> RootResult<()> {
        let host = &self.identity.hostname;
        if host.is_empty() {
            return Err(RootError::Config("identity.hostname must not be empty".into()));
        }
        if !synd_core::is_valid_hostname(host) {
            return Err(RootError::Config(format!(
                "identity.hostname must have a label and no whitespace, got '{}'",
                host
            )));
        }
        if self.resolver.output_shape.as_str().is_empty() {
            return Err(RootError::Config("resolver.output_shape must not be empty".into()));
        }
        if self.logging.filter.trim().is_empty() {
            return Err(RootError::Config("logging.filter must not be empty".into()));
        }
        Ok(())
    }

    /// Return the path to the default config file location.
    pub fn default_config_path() -> PathBuf {
        dirs_or_default(".synd/config.toml")
    }
}
