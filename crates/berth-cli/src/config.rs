//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate never sees it.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. Environment variables: `BERTH_<SECTION>__<KEY>`, e.g. `BERTH_LEDGER__PATH`
//! 3. Config file: `--config FILE`, else [`AppConfig::config_path`]
//! 4. Built-in defaults (always present)

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use berth_adapters::{default_ledger_path, default_routes_path};
use berth_core::application::{
    DEFAULT_BASE_PORT, DEFAULT_COMPOSE_FILE, DEFAULT_MAX_SCAN, DEFAULT_SUMMARY_FILE,
};
use berth_core::domain::{DEFAULT_COMPOSE_VERSION, DEFAULT_DOMAIN_SUFFIX};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "BERTH";

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub ports: PortsConfig,
    pub ledger: LedgerConfig,
    pub compose: ComposeConfig,
    pub publish: PublishConfig,
    pub output: OutputConfig,
}

/// Host port scan settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortsConfig {
    /// First host port tried.
    pub base: u16,
    /// How many candidates are tried before giving up.
    pub max_scan: u32,
    /// Skip ports some other process is already listening on.
    pub probe_host: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub path: PathBuf,
    pub lock_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeConfig {
    pub file_name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    pub enabled: bool,
    pub domain_suffix: String,
    pub routes_path: PathBuf,
    /// Empty disables the summary file.
    pub summary_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub no_color: bool,
    pub format: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ports: PortsConfig {
                base: DEFAULT_BASE_PORT,
                max_scan: DEFAULT_MAX_SCAN,
                probe_host: true,
            },
            ledger: LedgerConfig {
                path: default_ledger_path(),
                lock_timeout_ms: 3000,
            },
            compose: ComposeConfig {
                file_name: DEFAULT_COMPOSE_FILE.into(),
                version: DEFAULT_COMPOSE_VERSION.into(),
            },
            publish: PublishConfig {
                enabled: true,
                domain_suffix: DEFAULT_DOMAIN_SUFFIX.into(),
                routes_path: default_routes_path(),
                summary_file: DEFAULT_SUMMARY_FILE.into(),
            },
            output: OutputConfig {
                no_color: false,
                format: "human".into(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration: defaults, then the config file, then `BERTH_*`
    /// environment variables.
    ///
    /// An explicit `config_file` must exist; the default location is optional.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        let (path, required) = match config_file {
            Some(path) => (path.clone(), true),
            None => (Self::config_path(), false),
        };
        Self::load_from(&path, required)
    }

    fn load_from(path: &Path, required: bool) -> anyhow::Result<Self> {
        let defaults =
            Config::try_from(&Self::default()).context("Failed to seed default configuration")?;

        Config::builder()
            .add_source(defaults)
            .add_source(
                File::from(path)
                    .format(FileFormat::Toml)
                    .required(required),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?
            .try_deserialize()
            .context("Configuration has invalid values")
    }

    /// Path to the default configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `.berth.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("com", "berth", "berth")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".berth.toml"))
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.ledger.lock_timeout_ms)
    }

    pub fn summary_file(&self) -> Option<String> {
        let name = self.publish.summary_file.trim();
        (!name.is_empty()).then(|| name.to_string())
    }
}
