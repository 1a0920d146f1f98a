//! Application configuration for the portfolio harvester.
//!
//! User config lives at `~/.portfolio-harvester/harvester.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PortfolioError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "harvester.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".portfolio-harvester";

// ---------------------------------------------------------------------------
// Config structs (matching harvester.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Portfolio website settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Detail fan-out settings.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Reference and funding-round dataset locations.
    #[serde(default)]
    pub datasets: DatasetsConfig,

    /// Where enriched results are written.
    #[serde(default)]
    pub output: OutputConfig,
}

/// `[source]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Origin of the portfolio website (no trailing slash).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://eqtgroup.com".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[fetch]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Maximum concurrent detail requests. Unset means one per logical core.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,
}

/// `[datasets]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetsConfig {
    /// Public bucket URL the dataset objects are downloaded from.
    #[serde(default = "default_datasets_base_url")]
    pub base_url: String,

    /// Read dataset objects from this directory instead of downloading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_dir: Option<String>,

    /// Object name of the organization dataset.
    #[serde(default = "default_organizations")]
    pub organizations: String,

    /// Object name of the funding-round dataset.
    #[serde(default = "default_funding_rounds")]
    pub funding_rounds: String,
}

impl Default for DatasetsConfig {
    fn default() -> Self {
        Self {
            base_url: default_datasets_base_url(),
            local_dir: None,
            organizations: default_organizations(),
            funding_rounds: default_funding_rounds(),
        }
    }
}

fn default_datasets_base_url() -> String {
    "https://storage.googleapis.com/motherbrain-external-test".into()
}
fn default_organizations() -> String {
    "interview-test-org.json.gz".into()
}
fn default_funding_rounds() -> String {
    "interview-test-funding.json.gz".into()
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory that receives `result_<timestamp>.json` files.
    #[serde(default = "default_output_dir")]
    pub dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> String {
    "results".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.portfolio-harvester/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| PortfolioError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.portfolio-harvester/harvester.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PortfolioError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        PortfolioError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| PortfolioError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| PortfolioError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| PortfolioError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Reject values that would only fail later, mid-run.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    url::Url::parse(&config.source.base_url).map_err(|e| {
        PortfolioError::config(format!(
            "source.base_url '{}' is not a URL: {e}",
            config.source.base_url
        ))
    })?;

    if config.fetch.concurrency == Some(0) {
        return Err(PortfolioError::config("fetch.concurrency must be at least 1"));
    }

    if config.datasets.local_dir.is_none() {
        url::Url::parse(&config.datasets.base_url).map_err(|e| {
            PortfolioError::config(format!(
                "datasets.base_url '{}' is not a URL: {e}",
                config.datasets.base_url
            ))
        })?;
    }

    Ok(())
}
