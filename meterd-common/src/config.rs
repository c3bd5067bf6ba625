//! Configuration loading
//!
//! Every setting resolves through the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default listen address for the HTTP server
pub const DEFAULT_BIND: &str = "127.0.0.1:5850";
/// Default Gemini model used for value extraction
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
/// Default Gemini API base URL
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Default base URL advertised for stored meter images
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://storage.invalid/images";

/// Resolved runtime configuration for the meterd service
#[derive(Debug, Clone)]
pub struct MeterdConfig {
    /// Socket address the HTTP server binds to
    pub bind: String,
    /// Gemini API key; extraction fails cleanly when absent
    pub gemini_api_key: Option<String>,
    /// Gemini model name
    pub gemini_model: String,
    /// Gemini API base URL (overridable for testing)
    pub gemini_base_url: String,
    /// Base URL used to fabricate image URLs in responses
    pub image_base_url: String,
}

/// Raw TOML file contents; all fields optional
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    bind: Option<String>,
    gemini_api_key: Option<String>,
    gemini_model: Option<String>,
    gemini_base_url: Option<String>,
    image_base_url: Option<String>,
}

impl MeterdConfig {
    /// Load configuration following the four-tier priority order.
    ///
    /// `cli_bind` comes from `--bind`; `cli_config` from `--config`. An
    /// explicitly requested config file that cannot be read is an error;
    /// a missing file at the default location is not.
    pub fn load(cli_bind: Option<&str>, cli_config: Option<&Path>) -> Result<Self> {
        let file = load_file_config(cli_config)?;

        let bind = cli_bind
            .map(str::to_string)
            .or_else(|| std::env::var("METERD_BIND").ok())
            .or(file.bind)
            .unwrap_or_else(|| DEFAULT_BIND.to_string());

        let gemini_api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .or(file.gemini_api_key);

        let gemini_model = std::env::var("METERD_GEMINI_MODEL")
            .ok()
            .or(file.gemini_model)
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());

        let gemini_base_url = std::env::var("METERD_GEMINI_BASE_URL")
            .ok()
            .or(file.gemini_base_url)
            .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string());

        let image_base_url = std::env::var("METERD_IMAGE_BASE_URL")
            .ok()
            .or(file.image_base_url)
            .unwrap_or_else(|| DEFAULT_IMAGE_BASE_URL.to_string());

        Ok(Self {
            bind,
            gemini_api_key,
            gemini_model,
            gemini_base_url,
            image_base_url,
        })
    }
}

/// Read and parse the TOML config file, if one exists
fn load_file_config(cli_config: Option<&Path>) -> Result<FileConfig> {
    let path = match cli_config {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(FileConfig::default()),
        },
    };

    debug!("Loading config file: {}", path.display());
    let contents = std::fs::read_to_string(&path)?;
    toml::from_str(&contents)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Default configuration file path: ~/.config/meterd/config.toml
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("meterd").join("config.toml"))
}
