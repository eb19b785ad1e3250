use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::fetch::DEFAULT_MAX_DEPTH;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_tokenizer_type")]
    pub tokenizer: String,

    #[serde(default = "default_tokenizer_model")]
    pub tokenizer_model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokenizer_file: Option<PathBuf>,

    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Environment variable holding the upstream API token.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base_url: default_api_base_url(),
            tokenizer: default_tokenizer_type(),
            tokenizer_model: default_tokenizer_model(),
            tokenizer_file: None,
            max_depth: default_max_depth(),
            bind_address: default_bind_address(),
            port: default_port(),
            token_env: default_token_env(),
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    /// Reads the API token named by `token_env`. Blank values count as unset.
    pub fn api_token(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    }
}

fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_tokenizer_type() -> String {
    "tiktoken".to_string()
}

fn default_tokenizer_model() -> String {
    "cl100k_base".to_string()
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

fn default_user_agent() -> String {
    format!("treepack/{}", env!("CARGO_PKG_VERSION"))
}

pub fn load_config() -> anyhow::Result<Config> {
    load_config_from(&get_config_path()?)
}

/// Loads the config at `path`, writing the defaults there first if it does not exist.
pub fn load_config_from(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        let config = Config::default();
        save_config_to(path, &config)?;
        return Ok(config);
    }

    let config_str = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: Config = toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(config)
}

pub fn save_config_to(path: &Path, config: &Config) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let config_str = toml::to_string_pretty(config)?;
    std::fs::write(path, config_str)?;
    Ok(())
}

pub fn get_config_path() -> anyhow::Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
        .join("treepack");
    Ok(config_dir.join("config.toml"))
}
