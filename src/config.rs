use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub backend: BackendConfig,
    #[serde(default)]
    pub highlight: HighlightConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    /// Base URL of the annotation backend, e.g. `https://api.example.org`.
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HighlightConfig {
    /// Probe length for long-passage fallback location.
    #[serde(default = "default_probe_len")]
    pub probe_len: usize,
    #[serde(default = "default_passage_color")]
    pub passage_color: String,
    #[serde(default = "default_keyword_color")]
    pub keyword_color: String,
    #[serde(default = "default_search_color")]
    pub search_color: String,
}

fn default_probe_len() -> usize {
    20
}
fn default_passage_color() -> String {
    "#ffe08a".to_string()
}
fn default_keyword_color() -> String {
    "#b5e0ff".to_string()
}
fn default_search_color() -> String {
    "#d8f5c0".to_string()
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            probe_len: default_probe_len(),
            passage_color: default_passage_color(),
            keyword_color: default_keyword_color(),
            search_color: default_search_color(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SelectionConfig {
    /// How often a pending selection is reasserted, in milliseconds.
    #[serde(default = "default_reassert_ms")]
    pub reassert_interval_ms: u64,
    /// How long saved/error indicators linger before reverting, in
    /// seconds.
    #[serde(default = "default_status_revert_secs")]
    pub status_revert_secs: u64,
}

fn default_reassert_ms() -> u64 {
    200
}
fn default_status_revert_secs() -> u64 {
    3
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            reassert_interval_ms: default_reassert_ms(),
            status_revert_secs: default_status_revert_secs(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.backend.base_url.trim().is_empty() {
        anyhow::bail!("backend.base_url must not be empty");
    }

    if config.highlight.probe_len == 0 {
        anyhow::bail!("highlight.probe_len must be > 0");
    }

    if config.selection.reassert_interval_ms == 0 {
        anyhow::bail!("selection.reassert_interval_ms must be > 0");
    }

    Ok(config)
}
