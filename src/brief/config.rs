use crate::brief::paths::BriefPaths;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BriefNetworkConfig {
    pub send_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
    pub max_page_bytes: u64,
    pub user_agent: String,
}

impl Default for BriefNetworkConfig {
    fn default() -> Self {
        Self {
            send_timeout_secs: 10,
            fetch_timeout_secs: 10,
            max_page_bytes: 2 * 1024 * 1024,
            user_agent: format!("Brief/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl BriefNetworkConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BriefHistoryConfig {
    pub display_limit: usize,
}

impl Default for BriefHistoryConfig {
    fn default() -> Self {
        Self { display_limit: 20 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BriefConfig {
    pub network: BriefNetworkConfig,
    pub history: BriefHistoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialBriefConfig {
    network: Option<BriefNetworkConfig>,
    history: Option<BriefHistoryConfig>,
}

fn env_or_u64(var: &str, fallback: u64) -> u64 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<u64>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_usize(var: &str, fallback: usize) -> usize {
    match env::var(var) {
        Ok(v) => v.trim().parse::<usize>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn validate(cfg: &BriefConfig) -> Result<()> {
    if cfg.network.send_timeout_secs == 0 {
        return Err(anyhow!("invalid send timeout: must be >= 1 second"));
    }
    if cfg.network.fetch_timeout_secs == 0 {
        return Err(anyhow!("invalid fetch timeout: must be >= 1 second"));
    }
    if cfg.network.max_page_bytes == 0 {
        return Err(anyhow!("invalid max page bytes: must be >= 1"));
    }
    if cfg.network.user_agent.trim().is_empty() {
        return Err(anyhow!("invalid user agent: cannot be empty"));
    }
    if cfg.history.display_limit == 0 {
        return Err(anyhow!("invalid history display limit: must be >= 1"));
    }
    Ok(())
}

fn merge_file_config(paths: &BriefPaths, base: &mut BriefConfig) -> Result<()> {
    let path = &paths.config_file;
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(path)?;
    let parsed: PartialBriefConfig = toml::from_str(&raw)
        .map_err(|err| anyhow!("failed to parse brief config {}: {err}", path.display()))?;
    if let Some(network) = parsed.network {
        base.network = network;
    }
    if let Some(history) = parsed.history {
        base.history = history;
    }
    Ok(())
}

fn apply_env_overrides(cfg: &mut BriefConfig) {
    cfg.network.send_timeout_secs =
        env_or_u64("BRIEF_SEND_TIMEOUT_SECS", cfg.network.send_timeout_secs);
    cfg.network.fetch_timeout_secs =
        env_or_u64("BRIEF_FETCH_TIMEOUT_SECS", cfg.network.fetch_timeout_secs);
    cfg.network.max_page_bytes = env_or_u64("BRIEF_MAX_PAGE_BYTES", cfg.network.max_page_bytes);
    cfg.network.user_agent = env_or_string("BRIEF_USER_AGENT", &cfg.network.user_agent);
    cfg.history.display_limit =
        env_or_usize("BRIEF_HISTORY_DISPLAY_LIMIT", cfg.history.display_limit);
}

pub fn load_config(paths: &BriefPaths) -> Result<BriefConfig> {
    let mut cfg = BriefConfig::default();
    merge_file_config(paths, &mut cfg)?;
    apply_env_overrides(&mut cfg);
    validate(&cfg)?;
    Ok(cfg)
}
