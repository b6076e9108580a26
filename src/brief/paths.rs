use anyhow::Result;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct BriefPaths {
    pub brief_home: PathBuf,
    /// Directory both the app session and the share command read and write.
    pub store_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub config_file: PathBuf,
}

fn required_home_dir() -> Result<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        return Ok(home);
    }
    Err(anyhow::anyhow!("HOME directory could not be resolved"))
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

pub fn resolve_paths() -> Result<BriefPaths> {
    let brief_home = match env::var("BRIEF_HOME") {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => required_home_dir()?.join(".brief"),
    };

    let store_dir = env_or_default_path("BRIEF_STORE_DIR", brief_home.join("shared"));
    let logs_dir = env_or_default_path("BRIEF_LOGS_DIR", brief_home.join("logs"));
    let config_file = env_or_default_path("BRIEF_CONFIG_PATH", brief_home.join("brief.toml"));

    Ok(BriefPaths {
        brief_home,
        store_dir,
        logs_dir,
        config_file,
    })
}

#[cfg(test)]
pub fn test_paths(root: &std::path::Path) -> BriefPaths {
    BriefPaths {
        brief_home: root.to_path_buf(),
        store_dir: root.join("shared"),
        logs_dir: root.join("logs"),
        config_file: root.join("brief.toml"),
    }
}
