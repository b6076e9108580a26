use anyhow::Result;

use crate::brief::config::load_config;
use crate::brief::consent::ConsentGate;
use crate::brief::history::HistoryLog;
use crate::brief::paths::resolve_paths;
use crate::brief::prefs::Preferences;
use crate::commands::CommandReport;

include!(concat!(env!("OUT_DIR"), "/brief_env_allowlist.rs"));

/// Allowlisted variable names for which `is_set` holds.
pub fn set_env_keys(is_set: impl Fn(&str) -> bool) -> Vec<&'static str> {
    GENERATED_BRIEF_ENV_ALLOWLIST
        .iter()
        .copied()
        .filter(|key| is_set(key))
        .collect()
}

pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("status");

    report.detail(format!("brief_home={}", paths.brief_home.display()));
    report.detail(format!("store_dir={}", paths.store_dir.display()));
    report.detail(format!("logs_dir={}", paths.logs_dir.display()));
    report.detail(format!(
        "config_file={} present={}",
        paths.config_file.display(),
        paths.config_file.exists()
    ));

    match load_config(&paths) {
        Ok(cfg) => {
            report.detail(format!("send_timeout_secs={}", cfg.network.send_timeout_secs));
            report.detail(format!("fetch_timeout_secs={}", cfg.network.fetch_timeout_secs));
            report.detail(format!("max_page_bytes={}", cfg.network.max_page_bytes));
        }
        Err(err) => report.issue(format!("config invalid: {err:#}")),
    }

    let prefs = Preferences::open(&paths);
    let email = prefs.email();
    report.detail(format!("onboarded={}", prefs.has_completed_onboarding()));
    report.detail(format!(
        "email={}",
        if email.is_empty() { "<unset>" } else { &email }
    ));
    report.detail(format!("api_endpoint={}", prefs.api_endpoint()));
    report.detail(format!(
        "ai_summary={}",
        ConsentGate::load(prefs.clone()).state().as_str()
    ));
    report.detail(format!(
        "history_entries={}",
        HistoryLog::load(prefs.store()).len()
    ));

    let env_keys = set_env_keys(|key| std::env::var_os(key).is_some());
    if env_keys.is_empty() {
        report.detail("env_overrides=none");
    } else {
        report.detail(format!("env_overrides={}", env_keys.join(",")));
    }
    Ok(report)
}
