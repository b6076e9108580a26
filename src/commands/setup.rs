use anyhow::Result;

use crate::brief::audit;
use crate::brief::paths::resolve_paths;
use crate::brief::prefs::Preferences;
use crate::brief::send::validate_endpoint;
use crate::commands::CommandReport;

#[derive(Debug, Clone)]
pub struct SetupOptions {
    pub email: String,
    pub endpoint: Option<String>,
}

pub fn run(opts: &SetupOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let prefs = Preferences::open(&paths);
    let mut report = CommandReport::new("setup");

    if let Some(endpoint) = opts.endpoint.as_deref() {
        match validate_endpoint(endpoint) {
            Ok(_) => prefs.set_api_endpoint(endpoint.trim()),
            Err(err) => {
                report.issue(format!("{}: {err}", err.code()));
                return Ok(report);
            }
        }
    }

    if let Err(err) = prefs.complete_onboarding(&opts.email) {
        report.issue(format!("{err:#}"));
        return Ok(report);
    }

    audit::record(&paths, "setup", "ok", "onboarding completed");
    report.detail(format!("email={}", prefs.email()));
    report.detail(format!("api_endpoint={}", prefs.api_endpoint()));
    report.detail(format!("store_dir={}", paths.store_dir.display()));
    Ok(report)
}
