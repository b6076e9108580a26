use anyhow::Result;

use crate::brief::audit;
use crate::brief::history::HistoryLog;
use crate::brief::paths::resolve_paths;
use crate::brief::prefs::Preferences;
use crate::commands::CommandReport;

#[derive(Debug, Clone, Default)]
pub struct ResetOptions {
    pub yes: bool,
}

pub fn run(opts: &ResetOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let prefs = Preferences::open(&paths);
    let mut history = HistoryLog::load(prefs.store());
    let mut report = CommandReport::new("reset");

    if !opts.yes {
        report.detail(format!(
            "would clear: email={} history_entries={} ai_summary={} consent_given={} onboarding={}",
            prefs.email(),
            history.len(),
            prefs.ai_summary_enabled(),
            prefs.has_accepted_ai_consent(),
            prefs.has_completed_onboarding()
        ));
        report.detail("api endpoint is kept; rerun with --yes to reset");
        return Ok(report);
    }

    let cleared = history.len();
    prefs.reset_all(&mut history);
    audit::record(
        &paths,
        "reset",
        "ok",
        &format!("cleared preferences and {cleared} history entries"),
    );
    report.detail(format!("history_cleared={cleared}"));
    report.detail(format!("api_endpoint_kept={}", prefs.api_endpoint()));
    Ok(report)
}
