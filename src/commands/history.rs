use anyhow::Result;

use crate::brief::config::load_config;
use crate::brief::history::HistoryLog;
use crate::brief::paths::resolve_paths;
use crate::brief::prefs::Preferences;
use crate::brief::util::truncate_with_ellipsis;
use crate::commands::CommandReport;

#[derive(Debug, Clone, Default)]
pub struct HistoryOptions {
    pub limit: Option<usize>,
}

pub fn run(opts: &HistoryOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let config = load_config(&paths)?;
    let history = HistoryLog::load(Preferences::open(&paths).store());
    let mut report = CommandReport::new("history");

    let limit = opts.limit.unwrap_or(config.history.display_limit);
    let shown = &history.entries()[..history.len().min(limit)];

    report.detail(format!("count={}", history.len()));
    if history.is_empty() {
        report.detail("no links sent yet");
    }
    for record in shown {
        report.detail(format!(
            "{} | {} | {} | {}",
            record.sent_at.format("%Y-%m-%d %H:%M"),
            record.site,
            truncate_with_ellipsis(&record.title, 80),
            record.url
        ));
    }
    report.data = Some(serde_json::to_value(shown)?);
    Ok(report)
}
