use anyhow::Result;

use crate::brief::config::{BriefConfig, load_config};
use crate::brief::consent::ai_summary_allowed;
use crate::brief::extract::TitleFetcher;
use crate::brief::history::HistoryLog;
use crate::brief::paths::{BriefPaths, resolve_paths};
use crate::brief::prefs::{Preferences, SummaryLength};
use crate::brief::send::SendPipeline;
use crate::brief::submission::{Submission, dispatch};
use crate::commands::{CommandReport, apply_ai_choice};
use crate::error::SendError;

/// Preference changes a user can attach to a single send.
#[derive(Debug, Clone, Copy, Default)]
pub struct SendChoices {
    pub ai_summary: Option<bool>,
    pub accept: bool,
    pub summary_length: Option<SummaryLength>,
}

#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    pub url: String,
    pub title: Option<String>,
    pub context: Option<String>,
    pub choices: SendChoices,
}

/// Applies per-send preference changes, then sends `submission` once and
/// reports the outcome. Shared by `send` and `share`.
pub fn submit(
    paths: &BriefPaths,
    config: &BriefConfig,
    prefs: &Preferences,
    mut submission: Submission,
    choices: SendChoices,
    report: &mut CommandReport,
) {
    if !apply_ai_choice(prefs, choices.ai_summary, choices.accept, report) {
        return;
    }
    if let Some(length) = choices.summary_length {
        prefs.set_summary_length(length);
    }

    let email = prefs.email();
    let req = match submission.begin(&email, ai_summary_allowed(prefs), prefs.summary_length()) {
        Ok(req) => req,
        Err(err) => {
            report.issue(err.to_string());
            return;
        }
    };

    let mut history = HistoryLog::load(prefs.store());
    let pipeline = SendPipeline::from_prefs(prefs, &config.network);
    report.detail(format!("endpoint={}", pipeline.endpoint()));
    match dispatch(paths, &pipeline, &mut submission, req.clone(), &mut history) {
        Ok(record) => {
            report.detail(format!("sent to {}", req.email));
            report.detail(format!("title={}", record.title));
            report.detail(format!("site={}", record.site));
            report.detail(format!("ai_summary={}", req.ai_summary));
            report.detail(format!("history={}", history.len()));
        }
        Err(err) => {
            report.issue(format!("{}: {}", err.code(), err.user_message()));
            report.detail(format!("cause={err}"));
        }
    }
}

/// Refuses up front when no email is stored, before any page or endpoint
/// is contacted.
pub fn require_email(prefs: &Preferences, report: &mut CommandReport) -> bool {
    if !prefs.email().trim().is_empty() {
        return true;
    }
    let err = SendError::MissingPrecondition;
    report.issue(format!("{}: {}", err.code(), err.user_message()));
    false
}

pub fn run(opts: &SendOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let config = load_config(&paths)?;
    let prefs = Preferences::open(&paths);
    let mut report = CommandReport::new("send");
    if !require_email(&prefs, &mut report) {
        return Ok(report);
    }

    let title = match opts.title.as_deref().map(str::trim) {
        Some(title) if !title.is_empty() => title.to_string(),
        _ if opts.url.trim().is_empty() => String::new(),
        _ => TitleFetcher::new(&config.network).fetch_title(&opts.url),
    };
    let context = opts.context.clone().unwrap_or_default();
    let submission = Submission::new(opts.url.trim(), title, context);

    submit(&paths, &config, &prefs, submission, opts.choices, &mut report);
    Ok(report)
}
