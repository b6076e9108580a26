use anyhow::{Context, Result};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::brief::config::load_config;
use crate::brief::extract::TitleFetcher;
use crate::brief::paths::resolve_paths;
use crate::brief::prefs::Preferences;
use crate::brief::share_input::{Attachment, SharePayload};
use crate::brief::submission::Submission;
use crate::commands::CommandReport;
use crate::commands::send::{SendChoices, require_email, submit};

#[derive(Debug, Clone, Default)]
pub struct ShareOptions {
    /// JSON share payload; `-` reads it from stdin.
    pub payload: Option<PathBuf>,
    pub urls: Vec<String>,
    pub texts: Vec<String>,
    pub note: Option<String>,
    pub choices: SendChoices,
}

fn read_payload(path: &Path) -> Result<SharePayload> {
    let raw = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read share payload from stdin")?;
        buf
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("failed to read share payload {}", path.display()))?
    };
    serde_json::from_str(&raw).context("share payload is not valid JSON")
}

fn payload_from_flags(opts: &ShareOptions) -> SharePayload {
    let attachments = opts
        .urls
        .iter()
        .cloned()
        .map(Attachment::Url)
        .chain(opts.texts.iter().cloned().map(Attachment::Text))
        .collect();
    SharePayload::from_attachments(attachments)
}

pub fn run(opts: &ShareOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let config = load_config(&paths)?;
    let prefs = Preferences::open(&paths);
    let mut report = CommandReport::new("share");

    let payload = match &opts.payload {
        Some(path) => read_payload(path)?,
        None => payload_from_flags(opts),
    };
    let shared = payload.resolve();
    if shared.url.is_empty() {
        report.issue("shared content carries no link");
        return Ok(report);
    }
    report.detail(format!("url={}", shared.url));
    if !require_email(&prefs, &mut report) {
        return Ok(report);
    }

    let title = if shared.title.is_empty() {
        let fetched = TitleFetcher::new(&config.network).fetch_title(&shared.url);
        report.detail(format!("title_source=page title={fetched}"));
        fetched
    } else {
        report.detail(format!("title_source=share title={}", shared.title));
        shared.title
    };

    let note = opts.note.clone().unwrap_or_default();
    let submission = Submission::new(shared.url, title, note);
    submit(&paths, &config, &prefs, submission, opts.choices, &mut report);
    Ok(report)
}
