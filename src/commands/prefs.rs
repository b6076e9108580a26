use anyhow::{Result, anyhow};

use crate::brief::history::HistoryLog;
use crate::brief::paths::resolve_paths;
use crate::brief::prefs::{PrefKey, Preferences, SummaryLength, validate_email};
use crate::brief::send::validate_endpoint;
use crate::commands::CommandReport;

#[derive(Debug, Clone)]
pub enum PrefsAction {
    Show,
    Get { key: String },
    Set { key: String, value: String },
}

fn parse_key(raw: &str) -> Result<PrefKey> {
    PrefKey::parse(raw).ok_or_else(|| {
        let known: Vec<&str> = PrefKey::ALL.iter().map(|key| key.as_str()).collect();
        anyhow!("unknown preference `{raw}` (known: {})", known.join(", "))
    })
}

fn read_key(prefs: &Preferences, key: PrefKey) -> String {
    match key {
        PrefKey::Email => prefs.email(),
        PrefKey::ApiEndpoint => prefs.api_endpoint(),
        PrefKey::AiSummaryEnabled => prefs.ai_summary_enabled().to_string(),
        PrefKey::SummaryLength => prefs.summary_length().to_string(),
        PrefKey::HasAcceptedAiDataConsent => prefs.has_accepted_ai_consent().to_string(),
        PrefKey::HasCompletedOnboarding => prefs.has_completed_onboarding().to_string(),
        PrefKey::SentHistory => format!("{} entries", HistoryLog::load(prefs.store()).len()),
    }
}

fn write_key(prefs: &Preferences, key: PrefKey, value: &str) -> Result<()> {
    match key {
        PrefKey::Email => prefs.set_email(validate_email(value)?),
        PrefKey::ApiEndpoint => {
            validate_endpoint(value)?;
            prefs.set_api_endpoint(value.trim());
        }
        PrefKey::SummaryLength => prefs.set_summary_length(value.parse::<SummaryLength>()?),
        PrefKey::HasCompletedOnboarding => {
            let done = value
                .trim()
                .parse::<bool>()
                .map_err(|_| anyhow!("expected `true` or `false`, got `{value}`"))?;
            prefs.set_has_completed_onboarding(done);
        }
        PrefKey::AiSummaryEnabled | PrefKey::HasAcceptedAiDataConsent => {
            return Err(anyhow!(
                "`{key}` is managed by the consent flow; use `brief ai enable|disable`"
            ));
        }
        PrefKey::SentHistory => {
            return Err(anyhow!("`{key}` is written by sends; use `brief reset` to clear it"));
        }
    }
    Ok(())
}

pub fn run(action: &PrefsAction) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let prefs = Preferences::open(&paths);
    let mut report = CommandReport::new("prefs");

    match action {
        PrefsAction::Show => {
            let snapshot = prefs.snapshot();
            for key in PrefKey::ALL {
                report.detail(format!("{key}={}", read_key(&prefs, key)));
            }
            report.data = Some(serde_json::to_value(snapshot)?);
        }
        PrefsAction::Get { key } => {
            let key = parse_key(key)?;
            report.detail(format!("{key}={}", read_key(&prefs, key)));
        }
        PrefsAction::Set { key, value } => {
            let key = parse_key(key)?;
            match write_key(&prefs, key, value) {
                Ok(()) => report.detail(format!("{key}={}", read_key(&prefs, key))),
                Err(err) => report.issue(format!("{err:#}")),
            }
        }
    }
    Ok(report)
}
