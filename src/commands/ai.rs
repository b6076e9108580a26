use anyhow::Result;

use crate::brief::audit;
use crate::brief::consent::{AI_SUMMARY_DISCLOSURE, ConsentGate};
use crate::brief::paths::resolve_paths;
use crate::brief::prefs::{Preferences, SummaryLength};
use crate::commands::{CommandReport, apply_ai_choice};

#[derive(Debug, Clone)]
pub enum AiAction {
    Status,
    Enable { accept: bool },
    Disable,
    Length { value: Option<SummaryLength> },
}

pub fn run(action: &AiAction) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let prefs = Preferences::open(&paths);
    let mut report = CommandReport::new("ai");

    match action {
        AiAction::Status => {
            let gate = ConsentGate::load(prefs.clone());
            report.detail(format!("state={}", gate.state().as_str()));
            report.detail(format!("consent_given={}", prefs.has_accepted_ai_consent()));
            report.detail(format!("summary_length={}", prefs.summary_length()));
            if !prefs.has_accepted_ai_consent() {
                report.detail("enabling shows this disclosure first:");
                for line in AI_SUMMARY_DISCLOSURE.lines() {
                    report.detail(line);
                }
            }
        }
        AiAction::Enable { accept } => {
            let enabled = apply_ai_choice(&prefs, Some(true), *accept, &mut report);
            let status = if enabled { "enabled" } else { "declined" };
            audit::record(&paths, "consent", status, "ai summary enable requested");
        }
        AiAction::Disable => {
            apply_ai_choice(&prefs, Some(false), false, &mut report);
            audit::record(&paths, "consent", "disabled", "ai summary disabled");
        }
        AiAction::Length { value } => {
            if let Some(length) = value {
                prefs.set_summary_length(*length);
            }
            report.detail(format!("summary_length={}", prefs.summary_length()));
        }
    }
    Ok(report)
}
