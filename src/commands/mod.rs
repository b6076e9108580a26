pub mod ai;
pub mod app;
pub mod extract;
pub mod history;
pub mod prefs;
pub mod reset;
pub mod send;
pub mod setup;
pub mod share;
pub mod status;

use serde::Serialize;
use serde_json::Value;

use crate::brief::consent::{ConsentGate, EnableOutcome};
use crate::brief::prefs::Preferences;

#[derive(Debug, Clone, Serialize)]
pub struct CommandReport {
    pub command: String,
    pub ok: bool,
    pub details: Vec<String>,
    pub issues: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl CommandReport {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ok: true,
            details: Vec::new(),
            issues: Vec::new(),
            data: None,
        }
    }

    pub fn detail(&mut self, text: impl Into<String>) {
        self.details.push(text.into());
    }

    pub fn issue(&mut self, text: impl Into<String>) {
        self.ok = false;
        self.issues.push(text.into());
    }
}

/// Routes an AI summary on/off choice through the consent gate. Returns
/// false when the caller must stop because consent was required but not given.
pub fn apply_ai_choice(
    prefs: &Preferences,
    choice: Option<bool>,
    accept: bool,
    report: &mut CommandReport,
) -> bool {
    let Some(enable) = choice else {
        return true;
    };
    let mut gate = ConsentGate::load(prefs.clone());
    if !enable {
        gate.disable();
        report.detail("ai_summary=disabled");
        return true;
    }

    match gate.request_enable() {
        EnableOutcome::Enabled => {
            report.detail("ai_summary=enabled");
            true
        }
        EnableOutcome::NeedsConsent(disclosure) => {
            for line in disclosure.lines() {
                report.detail(line);
            }
            if accept && gate.accept().is_ok() {
                report.detail("consent=accepted");
                report.detail("ai_summary=enabled");
                return true;
            }
            let _ = gate.decline();
            report.issue("AI summary needs consent to the data disclosure above; rerun with --accept");
            false
        }
    }
}
