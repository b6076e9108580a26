use crate::brief::prefs::Preferences;
use crate::error::ConsentError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConsentState {
    Disabled,
    PendingConsent,
    Enabled,
}

impl ConsentState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::PendingConsent => "pending-consent",
            Self::Enabled => "enabled",
        }
    }
}

/// What must be shown before the AI summary flag can be turned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Disclosure {
    pub shared: &'static str,
    pub recipient: &'static str,
    pub withheld: &'static str,
}

pub const AI_SUMMARY_DISCLOSURE: Disclosure = Disclosure {
    shared: "The link URL, page title, and text content (up to 10,000 characters) are sent to generate your summary.",
    recipient: "Google Gemini, which generates the summary.",
    withheld: "Your email address and personal notes.",
};

impl Disclosure {
    pub fn lines(&self) -> [String; 3] {
        [
            format!("What's shared: {}", self.shared),
            format!("Who receives it: {}", self.recipient),
            format!("What's not shared: {}", self.withheld),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnableOutcome {
    Enabled,
    NeedsConsent(&'static Disclosure),
}

/// The summary flag only counts when consent has been recorded too, so a
/// partial write from another process can never enable it on its own.
pub fn ai_summary_allowed(prefs: &Preferences) -> bool {
    prefs.has_accepted_ai_consent() && prefs.ai_summary_enabled()
}

/// Three-state gate in front of `aiSummaryEnabled`. Consent, once given,
/// is only withdrawn by a full reset.
pub struct ConsentGate {
    prefs: Preferences,
    state: ConsentState,
}

impl ConsentGate {
    pub fn load(prefs: Preferences) -> Self {
        let state = if ai_summary_allowed(&prefs) {
            ConsentState::Enabled
        } else {
            ConsentState::Disabled
        };
        Self { prefs, state }
    }

    pub fn state(&self) -> ConsentState {
        self.state
    }

    pub fn request_enable(&mut self) -> EnableOutcome {
        match self.state {
            ConsentState::Enabled => EnableOutcome::Enabled,
            ConsentState::PendingConsent => EnableOutcome::NeedsConsent(&AI_SUMMARY_DISCLOSURE),
            ConsentState::Disabled => {
                if self.prefs.has_accepted_ai_consent() {
                    self.prefs.set_ai_summary_enabled(true);
                    self.state = ConsentState::Enabled;
                    EnableOutcome::Enabled
                } else {
                    self.state = ConsentState::PendingConsent;
                    EnableOutcome::NeedsConsent(&AI_SUMMARY_DISCLOSURE)
                }
            }
        }
    }

    /// Consent is written before the flag.
    pub fn accept(&mut self) -> Result<(), ConsentError> {
        if self.state != ConsentState::PendingConsent {
            return Err(ConsentError::NotPending);
        }
        self.prefs.set_has_accepted_ai_consent(true);
        self.prefs.set_ai_summary_enabled(true);
        self.state = ConsentState::Enabled;
        Ok(())
    }

    pub fn decline(&mut self) -> Result<(), ConsentError> {
        if self.state != ConsentState::PendingConsent {
            return Err(ConsentError::NotPending);
        }
        self.state = ConsentState::Disabled;
        Ok(())
    }

    pub fn disable(&mut self) {
        if self.state == ConsentState::Enabled || self.prefs.ai_summary_enabled() {
            self.prefs.set_ai_summary_enabled(false);
        }
        self.state = ConsentState::Disabled;
    }
}
