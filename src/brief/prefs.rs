use crate::brief::history::HistoryLog;
use crate::brief::paths::BriefPaths;
use crate::brief::store::{FileStore, KeyValueStore};
use crate::brief::warn::{self, WarnEvent};
use anyhow::{Result, bail};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub const DEFAULT_API_ENDPOINT: &str = "https://quickcapture-api.daniel-ensign.workers.dev";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefKey {
    Email,
    ApiEndpoint,
    AiSummaryEnabled,
    SummaryLength,
    HasAcceptedAiDataConsent,
    HasCompletedOnboarding,
    SentHistory,
}

impl PrefKey {
    pub const ALL: [PrefKey; 7] = [
        PrefKey::Email,
        PrefKey::ApiEndpoint,
        PrefKey::AiSummaryEnabled,
        PrefKey::SummaryLength,
        PrefKey::HasAcceptedAiDataConsent,
        PrefKey::HasCompletedOnboarding,
        PrefKey::SentHistory,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::ApiEndpoint => "apiEndpoint",
            Self::AiSummaryEnabled => "aiSummaryEnabled",
            Self::SummaryLength => "summaryLength",
            Self::HasAcceptedAiDataConsent => "hasAcceptedAIDataConsent",
            Self::HasCompletedOnboarding => "hasCompletedOnboarding",
            Self::SentHistory => "sentHistory",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == raw.trim())
    }
}

impl fmt::Display for PrefKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLength {
    #[default]
    Short,
    Long,
}

impl SummaryLength {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Long => "long",
        }
    }
}

impl fmt::Display for SummaryLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SummaryLength {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(Self::Short),
            "long" | "detailed" => Ok(Self::Long),
            other => bail!("invalid summary length `{other}`: use `short` or `long`"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceSet {
    pub email: String,
    pub api_endpoint: String,
    pub ai_summary_enabled: bool,
    pub summary_length: SummaryLength,
    #[serde(rename = "hasAcceptedAIDataConsent")]
    pub has_accepted_ai_consent: bool,
    pub has_completed_onboarding: bool,
}

impl Default for PreferenceSet {
    fn default() -> Self {
        Self {
            email: String::new(),
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            ai_summary_enabled: false,
            summary_length: SummaryLength::Short,
            has_accepted_ai_consent: false,
            has_completed_onboarding: false,
        }
    }
}

/// Trimmed address, or an error when it cannot be an email address.
pub fn validate_email(email: &str) -> Result<&str> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        bail!("`{email}` is not an email address");
    }
    Ok(email)
}

/// Typed view over the shared store. Reads never fail (documented defaults
/// stand in) and writes are fire-and-forget.
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
}

impl Preferences {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn open(paths: &BriefPaths) -> Self {
        Self::new(Arc::new(FileStore::new(&paths.store_dir)))
    }

    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.store)
    }

    fn read_value<T: DeserializeOwned>(&self, key: PrefKey) -> Option<T> {
        let raw = match self.store.read(key.as_str()) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn::emit(WarnEvent {
                    code: "W_PREF_READ",
                    stage: "prefs",
                    action: "use-default",
                    key: key.as_str(),
                    reason: "store unavailable",
                    err: &err.to_string(),
                });
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn::emit(WarnEvent {
                    code: "W_PREF_DECODE",
                    stage: "prefs",
                    action: "use-default",
                    key: key.as_str(),
                    reason: "undecodable value",
                    err: &err.to_string(),
                });
                None
            }
        }
    }

    fn write_value<T: Serialize>(&self, key: PrefKey, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(|err| err.to_string())
            .and_then(|raw| {
                self.store
                    .write(key.as_str(), &raw)
                    .map_err(|err| err.to_string())
            });
        if let Err(err) = result {
            warn::emit(WarnEvent {
                code: "W_PREF_WRITE",
                stage: "prefs",
                action: "drop-write",
                key: key.as_str(),
                reason: "store write failed",
                err: &err,
            });
        }
    }

    pub fn email(&self) -> String {
        self.read_value(PrefKey::Email).unwrap_or_default()
    }

    pub fn set_email(&self, email: &str) {
        self.write_value(PrefKey::Email, &email.trim());
    }

    pub fn api_endpoint(&self) -> String {
        self.read_value(PrefKey::ApiEndpoint)
            .unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string())
    }

    pub fn set_api_endpoint(&self, endpoint: &str) {
        self.write_value(PrefKey::ApiEndpoint, &endpoint.trim());
    }

    pub fn ai_summary_enabled(&self) -> bool {
        self.read_value(PrefKey::AiSummaryEnabled).unwrap_or(false)
    }

    /// Only the consent gate and reset may flip this flag.
    pub(in crate::brief) fn set_ai_summary_enabled(&self, enabled: bool) {
        self.write_value(PrefKey::AiSummaryEnabled, &enabled);
    }

    pub fn summary_length(&self) -> SummaryLength {
        self.read_value(PrefKey::SummaryLength).unwrap_or_default()
    }

    pub fn set_summary_length(&self, length: SummaryLength) {
        self.write_value(PrefKey::SummaryLength, &length);
    }

    pub fn has_accepted_ai_consent(&self) -> bool {
        self.read_value(PrefKey::HasAcceptedAiDataConsent)
            .unwrap_or(false)
    }

    pub(in crate::brief) fn set_has_accepted_ai_consent(&self, accepted: bool) {
        self.write_value(PrefKey::HasAcceptedAiDataConsent, &accepted);
    }

    pub fn has_completed_onboarding(&self) -> bool {
        self.read_value(PrefKey::HasCompletedOnboarding)
            .unwrap_or(false)
    }

    pub fn set_has_completed_onboarding(&self, done: bool) {
        self.write_value(PrefKey::HasCompletedOnboarding, &done);
    }

    /// Reads every field separately; another process may interleave writes.
    pub fn snapshot(&self) -> PreferenceSet {
        PreferenceSet {
            email: self.email(),
            api_endpoint: self.api_endpoint(),
            ai_summary_enabled: self.ai_summary_enabled(),
            summary_length: self.summary_length(),
            has_accepted_ai_consent: self.has_accepted_ai_consent(),
            has_completed_onboarding: self.has_completed_onboarding(),
        }
    }

    pub fn complete_onboarding(&self, email: &str) -> Result<()> {
        let email = validate_email(email)?;
        self.set_email(email);
        self.set_has_completed_onboarding(true);
        Ok(())
    }

    /// Full reset. The summary flag is cleared before consent so no reader
    /// can observe the flag on without consent.
    pub fn reset_all(&self, history: &mut HistoryLog) {
        self.set_has_completed_onboarding(false);
        self.set_email("");
        history.reset();
        self.set_ai_summary_enabled(false);
        self.set_summary_length(SummaryLength::Short);
        self.set_has_accepted_ai_consent(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn prefs_in(dir: &std::path::Path) -> Preferences {
        Preferences::new(Arc::new(FileStore::new(dir)))
    }

    #[test]
    fn fresh_store_reads_documented_defaults() {
        let tmp = tempdir().expect("tempdir");
        let prefs = prefs_in(tmp.path());
        assert_eq!(prefs.snapshot(), PreferenceSet::default());
    }

    #[test]
    fn fields_persist_independently_across_handles() {
        let tmp = tempdir().expect("tempdir");
        let app = prefs_in(tmp.path());
        let extension = prefs_in(tmp.path());

        app.set_email("u@x.com");
        extension.set_summary_length(SummaryLength::Long);

        let seen = app.snapshot();
        assert_eq!(seen.email, "u@x.com");
        assert_eq!(seen.summary_length, SummaryLength::Long);
        assert_eq!(extension.email(), "u@x.com");
    }

    #[test]
    fn undecodable_value_falls_back_to_default() {
        let tmp = tempdir().expect("tempdir");
        let prefs = prefs_in(tmp.path());
        fs::write(tmp.path().join("summaryLength.json"), "{not json").expect("write");
        assert_eq!(prefs.summary_length(), SummaryLength::Short);
    }

    #[test]
    fn unavailable_store_reads_defaults_and_drops_writes() {
        let tmp = tempdir().expect("tempdir");
        let blocker = tmp.path().join("blocker");
        fs::write(&blocker, "file").expect("write blocker");
        let prefs = prefs_in(&blocker.join("nested"));

        prefs.set_email("u@x.com");
        assert_eq!(prefs.email(), "");
        assert_eq!(prefs.api_endpoint(), DEFAULT_API_ENDPOINT);
    }

    #[test]
    fn keys_use_shared_schema_names() {
        assert_eq!(
            PrefKey::HasAcceptedAiDataConsent.as_str(),
            "hasAcceptedAIDataConsent"
        );
        assert_eq!(PrefKey::parse("sentHistory"), Some(PrefKey::SentHistory));
        assert_eq!(PrefKey::parse("nope"), None);
    }

    #[test]
    fn summary_length_accepts_detailed_alias() {
        assert_eq!(
            "Detailed".parse::<SummaryLength>().expect("parse"),
            SummaryLength::Long
        );
        assert!("medium".parse::<SummaryLength>().is_err());
    }

    #[test]
    fn onboarding_requires_an_address() {
        let tmp = tempdir().expect("tempdir");
        let prefs = prefs_in(tmp.path());
        assert!(prefs.complete_onboarding("   ").is_err());
        assert!(!prefs.has_completed_onboarding());

        prefs.complete_onboarding(" u@x.com ").expect("onboard");
        assert_eq!(prefs.email(), "u@x.com");
        assert!(prefs.has_completed_onboarding());
    }

    #[test]
    fn reset_restores_defaults_and_keeps_endpoint() {
        let tmp = tempdir().expect("tempdir");
        let prefs = prefs_in(tmp.path());
        let mut history = HistoryLog::load(prefs.store());

        prefs.complete_onboarding("u@x.com").expect("onboard");
        prefs.set_api_endpoint("http://127.0.0.1:9/send");
        prefs.set_has_accepted_ai_consent(true);
        prefs.set_ai_summary_enabled(true);
        prefs.set_summary_length(SummaryLength::Long);
        history.append("https://example.com/a", "A");

        prefs.reset_all(&mut history);

        let seen = prefs.snapshot();
        assert_eq!(seen.email, "");
        assert!(!seen.ai_summary_enabled);
        assert!(!seen.has_accepted_ai_consent);
        assert!(!seen.has_completed_onboarding);
        assert_eq!(seen.summary_length, SummaryLength::Short);
        assert_eq!(seen.api_endpoint, "http://127.0.0.1:9/send");
        assert!(history.is_empty());
        assert!(HistoryLog::load(prefs.store()).is_empty());
    }

    #[test]
    fn email_validation_trims_and_requires_at_sign() {
        assert_eq!(validate_email("  u@x.com ").expect("valid"), "u@x.com");
        assert!(validate_email("").is_err());
        assert!(validate_email("   ").is_err());
        assert!(validate_email("nope").is_err());
    }
}
