use crate::brief::audit;
use crate::brief::history::{ArticleRecord, HistoryLog};
use crate::brief::paths::BriefPaths;
use crate::brief::prefs::SummaryLength;
use crate::brief::send::{SendPipeline, SendRequest};
use crate::error::{SendError, SubmitError};

pub const SHARED_LINK_TITLE: &str = "Shared Link";

/// Input fields of the capture form plus the single in-flight guard.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub url: String,
    pub title: String,
    pub context: String,
    in_flight: bool,
}

impl Submission {
    pub fn new(url: impl Into<String>, title: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            context: context.into(),
            in_flight: false,
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn effective_title(&self) -> String {
        let title = self.title.trim();
        if title.is_empty() {
            SHARED_LINK_TITLE.to_string()
        } else {
            title.to_string()
        }
    }

    /// Freeze the current fields into a request and mark the submission as
    /// outstanding. A second call before `finish` is refused.
    pub fn begin(
        &mut self,
        email: &str,
        ai_summary: bool,
        summary_length: SummaryLength,
    ) -> Result<SendRequest, SubmitError> {
        if self.in_flight {
            return Err(SubmitError::InFlight);
        }
        if self.url.trim().is_empty() {
            return Err(SubmitError::MissingUrl);
        }
        self.in_flight = true;
        let context = self.context.trim();
        Ok(SendRequest {
            url: self.url.trim().to_string(),
            title: self.effective_title(),
            email: email.to_string(),
            context: (!context.is_empty()).then(|| context.to_string()),
            ai_summary,
            summary_length,
        })
    }

    /// Apply the outcome for `req`. Success records the original url/title
    /// and clears the form; failure keeps every field for a manual retry.
    pub fn finish(
        &mut self,
        req: &SendRequest,
        outcome: Result<(), SendError>,
        history: &mut HistoryLog,
    ) -> Result<ArticleRecord, SendError> {
        self.in_flight = false;
        outcome?;
        let record = history.append(&req.url, &req.title);
        self.url.clear();
        self.title.clear();
        self.context.clear();
        Ok(record)
    }
}

pub fn audit_outcome(paths: &BriefPaths, req: &SendRequest, outcome: &Result<(), SendError>) {
    match outcome {
        Ok(()) => audit::record(paths, "send", "ok", &format!("sent {} to {}", req.url, req.email)),
        Err(err) => audit::record(
            paths,
            "send",
            "failed",
            &format!("{} {}: {err}", err.code(), req.url),
        ),
    }
}

/// Blocking send for one-shot commands; `req` comes from `Submission::begin`.
pub fn dispatch(
    paths: &BriefPaths,
    pipeline: &SendPipeline,
    submission: &mut Submission,
    req: SendRequest,
    history: &mut HistoryLog,
) -> Result<ArticleRecord, SendError> {
    let outcome = pipeline.send(&req);
    audit_outcome(paths, &req, &outcome);
    submission.finish(&req, outcome, history)
}
