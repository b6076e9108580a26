use crate::brief::config::BriefNetworkConfig;
use crate::brief::prefs::{Preferences, SummaryLength};
use crate::brief::site::derive_site;
use crate::error::SendError;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub url: String,
    pub title: String,
    pub email: String,
    pub context: Option<String>,
    pub ai_summary: bool,
    pub summary_length: SummaryLength,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Payload<'a> {
    url: &'a str,
    title: &'a str,
    site: String,
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a str>,
    ai_summary: bool,
    summary_length: SummaryLength,
}

/// JSON body for the dispatch endpoint. A blank note is left out entirely.
pub fn build_payload(req: &SendRequest) -> Result<Vec<u8>, SendError> {
    let payload = Payload {
        url: &req.url,
        title: &req.title,
        site: derive_site(&req.url),
        email: &req.email,
        context: req
            .context
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty()),
        ai_summary: req.ai_summary,
        summary_length: req.summary_length,
    };
    serde_json::to_vec(&payload).map_err(|err| SendError::Serialization(err.to_string()))
}

pub fn validate_endpoint(raw: &str) -> Result<Url, SendError> {
    let invalid = || SendError::InvalidEndpoint(raw.to_string());
    let url = Url::parse(raw.trim()).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(invalid());
    }
    Ok(url)
}

fn classify(err: reqwest::Error, timeout: Duration) -> SendError {
    if err.is_timeout() {
        SendError::Timeout(timeout.as_secs())
    } else {
        SendError::Transport(err.to_string())
    }
}

/// One POST per call. No retry: a failure is final for that attempt.
#[derive(Debug, Clone)]
pub struct SendPipeline {
    endpoint: String,
    timeout: Duration,
}

impl SendPipeline {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
        }
    }

    pub fn from_prefs(prefs: &Preferences, cfg: &BriefNetworkConfig) -> Self {
        Self::new(prefs.api_endpoint(), cfg.send_timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn send(&self, req: &SendRequest) -> Result<(), SendError> {
        if req.email.trim().is_empty() {
            return Err(SendError::MissingPrecondition);
        }
        let endpoint = validate_endpoint(&self.endpoint)?;
        let body = build_payload(req)?;

        let client = Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .build()
            .map_err(|err| SendError::Transport(err.to_string()))?;
        let response = client
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(|err| classify(err, self.timeout))?;

        let status = response.status().as_u16();
        if status == 200 {
            Ok(())
        } else {
            Err(SendError::NonSuccessStatus(status))
        }
    }
}
