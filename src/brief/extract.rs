use crate::brief::config::BriefNetworkConfig;
use crate::brief::site::host_without_www;
use crate::brief::util::collapse_whitespace;
use crate::brief::warn::{self, WarnEvent};
use anyhow::{Context, Result, bail};
use regex::Regex;
use reqwest::blocking::Client;
use std::io::Read;
use std::sync::LazyLock;
use std::time::{Duration, Instant};
use url::Url;

pub const FALLBACK_TITLE: &str = "Article";

/// Checked in order; at most one is removed.
const PUBLISHER_SUFFIXES: &[&str] = &[
    " - The New York Times",
    " | CNN",
    " - BBC News",
    " - Reuters",
    " - The Washington Post",
    " - WSJ",
    " | AP News",
    " - X",
];

static OG_TITLE_PROPERTY_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<meta\s[^>]*?(?:property|name)\s*=\s*["']og:title["'][^>]*?\scontent\s*=\s*(?:"([^"]*)"|'([^']*)')"#,
    )
    .expect("valid og:title regex")
});

static OG_TITLE_CONTENT_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<meta\s[^>]*?content\s*=\s*(?:"([^"]*)"|'([^']*)')[^>]*?\s(?:property|name)\s*=\s*["']og:title["']"#,
    )
    .expect("valid og:title regex")
});

static TITLE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid title regex"));

fn decode_entities(raw: &str) -> String {
    raw.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

fn normalize(raw: &str) -> Option<String> {
    let text = collapse_whitespace(&decode_entities(raw));
    if text.is_empty() { None } else { Some(text) }
}

fn first_capture(re: &Regex, markup: &str) -> Option<String> {
    re.captures_iter(markup).find_map(|caps| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .and_then(|m| normalize(m.as_str()))
    })
}

pub fn og_title(markup: &str) -> Option<String> {
    first_capture(&OG_TITLE_PROPERTY_FIRST, markup)
        .or_else(|| first_capture(&OG_TITLE_CONTENT_FIRST, markup))
}

pub fn document_title(markup: &str) -> Option<String> {
    first_capture(&TITLE_TAG, markup)
}

/// Strip the first known publisher suffix found at the end of the title.
pub fn clean_title(title: &str) -> String {
    let trimmed = title.trim();
    for suffix in PUBLISHER_SUFFIXES {
        if let Some(stripped) = trimmed.strip_suffix(suffix) {
            return stripped.to_string();
        }
    }
    trimmed.to_string()
}

/// Social preview title, then `<title>`, each cleaned of publisher suffixes.
pub fn title_from_markup(markup: &str) -> Option<String> {
    og_title(markup)
        .or_else(|| document_title(markup))
        .map(|title| clean_title(&title))
        .filter(|title| !title.is_empty())
}

/// Full fallback chain: markup title, then the url's host, then a placeholder.
pub fn resolve_title(markup: Option<&str>, url: &str) -> String {
    markup
        .and_then(title_from_markup)
        .or_else(|| host_without_www(url))
        .unwrap_or_else(|| FALLBACK_TITLE.to_string())
}

/// Fetches pages to read their titles. Every failure collapses into the
/// host-name fallback; callers never see an error.
#[derive(Debug, Clone)]
pub struct TitleFetcher {
    timeout: Duration,
    max_bytes: u64,
    user_agent: String,
}

impl TitleFetcher {
    pub fn new(cfg: &BriefNetworkConfig) -> Self {
        Self {
            timeout: cfg.fetch_timeout(),
            max_bytes: cfg.max_page_bytes,
            user_agent: cfg.user_agent.clone(),
        }
    }

    /// `timeout` bounds the whole fetch, connect through the last body byte.
    fn fetch_markup(&self, url: &str) -> Result<String> {
        let started = Instant::now();
        let parsed = Url::parse(url.trim()).with_context(|| format!("invalid url `{url}`"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("unsupported scheme `{}`", parsed.scheme());
        }

        let client = Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .user_agent(self.user_agent.as_str())
            .build()?;
        let mut response = client.get(parsed).send()?;
        if !response.status().is_success() {
            bail!("page fetch failed with status {}", response.status());
        }

        // A single read is still bounded by the client timeout, so the
        // overshoot past the deadline is at most one read.
        let mut body = Vec::new();
        let mut chunk = [0u8; 8192];
        while (body.len() as u64) < self.max_bytes {
            if started.elapsed() >= self.timeout {
                bail!("page fetch exceeded {}s", self.timeout.as_secs());
            }
            let read = response
                .read(&mut chunk)
                .context("failed to read page body")?;
            if read == 0 {
                break;
            }
            let room = (self.max_bytes - body.len() as u64).min(read as u64) as usize;
            body.extend_from_slice(&chunk[..room]);
        }
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    pub fn fetch_title(&self, url: &str) -> String {
        match self.fetch_markup(url) {
            Ok(markup) => resolve_title(Some(&markup), url),
            Err(err) => {
                warn::emit(WarnEvent {
                    code: "W_TITLE_FETCH",
                    stage: "extract",
                    action: "use-host",
                    key: url,
                    reason: "page fetch failed",
                    err: &format!("{err:#}"),
                });
                resolve_title(None, url)
            }
        }
    }
}
