use anyhow::Result;

use crate::brief::config::load_config;
use crate::brief::extract::TitleFetcher;
use crate::brief::paths::resolve_paths;
use crate::brief::site::derive_site;
use crate::commands::CommandReport;

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub url: String,
}

pub fn run(opts: &ExtractOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let config = load_config(&paths)?;
    let mut report = CommandReport::new("extract");

    let title = TitleFetcher::new(&config.network).fetch_title(&opts.url);
    report.detail(format!("title={title}"));
    report.detail(format!("site={}", derive_site(&opts.url)));
    report.data = Some(serde_json::json!({
        "url": opts.url,
        "title": title,
        "site": derive_site(&opts.url),
    }));
    Ok(report)
}
