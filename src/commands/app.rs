use anyhow::Result;
use std::io::{self, BufReader};

use crate::brief::config::load_config;
use crate::brief::host::{HostSession, spawn_input_reader};
use crate::brief::paths::resolve_paths;
use crate::commands::CommandReport;

pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let config = load_config(&paths)?;
    let mut report = CommandReport::new("app");

    let session = HostSession::new(paths, config, io::stdout());
    spawn_input_reader(BufReader::new(io::stdin()), session.sender());
    let summary = session.run()?;

    report.detail(format!("sent={}", summary.sent));
    report.detail(format!("failed={}", summary.failed));
    report.detail(format!("abandoned={}", summary.abandoned));
    Ok(report)
}
