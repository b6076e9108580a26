use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::brief::prefs::SummaryLength;
use crate::commands::CommandReport;
use crate::commands::ai::AiAction;
use crate::commands::prefs::PrefsAction;
use crate::commands::send::SendChoices;

#[derive(Debug, Parser)]
#[command(name = "brief")]
#[command(version, about = "Send links to your inbox, optionally with an AI summary")]
struct Cli {
    /// Print the command report as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Record the address links are delivered to
    Setup {
        #[arg(long)]
        email: String,
        /// Override the dispatch endpoint
        #[arg(long)]
        endpoint: Option<String>,
    },
    /// Send a link entered by hand
    Send {
        #[arg(long)]
        url: String,
        /// Skip page analysis and use this title
        #[arg(long)]
        title: Option<String>,
        /// Personal note delivered with the link
        #[arg(long)]
        context: Option<String>,
        #[command(flatten)]
        choices: ChoiceArgs,
    },
    /// Send content handed over by a share action
    Share {
        /// JSON share payload file, `-` for stdin
        #[arg(long, conflicts_with_all = ["url", "text"])]
        payload: Option<PathBuf>,
        /// URL attachment (repeatable)
        #[arg(long)]
        url: Vec<String>,
        /// Plain-text attachment (repeatable)
        #[arg(long)]
        text: Vec<String>,
        #[arg(long)]
        note: Option<String>,
        #[command(flatten)]
        choices: ChoiceArgs,
    },
    /// Resolve the display title of a page
    Extract { url: String },
    /// List sent links, most recent first
    History {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Inspect or change stored preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsCommand,
    },
    /// AI summary settings and consent
    Ai {
        #[command(subcommand)]
        action: AiCommand,
    },
    /// Clear all preferences and history except the endpoint
    Reset {
        #[arg(long)]
        yes: bool,
    },
    /// Show paths, configuration and stored state
    Status,
    /// Interactive capture session reading commands from stdin
    App,
}

#[derive(Debug, Subcommand)]
enum PrefsCommand {
    Show,
    Get { key: String },
    Set { key: String, value: String },
}

#[derive(Debug, Subcommand)]
enum AiCommand {
    Status,
    Enable {
        /// Accept the data disclosure
        #[arg(long)]
        accept: bool,
    },
    Disable,
    /// Show or set the summary length
    Length {
        #[arg(value_parser = parse_length)]
        value: Option<SummaryLength>,
    },
}

#[derive(Debug, Clone, Args)]
struct ChoiceArgs {
    /// Turn AI summaries on (persists)
    #[arg(long, conflicts_with = "no_ai_summary")]
    ai_summary: bool,
    /// Turn AI summaries off (persists)
    #[arg(long)]
    no_ai_summary: bool,
    /// Accept the AI data disclosure if it is required
    #[arg(long)]
    accept: bool,
    #[arg(long, value_parser = parse_length)]
    summary_length: Option<SummaryLength>,
}

impl From<ChoiceArgs> for SendChoices {
    fn from(args: ChoiceArgs) -> Self {
        let ai_summary = if args.ai_summary {
            Some(true)
        } else if args.no_ai_summary {
            Some(false)
        } else {
            None
        };
        Self {
            ai_summary,
            accept: args.accept,
            summary_length: args.summary_length,
        }
    }
}

fn parse_length(raw: &str) -> Result<SummaryLength, String> {
    raw.parse::<SummaryLength>().map_err(|err| err.to_string())
}

fn print_report(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        let status = if report.ok { "ok" } else { "failed" };
        println!("{}: {status}", report.command);
        for detail in &report.details {
            println!("  {detail}");
        }
        for issue in &report.issues {
            println!("  issue: {issue}");
        }
    }

    if !report.ok {
        bail!("{} failed", report.command);
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let report = match cli.command {
        Command::Setup { email, endpoint } => {
            crate::commands::setup::run(&crate::commands::setup::SetupOptions { email, endpoint })?
        }
        Command::Send {
            url,
            title,
            context,
            choices,
        } => crate::commands::send::run(&crate::commands::send::SendOptions {
            url,
            title,
            context,
            choices: choices.into(),
        })?,
        Command::Share {
            payload,
            url,
            text,
            note,
            choices,
        } => crate::commands::share::run(&crate::commands::share::ShareOptions {
            payload,
            urls: url,
            texts: text,
            note,
            choices: choices.into(),
        })?,
        Command::Extract { url } => {
            crate::commands::extract::run(&crate::commands::extract::ExtractOptions { url })?
        }
        Command::History { limit } => {
            crate::commands::history::run(&crate::commands::history::HistoryOptions { limit })?
        }
        Command::Prefs { action } => {
            let action = match action {
                PrefsCommand::Show => PrefsAction::Show,
                PrefsCommand::Get { key } => PrefsAction::Get { key },
                PrefsCommand::Set { key, value } => PrefsAction::Set { key, value },
            };
            crate::commands::prefs::run(&action)?
        }
        Command::Ai { action } => {
            let action = match action {
                AiCommand::Status => AiAction::Status,
                AiCommand::Enable { accept } => AiAction::Enable { accept },
                AiCommand::Disable => AiAction::Disable,
                AiCommand::Length { value } => AiAction::Length { value },
            };
            crate::commands::ai::run(&action)?
        }
        Command::Reset { yes } => {
            crate::commands::reset::run(&crate::commands::reset::ResetOptions { yes })?
        }
        Command::Status => crate::commands::status::run()?,
        Command::App => crate::commands::app::run()?,
    };

    print_report(&report, cli.json)
}
