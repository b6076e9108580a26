use crate::brief::config::BriefConfig;
use crate::brief::consent::{ConsentGate, ai_summary_allowed};
use crate::brief::extract::TitleFetcher;
use crate::brief::history::HistoryLog;
use crate::brief::paths::BriefPaths;
use crate::brief::prefs::Preferences;
use crate::brief::send::{SendPipeline, SendRequest};
use crate::brief::submission::{Submission, audit_outcome};
use crate::brief::util::truncate_with_ellipsis;
use crate::error::SendError;
use anyhow::Result;
use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

/// Everything that can change session state. Workers and the input reader
/// only ever post these; the session loop is the one place they are applied.
#[derive(Debug)]
pub enum HostEvent {
    Input(String),
    InputClosed,
    TitleResolved { generation: u64, title: String },
    SendFinished {
        req: SendRequest,
        outcome: Result<(), SendError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Foreground,
    Background,
}

impl Phase {
    fn as_str(self) -> &'static str {
        match self {
            Self::Foreground => "foreground",
            Self::Background => "background",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub sent: usize,
    pub failed: usize,
    pub abandoned: usize,
}

const HELP: &str = "commands: url <link> | title <text> | note <text> | send | history | status | refresh | background | foreground | wait | quit";

/// Long-lived capture session of the host application.
pub struct HostSession<W: Write> {
    paths: BriefPaths,
    config: BriefConfig,
    prefs: Preferences,
    history: HistoryLog,
    submission: Submission,
    phase: Phase,
    tx: Sender<HostEvent>,
    rx: Receiver<HostEvent>,
    in_flight_ops: usize,
    waiting: bool,
    deferred: VecDeque<HostEvent>,
    analysis_generation: u64,
    summary: SessionSummary,
    out: W,
}

pub fn spawn_input_reader<R: BufRead + Send + 'static>(reader: R, tx: Sender<HostEvent>) {
    thread::spawn(move || {
        for line in reader.lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(HostEvent::Input(line)).is_err() {
                return;
            }
        }
        let _ = tx.send(HostEvent::InputClosed);
    });
}

impl<W: Write> HostSession<W> {
    pub fn new(paths: BriefPaths, config: BriefConfig, out: W) -> Self {
        let prefs = Preferences::open(&paths);
        let history = HistoryLog::load(prefs.store());
        let (tx, rx) = mpsc::channel();
        Self {
            paths,
            config,
            prefs,
            history,
            submission: Submission::default(),
            phase: Phase::Foreground,
            tx,
            rx,
            in_flight_ops: 0,
            waiting: false,
            deferred: VecDeque::new(),
            analysis_generation: 0,
            summary: SessionSummary::default(),
            out,
        }
    }

    pub fn sender(&self) -> Sender<HostEvent> {
        self.tx.clone()
    }

    /// Runs until `quit` or end of input. Work still in flight at that point
    /// is abandoned; its completion is dropped with the channel.
    pub fn run(mut self) -> Result<SessionSummary> {
        self.say(format!("ready history={}", self.history.len()))?;
        while let Ok(event) = self.rx.recv() {
            if self.handle_event(event)? == Flow::Quit {
                break;
            }
        }
        self.summary.abandoned = self.in_flight_ops;
        Ok(self.summary)
    }

    fn say(&mut self, line: impl AsRef<str>) -> Result<()> {
        writeln!(self.out, "{}", line.as_ref())?;
        self.out.flush()?;
        Ok(())
    }

    fn handle_event(&mut self, event: HostEvent) -> Result<Flow> {
        match event {
            HostEvent::Input(_) | HostEvent::InputClosed if self.waiting => {
                self.deferred.push_back(event);
                Ok(Flow::Continue)
            }
            HostEvent::Input(line) => self.handle_line(&line),
            HostEvent::InputClosed => Ok(Flow::Quit),
            HostEvent::TitleResolved { generation, title } => {
                self.in_flight_ops = self.in_flight_ops.saturating_sub(1);
                if generation == self.analysis_generation {
                    self.submission.title = title;
                    self.say(format!("title={}", self.submission.title))?;
                }
                self.resume_if_idle()
            }
            HostEvent::SendFinished { req, outcome } => {
                self.in_flight_ops = self.in_flight_ops.saturating_sub(1);
                audit_outcome(&self.paths, &req, &outcome);
                match self.submission.finish(&req, outcome, &mut self.history) {
                    Ok(record) => {
                        // The form was cleared; titles resolved for the sent url are stale.
                        self.analysis_generation += 1;
                        self.summary.sent += 1;
                        self.say(format!(
                            "sent to {} title={} site={} history={}",
                            req.email,
                            record.title,
                            record.site,
                            self.history.len()
                        ))?;
                    }
                    Err(err) => {
                        self.summary.failed += 1;
                        self.say(format!(
                            "error code={} message={}",
                            err.code(),
                            err.user_message()
                        ))?;
                    }
                }
                self.resume_if_idle()
            }
        }
    }

    fn resume_if_idle(&mut self) -> Result<Flow> {
        if !self.waiting || self.in_flight_ops > 0 {
            return Ok(Flow::Continue);
        }
        self.waiting = false;
        while !self.waiting {
            let Some(event) = self.deferred.pop_front() else {
                break;
            };
            if self.handle_event(event)? == Flow::Quit {
                return Ok(Flow::Quit);
            }
        }
        Ok(Flow::Continue)
    }

    fn handle_line(&mut self, line: &str) -> Result<Flow> {
        let line = line.trim();
        let (command, arg) = match line.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (line, ""),
        };

        match command {
            "" => {}
            "url" => {
                self.submission.url = arg.to_string();
                self.submission.title.clear();
                self.say(format!("url={arg}"))?;
                if !arg.is_empty() {
                    self.start_analysis();
                }
            }
            "title" => {
                // A manual title supersedes any analysis still running.
                self.analysis_generation += 1;
                self.submission.title = arg.to_string();
                self.say(format!("title={arg}"))?;
            }
            "note" => {
                self.submission.context = arg.to_string();
                self.say("note set")?;
            }
            "send" => self.start_send()?,
            "history" => self.print_history()?,
            "status" => self.print_status()?,
            "refresh" => {
                self.history.refresh();
                self.say(format!("history={}", self.history.len()))?;
            }
            "background" => {
                self.phase = Phase::Background;
                self.say("phase=background")?;
            }
            "foreground" => {
                if self.phase == Phase::Background {
                    self.history.refresh();
                }
                self.phase = Phase::Foreground;
                self.say(format!("phase=foreground history={}", self.history.len()))?;
            }
            "wait" => {
                if self.in_flight_ops > 0 {
                    self.waiting = true;
                }
            }
            "quit" | "exit" => return Ok(Flow::Quit),
            "help" => self.say(HELP)?,
            other => self.say(format!("unknown command `{other}`; try `help`"))?,
        }
        Ok(Flow::Continue)
    }

    fn start_analysis(&mut self) {
        self.analysis_generation += 1;
        let generation = self.analysis_generation;
        let url = self.submission.url.clone();
        let fetcher = TitleFetcher::new(&self.config.network);
        let tx = self.tx.clone();
        self.in_flight_ops += 1;
        thread::spawn(move || {
            let title = fetcher.fetch_title(&url);
            let _ = tx.send(HostEvent::TitleResolved { generation, title });
        });
    }

    fn start_send(&mut self) -> Result<()> {
        let email = self.prefs.email();
        let ai_summary = ai_summary_allowed(&self.prefs);
        let summary_length = self.prefs.summary_length();
        let req = match self.submission.begin(&email, ai_summary, summary_length) {
            Ok(req) => req,
            Err(err) => return self.say(format!("not sent: {err}")),
        };

        let pipeline = SendPipeline::from_prefs(&self.prefs, &self.config.network);
        let tx = self.tx.clone();
        self.in_flight_ops += 1;
        self.say("sending")?;
        thread::spawn(move || {
            let outcome = pipeline.send(&req);
            let _ = tx.send(HostEvent::SendFinished { req, outcome });
        });
        Ok(())
    }

    fn print_history(&mut self) -> Result<()> {
        let limit = self.config.history.display_limit;
        let lines: Vec<String> = self
            .history
            .entries()
            .iter()
            .take(limit)
            .enumerate()
            .map(|(i, record)| {
                format!(
                    "  {}. {} ({}) {}",
                    i + 1,
                    truncate_with_ellipsis(&record.title, 80),
                    record.site,
                    record.url
                )
            })
            .collect();
        self.say(format!("history count={}", self.history.len()))?;
        for line in lines {
            self.say(line)?;
        }
        Ok(())
    }

    fn print_status(&mut self) -> Result<()> {
        let email = self.prefs.email();
        let consent = ConsentGate::load(self.prefs.clone()).state();
        let line = format!(
            "phase={} email={} ai_summary={} sending={} in_flight={} url={} title={}",
            self.phase.as_str(),
            if email.is_empty() { "<unset>" } else { &email },
            consent.as_str(),
            self.submission.is_in_flight(),
            self.in_flight_ops,
            self.submission.url,
            self.submission.title
        );
        self.say(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brief::paths::test_paths;
    use crate::brief::prefs::SummaryLength;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn run_script(paths: &BriefPaths, script: &str) -> (SessionSummary, String) {
        let mut out = Vec::new();
        let session = HostSession::new(paths.clone(), BriefConfig::default(), &mut out);
        spawn_input_reader(Cursor::new(script.to_string()), session.sender());
        let summary = session.run().expect("run");
        (summary, String::from_utf8(out).expect("utf8"))
    }

    #[test]
    fn foreground_after_background_absorbs_foreign_appends() {
        let tmp = tempdir().expect("tempdir");
        let paths = test_paths(tmp.path());

        let mut out = Vec::new();
        let mut session = HostSession::new(paths.clone(), BriefConfig::default(), &mut out);
        assert_eq!(session.handle_line("background").expect("bg"), Flow::Continue);

        let mut extension = HistoryLog::load(Preferences::open(&paths).store());
        extension.append("https://example.com/shared", "Shared");

        session.handle_line("history").expect("history");
        session.handle_line("foreground").expect("fg");
        drop(session);

        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("history count=0"), "{text}");
        assert!(text.contains("phase=foreground history=1"), "{text}");
    }

    #[test]
    fn late_title_does_not_refill_a_cleared_form() {
        let tmp = tempdir().expect("tempdir");
        let paths = test_paths(tmp.path());

        let mut out = Vec::new();
        let mut session = HostSession::new(paths.clone(), BriefConfig::default(), &mut out);
        session.submission = Submission::new("https://example.com/a", "", "");
        session.analysis_generation = 1;
        session.in_flight_ops = 2;
        let req = session
            .submission
            .begin("u@x.com", false, SummaryLength::Short)
            .expect("begin");

        session
            .handle_event(HostEvent::SendFinished {
                req,
                outcome: Ok(()),
            })
            .expect("send finished");
        session
            .handle_event(HostEvent::TitleResolved {
                generation: 1,
                title: "Late".to_string(),
            })
            .expect("title resolved");

        assert_eq!(session.submission.url, "");
        assert_eq!(session.submission.title, "");
        assert_eq!(session.summary.sent, 1);
        drop(session);
        let text = String::from_utf8(out).expect("utf8");
        assert!(!text.contains("title=Late"), "{text}");
    }

    #[test]
    fn send_without_url_is_refused_locally() {
        let tmp = tempdir().expect("tempdir");
        let paths = test_paths(tmp.path());

        let (summary, text) = run_script(&paths, "title Manual\nsend\nquit\n");
        assert!(text.contains("not sent: no link to send"), "{text}");
        assert_eq!(summary, SessionSummary::default());
    }

    #[test]
    fn failed_send_keeps_fields_for_retry() {
        let tmp = tempdir().expect("tempdir");
        let paths = test_paths(tmp.path());
        Preferences::open(&paths).set_api_endpoint("http://127.0.0.1:9/send");

        let (summary, text) = run_script(
            &paths,
            "url http://127.0.0.1:9/a\ntitle Kept\nsend\nwait\nstatus\nquit\n",
        );
        assert!(text.contains("error code=E_MISSING_EMAIL"), "{text}");
        assert!(text.contains("url=http://127.0.0.1:9/a title=Kept"), "{text}");
        assert_eq!(summary.failed, 1);
        assert!(HistoryLog::load(Preferences::open(&paths).store()).is_empty());
    }

    #[test]
    fn unknown_commands_are_reported_not_fatal() {
        let tmp = tempdir().expect("tempdir");
        let (_, text) = run_script(&test_paths(tmp.path()), "frobnicate\nhelp\n");
        assert!(text.contains("unknown command `frobnicate`"), "{text}");
        assert!(text.contains("commands: url"), "{text}");
    }
}
