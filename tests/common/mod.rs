#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

impl CapturedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("request body is json")
    }
}

type Responder = dyn Fn(&CapturedRequest) -> (u16, String) + Send + Sync;

/// Minimal HTTP/1.1 server on an ephemeral loopback port. Every request is
/// recorded, then answered by `respond`.
pub struct FakeServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl FakeServer {
    pub fn start<F>(respond: F) -> Self
    where
        F: Fn(&CapturedRequest) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake server");
        let base_url = format!("http://{}", listener.local_addr().expect("addr"));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let respond: Arc<Responder> = Arc::new(respond);

        let seen = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else {
                    continue;
                };
                let seen = Arc::clone(&seen);
                let respond = Arc::clone(&respond);
                thread::spawn(move || handle(stream, &seen, respond.as_ref()));
            }
        });

        Self { base_url, requests }
    }

    /// Always answers with `status` and an empty body.
    pub fn with_status(status: u16) -> Self {
        Self::start(move |_| (status, String::new()))
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn posts(&self) -> Vec<CapturedRequest> {
        self.requests()
            .into_iter()
            .filter(|req| req.method == "POST")
            .collect()
    }
}

fn handle(stream: TcpStream, seen: &Mutex<Vec<CapturedRequest>>, respond: &Responder) {
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':')
            && name.trim().eq_ignore_ascii_case("content-length")
        {
            content_length = value.trim().parse().unwrap_or(0);
        }
    }

    let mut body = vec![0u8; content_length];
    if reader.read_exact(&mut body).is_err() {
        return;
    }
    let request = CapturedRequest {
        method,
        path,
        body: String::from_utf8_lossy(&body).into_owned(),
    };
    seen.lock().expect("requests lock").push(request.clone());

    let (status, body) = respond(&request);
    let response = format!(
        "HTTP/1.1 {status} Fake\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let mut stream = stream;
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

/// `brief` isolated to `home`, run from inside it so no stray `.env` applies.
pub fn brief(home: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("brief");
    cmd.current_dir(home)
        .env("BRIEF_HOME", home)
        .env("NO_PROXY", "127.0.0.1,localhost")
        .env("no_proxy", "127.0.0.1,localhost")
        .env_remove("BRIEF_STORE_DIR")
        .env_remove("BRIEF_LOGS_DIR")
        .env_remove("BRIEF_CONFIG_PATH")
        .env_remove("BRIEF_SEND_TIMEOUT_SECS")
        .env_remove("BRIEF_FETCH_TIMEOUT_SECS");
    cmd
}

/// Onboards `email` and points sends at `endpoint`.
pub fn onboard(home: &Path, email: &str, endpoint: &str) {
    brief(home)
        .args(["setup", "--email", email, "--endpoint", endpoint])
        .assert()
        .success();
}

pub fn stdout_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}
