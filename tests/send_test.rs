mod common;

use common::{FakeServer, brief, onboard, stdout_of};
use predicates::prelude::*;
use serde_json::Value;
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn send_posts_payload_and_records_history() {
    let tmp = tempdir().expect("tempdir");
    let server = FakeServer::with_status(200);
    onboard(tmp.path(), "reader@example.com", &server.url("/send"));

    brief(tmp.path())
        .args(["send", "--url", "https://www.nytimes.com/2024/a", "--title", "Big Story"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sent to reader@example.com"))
        .stdout(predicate::str::contains("site=nytimes.com"));

    let posts = server.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].path, "/send");
    let body = posts[0].json();
    assert_eq!(body["url"], "https://www.nytimes.com/2024/a");
    assert_eq!(body["title"], "Big Story");
    assert_eq!(body["site"], "nytimes.com");
    assert_eq!(body["email"], "reader@example.com");
    assert_eq!(body["aiSummary"], false);
    assert_eq!(body["summaryLength"], "short");
    assert!(body.get("context").is_none());

    let output = brief(tmp.path())
        .args(["history", "--json"])
        .output()
        .expect("history");
    assert!(output.status.success());
    let report: Value = serde_json::from_str(&stdout_of(&output)).expect("report json");
    assert_eq!(report["data"][0]["title"], "Big Story");
    assert_eq!(report["data"][0]["site"], "nytimes.com");
}

#[test]
fn send_includes_note_when_given() {
    let tmp = tempdir().expect("tempdir");
    let server = FakeServer::with_status(200);
    onboard(tmp.path(), "reader@example.com", &server.url("/send"));

    brief(tmp.path())
        .args([
            "send",
            "--url",
            "https://example.com/post",
            "--title",
            "Post",
            "--context",
            "read on the train",
            "--summary-length",
            "detailed",
        ])
        .assert()
        .success();

    let body = server.posts()[0].json();
    assert_eq!(body["context"], "read on the train");
    assert_eq!(body["summaryLength"], "long");
}

#[test]
fn missing_email_fails_without_contacting_server() {
    let tmp = tempdir().expect("tempdir");
    let server = FakeServer::with_status(200);
    brief(tmp.path())
        .args(["prefs", "set", "apiEndpoint", &server.url("/send")])
        .assert()
        .success();

    brief(tmp.path())
        .args(["send", "--url", "https://example.com/a", "--title", "A"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("E_MISSING_EMAIL"))
        .stdout(predicate::str::contains("Please set your email in Brief first"));

    assert!(server.requests().is_empty());
}

#[test]
fn share_without_email_fetches_nothing() {
    let tmp = tempdir().expect("tempdir");
    let server = FakeServer::with_status(200);
    brief(tmp.path())
        .args(["prefs", "set", "apiEndpoint", &server.url("/send")])
        .assert()
        .success();

    brief(tmp.path())
        .args(["share", "--url", &server.url("/article")])
        .assert()
        .failure()
        .stdout(predicate::str::contains("E_MISSING_EMAIL"))
        .stdout(predicate::str::contains("title_source").not());

    brief(tmp.path())
        .args(["send", "--url", &server.url("/other")])
        .assert()
        .failure()
        .stdout(predicate::str::contains("E_MISSING_EMAIL"));

    assert!(server.requests().is_empty());
}

#[test]
fn slow_endpoint_times_out() {
    let tmp = tempdir().expect("tempdir");
    let server = FakeServer::start(|_| {
        thread::sleep(Duration::from_secs(3));
        (200, String::new())
    });
    onboard(tmp.path(), "reader@example.com", &server.url("/send"));

    brief(tmp.path())
        .env("BRIEF_SEND_TIMEOUT_SECS", "1")
        .args(["send", "--url", "https://example.com/a", "--title", "A"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("E_TIMEOUT"));

    brief(tmp.path())
        .args(["prefs", "get", "sentHistory"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sentHistory=0 entries"));
}

#[test]
fn non_200_status_is_a_failure_and_history_is_untouched() {
    let tmp = tempdir().expect("tempdir");
    let server = FakeServer::with_status(201);
    onboard(tmp.path(), "reader@example.com", &server.url("/send"));

    brief(tmp.path())
        .args(["send", "--url", "https://example.com/a", "--title", "A"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("E_STATUS"))
        .stdout(predicate::str::contains("Failed to send link. Please try again."));

    assert_eq!(server.posts().len(), 1);
    brief(tmp.path())
        .args(["history"])
        .assert()
        .success()
        .stdout(predicate::str::contains("count=0"))
        .stdout(predicate::str::contains("no links sent yet"));
}

#[test]
fn invalid_endpoint_is_rejected_at_send_time() {
    let tmp = tempdir().expect("tempdir");
    onboard(tmp.path(), "reader@example.com", "https://example.com/send");
    std::fs::write(tmp.path().join("shared/apiEndpoint.json"), "\"not a url\"")
        .expect("write endpoint");

    brief(tmp.path())
        .args(["send", "--url", "https://example.com/a", "--title", "A"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("E_INVALID_ENDPOINT"));
}

#[test]
fn share_fetches_title_when_none_was_shared() {
    let tmp = tempdir().expect("tempdir");
    let server = FakeServer::start(|req| match req.method.as_str() {
        "GET" => (
            200,
            r#"<html><head><title>Tag</title><meta property="og:title" content="Shared Piece - Reuters"></head></html>"#
                .to_string(),
        ),
        _ => (200, String::new()),
    });
    onboard(tmp.path(), "reader@example.com", &server.url("/send"));

    brief(tmp.path())
        .args(["share", "--url", &server.url("/article")])
        .assert()
        .success()
        .stdout(predicate::str::contains("title_source=page title=Shared Piece"));

    let body = server.posts()[0].json();
    assert_eq!(body["title"], "Shared Piece");
    assert_eq!(body["site"], "127.0.0.1");
}

#[test]
fn share_payload_prefers_property_list_title() {
    let tmp = tempdir().expect("tempdir");
    let server = FakeServer::with_status(200);
    onboard(tmp.path(), "reader@example.com", &server.url("/send"));

    let payload = r#"{"items":[{"attachments":[
        {"type":"text","value":"Plain words"},
        {"type":"text","value":"https://inferred.example.com/x"},
        {"type":"propertyList","value":{"URL":"https://www.bbc.co.uk/news/1","title":"From The Page"}}
    ]}]}"#;
    brief(tmp.path())
        .args(["share", "--payload", "-"])
        .write_stdin(payload)
        .assert()
        .success();

    let body = server.posts()[0].json();
    assert_eq!(body["url"], "https://www.bbc.co.uk/news/1");
    assert_eq!(body["title"], "From The Page");
    assert_eq!(body["site"], "bbc.co.uk");
}

#[test]
fn share_without_link_fails() {
    let tmp = tempdir().expect("tempdir");
    brief(tmp.path())
        .args(["share", "--text", "just words"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("shared content carries no link"));
}
