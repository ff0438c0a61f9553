//! Interactive browser driven by scripted input

mod common;

use common::*;
use litelog::browser::{Browser, BrowserCommand};
use litelog_core::timezone::TimezoneConfig;
use litelog_terminal::{BrowserView, PayloadView, TableFormatter};
use std::sync::Arc;

fn browser(source: Arc<MockSource>) -> Browser<MockSource> {
    let session = session_with(source, configured_settings());
    Browser::new(
        session,
        BrowserView::with_size(TimezoneConfig::utc(), 100, 10),
        Box::new(TableFormatter::new(TimezoneConfig::utc())),
    )
}

fn source() -> Arc<MockSource> {
    let source = MockSource::new().with_keys(vec![key("sk-a", Some("prod")), key("sk-b", None)]);
    source.push_page_for(
        "sk-a",
        vec![
            LogEntryBuilder::new("req-1")
                .with_request_payload(r#"{"messages":[{"role":"user","content":"hi"}]}"#)
                .build(),
            LogEntryBuilder::new("req-2").with_status("failure").build(),
        ],
    );
    Arc::new(source)
}

#[tokio::test]
async fn test_select_with_keyboard() {
    let mut browser = browser(source());
    let mut output = Vec::new();

    browser.run(&b"j\n\nq\n"[..], &mut output).await.unwrap();

    let session = browser.session();
    assert_eq!(session.selected_id(), Some("req-1"));
    let rendered = String::from_utf8(output).unwrap();
    assert!(rendered.contains("LITELOG - prod"));
    assert!(rendered.contains("\"content\": \"hi\""));
}

#[tokio::test]
async fn test_errors_stay_on_screen_until_dismissed() {
    let source = source();
    let mut browser = browser(source.clone());
    let mut output = Vec::new();
    browser.run(&b"q\n"[..], &mut output).await.unwrap();

    source.push_status(401);
    browser.apply(BrowserCommand::LoadOlder).await;
    assert!(browser.render().contains("Error: Authentication failed"));
    assert_eq!(browser.session().current_entries().len(), 2);

    browser.apply(BrowserCommand::FocusDown).await;
    assert!(browser.render().contains("Error: Authentication failed"));

    browser.apply(BrowserCommand::DismissError).await;
    assert!(!browser.render().contains("Error:"));
}

#[tokio::test]
async fn test_key_navigation_and_unknown_input() {
    let source = source();
    source.push_page_for("sk-b", entries("b", 1));
    let mut browser = browser(source.clone());
    let mut output = Vec::new();

    browser.run(&b"n\nwhat\n"[..], &mut output).await.unwrap();

    let rendered = String::from_utf8(output).unwrap();
    assert!(rendered.contains("Unknown command: what"));
    assert_eq!(browser.session().selected_key().unwrap().as_str(), "sk-b");
    assert_eq!(source.calls_for("sk-b").len(), 1);
}

#[tokio::test]
async fn test_refresh_reloads_keys_and_logs() {
    let source = source();
    let mut browser = browser(source.clone());
    let mut output = Vec::new();

    browser.run(&b"o\nR\n"[..], &mut output).await.unwrap();

    assert_eq!(source.key_fetches(), 2);
    // latest, older, then latest again after the cache was cleared
    assert_eq!(source.calls_for("sk-a").len(), 3);
}

#[tokio::test]
async fn test_reads_chunked_input() {
    let input = tokio_test::io::Builder::new()
        .read(b"j\n")
        .read(b"k\n")
        .read(b"q\n")
        .build();
    let mut browser = browser(source());
    let mut output = Vec::new();

    browser
        .run(tokio::io::BufReader::new(input), &mut output)
        .await
        .unwrap();

    assert_eq!(browser.session().focused_id(), Some("req-1"));
}

#[tokio::test]
async fn test_progress_frame_while_loading_older() {
    let source = source();
    let mut browser = browser(source.clone());
    let mut output = Vec::new();
    browser.run(&b""[..], &mut output).await.unwrap();

    let gate = source.hold_fetches();
    let mut frames = Vec::new();
    let (result, _) = tokio::join!(
        browser.execute(BrowserCommand::LoadOlder, &mut frames),
        async { gate.add_permits(1) }
    );
    result.unwrap();

    let frames = String::from_utf8(frames).unwrap();
    assert!(frames.contains("loading older..."));
    assert!(frames.contains("2 entries"));
    assert_eq!(source.calls_for("sk-a").len(), 2);
    assert!(!browser.render().contains("loading older..."));
}

#[tokio::test]
async fn test_toggle_formatted_payload() {
    let mut browser = browser(source());
    let mut output = Vec::new();

    browser.run(&b"j\n\nf\n"[..], &mut output).await.unwrap();

    assert_eq!(browser.payload_view(), PayloadView::Formatted);
    let rendered = browser.render();
    assert!(rendered.contains("Messages:\n  [User]\n  hi"));
    assert!(!rendered.contains("\"content\": \"hi\""));

    browser.apply(BrowserCommand::TogglePayloadView).await;
    assert!(browser.render().contains("\"content\": \"hi\""));
}
