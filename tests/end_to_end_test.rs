//! End-to-end: a session backed by the real HTTP client against a local
//! gateway stub

use litelog::{Session, Settings};
use litelog_client::GatewayClient;
use litelog_core::types::KeyToken;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

const KEYS_BODY: &str = r#"{"keys":[
    {"token":"sk-a","key_name":"sk-...aaaa","key_alias":"prod","spend":12.5,"created_at":"2025-01-01T00:00:00Z"},
    {"token":"sk-b","key_name":"sk-...bbbb","key_alias":null,"spend":null,"created_at":"2025-01-02T00:00:00Z"}
]}"#;

const LATEST_BODY: &str = r#"{"data":[
    {"request_id":"r2","status":"success","model":"gpt-4o","startTime":"2025-03-01T11:00:00Z","endTime":"2025-03-01T11:00:03Z","spend":0.0021,"total_tokens":300,
     "proxy_server_request":{"model":"gpt-4o","messages":[]},"response":{"id":"chatcmpl-1"}},
    {"request_id":"r1","status":"failure","model":"gpt-4o","startTime":"2025-03-01T10:00:00Z","endTime":"2025-03-01T10:00:01Z","spend":0,"cache_hit":true}
]}"#;

const OLDER_BODY: &str = r#"{"data":[
    {"request_id":"r1","status":"failure","model":"gpt-4o","startTime":"2025-03-01T10:00:00Z","endTime":"2025-03-01T10:00:01Z","spend":0},
    {"request_id":"r0","status":"success","model":"gpt-4o-mini","startTime":"2025-02-28T09:00:00Z","endTime":"2025-02-28T09:00:01Z","spend":0.0001}
]}"#;

/// Serve canned responses by path; logs requests are answered in order
async fn spawn_gateway(log_bodies: Vec<&'static str>) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = requests.clone();

    tokio::spawn(async move {
        let mut log_bodies = log_bodies.into_iter();
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let head = String::from_utf8_lossy(&request).into_owned();
            let request_line = head.lines().next().unwrap_or_default().to_string();
            seen.lock().unwrap().push(request_line.clone());

            let (status, body) = if !head.contains("Bearer sk-master") {
                ("401 Unauthorized", "{}")
            } else if request_line.starts_with("GET /key/list") {
                ("200 OK", KEYS_BODY)
            } else if request_line.starts_with("GET /spend/logs/ui") {
                ("200 OK", log_bodies.next().unwrap_or(r#"{"data":[]}"#))
            } else {
                ("404 Not Found", "{}")
            };
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        }
    });

    (format!("http://{addr}"), requests)
}

fn settings(base_url: &str, admin_api_key: &str) -> Settings {
    Settings {
        base_url: base_url.to_string(),
        admin_api_key: admin_api_key.to_string(),
        ..Settings::default()
    }
}

fn connect(settings: &Settings) -> litelog::Result<Arc<GatewayClient>> {
    let http = reqwest::Client::builder().no_proxy().build()?;
    GatewayClient::with_http_client(&settings.base_url, &settings.admin_api_key, http).map(Arc::new)
}

#[tokio::test]
async fn test_browse_latest_then_older() {
    let (base_url, requests) = spawn_gateway(vec![LATEST_BODY, OLDER_BODY]).await;
    let mut session = Session::new(settings(&base_url, "sk-master"), connect);

    session.refresh_keys().await.unwrap();
    assert_eq!(session.keys()[0].display_name(), "prod");
    assert_eq!(session.keys()[1].spend, 0.0);
    assert_eq!(session.selected_key(), Some(&KeyToken::new("sk-a")));

    let ids: Vec<&str> = session
        .current_entries()
        .iter()
        .map(|e| e.request_id.as_str())
        .collect();
    assert_eq!(ids, ["r2", "r1"]);
    assert_eq!(session.current_entries()[1].cache_hit.as_deref(), Some("true"));

    session.load_older().await.unwrap();
    let ids: Vec<&str> = session
        .current_entries()
        .iter()
        .map(|e| e.request_id.as_str())
        .collect();
    assert_eq!(ids, ["r2", "r1", "r0"]);

    session.select_entry("r2").unwrap();
    let selected = session.selected_entry().unwrap();
    assert_eq!(selected.duration_secs(), Some(3.0));
    let payload: serde_json::Value =
        serde_json::from_slice(selected.request_payload.as_ref().unwrap().as_bytes()).unwrap();
    assert_eq!(payload["model"], "gpt-4o");

    let requests = requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 3);
    assert!(requests[1].contains("api_key=sk-a"));
    assert!(requests[1].contains("page_size=50"));
}

#[tokio::test]
async fn test_wrong_admin_key_reports_authentication_failure() {
    let (base_url, _requests) = spawn_gateway(Vec::new()).await;
    let mut session = Session::new(settings(&base_url, "sk-wrong"), connect);

    let err = session.refresh_keys().await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(
        session.last_error(),
        Some("Authentication failed. Please check your Admin API Key.")
    );
    assert!(session.keys().is_empty());
}

#[tokio::test]
async fn test_invalid_base_url_surfaces_on_construction() {
    let session = Session::new(settings("not a url", "sk-master"), connect);
    assert!(
        session
            .last_error()
            .unwrap()
            .starts_with("The provided Base URL is invalid")
    );
}
