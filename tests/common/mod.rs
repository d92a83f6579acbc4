// tests/common/mod.rs
// Minimal in-process HTTP responder for collector tests (no network).
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use lunar_dream_etl::config::FetchSettings;
use lunar_dream_etl::ingest::http::FetchContext;
use lunar_dream_etl::ingest::types::{RawReport, ReportSink, SourceCollector, SourceKind};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub struct MockServer {
    pub base: String,
    task: tokio::task::JoinHandle<()>,
}

impl MockServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Serve fixed bodies keyed by request target (`/path?query`); the path alone is
/// tried when the full target has no route. Unknown targets get 404.
/// `$BASE` inside a body is replaced by the server's own base URL.
pub async fn serve(routes: Vec<(&str, &str, String)>) -> MockServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let routes: Arc<HashMap<String, (String, String)>> = Arc::new(
        routes
            .into_iter()
            .map(|(path, ctype, body)| {
                (path.to_string(), (ctype.to_string(), body.replace("$BASE", &base)))
            })
            .collect(),
    );

    let task = tokio::spawn(async move {
        loop {
            let Ok((mut sock, _)) = listener.accept().await else {
                break;
            };
            let routes = routes.clone();
            tokio::spawn(async move {
                // Read the head and any request body so closing does not reset the peer.
                let mut buf = Vec::new();
                let mut chunk = [0u8; 4096];
                loop {
                    match sock.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            buf.extend_from_slice(&chunk[..n]);
                            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                                let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
                                let body_len = head
                                    .lines()
                                    .find_map(|l| l.strip_prefix("content-length:"))
                                    .and_then(|v| v.trim().parse::<usize>().ok())
                                    .unwrap_or(0);
                                if buf.len() >= end + 4 + body_len {
                                    break;
                                }
                            }
                        }
                    }
                }
                let head = String::from_utf8_lossy(&buf);
                let target = head
                    .lines()
                    .next()
                    .and_then(|l| l.split_whitespace().nth(1))
                    .unwrap_or("/")
                    .to_string();
                let path = target.split('?').next().unwrap_or("/").to_string();

                let (status, ctype, body) = match routes.get(&target).or_else(|| routes.get(&path)) {
                    Some((ctype, body)) => ("200 OK", ctype.as_str(), body.as_str()),
                    None => ("404 Not Found", "text/plain", "not found"),
                };
                let resp = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: {ctype}; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = sock.write_all(resp.as_bytes()).await;
                let _ = sock.shutdown().await;
            });
        }
    });

    MockServer { base, task }
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

/// Fetch settings without politeness delay.
pub fn fast_fetch() -> FetchSettings {
    FetchSettings {
        delay_ms: 0,
        timeout_secs: 5,
        provider_budget_secs: 10,
        ..FetchSettings::default()
    }
}

/// Run one collector to completion and return what it pushed, plus its result.
pub async fn run_collector<C: SourceCollector>(
    c: &C,
) -> (Vec<RawReport>, Result<(), lunar_dream_etl::error::CollectError>) {
    let ctx = FetchContext::new(&fast_fetch(), today()).unwrap();
    let (sink, mut rx) = ReportSink::new(c.max_reports());
    let res = c.collect(&ctx, &sink).await;
    drop(sink);
    let mut out = Vec::new();
    while let Ok(r) = rx.try_recv() {
        out.push(r);
    }
    (out, res)
}

pub fn report(kind: SourceKind, text: &str) -> RawReport {
    RawReport {
        source_kind: kind,
        external_id: lunar_dream_etl::dedup::content_id(text),
        url: format!("https://example.org/{}", lunar_dream_etl::dedup::content_id(text)),
        title: "Dream".to_string(),
        text: text.to_string(),
        captured_at: today(),
        tags: vec![kind.as_str().to_string()],
        license: "cc-by".to_string(),
    }
}

/// Long enough to pass every provider's length floor.
pub fn long_text(seed: &str) -> String {
    let mut s = String::new();
    while s.chars().count() < 420 {
        s.push_str(seed);
        s.push(' ');
    }
    s.trim_end().to_string()
}

/// Text of exactly `n` characters with no commas and no outer whitespace.
pub fn text_of_len(n: usize) -> String {
    let mut s: String = "Мне снилась тихая река ".chars().cycle().take(n).collect();
    if s.ends_with(' ') {
        s.pop();
        s.push('.');
    }
    s
}
