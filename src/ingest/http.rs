// src/ingest/http.rs
//! Per-provider HTTP context: client defaults (user agent, timeout) and a
//! politeness delay keyed by target host.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use serde::de::DeserializeOwned;

use crate::config::FetchSettings;
use crate::error::CollectError;

pub struct FetchContext {
    client: reqwest::Client,
    delay: Duration,
    last_hit: Mutex<HashMap<String, Instant>>,
    today: NaiveDate,
}

impl FetchContext {
    pub fn new(settings: &FetchSettings, today: NaiveDate) -> Result<Self, CollectError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .connect_timeout(Duration::from_secs(settings.timeout_secs.min(10)))
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| CollectError::Client(e.to_string()))?;
        Ok(Self {
            client,
            delay: Duration::from_millis(settings.delay_ms),
            last_hit: Mutex::new(HashMap::new()),
            today,
        })
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Collection date stamped on every report from this run.
    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Wait until `delay` has passed since the previous request to the same host.
    pub async fn throttle(&self, url: &str) {
        if self.delay.is_zero() {
            return;
        }
        let host = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
            .unwrap_or_default();

        let wait = {
            let mut guard = match self.last_hit.lock() {
                Ok(g) => g,
                Err(poisoned) => poisoned.into_inner(),
            };
            let now = Instant::now();
            let slot = match guard.get(&host) {
                Some(prev) => (*prev + self.delay).max(now),
                None => now,
            };
            guard.insert(host, slot);
            slot.saturating_duration_since(now)
        };
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }

    /// Throttled send with status check.
    pub async fn send(
        &self,
        url: &str,
        req: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, CollectError> {
        self.throttle(url).await;
        let resp = req.send().await.map_err(|source| CollectError::Http {
            url: url.to_string(),
            source,
        })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CollectError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(resp)
    }

    pub async fn get_text(&self, url: &str) -> Result<String, CollectError> {
        let resp = self.send(url, self.client.get(url)).await?;
        resp.text().await.map_err(|source| CollectError::Http {
            url: url.to_string(),
            source,
        })
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CollectError> {
        let body = self.get_text(url).await?;
        serde_json::from_str(&body).map_err(|e| CollectError::parse(url, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(delay_ms: u64) -> FetchContext {
        let settings = FetchSettings {
            delay_ms,
            ..FetchSettings::default()
        };
        FetchContext::new(&settings, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn same_host_requests_are_spaced() {
        let c = ctx(60);
        let t0 = Instant::now();
        c.throttle("https://a.example/x").await;
        c.throttle("https://a.example/y").await;
        assert!(t0.elapsed() >= Duration::from_millis(55));
    }

    #[tokio::test]
    async fn different_hosts_do_not_wait_on_each_other() {
        let c = ctx(500);
        let t0 = Instant::now();
        c.throttle("https://a.example/x").await;
        c.throttle("https://b.example/x").await;
        assert!(t0.elapsed() < Duration::from_millis(400));
    }
}
