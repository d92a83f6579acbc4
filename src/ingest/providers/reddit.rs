// src/ingest/providers/reddit.rs
//! Dream threads sampled from subreddits through the read-only OAuth API.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::config::sources::{RedditMode, RedditParams};
use crate::config::RedditCredentials;
use crate::error::CollectError;
use crate::ingest::http::FetchContext;
use crate::ingest::providers::ReportTemplate;
use crate::ingest::types::{RawReport, ReportSink, SourceCollector, SourceKind};
use crate::ingest::long_enough;

pub const REDDIT_AUTH_URL: &str = "https://www.reddit.com/api/v1/access_token";
pub const REDDIT_API: &str = "https://oauth.reddit.com";
const REDDIT_WEB: &str = "https://www.reddit.com";
const MIN_CHARS: usize = 160;
/// Only a short excerpt of each post is kept.
const SAMPLE_CHARS: usize = 1_200;
const PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
struct Token {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
    after: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub permalink: String,
}

pub struct RedditCollector {
    subreddits: Vec<String>,
    limit: usize,
    mode: RedditMode,
    credentials: Option<RedditCredentials>,
    auth_url: String,
    api_base: String,
}

impl RedditCollector {
    pub fn new(params: &RedditParams, credentials: Option<RedditCredentials>) -> Self {
        Self {
            subreddits: params
                .subreddits
                .iter()
                .map(|s| s.trim().trim_start_matches("r/").to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            limit: params.limit,
            mode: params.mode,
            credentials,
            auth_url: REDDIT_AUTH_URL.to_string(),
            api_base: REDDIT_API.to_string(),
        }
    }

    pub fn with_endpoints(mut self, auth_url: &str, api_base: &str) -> Self {
        self.auth_url = auth_url.to_string();
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    async fn token(&self, ctx: &FetchContext, creds: &RedditCredentials) -> Result<String, CollectError> {
        let req = ctx
            .client()
            .post(&self.auth_url)
            .basic_auth(&creds.client_id, Some(&creds.secret))
            .header(reqwest::header::USER_AGENT, &creds.user_agent)
            .form(&[("grant_type", "client_credentials")]);
        let resp = ctx.send(&self.auth_url, req).await?;
        let token: Token = resp
            .json()
            .await
            .map_err(|e| CollectError::parse("reddit token", e))?;
        Ok(token.access_token)
    }

    fn listing_url(&self, sub: &str, page: usize, after: Option<&str>) -> String {
        let mut url = format!(
            "{}/r/{}/{}?limit={}&raw_json=1",
            self.api_base,
            sub,
            self.mode.as_str(),
            page
        );
        if self.mode == RedditMode::Top {
            url.push_str("&t=all");
        }
        if let Some(a) = after {
            url.push_str("&after=");
            url.push_str(a);
        }
        url
    }

    async fn collect_subreddit(
        &self,
        ctx: &FetchContext,
        sink: &ReportSink,
        creds: &RedditCredentials,
        token: &str,
        sub: &str,
    ) -> Result<(), CollectError> {
        let mut seen = 0usize;
        let mut after: Option<String> = None;
        while seen < self.limit {
            let page = PAGE_SIZE.min(self.limit - seen);
            let url = self.listing_url(sub, page, after.as_deref());
            let req = ctx
                .client()
                .get(&url)
                .bearer_auth(token)
                .header(reqwest::header::USER_AGENT, &creds.user_agent);
            let listing: Listing = ctx
                .send(&url, req)
                .await?
                .json()
                .await
                .map_err(|e| CollectError::parse(&url, e))?;

            if listing.data.children.is_empty() {
                break;
            }
            seen += listing.data.children.len();
            for child in listing.data.children {
                if let Some(report) = post_to_report(child.data, sub, ctx.today()) {
                    if !sink.push(report) {
                        return Ok(());
                    }
                }
            }
            match listing.data.after {
                Some(a) => after = Some(a),
                None => break,
            }
        }
        Ok(())
    }
}

/// Keep self-posts long enough to be a dream account; store an excerpt only.
pub fn post_to_report(post: Post, sub: &str, today: NaiveDate) -> Option<RawReport> {
    let text = post.selftext.trim();
    if !long_enough(text, MIN_CHARS) {
        return None;
    }
    let sample: String = text.chars().take(SAMPLE_CHARS).collect();
    let template = ReportTemplate {
        kind: SourceKind::Reddit,
        url: format!("{REDDIT_WEB}{}", post.permalink),
        default_title: "Reddit post",
        tags: vec!["reddit".to_string(), sub.to_string()],
        license: "reddit-terms".to_string(),
    };
    Some(template.build(today, Some(post.id), Some(&post.title), sample))
}

#[async_trait]
impl SourceCollector for RedditCollector {
    async fn collect(&self, ctx: &FetchContext, sink: &ReportSink) -> Result<(), CollectError> {
        let creds = self
            .credentials
            .as_ref()
            .ok_or(CollectError::MissingCredentials("REDDIT_CLIENT_ID / REDDIT_SECRET"))?;
        let token = self.token(ctx, creds).await?;

        for sub in &self.subreddits {
            if sink.is_full() {
                break;
            }
            if let Err(e) = self.collect_subreddit(ctx, sink, creds, &token, sub).await {
                tracing::warn!(target: "ingest", provider = "reddit", subreddit = %sub, error = %e, "subreddit skipped");
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "reddit"
    }

    fn max_reports(&self) -> usize {
        self.limit.saturating_mul(self.subreddits.len().max(1))
    }
}
