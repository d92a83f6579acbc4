// src/ingest/providers/dreambank.rs
use async_trait::async_trait;

use crate::error::CollectError;
use crate::ingest::http::FetchContext;
use crate::ingest::page::{body_html, extract_links, title_then_h1};
use crate::ingest::providers::ReportTemplate;
use crate::ingest::types::{ReportSink, SourceCollector, SourceKind};
use crate::ingest::{html_to_text, long_enough};

pub const DREAMBANK_BASE: &str = "https://dreambank.net";
const MIN_CHARS: usize = 400;

/// Follows site links from the DreamBank index and keeps long text pages.
pub struct DreamBankCollector {
    base_url: String,
    limit: usize,
}

impl DreamBankCollector {
    pub fn new(limit: usize) -> Self {
        Self {
            base_url: DREAMBANK_BASE.to_string(),
            limit,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn site_host(&self) -> String {
        url::Url::parse(&self.base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default()
    }
}

#[async_trait]
impl SourceCollector for DreamBankCollector {
    async fn collect(&self, ctx: &FetchContext, sink: &ReportSink) -> Result<(), CollectError> {
        let index = ctx.get_text(&self.base_url).await?;
        let host = self.site_host();

        let links: Vec<String> = extract_links(&index, &self.base_url)
            .into_iter()
            .filter(|href| {
                url::Url::parse(href)
                    .ok()
                    .and_then(|u| u.host_str().map(|h| h.ends_with(host.as_str())))
                    .unwrap_or(false)
            })
            .take(self.limit)
            .collect();
        tracing::debug!(target: "ingest", provider = "dreambank", pages = links.len(), "index links");

        for href in links {
            if sink.is_full() {
                break;
            }
            let html = match ctx.get_text(&href).await {
                Ok(h) => h,
                Err(e) => {
                    tracing::debug!(target: "ingest", provider = "dreambank", url = %href, error = %e, "skip page");
                    continue;
                }
            };
            let text = html_to_text(body_html(&html));
            if !long_enough(&text, MIN_CHARS) {
                continue;
            }
            let title = title_then_h1(&html);
            let template = ReportTemplate {
                kind: SourceKind::DreamBank,
                url: href.clone(),
                default_title: "DreamBank page",
                tags: vec!["dreambank".to_string()],
                license: "public-website".to_string(),
            };
            sink.push(template.build(ctx.today(), Some(href.clone()), title.as_deref(), text));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "dreambank"
    }

    fn max_reports(&self) -> usize {
        self.limit
    }
}
