// src/ingest/providers/owner_site.rs
//! Crawl of a site whose owner explicitly authorized collection.
//!
//! Breadth-first from `start_url`, following only links on the same registrable
//! domain whose URL contains `path_prefix`. A visited set and `max_pages` bound
//! the traversal.

use std::collections::{HashSet, VecDeque};

use async_trait::async_trait;

use crate::config::sources::OwnerSiteParams;
use crate::error::CollectError;
use crate::ingest::http::FetchContext;
use crate::ingest::page::{extract_links, h1_then_title, main_content_html, registrable_domain};
use crate::ingest::providers::ReportTemplate;
use crate::ingest::types::{ReportSink, SourceCollector, SourceKind};
use crate::ingest::{html_to_text, longer_than};

const MIN_CHARS: usize = 300;

pub struct OwnerSiteCollector {
    start_url: String,
    domain: String,
    path_prefix: String,
    max_pages: usize,
    approved: bool,
}

impl OwnerSiteCollector {
    /// `approved` comes from the owner-approval flag resolved at startup.
    pub fn new(params: &OwnerSiteParams, approved: bool) -> Self {
        Self {
            start_url: params.start_url.clone().unwrap_or_default(),
            domain: params.domain.clone().unwrap_or_default(),
            path_prefix: params.path_prefix.clone(),
            max_pages: params.max_pages,
            approved,
        }
    }

    fn follows(&self, link: &str, base_host: &str) -> bool {
        link.contains(self.path_prefix.as_str())
            && registrable_domain(link).as_deref() == Some(base_host)
    }
}

#[async_trait]
impl SourceCollector for OwnerSiteCollector {
    async fn collect(&self, ctx: &FetchContext, sink: &ReportSink) -> Result<(), CollectError> {
        if !self.approved {
            return Err(CollectError::NotAuthorized(
                "set OWNER_APPROVED=1 to enable owner-site collection",
            ));
        }
        let base_host = registrable_domain(&self.domain).ok_or_else(|| {
            CollectError::InvalidParameter(format!("domain `{}` has no host", self.domain))
        })?;

        let template = ReportTemplate {
            kind: SourceKind::Owner,
            url: self.start_url.clone(),
            default_title: "",
            tags: vec!["owner".to_string(), self.domain.clone()],
            license: "by-owner".to_string(),
        };

        let mut queue = VecDeque::from([self.start_url.clone()]);
        let mut seen: HashSet<String> = HashSet::from([self.start_url.clone()]);
        let mut fetched = 0usize;

        while let Some(href) = queue.pop_front() {
            if fetched >= self.max_pages || sink.is_full() {
                break;
            }
            fetched += 1;
            let html = match ctx.get_text(&href).await {
                Ok(h) => h,
                Err(e) => {
                    tracing::debug!(target: "ingest", provider = "owner", url = %href, error = %e, "skip page");
                    continue;
                }
            };

            let text = html_to_text(main_content_html(&html));
            if longer_than(&text, MIN_CHARS) {
                let title = h1_then_title(&html).unwrap_or_else(|| self.domain.clone());
                sink.push(
                    template
                        .with_url(&href)
                        .build(ctx.today(), Some(href.clone()), Some(&title), text),
                );
            }

            for link in extract_links(&html, &href) {
                if self.follows(&link, &base_host) && seen.insert(link.clone()) {
                    queue.push_back(link);
                }
            }
        }
        tracing::debug!(target: "ingest", provider = "owner", pages = fetched, "crawl finished");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "owner"
    }

    fn max_reports(&self) -> usize {
        self.max_pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector() -> OwnerSiteCollector {
        let params = OwnerSiteParams {
            enabled: true,
            start_url: Some("https://magickum.com/magikum-sonnik/".into()),
            domain: Some("magickum.com".into()),
            ..OwnerSiteParams::default()
        };
        OwnerSiteCollector::new(&params, true)
    }

    #[test]
    fn follows_same_domain_under_prefix_only() {
        let c = collector();
        assert!(c.follows("https://www.magickum.com/magikum-sonnik/voda", "magickum.com"));
        assert!(!c.follows("https://magickum.com/shop", "magickum.com"));
        assert!(!c.follows("https://evil.example/magikum-sonnik/x", "magickum.com"));
    }
}
