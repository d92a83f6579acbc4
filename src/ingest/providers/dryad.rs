// src/ingest/providers/dryad.rs
use async_trait::async_trait;

use crate::error::CollectError;
use crate::ingest::http::FetchContext;
use crate::ingest::longer_than;
use crate::ingest::page::extract_links;
use crate::ingest::providers::ReportTemplate;
use crate::ingest::tabular::{
    column_texts, file_kind, json_records, sniff_kind, FileKind, DATASET_TEXT_COLUMNS,
};
use crate::ingest::types::{ReportSink, SourceCollector, SourceKind};

pub const DRYAD_BASE: &str = "https://datadryad.org";
const MIN_CHARS: usize = 120;
/// Landing pages link many files; only the first few are fetched.
const MAX_FILES: usize = 20;

/// Reads data files linked from a Dryad dataset landing page.
pub struct DryadCollector {
    base_url: String,
    doi: String,
    max_reports: usize,
}

impl DryadCollector {
    pub fn new(doi: &str, max_reports: usize) -> Self {
        Self {
            base_url: DRYAD_BASE.to_string(),
            doi: doi.trim().to_string(),
            max_reports,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn is_data_link(href: &str) -> bool {
        let lower = href.to_ascii_lowercase();
        let path = lower.split(['?', '#']).next().unwrap_or_default();
        path.ends_with(".csv")
            || path.ends_with(".tsv")
            || path.ends_with(".json")
            || lower.contains("download")
    }
}

#[async_trait]
impl SourceCollector for DryadCollector {
    async fn collect(&self, ctx: &FetchContext, sink: &ReportSink) -> Result<(), CollectError> {
        let page_url = format!("{}/dataset/doi:{}", self.base_url, self.doi);
        let page = ctx.get_text(&page_url).await?;

        let files: Vec<String> = extract_links(&page, &page_url)
            .into_iter()
            .filter(|h| Self::is_data_link(h))
            .take(MAX_FILES)
            .collect();

        for href in files {
            if sink.is_full() {
                break;
            }
            let body = match ctx.get_text(&href).await {
                Ok(b) => b,
                Err(e) => {
                    tracing::debug!(target: "ingest", provider = "dryad", url = %href, error = %e, "skip file");
                    continue;
                }
            };
            let template = ReportTemplate {
                kind: SourceKind::Dryad,
                url: href.clone(),
                default_title: "Dryad dream report",
                tags: vec!["dryad".to_string()],
                license: "as-provided".to_string(),
            };

            let texts: Vec<(Option<String>, String)> =
                match file_kind(&href).unwrap_or_else(|| sniff_kind(&body)) {
                    FileKind::Json => json_records(&body)
                        .into_iter()
                        .map(|r| (r.id, r.text))
                        .collect(),
                    FileKind::Delimited => column_texts(&body, DATASET_TEXT_COLUMNS)
                        .unwrap_or_default()
                        .into_iter()
                        .map(|t| (None, t))
                        .collect(),
                };

            for (id, text) in texts {
                if !longer_than(&text, MIN_CHARS) {
                    continue;
                }
                if !sink.push(template.build(ctx.today(), id, None, text)) {
                    break;
                }
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "dryad"
    }

    fn max_reports(&self) -> usize {
        self.max_reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_links() {
        assert!(DryadCollector::is_data_link("https://x/files/reports.CSV"));
        assert!(DryadCollector::is_data_link("https://x/downloads/file_stream/1"));
        assert!(DryadCollector::is_data_link("https://x/a.json?v=2"));
        assert!(!DryadCollector::is_data_link("https://x/about"));
    }
}
