// src/ingest/providers/zenodo.rs
//! Sleep and Dream Database exports archived on Zenodo.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::CollectError;
use crate::ingest::http::FetchContext;
use crate::ingest::longer_than;
use crate::ingest::providers::ReportTemplate;
use crate::ingest::tabular::{column_texts, file_kind, json_records, FileKind, DATASET_TEXT_COLUMNS};
use crate::ingest::types::{ReportSink, SourceCollector, SourceKind};

pub const ZENODO_API: &str = "https://zenodo.org/api";
const SDDB_URL: &str = "https://sleepanddreamdatabase.org/";
const MIN_CHARS: usize = 120;

#[derive(Debug, Deserialize)]
struct Record {
    #[serde(default)]
    files: Vec<RecordFile>,
}

#[derive(Debug, Deserialize)]
struct RecordFile {
    key: Option<String>,
    links: Option<FileLinks>,
}

#[derive(Debug, Deserialize)]
struct FileLinks {
    #[serde(rename = "self")]
    download: Option<String>,
}

pub struct ZenodoCollector {
    api_base: String,
    record_id: String,
    max_reports: usize,
}

impl ZenodoCollector {
    pub fn new(record_id: &str, max_reports: usize) -> Self {
        Self {
            api_base: ZENODO_API.to_string(),
            record_id: record_id.trim().to_string(),
            max_reports,
        }
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    fn template() -> ReportTemplate {
        ReportTemplate {
            kind: SourceKind::Sddb,
            url: SDDB_URL.to_string(),
            default_title: "SDDb report",
            tags: vec!["sddb".to_string()],
            license: "as-provided".to_string(),
        }
    }
}

#[async_trait]
impl SourceCollector for ZenodoCollector {
    async fn collect(&self, ctx: &FetchContext, sink: &ReportSink) -> Result<(), CollectError> {
        let record_url = format!("{}/records/{}", self.api_base, self.record_id);
        let record: Record = ctx.get_json(&record_url).await?;
        let template = Self::template();

        for file in record.files {
            if sink.is_full() {
                break;
            }
            let name = file.key.unwrap_or_default();
            let Some(kind) = file_kind(&name) else { continue };
            let Some(download) = file.links.and_then(|l| l.download) else {
                continue;
            };

            let body = match ctx.get_text(&download).await {
                Ok(b) => b,
                Err(e) => {
                    tracing::warn!(target: "ingest", provider = "sddb", file = %name, error = %e, "file download failed");
                    continue;
                }
            };

            match kind {
                FileKind::Json => {
                    for rec in json_records(&body) {
                        if !longer_than(&rec.text, MIN_CHARS) {
                            continue;
                        }
                        let report =
                            template.build(ctx.today(), rec.id, rec.title.as_deref(), rec.text);
                        if !sink.push(report) {
                            break;
                        }
                    }
                }
                FileKind::Delimited => {
                    let Some(cells) = column_texts(&body, DATASET_TEXT_COLUMNS) else {
                        tracing::debug!(target: "ingest", provider = "sddb", file = %name, "no text column");
                        continue;
                    };
                    for text in cells.into_iter().filter(|t| longer_than(t, MIN_CHARS)) {
                        if !sink.push(template.build(ctx.today(), None, None, text)) {
                            break;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "sddb"
    }

    fn max_reports(&self) -> usize {
        self.max_reports
    }
}
