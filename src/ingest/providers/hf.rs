// src/ingest/providers/hf.rs
//! Hugging Face datasets read through the public datasets-server API.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::CollectError;
use crate::ingest::http::FetchContext;
use crate::ingest::longer_than;
use crate::ingest::providers::ReportTemplate;
use crate::ingest::tabular::first_text_field;
use crate::ingest::types::{ReportSink, SourceCollector, SourceKind};

pub const HF_DATASETS_SERVER: &str = "https://datasets-server.huggingface.co";
const HF_WEB: &str = "https://huggingface.co/datasets";
const MIN_CHARS: usize = 120;
/// datasets-server caps `length` at 100.
const PAGE_SIZE: usize = 100;
const TEXT_FIELDS: &[&str] = &["text", "report", "content"];

#[derive(Debug, Deserialize)]
struct Splits {
    #[serde(default)]
    splits: Vec<SplitRef>,
}

#[derive(Debug, Deserialize)]
struct SplitRef {
    config: String,
    split: String,
}

#[derive(Debug, Deserialize)]
struct RowsPage {
    #[serde(default)]
    rows: Vec<RowItem>,
    num_rows_total: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RowItem {
    row: serde_json::Map<String, serde_json::Value>,
}

pub struct HfCollector {
    names: Vec<String>,
    max_rows: usize,
    api_base: String,
}

impl HfCollector {
    pub fn new(names: &[String], max_rows: usize) -> Self {
        Self {
            names: names
                .iter()
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .collect(),
            max_rows,
            api_base: HF_DATASETS_SERVER.to_string(),
        }
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, path: &str, params: &[(&str, String)]) -> Result<String, CollectError> {
        url::Url::parse_with_params(&format!("{}/{path}", self.api_base), params)
            .map(|u| u.to_string())
            .map_err(|e| CollectError::InvalidParameter(format!("datasets-server url: {e}")))
    }

    async fn collect_dataset(
        &self,
        ctx: &FetchContext,
        sink: &ReportSink,
        name: &str,
    ) -> Result<(), CollectError> {
        let splits: Splits = ctx
            .get_json(&self.endpoint("splits", &[("dataset", name.to_string())])?)
            .await?;
        let template = ReportTemplate {
            kind: SourceKind::HuggingFace,
            url: format!("{HF_WEB}/{name}"),
            default_title: "HF dataset row",
            tags: vec!["hf".to_string(), name.to_string()],
            license: "dataset-terms".to_string(),
        };

        let mut rows_read = 0usize;
        for s in splits.splits {
            let mut offset = 0usize;
            while rows_read < self.max_rows {
                let length = PAGE_SIZE.min(self.max_rows - rows_read);
                let url = self.endpoint(
                    "rows",
                    &[
                        ("dataset", name.to_string()),
                        ("config", s.config.clone()),
                        ("split", s.split.clone()),
                        ("offset", offset.to_string()),
                        ("length", length.to_string()),
                    ],
                )?;
                let page: RowsPage = ctx.get_json(&url).await?;
                if page.rows.is_empty() {
                    break;
                }
                offset += page.rows.len();
                rows_read += page.rows.len();

                for item in page.rows {
                    let Some(text) = first_text_field(&item.row, TEXT_FIELDS) else {
                        continue;
                    };
                    if !longer_than(&text, MIN_CHARS) {
                        continue;
                    }
                    if !sink.push(template.build(ctx.today(), None, None, text)) {
                        return Ok(());
                    }
                }
                if page.num_rows_total.is_some_and(|total| offset >= total) {
                    break;
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SourceCollector for HfCollector {
    async fn collect(&self, ctx: &FetchContext, sink: &ReportSink) -> Result<(), CollectError> {
        for name in &self.names {
            if sink.is_full() {
                break;
            }
            if let Err(e) = self.collect_dataset(ctx, sink, name).await {
                tracing::warn!(target: "ingest", provider = "hf", dataset = %name, error = %e, "dataset skipped");
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "hf"
    }

    fn max_reports(&self) -> usize {
        self.max_rows.saturating_mul(self.names.len().max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_encodes_dataset_names() {
        let c = HfCollector::new(&["user/dream reports".to_string()], 10);
        let url = c
            .endpoint("splits", &[("dataset", "user/dream reports".to_string())])
            .unwrap();
        assert_eq!(
            url,
            "https://datasets-server.huggingface.co/splits?dataset=user%2Fdream+reports"
        );
    }
}
