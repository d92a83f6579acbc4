// src/ingest/providers/figshare.rs
//! Donders dream datasets published as Figshare articles.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::CollectError;
use crate::ingest::http::FetchContext;
use crate::ingest::longer_than;
use crate::ingest::providers::ReportTemplate;
use crate::ingest::tabular::{column_texts, file_kind, json_records, FileKind, FIGSHARE_TEXT_COLUMNS};
use crate::ingest::types::{ReportSink, SourceCollector, SourceKind};

pub const FIGSHARE_API: &str = "https://api.figshare.com/v2";
const ROW_MIN_CHARS: usize = 120;
const PLAIN_MIN_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
struct Article {
    #[serde(default)]
    files: Vec<ArticleFile>,
}

#[derive(Debug, Deserialize)]
struct ArticleFile {
    name: Option<String>,
    download_url: Option<String>,
}

pub struct FigshareCollector {
    api_base: String,
    fig_id: String,
    max_reports: usize,
}

impl FigshareCollector {
    pub fn new(fig_id: &str, max_reports: usize) -> Self {
        Self {
            api_base: FIGSHARE_API.to_string(),
            fig_id: fig_id.trim().to_string(),
            max_reports,
        }
    }

    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }
}

/// Row texts of a file, or the whole file as one text when no report column exists.
fn file_texts(kind: FileKind, body: &str) -> Vec<String> {
    if kind == FileKind::Json {
        let recs = json_records(body);
        if !recs.is_empty() {
            return recs
                .into_iter()
                .map(|r| r.text)
                .filter(|t| longer_than(t, ROW_MIN_CHARS))
                .collect();
        }
    }
    match column_texts(body, FIGSHARE_TEXT_COLUMNS) {
        Some(cells) => cells
            .into_iter()
            .filter(|t| longer_than(t, ROW_MIN_CHARS))
            .collect(),
        None => {
            let whole = body.trim();
            if longer_than(whole, PLAIN_MIN_CHARS) {
                vec![whole.to_string()]
            } else {
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl SourceCollector for FigshareCollector {
    async fn collect(&self, ctx: &FetchContext, sink: &ReportSink) -> Result<(), CollectError> {
        let article_url = format!("{}/articles/{}", self.api_base, self.fig_id);
        let article: Article = ctx.get_json(&article_url).await?;

        for file in article.files {
            if sink.is_full() {
                break;
            }
            let name = file.name.unwrap_or_default();
            let Some(kind) = file_kind(&name) else { continue };
            let Some(link) = file.download_url else { continue };

            let body = match ctx.get_text(&link).await {
                Ok(b) => b,
                Err(e) => {
                    tracing::warn!(target: "ingest", provider = "donders", file = %name, error = %e, "file download failed");
                    continue;
                }
            };
            let template = ReportTemplate {
                kind: SourceKind::Donders,
                url: link.clone(),
                default_title: "Donders dream-related",
                tags: vec!["donders".to_string()],
                license: "as-provided".to_string(),
            };
            for text in file_texts(kind, &body) {
                if !sink.push(template.build(ctx.today(), None, None, text)) {
                    break;
                }
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "donders"
    }

    fn max_reports(&self) -> usize {
        self.max_reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_file_becomes_one_report() {
        let body = "A long free-form transcript without any header row. ".repeat(5);
        let texts = file_texts(FileKind::Delimited, &body);
        assert_eq!(texts.len(), 1);

        assert!(file_texts(FileKind::Delimited, "too short").is_empty());
    }

    #[test]
    fn transcript_column_is_recognized() {
        let row = "x".repeat(130);
        let body = format!("subject\ttranscript\n1\t{row}\n2\tshort\n");
        assert_eq!(file_texts(FileKind::Delimited, &body), vec![row]);
    }
}
