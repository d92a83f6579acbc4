// src/ingest/providers/sheets.rs
//! Spreadsheet CSV exports curated by the site owner.
//! Expected columns: `text` or `report`, optionally `symbol`.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::dedup::content_id;
use crate::error::CollectError;
use crate::ingest::http::FetchContext;
use crate::ingest::providers::ReportTemplate;
use crate::ingest::types::{RawReport, ReportSink, SourceCollector, SourceKind};
use crate::ingest::long_enough;

const MIN_CHARS: usize = 60;

pub struct SheetCollector {
    csv_url: String,
    license: String,
}

impl SheetCollector {
    pub fn new(csv_url: &str, license: &str) -> Self {
        Self {
            csv_url: csv_url.trim().to_string(),
            license: license.to_string(),
        }
    }

    pub fn reports_from_csv(&self, body: &str, today: NaiveDate) -> Result<Vec<RawReport>, CollectError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(body.as_bytes());
        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| CollectError::parse(&self.csv_url, e))?
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_lowercase())
            .collect();
        let col = |name: &str| headers.iter().position(|h| h == name);
        let (text_col, report_col, symbol_col) = (col("text"), col("report"), col("symbol"));

        let template = ReportTemplate {
            kind: SourceKind::GoogleSheet,
            url: self.csv_url.clone(),
            default_title: "Sheet row",
            tags: vec!["gsheet".to_string()],
            license: self.license.clone(),
        };

        let mut out = Vec::new();
        for record in reader.records() {
            let Ok(record) = record else { continue };
            let cell = |idx: Option<usize>| {
                idx.and_then(|i| record.get(i))
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
            };
            let text = cell(text_col).or_else(|| cell(report_col)).unwrap_or_default();
            if !long_enough(text, MIN_CHARS) {
                continue;
            }
            let symbol = cell(symbol_col).unwrap_or_default();

            let mut report = template.build(
                today,
                Some(content_id(&format!("{symbol}{text}"))),
                None,
                text.to_string(),
            );
            if !symbol.is_empty() {
                report.tags.push(format!("symbol:{symbol}"));
            }
            out.push(report);
        }
        Ok(out)
    }
}

#[async_trait]
impl SourceCollector for SheetCollector {
    async fn collect(&self, ctx: &FetchContext, sink: &ReportSink) -> Result<(), CollectError> {
        let body = ctx.get_text(&self.csv_url).await?;
        for report in self.reports_from_csv(&body, ctx.today())? {
            if !sink.push(report) {
                break;
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "gsheet"
    }
}
