// src/analyze/mod.rs
//! Curation: symbol matching, bucketing and per-symbol synthesis.
//!
//! Order:
//! 1) Assign each deduplicated report at most one symbol (`symbols`)
//! 2) Group by symbol, keeping processing order inside a bucket
//! 3) Synthesize one `CuratedEntry` per non-empty bucket (`synthesis`)

pub mod ai_adapter;
pub mod contexts;
pub mod symbols;
pub mod synthesis;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::analyze::contexts::bucket_contexts;
use crate::ingest::types::RawReport;

pub use crate::analyze::ai_adapter::{DynParaphraser, MockParaphraser, Paraphraser};
pub use crate::analyze::symbols::{partial_ratio, Buckets, SymbolMatcher};
pub use crate::analyze::synthesis::{SynthPath, Synthesis, Synthesizer};

/// Provenance entries kept per symbol.
pub const MAX_SOURCES: usize = 6;
pub const TONE: &str = "neutral";
pub const NOTES: &str =
    "Синтез на основе современных корпусов (оценочно). Классические сонники не использовались.";

/// Where a contributing report came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub url: String,
    pub title: String,
    #[serde(rename = "date")]
    pub captured_at: NaiveDate,
    pub license: String,
}

impl From<&RawReport> for Provenance {
    fn from(r: &RawReport) -> Self {
        Self {
            url: r.url.clone(),
            title: r.title.clone(),
            captured_at: r.captured_at,
            license: r.license.clone(),
        }
    }
}

/// One output unit, keyed by symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuratedEntry {
    pub symbol: String,
    pub contexts: Vec<String>,
    pub modern_interpretation: String,
    pub tone: String,
    /// Reserved; always empty.
    pub lunar_links: Vec<String>,
    pub sources: Vec<Provenance>,
    pub confidence: f64,
    pub updated_at: DateTime<Utc>,
    pub notes: String,
}

/// Round to two decimals.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Build the entry for one bucket.
pub async fn curate_bucket(
    symbol: &str,
    reports: &[RawReport],
    synth: &Synthesizer,
    now: DateTime<Utc>,
) -> CuratedEntry {
    let synthesis = synth.synthesize(symbol, reports).await;
    CuratedEntry {
        symbol: symbol.to_string(),
        contexts: bucket_contexts(reports.iter().map(|r| r.text.as_str())),
        modern_interpretation: synthesis.text.clone(),
        tone: TONE.to_string(),
        lunar_links: Vec::new(),
        sources: reports.iter().take(MAX_SOURCES).map(Provenance::from).collect(),
        confidence: round2(synthesis.confidence()),
        updated_at: now,
        notes: NOTES.to_string(),
    }
}

/// Synthesize one entry per bucket, in symbol order.
pub async fn curate_buckets(
    buckets: &Buckets,
    synth: &Synthesizer,
    now: DateTime<Utc>,
) -> Vec<CuratedEntry> {
    let mut out = Vec::with_capacity(buckets.len());
    for (symbol, bucket) in buckets {
        let entry = curate_bucket(symbol, bucket, synth, now).await;
        tracing::debug!(
            target: "curate",
            symbol = %entry.symbol,
            reports = bucket.len(),
            confidence = entry.confidence,
            "entry synthesized"
        );
        out.push(entry);
    }
    out
}

/// Match, bucket and synthesize.
pub async fn curate(
    reports: Vec<RawReport>,
    matcher: &SymbolMatcher,
    synth: &Synthesizer,
    now: DateTime<Utc>,
) -> Vec<CuratedEntry> {
    let buckets = matcher.bucket(reports);
    curate_buckets(&buckets, synth, now).await
}
