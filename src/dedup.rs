// src/dedup.rs
//! Content-keyed deduplication of the merged raw corpus.
//!
//! Keys are provider-aware: the same text from two providers yields two keys.
//! The default key is a SHA-256 over the full normalized text; `Prefix` keeps
//! the older scheme that hashes only the first `prefix_chars` characters.

use std::collections::HashSet;

use metrics::counter;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::ingest::types::{RawReport, SourceKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupMode {
    #[default]
    Digest,
    Prefix,
}

/// Short stable identifier for a piece of text (first 16 hex chars of SHA-256).
pub fn content_id(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    hex16(&digest)
}

fn hex16(bytes: &[u8]) -> String {
    bytes.iter().take(8).map(|b| format!("{b:02x}")).collect()
}

/// Key under which a report is deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DedupKey(String);

impl DedupKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Deduplicator {
    mode: DedupMode,
    prefix_chars: usize,
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new(DedupMode::Digest, 160)
    }
}

impl Deduplicator {
    pub fn new(mode: DedupMode, prefix_chars: usize) -> Self {
        Self { mode, prefix_chars }
    }

    pub fn key(&self, report: &RawReport) -> DedupKey {
        self.key_for(report.source_kind, &report.text)
    }

    pub fn key_for(&self, kind: SourceKind, text: &str) -> DedupKey {
        let mut h = Sha256::new();
        h.update(kind.as_str().as_bytes());
        h.update([0u8]);
        match self.mode {
            DedupMode::Digest => h.update(text.as_bytes()),
            DedupMode::Prefix => {
                let prefix: String = text.chars().take(self.prefix_chars).collect();
                h.update(prefix.as_bytes());
            }
        }
        let digest = h.finalize();
        DedupKey(digest.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Keep the first report seen for each key, in input order.
    /// Returns the survivors and how many were dropped.
    pub fn dedup(&self, reports: Vec<RawReport>) -> (Vec<RawReport>, usize) {
        let total = reports.len();
        let mut seen: HashSet<DedupKey> = HashSet::with_capacity(total);
        let kept: Vec<RawReport> = reports
            .into_iter()
            .filter(|r| seen.insert(self.key(r)))
            .collect();
        let removed = total - kept.len();

        counter!("dedup_removed_total").increment(removed as u64);
        tracing::info!(target: "curate", total, kept = kept.len(), removed, "dedup done");
        (kept, removed)
    }
}
