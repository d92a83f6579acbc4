// src/ingest/types.rs
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::CollectError;
use crate::ingest::http::FetchContext;

/// Provider family a report came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[serde(rename = "dreambank")]
    DreamBank,
    Sddb,
    Dryad,
    Donders,
    Rss,
    #[serde(rename = "gsheet")]
    GoogleSheet,
    Reddit,
    #[serde(rename = "hf")]
    HuggingFace,
    Owner,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::DreamBank => "dreambank",
            SourceKind::Sddb => "sddb",
            SourceKind::Dryad => "dryad",
            SourceKind::Donders => "donders",
            SourceKind::Rss => "rss",
            SourceKind::GoogleSheet => "gsheet",
            SourceKind::Reddit => "reddit",
            SourceKind::HuggingFace => "hf",
            SourceKind::Owner => "owner",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ingested document, already normalized to plain text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawReport {
    pub source_kind: SourceKind,
    pub external_id: String,
    pub url: String,
    pub title: String,
    pub text: String,
    /// Day of collection, not of authorship.
    pub captured_at: NaiveDate,
    pub tags: Vec<String>,
    pub license: String,
}

/// Accumulator handed to a collector. Each provider task owns its own sink, so
/// nothing is shared between providers until the final merge.
///
/// Reports go through a channel rather than a returned `Vec` so that a collector
/// cancelled by its time budget still contributes what it already pushed.
pub struct ReportSink {
    tx: mpsc::UnboundedSender<RawReport>,
    max: usize,
    pushed: AtomicUsize,
}

impl ReportSink {
    pub fn new(max: usize) -> (Self, mpsc::UnboundedReceiver<RawReport>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx,
                max,
                pushed: AtomicUsize::new(0),
            },
            rx,
        )
    }

    /// Accept a report unless the provider's cap is reached.
    /// Returns `false` once the sink is full; collectors should stop then.
    pub fn push(&self, report: RawReport) -> bool {
        if self.is_full() {
            return false;
        }
        if self.tx.send(report).is_err() {
            return false;
        }
        self.pushed.fetch_add(1, Ordering::Relaxed);
        true
    }

    pub fn is_full(&self) -> bool {
        self.pushed.load(Ordering::Relaxed) >= self.max
    }

    pub fn len(&self) -> usize {
        self.pushed.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A provider that yields dream reports.
///
/// Implementations catch item-level problems themselves (log + skip) and return
/// `Err` only when the provider as a whole cannot continue. Either way the
/// reports already pushed to the sink are kept.
#[async_trait::async_trait]
pub trait SourceCollector: Send + Sync {
    async fn collect(&self, ctx: &FetchContext, sink: &ReportSink) -> Result<(), CollectError>;

    /// Short provider name for logs and metrics, e.g. `"rss"`.
    fn name(&self) -> &'static str;

    /// Upper bound on reports this provider may yield.
    fn max_reports(&self) -> usize {
        crate::ingest::DEFAULT_MAX_REPORTS
    }
}

/// How a provider task ended.
#[derive(Debug)]
pub enum CollectStatus {
    Completed,
    Failed(CollectError),
    TimedOut,
}

/// Result of one provider task: whatever it gathered plus how it ended.
#[derive(Debug)]
pub struct CollectOutcome {
    pub provider: &'static str,
    pub reports: Vec<RawReport>,
    pub status: CollectStatus,
}

impl CollectOutcome {
    pub fn is_failure(&self) -> bool {
        !matches!(self.status, CollectStatus::Completed)
    }

    pub fn failure_reason(&self) -> Option<String> {
        match &self.status {
            CollectStatus::Completed => None,
            CollectStatus::Failed(e) => Some(e.to_string()),
            CollectStatus::TimedOut => Some("time budget exhausted".to_string()),
        }
    }
}
