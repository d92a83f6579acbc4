// src/ingest/mod.rs
pub mod http;
pub mod page;
pub mod providers;
pub mod tabular;
pub mod types;

use std::time::{Duration, Instant};

use chrono::NaiveDate;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use tokio::task::JoinSet;

use crate::config::FetchSettings;
use crate::ingest::http::FetchContext;
use crate::ingest::types::{CollectOutcome, CollectStatus, RawReport, ReportSink, SourceCollector};

/// Cap used by providers that do not declare their own.
pub const DEFAULT_MAX_REPORTS: usize = 5_000;
/// Display titles are cut to this many characters.
pub const TITLE_MAX_CHARS: usize = 120;

/// One-time metrics registration (so series show up in the exposition).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "ingest_reports_total",
            "Reports accepted from a provider after normalization."
        );
        describe_counter!(
            "ingest_provider_errors_total",
            "Providers that failed or ran out of time."
        );
        describe_histogram!("ingest_provider_ms", "Provider wall time in milliseconds.");
        describe_counter!("dedup_removed_total", "Reports dropped as duplicates.");
        describe_counter!(
            "matcher_unmatched_total",
            "Reports below the symbol acceptance threshold."
        );
        describe_counter!("synth_outcomes_total", "Synthesized entries by path.");
        describe_gauge!("pipeline_last_run_ts", "Unix ts of the last pipeline run.");
    });
}

/// Strip markup and collapse whitespace: used for feed summaries and API fields.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags (a space keeps adjacent words apart)
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out.trim().to_string()
}

/// Render an HTML page (or fragment) to readable plain text, keeping paragraphs.
pub fn html_to_text(html: &str) -> String {
    let rendered = html2text::from_read(html.as_bytes(), 10_000).unwrap_or_default();
    static RE_BLANKS: OnceCell<regex::Regex> = OnceCell::new();
    let re = RE_BLANKS.get_or_init(|| regex::Regex::new(r"\n{3,}").unwrap());
    re.replace_all(&rendered, "\n\n").trim().to_string()
}

/// Collapse whitespace and cut to `max` characters, marking the cut with `…`.
pub fn shorten(s: &str, max: usize) -> String {
    let flat = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        return flat;
    }
    let mut out: String = flat.chars().take(max).collect();
    out.push('…');
    out
}

/// Inclusive minimum-length filter, counted in characters (crawled pages, feeds, threads).
pub fn long_enough(text: &str, min_chars: usize) -> bool {
    text.chars().count() >= min_chars
}

/// Strict variant for dataset rows and owner pages: text must exceed `min_chars`.
pub fn longer_than(text: &str, min_chars: usize) -> bool {
    text.chars().count() > min_chars
}

/// Run every collector as its own task and wait for all of them.
///
/// Each task gets a fresh `FetchContext` and `ReportSink`; a task that exceeds the
/// provider budget is cancelled and keeps the reports it already produced.
/// Outcomes come back in the order the collectors were given.
pub async fn collect_all(
    collectors: Vec<Box<dyn SourceCollector>>,
    settings: &FetchSettings,
    today: NaiveDate,
) -> Vec<CollectOutcome> {
    ensure_metrics_described();
    let budget = Duration::from_secs(settings.provider_budget_secs);

    let mut set = JoinSet::new();
    for (idx, collector) in collectors.into_iter().enumerate() {
        let ctx = FetchContext::new(settings, today);
        set.spawn(async move {
            let provider = collector.name();
            let t0 = Instant::now();
            let (sink, mut rx) = ReportSink::new(collector.max_reports());
            tracing::info!(target: "ingest", provider, "collecting");

            let status = match ctx {
                Err(e) => CollectStatus::Failed(e),
                Ok(ctx) => {
                    match tokio::time::timeout(budget, collector.collect(&ctx, &sink)).await {
                        Ok(Ok(())) => CollectStatus::Completed,
                        Ok(Err(e)) => CollectStatus::Failed(e),
                        Err(_) => CollectStatus::TimedOut,
                    }
                }
            };
            drop(sink);

            let mut reports = Vec::new();
            while let Ok(r) = rx.try_recv() {
                reports.push(r);
            }
            histogram!("ingest_provider_ms", "provider" => provider)
                .record(t0.elapsed().as_secs_f64() * 1_000.0);
            (
                idx,
                CollectOutcome {
                    provider,
                    reports,
                    status,
                },
            )
        });
    }

    let mut finished = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(pair) => finished.push(pair),
            Err(e) => tracing::error!(target: "ingest", error = ?e, "provider task panicked"),
        }
    }
    finished.sort_by_key(|(idx, _)| *idx);

    let outcomes: Vec<CollectOutcome> = finished.into_iter().map(|(_, o)| o).collect();
    for o in &outcomes {
        counter!("ingest_reports_total", "provider" => o.provider)
            .increment(o.reports.len() as u64);
        match o.failure_reason() {
            None => tracing::info!(
                target: "ingest",
                provider = o.provider,
                reports = o.reports.len(),
                "provider done"
            ),
            Some(reason) => {
                counter!("ingest_provider_errors_total", "provider" => o.provider).increment(1);
                tracing::warn!(
                    target: "ingest",
                    provider = o.provider,
                    reports = o.reports.len(),
                    %reason,
                    "provider ended early; keeping partial results"
                );
            }
        }
    }
    outcomes
}

/// Concatenate all outcomes in collector order.
pub fn merge(outcomes: Vec<CollectOutcome>) -> Vec<RawReport> {
    outcomes.into_iter().flat_map(|o| o.reports).collect()
}
