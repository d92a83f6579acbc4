// src/ingest/providers/mod.rs
//! One collector per provider kind, plus the closed `Provider` union the
//! orchestrator builds from configuration.

pub mod dreambank;
pub mod dryad;
pub mod figshare;
pub mod hf;
pub mod owner_site;
pub mod reddit;
pub mod rss;
pub mod sheets;
pub mod zenodo;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::config::{Secrets, SourcesConfig};
use crate::dedup::content_id;
use crate::error::CollectError;
use crate::ingest::http::FetchContext;
use crate::ingest::types::{RawReport, ReportSink, SourceCollector, SourceKind};
use crate::ingest::{shorten, TITLE_MAX_CHARS};

pub use dreambank::DreamBankCollector;
pub use dryad::DryadCollector;
pub use figshare::FigshareCollector;
pub use hf::HfCollector;
pub use owner_site::OwnerSiteCollector;
pub use reddit::RedditCollector;
pub use rss::FeedCollector;
pub use sheets::SheetCollector;
pub use zenodo::ZenodoCollector;

/// Fixed provenance fields shared by every report of one provider instance.
#[derive(Debug, Clone)]
pub(crate) struct ReportTemplate {
    pub kind: SourceKind,
    pub url: String,
    pub default_title: &'static str,
    pub tags: Vec<String>,
    pub license: String,
}

impl ReportTemplate {
    /// Missing ids fall back to a digest of the text.
    pub fn build(
        &self,
        today: NaiveDate,
        id: Option<String>,
        title: Option<&str>,
        text: String,
    ) -> RawReport {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(self.default_title);
        RawReport {
            source_kind: self.kind,
            external_id: id.unwrap_or_else(|| content_id(&text)),
            url: self.url.clone(),
            title: shorten(title, TITLE_MAX_CHARS),
            text,
            captured_at: today,
            tags: self.tags.clone(),
            license: self.license.clone(),
        }
    }

    pub fn with_url(&self, url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..self.clone()
        }
    }
}

/// Every provider kind the configuration can enable.
pub enum Provider {
    DreamBank(DreamBankCollector),
    Zenodo(ZenodoCollector),
    Dryad(DryadCollector),
    Figshare(FigshareCollector),
    Feed(FeedCollector),
    Sheet(SheetCollector),
    Reddit(RedditCollector),
    HuggingFace(HfCollector),
    OwnerSite(OwnerSiteCollector),
}

impl Provider {
    /// Instantiate the enabled providers in a fixed order.
    pub fn from_config(cfg: &SourcesConfig, secrets: &Secrets) -> Vec<Provider> {
        let mut out = Vec::new();
        if cfg.dreambank.enabled {
            out.push(Provider::DreamBank(DreamBankCollector::new(cfg.dreambank.limit)));
        }
        if cfg.sddb_zenodo.enabled {
            out.push(Provider::Zenodo(ZenodoCollector::new(
                &cfg.sddb_zenodo.record_id,
                cfg.sddb_zenodo.max_reports,
            )));
        }
        for d in &cfg.dryad {
            out.push(Provider::Dryad(DryadCollector::new(&d.doi, d.max_reports)));
        }
        for d in &cfg.donders {
            out.push(Provider::Figshare(FigshareCollector::new(
                &d.fig_id,
                d.max_reports,
            )));
        }
        for f in &cfg.rss {
            out.push(Provider::Feed(FeedCollector::new(&f.url, &f.license)));
        }
        for s in &cfg.google_sheets {
            out.push(Provider::Sheet(SheetCollector::new(&s.csv_url, &s.license)));
        }
        if cfg.reddit.enabled {
            out.push(Provider::Reddit(RedditCollector::new(
                &cfg.reddit,
                secrets.reddit.clone(),
            )));
        }
        if cfg.hf_datasets.enabled {
            out.push(Provider::HuggingFace(HfCollector::new(
                &cfg.hf_datasets.names,
                cfg.hf_datasets.max_rows,
            )));
        }
        if cfg.magickum_owner.enabled {
            out.push(Provider::OwnerSite(OwnerSiteCollector::new(
                &cfg.magickum_owner,
                secrets.owner_approved,
            )));
        }
        out
    }

    fn inner(&self) -> &dyn SourceCollector {
        match self {
            Provider::DreamBank(c) => c,
            Provider::Zenodo(c) => c,
            Provider::Dryad(c) => c,
            Provider::Figshare(c) => c,
            Provider::Feed(c) => c,
            Provider::Sheet(c) => c,
            Provider::Reddit(c) => c,
            Provider::HuggingFace(c) => c,
            Provider::OwnerSite(c) => c,
        }
    }
}

#[async_trait]
impl SourceCollector for Provider {
    async fn collect(&self, ctx: &FetchContext, sink: &ReportSink) -> Result<(), CollectError> {
        self.inner().collect(ctx, sink).await
    }

    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn max_reports(&self) -> usize {
        self.inner().max_reports()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::sources::{DryadParams, FeedParams};

    #[test]
    fn only_enabled_providers_are_built_in_fixed_order() {
        let mut cfg = SourcesConfig::default();
        cfg.rss.push(FeedParams {
            url: "https://feeds.example/dreams.xml".into(),
            license: "cc-by".into(),
        });
        cfg.dryad.push(DryadParams {
            doi: "10.5061/dryad.x".into(),
            max_reports: 10,
        });
        cfg.dreambank.enabled = true;

        let providers = Provider::from_config(&cfg, &Secrets::default());
        let names: Vec<_> = providers.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["dreambank", "dryad", "rss"]);
        assert_eq!(providers[1].max_reports(), 10);
    }

    #[test]
    fn template_fills_defaults_and_truncates_title() {
        let t = ReportTemplate {
            kind: SourceKind::Sddb,
            url: "https://sleepanddreamdatabase.org/".into(),
            default_title: "SDDb report",
            tags: vec!["sddb".into()],
            license: "as-provided".into(),
        };
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let r = t.build(day, None, Some("  "), "some text".into());
        assert_eq!(r.title, "SDDb report");
        assert_eq!(r.external_id, content_id("some text"));

        let long = "t".repeat(130);
        let r = t.build(day, Some("42".into()), Some(&long), "x".into());
        assert_eq!(r.title.chars().count(), 121);
        assert_eq!(r.external_id, "42");
    }
}
