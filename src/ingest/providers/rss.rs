// src/ingest/providers/rss.rs
//! RSS 2.0 / Atom feeds of dream posts.

use async_trait::async_trait;
use chrono::NaiveDate;
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::error::CollectError;
use crate::ingest::http::FetchContext;
use crate::ingest::providers::ReportTemplate;
use crate::ingest::types::{RawReport, ReportSink, SourceCollector, SourceKind};
use crate::ingest::{long_enough, normalize_text};

/// Entries read per feed.
pub const FEED_WINDOW: usize = 200;
const MIN_CHARS: usize = 160;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    guid: Option<Text>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Atom {
    #[serde(rename = "entry", default)]
    entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    id: Option<String>,
    title: Option<Text>,
    #[serde(default)]
    link: Vec<AtomLink>,
    summary: Option<Text>,
    content: Option<Text>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

/// Element whose attributes we ignore and whose text we keep.
#[derive(Debug, Deserialize)]
struct Text {
    #[serde(rename = "$text", default)]
    value: String,
}

/// A feed entry before filtering, format-independent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub id: Option<String>,
    pub link: Option<String>,
    pub title: Option<String>,
    pub body: String,
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse RSS first, then Atom.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>, CollectError> {
    let xml_clean = scrub_html_entities_for_xml(xml);

    let rss_err = match from_str::<Rss>(&xml_clean) {
        Ok(rss) => {
            return Ok(rss
                .channel
                .item
                .into_iter()
                .map(|it| FeedEntry {
                    id: non_empty(it.guid.map(|g| g.value)),
                    link: non_empty(it.link),
                    title: non_empty(it.title),
                    body: it.description.unwrap_or_default(),
                })
                .collect())
        }
        Err(e) => e,
    };

    if !xml_clean.contains("<feed") {
        return Err(CollectError::parse(
            "feed xml",
            format!("not rss ({rss_err}) and no atom <feed> root"),
        ));
    }
    match from_str::<Atom>(&xml_clean) {
        Ok(atom) => Ok(atom
            .entry
            .into_iter()
            .map(|e| {
                let link = e
                    .link
                    .iter()
                    .find(|l| l.rel.as_deref().map_or(true, |r| r == "alternate"))
                    .or_else(|| e.link.first())
                    .and_then(|l| l.href.clone());
                let body = e
                    .summary
                    .map(|t| t.value)
                    .filter(|v| !v.trim().is_empty())
                    .or_else(|| e.content.map(|t| t.value))
                    .unwrap_or_default();
                FeedEntry {
                    id: non_empty(e.id),
                    link: non_empty(link),
                    title: non_empty(e.title.map(|t| t.value)),
                    body,
                }
            })
            .collect()),
        Err(atom_err) => Err(CollectError::parse(
            "feed xml",
            format!("not rss ({rss_err}) nor atom ({atom_err})"),
        )),
    }
}

pub struct FeedCollector {
    url: String,
    license: String,
}

impl FeedCollector {
    pub fn new(url: &str, license: &str) -> Self {
        Self {
            url: url.trim().to_string(),
            license: license.to_string(),
        }
    }

    /// Filter and convert parsed entries; the feed window and length floor apply here.
    pub fn reports_from_entries(&self, entries: Vec<FeedEntry>, today: NaiveDate) -> Vec<RawReport> {
        let template = ReportTemplate {
            kind: SourceKind::Rss,
            url: self.url.clone(),
            default_title: "RSS post",
            tags: vec!["rss".to_string()],
            license: self.license.clone(),
        };
        entries
            .into_iter()
            .take(FEED_WINDOW)
            .filter_map(|e| {
                let text = normalize_text(&e.body);
                if !long_enough(&text, MIN_CHARS) {
                    return None;
                }
                let link = e.link.clone().unwrap_or_else(|| self.url.clone());
                let id = e.id.or(e.link);
                Some(template.with_url(&link).build(today, id, e.title.as_deref(), text))
            })
            .collect()
    }
}

#[async_trait]
impl SourceCollector for FeedCollector {
    async fn collect(&self, ctx: &FetchContext, sink: &ReportSink) -> Result<(), CollectError> {
        let body = ctx.get_text(&self.url).await?;
        let entries = parse_feed(&body)?;
        for report in self.reports_from_entries(entries, ctx.today()) {
            if !sink.push(report) {
                break;
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "rss"
    }

    fn max_reports(&self) -> usize {
        FEED_WINDOW
    }
}

/// Feeds often carry HTML entities that are undefined in XML.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&laquo;", "«")
        .replace("&raquo;", "»")
        .replace("&hellip;", "…")
}
