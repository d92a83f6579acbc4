// src/ingest/page.rs
//! Helpers for crawled HTML pages: link discovery, titles, main content, domains.

use std::collections::HashSet;

use once_cell::sync::OnceCell;
use regex::Regex;

/// All `href` targets of a page, resolved against `base_url`, fragments dropped,
/// deduplicated in first-seen order.
pub fn extract_links(html: &str, base_url: &str) -> Vec<String> {
    static HREF: OnceCell<Regex> = OnceCell::new();
    let href_re =
        HREF.get_or_init(|| Regex::new(r#"(?i)href\s*=\s*["']([^"']+)["']"#).unwrap());
    let base = url::Url::parse(base_url).ok();

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for cap in href_re.captures_iter(html) {
        let raw = html_escape::decode_html_entities(cap[1].trim()).to_string();
        if raw.is_empty() || raw.starts_with('#') {
            continue;
        }
        let lower = raw.to_ascii_lowercase();
        if lower.starts_with("mailto:") || lower.starts_with("javascript:") {
            continue;
        }

        let resolved = match &base {
            Some(b) => match b.join(&raw) {
                Ok(u) => u,
                Err(_) => continue,
            },
            None => match url::Url::parse(&raw) {
                Ok(u) => u,
                Err(_) => continue,
            },
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }
        let mut resolved = resolved;
        resolved.set_fragment(None);
        let s = resolved.to_string();
        if seen.insert(s.clone()) {
            links.push(s);
        }
    }
    links
}

fn inner_text_of(html: &str, tag: &str) -> Option<String> {
    let re = Regex::new(&format!(r"(?is)<{tag}\b[^>]*>(.*?)</{tag}>")).ok()?;
    let cap = re.captures(html)?;
    let text = crate::ingest::normalize_text(&cap[1]);
    (!text.is_empty()).then_some(text)
}

/// `<title>` first, then `<h1>`.
pub fn title_then_h1(html: &str) -> Option<String> {
    inner_text_of(html, "title").or_else(|| inner_text_of(html, "h1"))
}

/// `<h1>` first, then `<title>`.
pub fn h1_then_title(html: &str) -> Option<String> {
    inner_text_of(html, "h1").or_else(|| inner_text_of(html, "title"))
}

/// Inner HTML of `<body>`, or the whole document.
pub fn body_html(html: &str) -> &str {
    static BODY: OnceCell<Regex> = OnceCell::new();
    let re = BODY.get_or_init(|| Regex::new(r"(?is)<body\b[^>]*>(.*)</body>").unwrap());
    match re.captures(html).and_then(|c| c.get(1)) {
        Some(m) => m.as_str(),
        None => html,
    }
}

/// Article-like container: `<article>`, `<main>`, or a `div` whose class mentions
/// entry/post/content/article. Falls back to the whole document.
pub fn main_content_html(html: &str) -> &str {
    static ARTICLE: OnceCell<Regex> = OnceCell::new();
    static MAIN: OnceCell<Regex> = OnceCell::new();
    static DIV: OnceCell<Regex> = OnceCell::new();
    let article =
        ARTICLE.get_or_init(|| Regex::new(r"(?is)<article\b[^>]*>(.*?)</article>").unwrap());
    let main = MAIN.get_or_init(|| Regex::new(r"(?is)<main\b[^>]*>(.*?)</main>").unwrap());
    // Greedy to the last </div>: nested divs inside the container stay intact.
    let div = DIV.get_or_init(|| {
        Regex::new(r#"(?is)<div\b[^>]*class\s*=\s*["'][^"']*(entry|post|content|article)[^"']*["'][^>]*>(.*)</div>"#)
            .unwrap()
    });

    if let Some(m) = article.captures(html).and_then(|c| c.get(1)) {
        return m.as_str();
    }
    if let Some(m) = main.captures(html).and_then(|c| c.get(1)) {
        return m.as_str();
    }
    if let Some(m) = div.captures(html).and_then(|c| c.get(2)) {
        return m.as_str();
    }
    html
}

/// Multi-label public suffixes we expect to meet; everything else is treated
/// as a single-label suffix.
const TWO_LABEL_SUFFIXES: &[&str] = &[
    "co.uk", "org.uk", "ac.uk", "gov.uk", "com.au", "net.au", "org.au", "co.nz", "com.br",
    "com.ua", "kiev.ua", "org.ua", "net.ua", "msk.ru", "spb.ru", "com.ru", "co.jp", "co.in",
    "com.tr", "com.pl", "co.za",
];

/// Registrable domain (public suffix + one label) of a host or URL.
/// IP addresses and single-label hosts are returned as they are.
pub fn registrable_domain(host_or_url: &str) -> Option<String> {
    let host = match url::Url::parse(host_or_url) {
        Ok(u) if u.host_str().is_some() => u.host_str()?.to_string(),
        _ => host_or_url
            .split('/')
            .next()
            .unwrap_or_default()
            .split(':')
            .next()
            .unwrap_or_default()
            .to_string(),
    };
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    if host.is_empty() {
        return None;
    }
    if host.parse::<std::net::IpAddr>().is_ok() || host.starts_with('[') {
        return Some(host);
    }

    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() < 2 {
        return Some(host);
    }
    let last_two = labels[labels.len() - 2..].join(".");
    let take = if TWO_LABEL_SUFFIXES.contains(&last_two.as_str()) {
        3
    } else {
        2
    };
    if labels.len() < take {
        return Some(host);
    }
    Some(labels[labels.len() - take..].join("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_resolve_relative_and_skip_fragments() {
        let html = r##"<a href="/a">A</a> <a href='b.html#x'>B</a> <a href="#top">T</a>
            <a href="mailto:x@y.z">M</a> <a href="https://other.org/c">C</a> <a href="/a">dup</a>"##;
        let links = extract_links(html, "https://site.example/dir/index.html");
        assert_eq!(
            links,
            vec![
                "https://site.example/a",
                "https://site.example/dir/b.html",
                "https://other.org/c",
            ]
        );
    }

    #[test]
    fn titles() {
        let html = "<html><head><title> Page &amp; Co </title></head><body><h1>Head</h1></body>";
        assert_eq!(title_then_h1(html).as_deref(), Some("Page & Co"));
        assert_eq!(h1_then_title(html).as_deref(), Some("Head"));
        assert_eq!(title_then_h1("<p>none</p>"), None);
    }

    #[test]
    fn main_content_prefers_article() {
        let html = "<body><nav>menu</nav><article><p>story</p></article><main>m</main></body>";
        assert_eq!(main_content_html(html), "<p>story</p>");
        let html = r#"<body><div class="post-body"><p>x</p><div>y</div></div></body>"#;
        assert_eq!(main_content_html(html), "<p>x</p><div>y</div>");
    }

    #[test]
    fn registrable_domains() {
        assert_eq!(
            registrable_domain("https://www.magickum.com/magikum-sonnik/x").as_deref(),
            Some("magickum.com")
        );
        assert_eq!(
            registrable_domain("blog.example.co.uk").as_deref(),
            Some("example.co.uk")
        );
        assert_eq!(
            registrable_domain("http://127.0.0.1:8080/x").as_deref(),
            Some("127.0.0.1")
        );
        assert_eq!(registrable_domain("localhost").as_deref(), Some("localhost"));
    }
}
