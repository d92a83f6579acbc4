// src/analyze/contexts.rs
//! Most frequent long tokens of a bucket, used as "contexts" of a symbol.

use std::collections::HashMap;

use once_cell::sync::OnceCell;
use regex::Regex;

/// Contexts kept per symbol.
pub const CONTEXT_COUNT: usize = 3;

fn token_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"[a-zа-яёіїґéèçàùöüßñ\-]{5,}").unwrap())
}

/// Top `k` tokens of five or more letters by frequency (lowercased).
/// Equal counts keep the token seen first.
pub fn pick_contexts(text: &str, k: usize) -> Vec<String> {
    let body = text.to_lowercase();
    // token -> (count, first position)
    let mut freq: HashMap<&str, (usize, usize)> = HashMap::new();
    for (pos, m) in token_re().find_iter(&body).enumerate() {
        freq.entry(m.as_str()).or_insert((0, pos)).0 += 1;
    }
    let mut ranked: Vec<(&str, (usize, usize))> = freq.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
    ranked
        .into_iter()
        .take(k)
        .map(|(w, _)| w.to_string())
        .collect()
}

/// Contexts over the concatenated texts of a bucket.
pub fn bucket_contexts<'a>(texts: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let joined = texts.into_iter().collect::<Vec<_>>().join(" ");
    pick_contexts(&joined, CONTEXT_COUNT)
}
