// src/ingest/tabular.rs
//! Record extraction from dataset files: JSON / JSON Lines and delimited text.

use serde_json::Value;

/// Header names that hold the report body in repository datasets.
pub const DATASET_TEXT_COLUMNS: &[&str] = &["text", "report", "content", "dream"];
/// Figshare uploads also use `transcript`.
pub const FIGSHARE_TEXT_COLUMNS: &[&str] = &["report", "dream", "text", "transcript", "content"];

/// One record pulled out of a dataset file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetRecord {
    pub id: Option<String>,
    pub title: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Json,
    Delimited,
}

/// Classify a file by name; `None` for formats we do not read.
pub fn file_kind(name: &str) -> Option<FileKind> {
    let lower = name.to_ascii_lowercase();
    let lower = lower.split(['?', '#']).next().unwrap_or_default();
    if lower.ends_with(".json") || lower.ends_with(".jsonl") {
        Some(FileKind::Json)
    } else if lower.ends_with(".csv") || lower.ends_with(".tsv") || lower.ends_with(".txt") {
        Some(FileKind::Delimited)
    } else {
        None
    }
}

/// Guess a kind from content when the name carries no extension.
pub fn sniff_kind(body: &str) -> FileKind {
    match body.trim_start().chars().next() {
        Some('[') | Some('{') => FileKind::Json,
        _ => FileKind::Delimited,
    }
}

/// Comma unless the header row has more tabs than commas.
pub fn sniff_delimiter(first_line: &str) -> u8 {
    let commas = first_line.matches(',').count();
    let tabs = first_line.matches('\t').count();
    if commas > 0 && commas >= tabs {
        b','
    } else {
        b'\t'
    }
}

/// Text cells of the first header found in `candidates`.
/// Returns `None` when the file has no such column.
pub fn column_texts(body: &str, candidates: &[&str]) -> Option<Vec<String>> {
    let first_line = body.lines().next()?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(sniff_delimiter(first_line))
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .ok()?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_lowercase())
        .collect();
    let idx = headers
        .iter()
        .position(|h| candidates.contains(&h.as_str()))?;

    let mut out = Vec::new();
    for record in reader.records() {
        // A malformed row only costs that row.
        let Ok(record) = record else { continue };
        if let Some(cell) = record.get(idx) {
            out.push(cell.trim().to_string());
        }
    }
    Some(out)
}

/// Records from a JSON Lines file, or from a JSON array / single object.
pub fn json_records(body: &str) -> Vec<DatasetRecord> {
    let mut out = Vec::new();
    let mut any_line_parsed = false;
    // A top-level array is never JSON Lines, even if some of its lines parse alone.
    let is_array = body.trim_start().starts_with('[');
    for line in body.lines().filter(|_| !is_array) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Ok(v) = serde_json::from_str::<Value>(line) {
            any_line_parsed = true;
            out.extend(record_from_value(&v));
        }
    }
    if any_line_parsed {
        return out;
    }

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(items)) => items.iter().filter_map(record_from_value).collect(),
        Ok(v) => record_from_value(&v).into_iter().collect(),
        Err(e) => {
            tracing::debug!(target: "ingest", error = %e, "dataset file is not json");
            Vec::new()
        }
    }
}

/// First non-empty string among `keys` in a JSON object.
pub fn first_text_field(obj: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn record_from_value(v: &Value) -> Option<DatasetRecord> {
    let obj = v.as_object()?;
    let text = first_text_field(obj, &["text", "report"])?;
    let id = obj.get("id").and_then(|id| match id {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });
    let title = first_text_field(obj, &["title"]);
    Some(DatasetRecord { id, title, text })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiter_prefers_tabs_only_when_more_frequent() {
        assert_eq!(sniff_delimiter("id,text"), b',');
        assert_eq!(sniff_delimiter("id\ttext\tlen"), b'\t');
        assert_eq!(sniff_delimiter("text"), b'\t');
    }

    #[test]
    fn picks_first_matching_header_in_column_order() {
        let body = "id,Dream,report\n1,first dream,other\n2,second dream,x\n";
        let cells = column_texts(body, DATASET_TEXT_COLUMNS).unwrap();
        assert_eq!(cells, vec!["first dream", "second dream"]);
    }

    #[test]
    fn tsv_and_missing_column() {
        let body = "id\treport\n1\ta long report\n";
        assert_eq!(
            column_texts(body, DATASET_TEXT_COLUMNS).unwrap(),
            vec!["a long report"]
        );
        assert!(column_texts("a,b\n1,2\n", DATASET_TEXT_COLUMNS).is_none());
    }

    #[test]
    fn jsonl_then_array_fallback() {
        let jsonl = "{\"id\": 7, \"report\": \"r1\"}\n{\"text\": \"t2\", \"title\": \"T\"}\n";
        let recs = json_records(jsonl);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].id.as_deref(), Some("7"));
        assert_eq!(recs[1].title.as_deref(), Some("T"));

        let pretty = "[\n  {\"text\": \"a\"},\n  {\"report\": \"b\"}\n]";
        let recs = json_records(pretty);
        assert_eq!(
            recs.iter().map(|r| r.text.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
    }

    #[test]
    fn file_kinds() {
        assert_eq!(file_kind("Data.CSV"), Some(FileKind::Delimited));
        assert_eq!(file_kind("x.jsonl?download=1"), Some(FileKind::Json));
        assert_eq!(file_kind("paper.pdf"), None);
        assert_eq!(sniff_kind("  [{}]"), FileKind::Json);
    }
}
