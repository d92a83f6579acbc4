// src/emit.rs
//! Serialize the curated corpus: one JSON record per line, plus one compact JSON array.
//!
//! Both files are written to temporaries next to their targets and only renamed into
//! place once both are complete, so a failed run never leaves a half-written artifact.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::analyze::CuratedEntry;
use crate::error::EmitError;

/// Sort ascending by symbol; a repeated symbol keeps its first entry.
pub fn sort_entries(entries: &mut Vec<CuratedEntry>) {
    entries.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    entries.dedup_by(|later, first| later.symbol == first.symbol);
}

/// One compact record per line (non-ASCII kept verbatim).
pub fn to_jsonl(entries: &[CuratedEntry]) -> Result<String, EmitError> {
    let mut out = String::new();
    for e in entries {
        out.push_str(&serde_json::to_string(e)?);
        out.push('\n');
    }
    Ok(out)
}

/// The whole array, compact.
pub fn to_json(entries: &[CuratedEntry]) -> Result<String, EmitError> {
    Ok(serde_json::to_string(entries)?)
}

fn ensure_parent(path: &Path) -> Result<(), EmitError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).map_err(|source| EmitError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "out".to_string());
    path.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}

fn write_tmp(path: &Path, bytes: &[u8]) -> Result<PathBuf, EmitError> {
    ensure_parent(path)?;
    // A directory in the way would only fail at rename time, after the other file moved.
    if path.is_dir() {
        return Err(EmitError::Write {
            path: path.to_path_buf(),
            source: std::io::Error::other("target is a directory"),
        });
    }
    let tmp = tmp_path(path);
    let res = fs::File::create(&tmp).and_then(|mut f| {
        f.write_all(bytes)?;
        f.sync_all()
    });
    match res {
        Ok(()) => Ok(tmp),
        Err(source) => {
            let _ = fs::remove_file(&tmp);
            Err(EmitError::Write {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}

fn commit(tmp: &Path, target: &Path) -> Result<(), EmitError> {
    fs::rename(tmp, target).map_err(|source| {
        let _ = fs::remove_file(tmp);
        EmitError::Write {
            path: target.to_path_buf(),
            source,
        }
    })
}

/// Write `bytes` to `path` via a temporary file and rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), EmitError> {
    let tmp = write_tmp(path, bytes)?;
    commit(&tmp, path)
}

/// Sort and write both representations. Returns the number of entries written.
pub fn emit(
    mut entries: Vec<CuratedEntry>,
    jsonl_path: &Path,
    json_path: &Path,
) -> Result<usize, EmitError> {
    if jsonl_path == json_path {
        return Err(EmitError::SameTarget(jsonl_path.to_path_buf()));
    }
    sort_entries(&mut entries);
    let jsonl = to_jsonl(&entries)?;
    let json = to_json(&entries)?;

    let jsonl_tmp = write_tmp(jsonl_path, jsonl.as_bytes())?;
    let json_tmp = match write_tmp(json_path, json.as_bytes()) {
        Ok(t) => t,
        Err(e) => {
            let _ = fs::remove_file(&jsonl_tmp);
            return Err(e);
        }
    };
    if let Err(e) = commit(&jsonl_tmp, jsonl_path) {
        let _ = fs::remove_file(&json_tmp);
        return Err(e);
    }
    commit(&json_tmp, json_path)?;

    tracing::info!(
        target: "emit",
        entries = entries.len(),
        jsonl = %jsonl_path.display(),
        json = %json_path.display(),
        "curated corpus written"
    );
    Ok(entries.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tmp_file_sits_next_to_target() {
        let t = tmp_path(Path::new("data/dreams_curated.json"));
        assert_eq!(t.parent(), Some(Path::new("data")));
        let name = t.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(".dreams_curated.json."));
        assert!(name.ends_with(".tmp"));
    }
}
