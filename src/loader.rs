//! Item loading: locate the `RAW` listing in the data file, convert it to
//! JSON and expand each shorthand record into an [`Item`].

use anyhow::{Context, Result};
use regex::Regex;
use serde_json::Value;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::FatalError;
use crate::jsonish;
use crate::models::{Item, ShorthandRecord};

/// `const RAW = [ ... \n];`. The body runs up to the first `];` that opens a line.
static RAW_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)const RAW\s*=\s*\[(.*?)\n\];").expect("static regex"));

/// Read and expand every item in the data file at `path`.
pub fn load_items(path: &Path) -> Result<Vec<Item>> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read data file: {}", path.display()))?;
    let items = parse_items(&source)?;
    tracing::debug!(count = items.len(), path = %path.display(), "loaded items");
    Ok(items)
}

/// Expand all items from the full text of a data file, in listing order.
pub fn parse_items(source: &str) -> Result<Vec<Item>, FatalError> {
    let body = extract_raw_literal(source)?;

    // The body is wrapped after the fact; newlines keep a trailing comment on
    // its last line from swallowing the closing bracket.
    let records: Vec<Value> = jsonish::parse(&format!("[\n{}\n]", body))?;

    records
        .into_iter()
        .enumerate()
        .map(|(i, record)| expand_record(i + 1, record))
        .collect()
}

/// Body of the `RAW` array literal, without its brackets.
pub fn extract_raw_literal(source: &str) -> Result<&str, FatalError> {
    RAW_MARKER
        .captures(source)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or(FatalError::MarkerNotFound)
}

/// Expand the record at 1-based `position`.
pub fn expand_record(position: usize, record: Value) -> Result<Item, FatalError> {
    let obj = record.as_object().ok_or_else(|| FatalError::InvalidRecord {
        position,
        message: "expected an object".to_string(),
    })?;

    if let Some(key) = ShorthandRecord::REQUIRED_KEYS
        .iter()
        .find(|key| !obj.contains_key(**key))
    {
        return Err(FatalError::MissingField { key: *key, position });
    }

    let raw: ShorthandRecord =
        serde_json::from_value(record).map_err(|e| FatalError::InvalidRecord {
            position,
            message: e.to_string(),
        })?;

    Ok(Item::from_shorthand(position, raw))
}
