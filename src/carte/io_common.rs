use std::path::Path;

use log::warn;
use serde_json::Value as JSValue;

use circo_results::Row;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Extracts the rows of a results payload: either `{"data": [...]}` or a bare list.
/// Entries that are not objects are dropped.
pub fn rows_from_payload(payload: &JSValue) -> Vec<Row> {
    let entries = match payload {
        JSValue::Array(l) => l,
        JSValue::Object(o) => match o.get("data") {
            Some(JSValue::Array(l)) => l,
            _ => {
                warn!("rows_from_payload: object without a data list, no rows read");
                return vec![];
            }
        },
        _ => {
            warn!("rows_from_payload: unexpected payload, no rows read");
            return vec![];
        }
    };
    let rows: Vec<Row> = entries
        .iter()
        .filter_map(|e| e.as_object().cloned())
        .collect();
    if rows.len() < entries.len() {
        warn!(
            "rows_from_payload: dropped {} entries that are not rows",
            entries.len() - rows.len()
        );
    }
    rows
}

/// The URL of the next page of a paginated payload, if there is one.
///
/// The tabular API of data.gouv.fr puts it under `links.next`; other APIs use a
/// top-level `next`.
pub fn next_page_url(payload: &JSValue) -> Option<String> {
    let next = payload
        .get("links")
        .and_then(|l| l.get("next"))
        .or_else(|| payload.get("next"))?;
    match next.as_str() {
        Some(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}
