use std::collections::BTreeMap;

use connector_core::kv::{self, KvRow};

/// Editable header rows from persisted settings.
pub fn decode(headers: Option<&[KvRow]>) -> Vec<KvRow> {
    kv::with_placeholder(headers.map(<[KvRow]>::to_vec).unwrap_or_default())
}

/// Header rows as persisted: rows with an empty key are dropped, order and
/// duplicates are kept. `None` when nothing is left.
pub fn encode(rows: &[KvRow]) -> Option<Vec<KvRow>> {
    let kept: Vec<KvRow> = rows.iter().filter(|h| !h.key.is_empty()).cloned().collect();
    if kept.is_empty() { None } else { Some(kept) }
}

/// Collapse header rows into the mapping sent over the wire.
/// On duplicate keys the last row wins.
pub fn collapse(rows: &[KvRow]) -> BTreeMap<String, String> {
    rows.iter()
        .filter(|h| !h.key.is_empty())
        .map(|h| (h.key.clone(), h.value.clone()))
        .collect()
}
