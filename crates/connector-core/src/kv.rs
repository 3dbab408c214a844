use serde::{Deserialize, Serialize};

// ── Key-value row ────────────────────────────────────────────────────

/// A single key-value row for query params, headers or JSON body pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvRow {
    pub key: String,
    pub value: String,
}

impl KvRow {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn new_empty() -> Self {
        Self::default()
    }

    /// True when both key and value are empty.
    pub fn is_blank(&self) -> bool {
        self.key.is_empty() && self.value.is_empty()
    }
}

// ── Row list editing ─────────────────────────────────────────────────

/// Return `rows`, or a single empty placeholder row when `rows` is empty.
/// Editors always show at least one row.
pub fn with_placeholder(rows: Vec<KvRow>) -> Vec<KvRow> {
    if rows.is_empty() {
        vec![KvRow::new_empty()]
    } else {
        rows
    }
}

/// Append an empty row. Returns the index of the new row.
pub fn add_row(rows: &mut Vec<KvRow>) -> usize {
    rows.push(KvRow::new_empty());
    rows.len() - 1
}

/// Whether the delete control is offered. The last remaining row stays.
pub fn can_remove_row(rows: &[KvRow]) -> bool {
    rows.len() > 1
}

/// Remove the row at `index`. Returns false (and leaves the list as is)
/// when the index is out of range or it is the only row left.
pub fn remove_row(rows: &mut Vec<KvRow>, index: usize) -> bool {
    if !can_remove_row(rows) || index >= rows.len() {
        return false;
    }
    rows.remove(index);
    true
}

/// Set the key of the row at `index`. Returns false for a missing row.
pub fn set_key(rows: &mut [KvRow], index: usize, key: &str) -> bool {
    match rows.get_mut(index) {
        Some(row) => {
            row.key = key.to_string();
            true
        }
        None => false,
    }
}

/// Set the value of the row at `index`. Returns false for a missing row.
pub fn set_value(rows: &mut [KvRow], index: usize, value: &str) -> bool {
    match rows.get_mut(index) {
        Some(row) => {
            row.value = value.to_string();
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_only_when_empty() {
        assert_eq!(with_placeholder(Vec::new()), vec![KvRow::new_empty()]);

        let rows = vec![KvRow::new("a", "b")];
        assert_eq!(with_placeholder(rows.clone()), rows);
    }

    #[test]
    fn test_add_and_remove_rows() {
        let mut rows = vec![KvRow::new("a", "b")];
        assert!(!can_remove_row(&rows));

        let idx = add_row(&mut rows);
        assert_eq!(idx, 1);
        assert!(rows[1].is_blank());
        assert!(can_remove_row(&rows));

        assert!(remove_row(&mut rows, 0));
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_blank());
    }

    #[test]
    fn test_last_row_cannot_be_removed() {
        let mut rows = vec![KvRow::new("a", "b")];
        assert!(!remove_row(&mut rows, 0));
        assert_eq!(rows, vec![KvRow::new("a", "b")]);
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut rows = vec![KvRow::new("a", "b"), KvRow::new("c", "d")];
        assert!(!remove_row(&mut rows, 5));
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_set_key_and_value() {
        let mut rows = vec![KvRow::new_empty()];
        assert!(set_key(&mut rows, 0, "Content-Type"));
        assert!(set_value(&mut rows, 0, "application/json"));
        assert_eq!(rows[0], KvRow::new("Content-Type", "application/json"));

        assert!(!set_key(&mut rows, 3, "x"));
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&KvRow::new("a", "b")).unwrap();
        assert_eq!(json, r#"{"key":"a","value":"b"}"#);
    }
}
