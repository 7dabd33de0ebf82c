//! Attribute table descriptions returned by `describe_table`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Field record that keeps insertion order, serialized as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(IndexMap<String, String>);

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a field, keeping its original position on replace.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Row(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// One table of a description: ordered header fields and records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionTable {
    #[serde(rename = "headFields")]
    pub head_fields: Vec<String>,
    pub rows: Vec<Row>,
}

/// Parsed `db.describe` output: table attributes plus one row per column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescription {
    #[serde(rename = "tableObj")]
    pub table: DescriptionTable,
    #[serde(rename = "columnObj")]
    pub columns: DescriptionTable,
}

impl TableDescription {
    /// Look up the description row of a column by name.
    pub fn column(&self, name: &str) -> Option<&Row> {
        self.columns
            .rows
            .iter()
            .find(|row| row.get("column") == Some(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_serializes_in_insertion_order() {
        let row: Row = [("column", "area_m2"), ("type", "DOUBLE PRECISION"), ("min", "1.50")]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(
            json,
            r#"{"column":"area_m2","type":"DOUBLE PRECISION","min":"1.50"}"#
        );
    }

    #[test]
    fn row_insert_replaces_in_place() {
        let mut row = Row::new();
        row.insert("a", "1");
        row.insert("b", "2");
        row.insert("a", "3");
        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(row.get("a"), Some("3"));
    }

    #[test]
    fn row_deserializes_keeping_field_order() {
        let row: Row = serde_json::from_str(r#"{"type":"INTEGER","column":"floors","len":"20"}"#).unwrap();
        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["type", "column", "len"]);
        assert_eq!(row.get("column"), Some("floors"));
    }

    #[test]
    fn description_uses_browser_field_names() {
        let desc = TableDescription::default();
        let value = serde_json::to_value(&desc).unwrap();
        assert!(value.get("tableObj").is_some());
        assert!(value["columnObj"].get("headFields").is_some());
    }
}
