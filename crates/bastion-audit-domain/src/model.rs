use crate::policy::FieldMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

/// One authorization grant: an ordered mapping of column name -> scalar cell value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Scalar cell rendered as trimmed text. Nulls, blanks, and non-scalars are `None`.
    pub fn text(&self, field: &str) -> Option<Cow<'_, str>> {
        let text = match self.0.get(field)? {
            Value::String(s) => Cow::Borrowed(s.trim()),
            Value::Number(n) => Cow::Owned(n.to_string()),
            Value::Bool(b) => Cow::Owned(b.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => return None,
        };
        if text.is_empty() { None } else { Some(text) }
    }

    /// Like [`Record::text`], with missing values as the empty string.
    pub fn text_or_empty(&self, field: &str) -> String {
        self.text(field).map(Cow::into_owned).unwrap_or_default()
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    /// All fields except `field`, in original order.
    pub fn without(&self, field: &str) -> Map<String, Value> {
        self.0
            .iter()
            .filter(|(k, _)| k.as_str() != field)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Set `field` as the last column, replacing any earlier occurrence.
    pub fn set_trailing(&mut self, field: &str, value: Value) {
        let mut fields = self.without(field);
        fields.insert(field.to_string(), value);
        self.0 = fields;
    }
}

impl From<Map<String, Value>> for Record {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    #[serde(default)]
    pub records: Vec<Record>,
}

/// All sheets of one tabular snapshot, in workbook order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    pub fn record_count(&self) -> usize {
        self.sheets.iter().map(|s| s.records.len()).sum()
    }
}

/// Identity of a grant across snapshots.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PermissionKey {
    pub host_ip: String,
    pub host_name: String,
    pub network: String,
    pub host_group: String,
    pub protocol: String,
    pub account: String,
}

impl PermissionKey {
    pub fn from_record(record: &Record, fields: &FieldMap) -> Self {
        Self {
            host_ip: record.text_or_empty(&fields.host_ip),
            host_name: record.text_or_empty(&fields.host_name),
            network: record.text_or_empty(&fields.network),
            host_group: record.text_or_empty(&fields.host_group),
            protocol: record.text_or_empty(&fields.protocol),
            account: record.text_or_empty(&fields.account),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_normalizes_scalars() {
        let record = Record::from_fields([
            ("ip", json!(" 10.0.0.1 ")),
            ("port", json!(22)),
            ("blank", json!("   ")),
            ("none", Value::Null),
        ]);
        assert_eq!(record.text("ip").as_deref(), Some("10.0.0.1"));
        assert_eq!(record.text("port").as_deref(), Some("22"));
        assert_eq!(record.text("blank"), None);
        assert_eq!(record.text("none"), None);
        assert_eq!(record.text("missing"), None);
        assert_eq!(record.text_or_empty("missing"), "");
    }

    #[test]
    fn set_trailing_moves_field_to_end() {
        let mut record = Record::from_fields([
            ("mark", json!("old")),
            ("a", json!(1)),
            ("b", json!(2)),
        ]);
        record.set_trailing("mark", json!("new"));
        let keys: Vec<&str> = record.fields().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b", "mark"]);
        assert_eq!(record.get("mark"), Some(&json!("new")));
    }
}
