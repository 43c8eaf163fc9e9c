/// Remote app settings rows
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One `{key, value}` row from the remote settings table
///
/// Values are kept as raw JSON; consumers decide how to coerce them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingRow {
    /// Setting name
    pub key: String,
    /// Raw JSON value
    pub value: Value,
}

impl SettingRow {
    /// Create a row
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Find the value for `key` in a set of rows
#[must_use]
pub fn find_setting<'a>(rows: &'a [SettingRow], key: &str) -> Option<&'a Value> {
    rows.iter().find(|row| row.key == key).map(|row| &row.value)
}
