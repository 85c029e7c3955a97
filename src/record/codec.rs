//! Stored form of a record: UTF-8 JSON `{"id", "version", "fields"}`.
//!
//! Dates are written as RFC 3339 UTC strings and recognized again on read.
//! The pending action is never part of the stored form.

use serde::{Deserialize, Serialize};

use super::value::{fields_to_json, Value};
use super::Record;

#[derive(Serialize)]
struct StoredRecordRef<'a> {
    id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'a str>,
    fields: serde_json::Value,
}

#[derive(Deserialize)]
struct StoredRecord {
    id: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    fields: serde_json::Map<String, serde_json::Value>,
}

pub fn encode(record: &Record) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&StoredRecordRef {
        id: record.id(),
        version: record.version(),
        fields: fields_to_json(record.fields()),
    })
}

pub fn decode(bytes: &[u8]) -> Result<Record, serde_json::Error> {
    let stored: StoredRecord = serde_json::from_slice(bytes)?;
    let fields = stored
        .fields
        .into_iter()
        .map(|(name, value)| (name, Value::from_json(value)))
        .collect();

    let mut record = Record::with_fields(stored.id, fields);
    record.set_version(stored.version);
    Ok(record)
}
