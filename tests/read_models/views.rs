//! Read model views used by the read model tests.

use chrono::{DateTime, Utc};
use kv_projections::ReadModel;
use serde::{Deserialize, Serialize};

/// A read-optimized view of a single counter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ReadModel)]
#[read_model(collection = "counter_views")]
pub struct CounterView {
    #[read_model(id)]
    pub counter_id: String,
    pub name: String,
    pub value: i32,
    pub updated_at: DateTime<Utc>,
}

impl CounterView {
    pub fn new(counter_id: &str, name: &str, updated_at: DateTime<Utc>) -> Self {
        Self {
            counter_id: counter_id.to_string(),
            name: name.to_string(),
            value: 0,
            updated_at,
        }
    }
}

/// Numeric ids and the default collection name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ReadModel)]
pub struct UserProfile {
    pub id: u64,
    pub display_name: String,
    pub tags: Vec<String>,
}

/// Free text that may happen to look like a timestamp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ReadModel)]
pub struct Note {
    #[read_model(id)]
    pub slug: String,
    pub text: String,
}
