use crate::store::escape_pattern;

const COUNTER_PREFIX: &str = "nextItemId:";

/// Maps collections and ids onto store keys.
///
/// Records live at `<prefix><collection>:<id>`; each collection has one id
/// counter at `nextItemId:<prefix><collection>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyspace {
    prefix: String,
}

impl Keyspace {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn namespace(&self, collection: &str) -> String {
        format!("{}{}", self.prefix, collection)
    }

    pub fn record_key(&self, collection: &str, id: &str) -> String {
        format!("{}:{}", self.namespace(collection), id)
    }

    pub fn counter_key(&self, collection: &str) -> String {
        format!("{}{}", COUNTER_PREFIX, self.namespace(collection))
    }

    /// Glob pattern matching every record key of `collection` and nothing else.
    pub fn collection_pattern(&self, collection: &str) -> String {
        format!("{}:*", escape_pattern(&self.namespace(collection)))
    }

    /// Recover the id part of a record key belonging to `collection`.
    pub fn id_from_key<'k>(&self, collection: &str, key: &'k str) -> Option<&'k str> {
        let namespace = self.namespace(collection);
        key.strip_prefix(namespace.as_str())?.strip_prefix(':')
    }
}
