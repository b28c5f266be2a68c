//! Domain entities: `Store`, `Record`, and `MetadataDocument`.
//!
//! These types are the shapes persisted by the metadata backend (see
//! `gamesave-server::storage::metadata`) and returned across both wire
//! frontends. `properties` and metadata `data` are intentionally opaque
//! JSON objects -- no schema is enforced on read or write.

use serde::{Deserialize, Serialize};
use serde_json::Map;
use serde_json::Value;

/// A logical container of records owned by one application/game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub store_id: String,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A keyed document inside a store carrying structured properties, tags,
/// an owner, and the set of blob keys currently attached to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub store_id: String,
    pub record_id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub owner_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub game_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub blob_keys: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Record {
    /// Appends `blob_key` to `blob_keys` if not already present. Returns
    /// `true` if the set changed.
    pub fn add_blob_key(&mut self, blob_key: &str) -> bool {
        if self.blob_keys.iter().any(|k| k == blob_key) {
            return false;
        }
        self.blob_keys.push(blob_key.to_string());
        true
    }

    /// Removes `blob_key` from `blob_keys`. Returns `true` if the set changed.
    pub fn remove_blob_key(&mut self, blob_key: &str) -> bool {
        let before = self.blob_keys.len();
        self.blob_keys.retain(|k| k != blob_key);
        self.blob_keys.len() != before
    }
}

/// A namespaced key/value document independent of stores, keyed by the
/// composite `(metadata_type, metadata_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataDocument {
    pub metadata_type: String,
    pub metadata_id: String,
    pub data: Map<String, Value>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Filter accepted by `QueryRecords`. `limit = 0` means "no limit".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordQuery {
    pub owner_id: Option<String>,
    pub game_id: Option<String>,
    pub limit: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_blob_key_is_idempotent() {
        let mut record = Record {
            store_id: "s".into(),
            record_id: "r".into(),
            owner_id: None,
            game_id: None,
            tags: vec![],
            properties: Map::new(),
            blob_keys: vec![],
            created_at: 1,
            updated_at: 1,
        };

        assert!(record.add_blob_key("b1"));
        assert!(!record.add_blob_key("b1"));
        assert_eq!(record.blob_keys, vec!["b1".to_string()]);
    }

    #[test]
    fn remove_blob_key_reports_change() {
        let mut record = Record {
            store_id: "s".into(),
            record_id: "r".into(),
            owner_id: None,
            game_id: None,
            tags: vec![],
            properties: Map::new(),
            blob_keys: vec!["b1".into(), "b2".into()],
            created_at: 1,
            updated_at: 1,
        };

        assert!(record.remove_blob_key("b1"));
        assert!(!record.remove_blob_key("b1"));
        assert_eq!(record.blob_keys, vec!["b2".to_string()]);
    }
}
