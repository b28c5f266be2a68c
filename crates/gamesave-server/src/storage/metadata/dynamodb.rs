//! DynamoDB-backed [`MetadataStore`] -- the "document-style NoSQL table
//! trio" variant named in the design: one table each for stores, records,
//! and metadata documents.
//!
//! Grounded on the single-table composite-key pattern of
//! `pmcp-tasks::store::dynamodb::DynamoDbBackend`, generalized to three
//! tables because stores/records/metadata have independent lifecycles and
//! independent secondary indexes (`owner_id`, `game_id`).
//!
//! Table layout:
//!
//! | Table             | Partition key | Sort key    | GSIs                          |
//! |-------------------|---------------|-------------|--------------------------------|
//! | `{stores_table}`  | `store_id`    | --          | --                             |
//! | `{records_table}` | `store_id`    | `record_id` | `owner_id-index`, `game_id-index` |
//! | `{metadata_table}`| `metadata_type` | `metadata_id` | --                         |

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use serde_json::{Map, Value};

use gamesave_core::{BackendError, BackendResult, MetadataDocument, Record, RecordQuery, Store};

use super::{MetadataStore, RequestCancel};

/// DynamoDB-backed metadata store.
#[derive(Debug, Clone)]
pub struct DynamoMetadataStore {
    client: Client,
    stores_table: String,
    records_table: String,
    metadata_table: String,
}

impl DynamoMetadataStore {
    #[must_use]
    pub fn new(
        client: Client,
        stores_table: impl Into<String>,
        records_table: impl Into<String>,
        metadata_table: impl Into<String>,
    ) -> Self {
        Self {
            client,
            stores_table: stores_table.into(),
            records_table: records_table.into(),
            metadata_table: metadata_table.into(),
        }
    }

    /// Builds a client from the standard AWS SDK config chain, honoring
    /// the optional region hint from `aws.region`.
    pub async fn from_env(
        region: Option<String>,
        stores_table: impl Into<String>,
        records_table: impl Into<String>,
        metadata_table: impl Into<String>,
    ) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region));
        }
        let config = loader.load().await;
        let client = Client::new(&config);
        Self::new(client, stores_table, records_table, metadata_table)
    }
}

fn map_sdk_error(err: impl std::error::Error + Send + Sync + 'static) -> BackendError {
    BackendError::Transient(err.to_string())
}

fn json_to_attr(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(items) => AttributeValue::L(items.iter().map(json_to_attr).collect()),
        Value::Object(map) => {
            let mut out = HashMap::new();
            for (k, v) in map {
                out.insert(k.clone(), json_to_attr(v));
            }
            AttributeValue::M(out)
        }
    }
}

fn attr_to_json(attr: &AttributeValue) -> Value {
    match attr {
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::N(n) => {
            // Try exact integer parses first: DynamoDB's `N` is decimal text,
            // and routing every number through f64 would silently truncate
            // integers outside 2^53 and break the SetMetadata/GetMetadata
            // round-trip property for large ids/counters.
            if let Ok(i) = n.parse::<i64>() {
                Value::Number(serde_json::Number::from(i))
            } else if let Ok(u) = n.parse::<u64>() {
                Value::Number(serde_json::Number::from(u))
            } else {
                n.parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::L(items) => Value::Array(items.iter().map(attr_to_json).collect()),
        AttributeValue::M(map) => {
            let mut out = Map::new();
            for (k, v) in map {
                out.insert(k.clone(), attr_to_json(v));
            }
            Value::Object(out)
        }
        _ => Value::Null,
    }
}

fn properties_to_attr(properties: &Map<String, Value>) -> AttributeValue {
    json_to_attr(&Value::Object(properties.clone()))
}

fn attr_to_properties(item: &HashMap<String, AttributeValue>, key: &str) -> Map<String, Value> {
    item.get(key)
        .map(attr_to_json)
        .and_then(|v| v.as_object().cloned())
        .unwrap_or_default()
}

fn store_to_item(store: &Store) -> HashMap<String, AttributeValue> {
    HashMap::from([
        ("store_id".to_string(), AttributeValue::S(store.store_id.clone())),
        ("name".to_string(), AttributeValue::S(store.name.clone())),
        ("created_at".to_string(), AttributeValue::N(store.created_at.to_string())),
        ("updated_at".to_string(), AttributeValue::N(store.updated_at.to_string())),
    ])
}

fn item_to_store(item: &HashMap<String, AttributeValue>) -> Option<Store> {
    Some(Store {
        store_id: item.get("store_id")?.as_s().ok()?.clone(),
        name: item.get("name")?.as_s().ok()?.clone(),
        created_at: item.get("created_at")?.as_n().ok()?.parse().ok()?,
        updated_at: item.get("updated_at")?.as_n().ok()?.parse().ok()?,
    })
}

fn record_to_item(record: &Record) -> HashMap<String, AttributeValue> {
    let mut item = HashMap::from([
        ("store_id".to_string(), AttributeValue::S(record.store_id.clone())),
        ("record_id".to_string(), AttributeValue::S(record.record_id.clone())),
        (
            "tags".to_string(),
            AttributeValue::L(record.tags.iter().cloned().map(AttributeValue::S).collect()),
        ),
        ("properties".to_string(), properties_to_attr(&record.properties)),
        (
            "blob_keys".to_string(),
            AttributeValue::L(record.blob_keys.iter().cloned().map(AttributeValue::S).collect()),
        ),
        ("created_at".to_string(), AttributeValue::N(record.created_at.to_string())),
        ("updated_at".to_string(), AttributeValue::N(record.updated_at.to_string())),
    ]);
    if let Some(owner_id) = &record.owner_id {
        item.insert("owner_id".to_string(), AttributeValue::S(owner_id.clone()));
    }
    if let Some(game_id) = &record.game_id {
        item.insert("game_id".to_string(), AttributeValue::S(game_id.clone()));
    }
    item
}

fn item_to_record(item: &HashMap<String, AttributeValue>) -> Option<Record> {
    Some(Record {
        store_id: item.get("store_id")?.as_s().ok()?.clone(),
        record_id: item.get("record_id")?.as_s().ok()?.clone(),
        owner_id: item.get("owner_id").and_then(|v| v.as_s().ok()).cloned(),
        game_id: item.get("game_id").and_then(|v| v.as_s().ok()).cloned(),
        tags: item
            .get("tags")
            .and_then(|v| v.as_l().ok())
            .map(|l| l.iter().filter_map(|v| v.as_s().ok().cloned()).collect())
            .unwrap_or_default(),
        properties: attr_to_properties(item, "properties"),
        blob_keys: item
            .get("blob_keys")
            .and_then(|v| v.as_l().ok())
            .map(|l| l.iter().filter_map(|v| v.as_s().ok().cloned()).collect())
            .unwrap_or_default(),
        created_at: item.get("created_at")?.as_n().ok()?.parse().ok()?,
        updated_at: item.get("updated_at")?.as_n().ok()?.parse().ok()?,
    })
}

fn metadata_to_item(doc: &MetadataDocument) -> HashMap<String, AttributeValue> {
    HashMap::from([
        ("metadata_type".to_string(), AttributeValue::S(doc.metadata_type.clone())),
        ("metadata_id".to_string(), AttributeValue::S(doc.metadata_id.clone())),
        ("data".to_string(), properties_to_attr(&doc.data)),
        ("created_at".to_string(), AttributeValue::N(doc.created_at.to_string())),
        ("updated_at".to_string(), AttributeValue::N(doc.updated_at.to_string())),
    ])
}

fn item_to_metadata(item: &HashMap<String, AttributeValue>) -> Option<MetadataDocument> {
    Some(MetadataDocument {
        metadata_type: item.get("metadata_type")?.as_s().ok()?.clone(),
        metadata_id: item.get("metadata_id")?.as_s().ok()?.clone(),
        data: attr_to_properties(item, "data"),
        created_at: item.get("created_at")?.as_n().ok()?.parse().ok()?,
        updated_at: item.get("updated_at")?.as_n().ok()?.parse().ok()?,
    })
}

#[async_trait]
impl MetadataStore for DynamoMetadataStore {
    async fn create_store(&self, _ctx: &RequestCancel, store: Store) -> BackendResult<()> {
        let result = self
            .client
            .put_item()
            .table_name(&self.stores_table)
            .set_item(Some(store_to_item(&store)))
            .condition_expression("attribute_not_exists(store_id)")
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if err.as_service_error().is_some_and(|e| e.is_conditional_check_failed_exception()) => {
                Err(BackendError::AlreadyExists)
            }
            Err(err) => Err(map_sdk_error(err)),
        }
    }

    async fn get_store(&self, _ctx: &RequestCancel, store_id: &str) -> BackendResult<Option<Store>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.stores_table)
            .key("store_id", AttributeValue::S(store_id.to_string()))
            .send()
            .await
            .map_err(map_sdk_error)?;

        Ok(result.item().and_then(item_to_store))
    }

    async fn list_stores(&self, _ctx: &RequestCancel) -> BackendResult<Vec<Store>> {
        let result = self
            .client
            .scan()
            .table_name(&self.stores_table)
            .send()
            .await
            .map_err(map_sdk_error)?;

        Ok(result.items().iter().filter_map(item_to_store).collect())
    }

    async fn delete_store(&self, _ctx: &RequestCancel, store_id: &str) -> BackendResult<()> {
        self.client
            .delete_item()
            .table_name(&self.stores_table)
            .key("store_id", AttributeValue::S(store_id.to_string()))
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(())
    }

    async fn create_record(&self, _ctx: &RequestCancel, record: Record) -> BackendResult<()> {
        let result = self
            .client
            .put_item()
            .table_name(&self.records_table)
            .set_item(Some(record_to_item(&record)))
            .condition_expression("attribute_not_exists(store_id) AND attribute_not_exists(record_id)")
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if err.as_service_error().is_some_and(|e| e.is_conditional_check_failed_exception()) => {
                Err(BackendError::AlreadyExists)
            }
            Err(err) => Err(map_sdk_error(err)),
        }
    }

    async fn get_record(
        &self,
        _ctx: &RequestCancel,
        store_id: &str,
        record_id: &str,
    ) -> BackendResult<Option<Record>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.records_table)
            .key("store_id", AttributeValue::S(store_id.to_string()))
            .key("record_id", AttributeValue::S(record_id.to_string()))
            .send()
            .await
            .map_err(map_sdk_error)?;

        Ok(result.item().and_then(item_to_record))
    }

    async fn update_record(&self, _ctx: &RequestCancel, record: Record) -> BackendResult<()> {
        self.client
            .put_item()
            .table_name(&self.records_table)
            .set_item(Some(record_to_item(&record)))
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(())
    }

    async fn delete_record(
        &self,
        _ctx: &RequestCancel,
        store_id: &str,
        record_id: &str,
    ) -> BackendResult<()> {
        self.client
            .delete_item()
            .table_name(&self.records_table)
            .key("store_id", AttributeValue::S(store_id.to_string()))
            .key("record_id", AttributeValue::S(record_id.to_string()))
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(())
    }

    async fn query_records(
        &self,
        _ctx: &RequestCancel,
        store_id: &str,
        query: &RecordQuery,
    ) -> BackendResult<Vec<Record>> {
        let mut request = self.client.query().table_name(&self.records_table);

        if let Some(owner_id) = &query.owner_id {
            request = request
                .index_name("owner_id-index")
                .key_condition_expression("store_id = :sid AND owner_id = :oid")
                .expression_attribute_values(":sid", AttributeValue::S(store_id.to_string()))
                .expression_attribute_values(":oid", AttributeValue::S(owner_id.clone()));
        } else if let Some(game_id) = &query.game_id {
            request = request
                .index_name("game_id-index")
                .key_condition_expression("store_id = :sid AND game_id = :gid")
                .expression_attribute_values(":sid", AttributeValue::S(store_id.to_string()))
                .expression_attribute_values(":gid", AttributeValue::S(game_id.clone()));
        } else {
            request = request
                .key_condition_expression("store_id = :sid")
                .expression_attribute_values(":sid", AttributeValue::S(store_id.to_string()));
        }

        let result = request.send().await.map_err(map_sdk_error)?;
        let mut records: Vec<Record> = result.items().iter().filter_map(item_to_record).collect();

        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.record_id.cmp(&b.record_id))
        });
        if query.limit > 0 {
            records.truncate(query.limit as usize);
        }
        Ok(records)
    }

    async fn scan_records_page(
        &self,
        _ctx: &RequestCancel,
        store_id: &str,
        offset: usize,
        page_size: usize,
    ) -> BackendResult<Vec<Record>> {
        let result = self
            .client
            .query()
            .table_name(&self.records_table)
            .key_condition_expression("store_id = :sid")
            .expression_attribute_values(":sid", AttributeValue::S(store_id.to_string()))
            .send()
            .await
            .map_err(map_sdk_error)?;

        let mut records: Vec<Record> = result.items().iter().filter_map(item_to_record).collect();
        records.sort_by(|a, b| a.record_id.cmp(&b.record_id));
        Ok(records.into_iter().skip(offset).take(page_size).collect())
    }

    async fn set_metadata(
        &self,
        ctx: &RequestCancel,
        metadata_type: &str,
        metadata_id: &str,
        data: Map<String, Value>,
        now: i64,
    ) -> BackendResult<()> {
        let created_at = self
            .get_metadata(ctx, metadata_type, metadata_id)
            .await?
            .map_or(now, |doc| doc.created_at);

        let doc = MetadataDocument {
            metadata_type: metadata_type.to_string(),
            metadata_id: metadata_id.to_string(),
            data,
            created_at,
            updated_at: now,
        };

        self.client
            .put_item()
            .table_name(&self.metadata_table)
            .set_item(Some(metadata_to_item(&doc)))
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(())
    }

    async fn get_metadata(
        &self,
        _ctx: &RequestCancel,
        metadata_type: &str,
        metadata_id: &str,
    ) -> BackendResult<Option<MetadataDocument>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.metadata_table)
            .key("metadata_type", AttributeValue::S(metadata_type.to_string()))
            .key("metadata_id", AttributeValue::S(metadata_id.to_string()))
            .send()
            .await
            .map_err(map_sdk_error)?;

        Ok(result.item().and_then(item_to_metadata))
    }

    async fn delete_metadata(
        &self,
        _ctx: &RequestCancel,
        metadata_type: &str,
        metadata_id: &str,
    ) -> BackendResult<()> {
        self.client
            .delete_item()
            .table_name(&self.metadata_table)
            .key("metadata_type", AttributeValue::S(metadata_type.to_string()))
            .key("metadata_id", AttributeValue::S(metadata_id.to_string()))
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(())
    }

    async fn query_metadata(
        &self,
        _ctx: &RequestCancel,
        metadata_type: &str,
    ) -> BackendResult<Vec<MetadataDocument>> {
        let result = self
            .client
            .query()
            .table_name(&self.metadata_table)
            .key_condition_expression("metadata_type = :t")
            .expression_attribute_values(":t", AttributeValue::S(metadata_type.to_string()))
            .send()
            .await
            .map_err(map_sdk_error)?;

        let mut docs: Vec<MetadataDocument> = result.items().iter().filter_map(item_to_metadata).collect();
        docs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_round_trips_through_attribute_map() {
        let store = Store {
            store_id: "s1".to_string(),
            name: "My Store".to_string(),
            created_at: 100,
            updated_at: 200,
        };
        let item = store_to_item(&store);
        assert_eq!(item_to_store(&item), Some(store));
    }

    #[test]
    fn record_round_trips_through_attribute_map_with_properties() {
        let mut properties = Map::new();
        properties.insert("level".to_string(), Value::from(7));
        properties.insert("name".to_string(), Value::from("hero"));

        let record = Record {
            store_id: "s1".to_string(),
            record_id: "r1".to_string(),
            owner_id: Some("u1".to_string()),
            game_id: None,
            tags: vec!["alpha".to_string()],
            properties,
            blob_keys: vec!["save.bin".to_string()],
            created_at: 10,
            updated_at: 20,
        };

        let item = record_to_item(&record);
        assert_eq!(item_to_record(&item), Some(record));
    }

    #[test]
    fn record_without_owner_or_game_round_trips() {
        let record = Record {
            store_id: "s1".to_string(),
            record_id: "r1".to_string(),
            owner_id: None,
            game_id: None,
            tags: vec![],
            properties: Map::new(),
            blob_keys: vec![],
            created_at: 1,
            updated_at: 1,
        };
        let item = record_to_item(&record);
        assert_eq!(item_to_record(&item), Some(record));
    }

    #[test]
    fn large_integer_properties_round_trip_exactly() {
        let mut properties = Map::new();
        properties.insert("big_counter".to_string(), Value::from(9_007_199_254_740_993_i64));
        properties.insert("negative".to_string(), Value::from(-42_i64));
        properties.insert("ratio".to_string(), Value::from(1.5));

        let attr = properties_to_attr(&properties);
        let round_tripped = attr_to_json(&attr).as_object().cloned().unwrap();

        assert_eq!(round_tripped, properties);
    }
}
