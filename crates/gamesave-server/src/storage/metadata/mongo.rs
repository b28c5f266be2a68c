//! MongoDB-backed [`MetadataStore`] -- three collections mirroring the
//! DynamoDB table trio, using compound indexes instead of GSIs.
//!
//! Collections:
//! - `stores`, unique index on `store_id`.
//! - `records`, unique compound index on `(store_id, record_id)`, plus
//!   non-unique compound indexes on `(store_id, owner_id)` and
//!   `(store_id, game_id)` for [`MetadataStore::query_records`].
//! - `metadata`, unique compound index on `(metadata_type, metadata_id)`.

use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::{FindOptions, IndexOptions};
use mongodb::{Client, Collection, IndexModel};

use gamesave_core::{BackendError, BackendResult, MetadataDocument, Record, RecordQuery, Store};

use super::{MetadataStore, RequestCancel};
use async_trait::async_trait;

fn map_mongo_error(err: mongodb::error::Error) -> BackendError {
    use mongodb::error::ErrorKind;
    match *err.kind {
        ErrorKind::Write(mongodb::error::WriteFailure::WriteError(ref we))
            if we.code == 11000 =>
        {
            BackendError::AlreadyExists
        }
        _ => BackendError::Transient(err.to_string()),
    }
}

fn properties_to_bson(properties: &serde_json::Map<String, serde_json::Value>) -> Document {
    mongodb::bson::to_document(properties).unwrap_or_default()
}

fn bson_to_properties(doc: &Document) -> serde_json::Map<String, serde_json::Value> {
    mongodb::bson::from_document(doc.clone()).unwrap_or_default()
}

fn store_to_doc(store: &Store) -> Document {
    doc! {
        "store_id": &store.store_id,
        "name": &store.name,
        "created_at": store.created_at,
        "updated_at": store.updated_at,
    }
}

fn doc_to_store(doc: &Document) -> Option<Store> {
    Some(Store {
        store_id: doc.get_str("store_id").ok()?.to_string(),
        name: doc.get_str("name").ok()?.to_string(),
        created_at: doc.get_i64("created_at").ok()?,
        updated_at: doc.get_i64("updated_at").ok()?,
    })
}

fn record_to_doc(record: &Record) -> Document {
    doc! {
        "store_id": &record.store_id,
        "record_id": &record.record_id,
        "owner_id": record.owner_id.clone(),
        "game_id": record.game_id.clone(),
        "tags": record.tags.clone(),
        "properties": properties_to_bson(&record.properties),
        "blob_keys": record.blob_keys.clone(),
        "created_at": record.created_at,
        "updated_at": record.updated_at,
    }
}

fn doc_to_record(doc: &Document) -> Option<Record> {
    Some(Record {
        store_id: doc.get_str("store_id").ok()?.to_string(),
        record_id: doc.get_str("record_id").ok()?.to_string(),
        owner_id: doc.get_str("owner_id").ok().map(str::to_string),
        game_id: doc.get_str("game_id").ok().map(str::to_string),
        tags: doc
            .get_array("tags")
            .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default(),
        properties: doc
            .get_document("properties")
            .map(bson_to_properties)
            .unwrap_or_default(),
        blob_keys: doc
            .get_array("blob_keys")
            .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default(),
        created_at: doc.get_i64("created_at").ok()?,
        updated_at: doc.get_i64("updated_at").ok()?,
    })
}

fn metadata_to_doc(metadata: &MetadataDocument) -> Document {
    doc! {
        "metadata_type": &metadata.metadata_type,
        "metadata_id": &metadata.metadata_id,
        "data": properties_to_bson(&metadata.data),
        "created_at": metadata.created_at,
        "updated_at": metadata.updated_at,
    }
}

fn doc_to_metadata(doc: &Document) -> Option<MetadataDocument> {
    Some(MetadataDocument {
        metadata_type: doc.get_str("metadata_type").ok()?.to_string(),
        metadata_id: doc.get_str("metadata_id").ok()?.to_string(),
        data: doc.get_document("data").map(bson_to_properties).unwrap_or_default(),
        created_at: doc.get_i64("created_at").ok()?,
        updated_at: doc.get_i64("updated_at").ok()?,
    })
}

/// MongoDB-backed metadata store.
#[derive(Debug, Clone)]
pub struct MongoMetadataStore {
    stores: Collection<Document>,
    records: Collection<Document>,
    metadata: Collection<Document>,
}

impl MongoMetadataStore {
    #[must_use]
    pub fn new(client: &Client, database: &str) -> Self {
        let db = client.database(database);
        Self {
            stores: db.collection("stores"),
            records: db.collection("records"),
            metadata: db.collection("metadata"),
        }
    }

    /// Creates the indexes this adapter relies on. Idempotent; call once at
    /// startup.
    pub async fn ensure_indexes(&self) -> BackendResult<()> {
        let unique = IndexOptions::builder().unique(true).build();

        self.stores
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "store_id": 1 })
                    .options(unique.clone())
                    .build(),
            )
            .await
            .map_err(map_mongo_error)?;

        self.records
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "store_id": 1, "record_id": 1 })
                    .options(unique.clone())
                    .build(),
            )
            .await
            .map_err(map_mongo_error)?;
        self.records
            .create_index(IndexModel::builder().keys(doc! { "store_id": 1, "owner_id": 1 }).build())
            .await
            .map_err(map_mongo_error)?;
        self.records
            .create_index(IndexModel::builder().keys(doc! { "store_id": 1, "game_id": 1 }).build())
            .await
            .map_err(map_mongo_error)?;

        self.metadata
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "metadata_type": 1, "metadata_id": 1 })
                    .options(unique)
                    .build(),
            )
            .await
            .map_err(map_mongo_error)?;

        Ok(())
    }
}

#[async_trait]
impl MetadataStore for MongoMetadataStore {
    async fn create_store(&self, _ctx: &RequestCancel, store: Store) -> BackendResult<()> {
        self.stores
            .insert_one(store_to_doc(&store))
            .await
            .map_err(map_mongo_error)?;
        Ok(())
    }

    async fn get_store(&self, _ctx: &RequestCancel, store_id: &str) -> BackendResult<Option<Store>> {
        let found = self
            .stores
            .find_one(doc! { "store_id": store_id })
            .await
            .map_err(map_mongo_error)?;
        Ok(found.and_then(|d| doc_to_store(&d)))
    }

    async fn list_stores(&self, _ctx: &RequestCancel) -> BackendResult<Vec<Store>> {
        let mut cursor = self.stores.find(doc! {}).await.map_err(map_mongo_error)?;
        let mut out = Vec::new();
        while let Some(doc) = cursor.try_next().await.map_err(map_mongo_error)? {
            if let Some(store) = doc_to_store(&doc) {
                out.push(store);
            }
        }
        Ok(out)
    }

    async fn delete_store(&self, _ctx: &RequestCancel, store_id: &str) -> BackendResult<()> {
        self.stores
            .delete_one(doc! { "store_id": store_id })
            .await
            .map_err(map_mongo_error)?;
        Ok(())
    }

    async fn create_record(&self, _ctx: &RequestCancel, record: Record) -> BackendResult<()> {
        self.records
            .insert_one(record_to_doc(&record))
            .await
            .map_err(map_mongo_error)?;
        Ok(())
    }

    async fn get_record(
        &self,
        _ctx: &RequestCancel,
        store_id: &str,
        record_id: &str,
    ) -> BackendResult<Option<Record>> {
        let found = self
            .records
            .find_one(doc! { "store_id": store_id, "record_id": record_id })
            .await
            .map_err(map_mongo_error)?;
        Ok(found.and_then(|d| doc_to_record(&d)))
    }

    async fn update_record(&self, _ctx: &RequestCancel, record: Record) -> BackendResult<()> {
        self.records
            .replace_one(
                doc! { "store_id": &record.store_id, "record_id": &record.record_id },
                record_to_doc(&record),
            )
            .upsert(true)
            .await
            .map_err(map_mongo_error)?;
        Ok(())
    }

    async fn delete_record(
        &self,
        _ctx: &RequestCancel,
        store_id: &str,
        record_id: &str,
    ) -> BackendResult<()> {
        self.records
            .delete_one(doc! { "store_id": store_id, "record_id": record_id })
            .await
            .map_err(map_mongo_error)?;
        Ok(())
    }

    async fn query_records(
        &self,
        _ctx: &RequestCancel,
        store_id: &str,
        query: &RecordQuery,
    ) -> BackendResult<Vec<Record>> {
        let mut filter = doc! { "store_id": store_id };
        if let Some(owner_id) = &query.owner_id {
            filter.insert("owner_id", owner_id);
        }
        if let Some(game_id) = &query.game_id {
            filter.insert("game_id", game_id);
        }

        let mut options = FindOptions::builder()
            .sort(doc! { "created_at": -1, "record_id": 1 })
            .build();
        if query.limit > 0 {
            options.limit = Some(i64::from(query.limit));
        }

        let mut cursor = self.records.find(filter).with_options(options).await.map_err(map_mongo_error)?;
        let mut out = Vec::new();
        while let Some(doc) = cursor.try_next().await.map_err(map_mongo_error)? {
            if let Some(record) = doc_to_record(&doc) {
                out.push(record);
            }
        }
        Ok(out)
    }

    async fn scan_records_page(
        &self,
        _ctx: &RequestCancel,
        store_id: &str,
        offset: usize,
        page_size: usize,
    ) -> BackendResult<Vec<Record>> {
        let options = FindOptions::builder()
            .sort(doc! { "record_id": 1 })
            .skip(offset as u64)
            .limit(page_size as i64)
            .build();

        let mut cursor = self
            .records
            .find(doc! { "store_id": store_id })
            .with_options(options)
            .await
            .map_err(map_mongo_error)?;
        let mut out = Vec::new();
        while let Some(doc) = cursor.try_next().await.map_err(map_mongo_error)? {
            if let Some(record) = doc_to_record(&doc) {
                out.push(record);
            }
        }
        Ok(out)
    }

    async fn set_metadata(
        &self,
        ctx: &RequestCancel,
        metadata_type: &str,
        metadata_id: &str,
        data: serde_json::Map<String, serde_json::Value>,
        now: i64,
    ) -> BackendResult<()> {
        let created_at = self
            .get_metadata(ctx, metadata_type, metadata_id)
            .await?
            .map_or(now, |doc| doc.created_at);

        let metadata = MetadataDocument {
            metadata_type: metadata_type.to_string(),
            metadata_id: metadata_id.to_string(),
            data,
            created_at,
            updated_at: now,
        };

        self.metadata
            .replace_one(
                doc! { "metadata_type": metadata_type, "metadata_id": metadata_id },
                metadata_to_doc(&metadata),
            )
            .upsert(true)
            .await
            .map_err(map_mongo_error)?;
        Ok(())
    }

    async fn get_metadata(
        &self,
        _ctx: &RequestCancel,
        metadata_type: &str,
        metadata_id: &str,
    ) -> BackendResult<Option<MetadataDocument>> {
        let found = self
            .metadata
            .find_one(doc! { "metadata_type": metadata_type, "metadata_id": metadata_id })
            .await
            .map_err(map_mongo_error)?;
        Ok(found.and_then(|d| doc_to_metadata(&d)))
    }

    async fn delete_metadata(
        &self,
        _ctx: &RequestCancel,
        metadata_type: &str,
        metadata_id: &str,
    ) -> BackendResult<()> {
        self.metadata
            .delete_one(doc! { "metadata_type": metadata_type, "metadata_id": metadata_id })
            .await
            .map_err(map_mongo_error)?;
        Ok(())
    }

    async fn query_metadata(
        &self,
        _ctx: &RequestCancel,
        metadata_type: &str,
    ) -> BackendResult<Vec<MetadataDocument>> {
        let options = FindOptions::builder().sort(doc! { "created_at": -1 }).build();
        let mut cursor = self
            .metadata
            .find(doc! { "metadata_type": metadata_type })
            .with_options(options)
            .await
            .map_err(map_mongo_error)?;
        let mut out = Vec::new();
        while let Some(doc) = cursor.try_next().await.map_err(map_mongo_error)? {
            if let Some(metadata) = doc_to_metadata(&doc) {
                out.push(metadata);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_round_trips_through_bson_document() {
        let store = Store {
            store_id: "s1".to_string(),
            name: "My Store".to_string(),
            created_at: 100,
            updated_at: 200,
        };
        assert_eq!(doc_to_store(&store_to_doc(&store)), Some(store));
    }

    #[test]
    fn record_round_trips_through_bson_document() {
        let mut properties = serde_json::Map::new();
        properties.insert("level".to_string(), serde_json::Value::from(3));

        let record = Record {
            store_id: "s1".to_string(),
            record_id: "r1".to_string(),
            owner_id: Some("u1".to_string()),
            game_id: Some("g1".to_string()),
            tags: vec!["t".to_string()],
            properties,
            blob_keys: vec!["b".to_string()],
            created_at: 1,
            updated_at: 2,
        };
        assert_eq!(doc_to_record(&record_to_doc(&record)), Some(record));
    }
}
