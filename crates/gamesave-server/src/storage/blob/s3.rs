//! S3-backed [`BlobStore`].

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use gamesave_core::{BackendError, BackendResult};

use super::{BlobPayload, BlobStore};
use crate::storage::metadata::RequestCancel;

fn map_sdk_error(err: impl std::error::Error + Send + Sync + 'static) -> BackendError {
    BackendError::Transient(err.to_string())
}

/// S3-backed blob store.
#[derive(Debug, Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    #[must_use]
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    pub async fn from_env(region: Option<String>, bucket: impl Into<String>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region));
        }
        let config = loader.load().await;
        Self::new(Client::new(&config), bucket)
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn head(&self, _ctx: &RequestCancel, key: &str) -> BackendResult<bool> {
        match self.client.head_object().bucket(&self.bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(err) if err.as_service_error().is_some_and(|e| e.is_not_found()) => Ok(false),
            Err(err) => Err(map_sdk_error(err)),
        }
    }

    async fn get(&self, _ctx: &RequestCancel, key: &str) -> BackendResult<Option<BlobPayload>> {
        let result = self.client.get_object().bucket(&self.bucket).key(key).send().await;

        let output = match result {
            Ok(output) => output,
            Err(err) if err.as_service_error().is_some_and(|e| e.is_no_such_key()) => return Ok(None),
            Err(err) => return Err(map_sdk_error(err)),
        };

        let content_type = output.content_type().map(str::to_string);
        let body = output.body.collect().await.map_err(map_sdk_error)?;
        Ok(Some(BlobPayload {
            bytes: body.into_bytes(),
            content_type,
        }))
    }

    async fn put(&self, _ctx: &RequestCancel, key: &str, payload: BlobPayload) -> BackendResult<()> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(payload.bytes));
        if let Some(content_type) = payload.content_type {
            request = request.content_type(content_type);
        }
        request.send().await.map_err(map_sdk_error)?;
        Ok(())
    }

    async fn delete(&self, _ctx: &RequestCancel, key: &str) -> BackendResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(())
    }

    async fn list(&self, _ctx: &RequestCancel, prefix: &str) -> BackendResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation_token = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(&self.bucket).prefix(prefix);
            if let Some(token) = continuation_token.take() {
                request = request.continuation_token(token);
            }
            let output = request.send().await.map_err(map_sdk_error)?;

            keys.extend(output.contents().iter().filter_map(|obj| obj.key().map(str::to_string)));

            if output.is_truncated().unwrap_or(false) {
                continuation_token = output.next_continuation_token().map(str::to_string);
            } else {
                break;
            }
        }
        Ok(keys)
    }
}

