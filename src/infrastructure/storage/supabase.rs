use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use zeroize::Zeroizing;

use super::{validate_object_path, ObjectStorage, StorageError, StoredObject};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the Supabase Storage REST API using the service-role key.
#[derive(Clone)]
pub struct SupabaseStorage {
    client: Client,
    base_url: String,
    service_key: Zeroizing<String>,
}

impl SupabaseStorage {
    pub fn new(base_url: &str, service_key: &str) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(SupabaseStorage {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: Zeroizing::new(service_key.to_string()),
        })
    }

    fn object_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, path)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .bearer_auth(self.service_key.as_str())
            .header("apikey", self.service_key.as_str())
    }
}

async fn error_body(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    format!("{status}: {body}")
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, StorageError> {
        validate_object_path(path)?;

        let response = self
            .authorized(self.client.post(self.object_url(bucket, path)))
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CACHE_CONTROL, "max-age=3600")
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await
            .map_err(|e| StorageError::Upload(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StorageError::Upload(error_body(response).await));
        }

        tracing::debug!(bucket, path, "Uploaded object to Supabase storage");

        Ok(StoredObject {
            bucket: bucket.to_string(),
            path: path.to_string(),
            public_url: self.public_url(bucket, path),
        })
    }

    async fn delete(&self, bucket: &str, path: &str) -> Result<(), StorageError> {
        validate_object_path(path)?;

        let response = self
            .authorized(self.client.delete(self.object_url(bucket, path)))
            .send()
            .await
            .map_err(|e| StorageError::Delete(e.to_string()))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(StorageError::NotFound(format!("{bucket}/{path}"))),
            _ => Err(StorageError::Delete(error_body(response).await)),
        }
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, bucket, path)
    }

    fn backend_name(&self) -> &'static str {
        "supabase"
    }
}
