//! Object storage gateway for listing images.

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use url::Url;

/// Bucket holding all listing images.
pub const CAR_IMAGES_BUCKET: &str = "car-images";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("invalid storage base url: {0}")]
    InvalidBaseUrl(String),
}

/// Seam over the image bucket so the catalog service can be exercised
/// without a live backend.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload an object and return its public URL.
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError>;

    /// Delete an object by key.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Supabase storage client talking to the storage REST API.
#[derive(Debug, Clone)]
pub struct SupabaseStorage {
    http: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseStorage {
    pub fn new(base_url: &str, service_key: String) -> Result<Self, StorageError> {
        // Validate early so a bad URL fails at startup, not per upload.
        Url::parse(base_url).map_err(|e| StorageError::InvalidBaseUrl(e.to_string()))?;

        let http = Client::builder()
            .user_agent(concat!("carhub/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StorageError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
        })
    }

    /// Public URL for an object key in the car-images bucket.
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, CAR_IMAGES_BUCKET, key
        )
    }

    fn object_endpoint(&self, key: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, CAR_IMAGES_BUCKET, key)
    }
}

#[async_trait]
impl ObjectStore for SupabaseStorage {
    async fn upload(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let res = self
            .http
            .post(self.object_endpoint(key))
            .bearer_auth(&self.service_key)
            .header("content-type", content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(StorageError::Http { status, body });
        }

        Ok(self.public_url(key))
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let res = self
            .http
            .delete(self.object_endpoint(key))
            .bearer_auth(&self.service_key)
            .send()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(StorageError::Http { status, body });
        }

        Ok(())
    }
}

/// Derive the object key from a public URL, i.e. everything after the
/// bucket segment. Returns `None` for URLs that don't point into the
/// car-images bucket.
pub fn object_key_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let marker = format!("/{CAR_IMAGES_BUCKET}/");
    let path = parsed.path();
    let start = path.find(&marker)? + marker.len();
    let key = &path[start..];
    if key.is_empty() { None } else { Some(key.to_string()) }
}
