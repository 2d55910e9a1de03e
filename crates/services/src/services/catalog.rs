//! Car catalog service: listing CRUD plus AI-assisted extraction.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use db::models::car::{Car, CarData, CarStatus, CreateCar};
use moka::future::Cache;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{
    auth::{self, AuthError, AuthIdentity},
    extraction::{self, ExtractionResult},
    gemini_api::{GeminiApiClient, GeminiApiError},
    image,
    rate_limit::{PolicyClient, PolicyDecision, PolicyError, RateLimitInfo},
    storage::{self, ObjectStore, StorageError},
};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("gemini api error: {0}")]
    Gemini(#[from] GeminiApiError),
    #[error("policy error: {0}")]
    Policy(#[from] PolicyError),
    #[error("no valid images were uploaded")]
    NoValidImages,
    #[error("car not found")]
    CarNotFound,
    #[error("invalid image payload")]
    InvalidImagePayload,
    #[error("rate limit exceeded")]
    RateLimited(RateLimitInfo),
    #[error("request denied by security policy")]
    PolicyDenied,
}

/// Orchestrates listings over the database, the image bucket, the AI
/// client, and the policy collaborator. Constructed once at startup.
pub struct CatalogService {
    pool: SqlitePool,
    store: Arc<dyn ObjectStore>,
    gemini: Option<GeminiApiClient>,
    policy: Arc<dyn PolicyClient>,
    listing_cache: Cache<String, Arc<Vec<CarData>>>,
}

impl CatalogService {
    const LISTING_CACHE_TTL: Duration = Duration::from_secs(60);

    pub fn new(
        pool: SqlitePool,
        store: Arc<dyn ObjectStore>,
        gemini: Option<GeminiApiClient>,
        policy: Arc<dyn PolicyClient>,
    ) -> Self {
        Self {
            pool,
            store,
            gemini,
            policy,
            listing_cache: Cache::builder()
                .time_to_live(Self::LISTING_CACHE_TTL)
                .build(),
        }
    }

    fn gemini(&self) -> Result<&GeminiApiClient, GeminiApiError> {
        self.gemini.as_ref().ok_or(GeminiApiError::MissingApiKey)
    }

    /// Create a listing. Malformed image payloads are skipped; an upload
    /// failure aborts the whole operation, and so does ending up with zero
    /// stored images. The record id is generated up front so image keys
    /// are namespaced under it.
    pub async fn add_car(
        &self,
        identity: &AuthIdentity,
        data: &CreateCar,
        images: &[String],
    ) -> Result<CarData, CatalogError> {
        auth::require_user(&self.pool, identity).await?;

        let car_id = Uuid::new_v4();
        let folder = format!("cars/{car_id}");

        let mut image_urls = Vec::new();
        for (index, payload) in images.iter().enumerate() {
            let Some(decoded) = image::decode_data_url(payload) else {
                warn!(index, "skipping malformed image payload");
                continue;
            };

            let key = format!(
                "{folder}/image-{}-{}.{}",
                Utc::now().timestamp_millis(),
                index,
                decoded.extension
            );
            let content_type = decoded.content_type();
            let url = self.store.upload(&key, decoded.bytes, &content_type).await?;
            image_urls.push(url);
        }

        if image_urls.is_empty() {
            return Err(CatalogError::NoValidImages);
        }

        let car = Car::create(&self.pool, car_id, data, &image_urls).await?;
        info!(car_id = %car.id, image_count = image_urls.len(), "car listing created");

        self.listing_cache.invalidate_all();
        Ok(car.into_data())
    }

    /// List cars, newest first, optionally filtered by a case-insensitive
    /// substring over make, model, or color.
    pub async fn get_cars(
        &self,
        identity: &AuthIdentity,
        search: Option<&str>,
    ) -> Result<Vec<CarData>, CatalogError> {
        auth::require_user(&self.pool, identity).await?;

        let cache_key = search.unwrap_or_default().trim().to_lowercase();
        if let Some(hit) = self.listing_cache.get(&cache_key).await {
            return Ok(hit.as_ref().clone());
        }

        let cars = Car::find_all(&self.pool, search).await?;
        let data: Vec<CarData> = cars.into_iter().map(Car::into_data).collect();
        self.listing_cache
            .insert(cache_key, Arc::new(data.clone()))
            .await;
        Ok(data)
    }

    /// Featured, available cars for the public landing page.
    pub async fn get_featured_cars(&self, limit: i64) -> Result<Vec<CarData>, CatalogError> {
        let cars = Car::find_featured(&self.pool, limit).await?;
        Ok(cars.into_iter().map(Car::into_data).collect())
    }

    /// Delete a listing. The database row is removed first; stored images
    /// are then cleaned up best-effort, and cleanup failures do not undo
    /// the delete.
    pub async fn delete_car(&self, identity: &AuthIdentity, id: Uuid) -> Result<(), CatalogError> {
        auth::require_user(&self.pool, identity).await?;

        let car = Car::find_by_id(&self.pool, id)
            .await?
            .ok_or(CatalogError::CarNotFound)?;
        let image_urls = car.image_urls();

        Car::delete(&self.pool, id).await?;

        for url in &image_urls {
            let Some(key) = storage::object_key_from_url(url) else {
                warn!(url = %url, "could not derive storage key from image url");
                continue;
            };
            if let Err(e) = self.store.remove(&key).await {
                error!(key = %key, error = %e, "failed to delete car image");
            }
        }

        info!(car_id = %id, "car listing deleted");
        self.listing_cache.invalidate_all();
        Ok(())
    }

    /// Partial update of status and/or featured.
    pub async fn update_car_status(
        &self,
        identity: &AuthIdentity,
        id: Uuid,
        status: Option<CarStatus>,
        featured: Option<bool>,
    ) -> Result<(), CatalogError> {
        auth::require_user(&self.pool, identity).await?;

        let updated = Car::update_status(&self.pool, id, status, featured).await?;
        if updated == 0 {
            return Err(CatalogError::CarNotFound);
        }

        self.listing_cache.invalidate_all();
        Ok(())
    }

    /// AI prefill for the add-car form: extract the full listing schema
    /// from a photo.
    pub async fn process_car_image(
        &self,
        identity: &AuthIdentity,
        image_payload: &str,
    ) -> Result<ExtractionResult, CatalogError> {
        auth::require_user(&self.pool, identity).await?;

        let decoded =
            image::decode_data_url(image_payload).ok_or(CatalogError::InvalidImagePayload)?;
        let reply = self
            .gemini()?
            .analyze_image(
                &decoded.content_type(),
                &decoded.base64,
                extraction::LISTING_PROMPT,
            )
            .await?;
        Ok(extraction::normalize_listing(&reply))
    }

    /// Public image search: rate-limited per caller address, then
    /// extracted against the narrow search schema.
    pub async fn process_image_search(
        &self,
        client_ip: &str,
        image_payload: &str,
    ) -> Result<ExtractionResult, CatalogError> {
        match self.policy.check(client_ip, 1).await? {
            PolicyDecision::Allow => {}
            PolicyDecision::DenyRateLimited(info) => {
                error!(
                    remaining = info.remaining,
                    reset_seconds = info.reset_seconds,
                    "image search rate limit exceeded"
                );
                return Err(CatalogError::RateLimited(info));
            }
            PolicyDecision::Deny => return Err(CatalogError::PolicyDenied),
        }

        let decoded =
            image::decode_data_url(image_payload).ok_or(CatalogError::InvalidImagePayload)?;
        let reply = self
            .gemini()?
            .analyze_image(
                &decoded.content_type(),
                &decoded.base64,
                extraction::SEARCH_PROMPT,
            )
            .await?;
        Ok(extraction::normalize_search(&reply))
    }
}
