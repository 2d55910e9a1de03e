//! Public routes backing the browsing site.

use axum::{
    Router,
    extract::{Query, State},
    http::HeaderMap,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::car::CarData;
use serde::Deserialize;
use services::services::extraction::ExtractionResult;
use utils::response::ApiResponse;

use crate::{
    error::ApiError,
    extract::client_ip,
    routes::cars::ImagePayload,
    state::AppState,
};

const DEFAULT_FEATURED_LIMIT: i64 = 3;

#[derive(Debug, Deserialize)]
pub struct FeaturedCarsQuery {
    pub limit: Option<i64>,
}

pub async fn get_featured_cars(
    State(state): State<AppState>,
    Query(query): Query<FeaturedCarsQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<CarData>>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_FEATURED_LIMIT);
    let cars = state.catalog.get_featured_cars(limit).await?;
    Ok(ResponseJson(ApiResponse::success(cars)))
}

/// Public image-based search: rate-limited per caller address.
pub async fn image_search(
    State(state): State<AppState>,
    headers: HeaderMap,
    axum::Json(payload): axum::Json<ImagePayload>,
) -> Result<ResponseJson<ExtractionResult>, ApiError> {
    let ip = client_ip(&headers);
    let result = state
        .catalog
        .process_image_search(&ip, &payload.image)
        .await?;
    Ok(ResponseJson(result))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/featured-cars", get(get_featured_cars))
        .route("/image-search", post(image_search))
}
