//! Routes for the admin car catalog.

use axum::{
    Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::{delete, patch, post},
};
use db::models::car::{CarData, CarStatus, CreateCar};
use serde::Deserialize;
use services::services::extraction::ExtractionResult;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{error::ApiError, extract::AuthSession, state::AppState};

#[derive(Debug, Deserialize, TS)]
pub struct AddCarRequest {
    pub car_data: CreateCar,
    pub images: Vec<String>,
}

#[derive(Debug, Deserialize, TS)]
pub struct UpdateCarStatusRequest {
    pub status: Option<CarStatus>,
    pub featured: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ListCarsQuery {
    pub search: Option<String>,
}

/// Image payload as a `data:image/...;base64,` string.
#[derive(Debug, Deserialize, TS)]
pub struct ImagePayload {
    pub image: String,
}

pub async fn add_car(
    State(state): State<AppState>,
    AuthSession(identity): AuthSession,
    axum::Json(payload): axum::Json<AddCarRequest>,
) -> Result<ResponseJson<ApiResponse<CarData>>, ApiError> {
    let car = state
        .catalog
        .add_car(&identity, &payload.car_data, &payload.images)
        .await?;
    Ok(ResponseJson(ApiResponse::success(car)))
}

pub async fn get_cars(
    State(state): State<AppState>,
    AuthSession(identity): AuthSession,
    Query(query): Query<ListCarsQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<CarData>>>, ApiError> {
    let cars = state
        .catalog
        .get_cars(&identity, query.search.as_deref())
        .await?;
    Ok(ResponseJson(ApiResponse::success(cars)))
}

pub async fn delete_car(
    State(state): State<AppState>,
    AuthSession(identity): AuthSession,
    Path(car_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state.catalog.delete_car(&identity, car_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn update_car_status(
    State(state): State<AppState>,
    AuthSession(identity): AuthSession,
    Path(car_id): Path<Uuid>,
    axum::Json(payload): axum::Json<UpdateCarStatusRequest>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state
        .catalog
        .update_car_status(&identity, car_id, payload.status, payload.featured)
        .await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

/// AI prefill: extract listing attributes from a photo.
pub async fn process_car_image(
    State(state): State<AppState>,
    AuthSession(identity): AuthSession,
    axum::Json(payload): axum::Json<ImagePayload>,
) -> Result<ResponseJson<ExtractionResult>, ApiError> {
    let result = state
        .catalog
        .process_car_image(&identity, &payload.image)
        .await?;
    Ok(ResponseJson(result))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/cars",
        Router::new()
            .route("/", post(add_car).get(get_cars))
            .route("/extract", post(process_car_image))
            .route("/{car_id}", delete(delete_car))
            .route("/{car_id}/status", patch(update_car_status)),
    )
}
