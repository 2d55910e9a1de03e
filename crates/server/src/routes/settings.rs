//! Routes for dealership settings and user administration.

use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, patch, put},
};
use db::models::{
    dealership::{CreateWorkingHours, DealershipInfoData},
    user::{User, UserRole},
};
use serde::Deserialize;
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{error::ApiError, extract::AuthSession, state::AppState};

#[derive(Debug, Deserialize, TS)]
pub struct UpdateUserRoleRequest {
    pub role: UserRole,
}

pub async fn get_dealership_info(
    State(state): State<AppState>,
    AuthSession(identity): AuthSession,
) -> Result<ResponseJson<ApiResponse<DealershipInfoData>>, ApiError> {
    let data = state.settings.get_dealership_info(&identity).await?;
    Ok(ResponseJson(ApiResponse::success(data)))
}

/// Replace the full weekly schedule.
pub async fn save_working_hours(
    State(state): State<AppState>,
    AuthSession(identity): AuthSession,
    axum::Json(hours): axum::Json<Vec<CreateWorkingHours>>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state.settings.save_working_hours(&identity, &hours).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn get_users(
    State(state): State<AppState>,
    AuthSession(identity): AuthSession,
) -> Result<ResponseJson<ApiResponse<Vec<User>>>, ApiError> {
    let users = state.settings.get_users(&identity).await?;
    Ok(ResponseJson(ApiResponse::success(users)))
}

pub async fn update_user_role(
    State(state): State<AppState>,
    AuthSession(identity): AuthSession,
    Path(auth_user_id): Path<String>,
    axum::Json(payload): axum::Json<UpdateUserRoleRequest>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state
        .settings
        .update_user_role(&identity, &auth_user_id, payload.role)
        .await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new().nest(
        "/settings",
        Router::new()
            .route("/dealership", get(get_dealership_info))
            .route("/working-hours", put(save_working_hours))
            .route("/users", get(get_users))
            .route("/users/{auth_user_id}/role", patch(update_user_role)),
    )
}
