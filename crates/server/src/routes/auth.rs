//! Routes wiring the external auth provider to local user records.

use axum::{
    Router,
    extract::State,
    http::HeaderMap,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::user::User;
use serde::Serialize;
use services::services::auth::AuthError;
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{error::ApiError, extract::identity_from_headers, state::AppState};

#[derive(Debug, Serialize, TS)]
pub struct CheckAdminResponse {
    pub is_admin: bool,
}

/// Ensure the caller has a user record, creating one on first sight.
pub async fn sync_user(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    let identity = identity_from_headers(&headers, &state.auth)
        .ok_or(ApiError::Auth(AuthError::Unauthorized))?;
    let user = state.auth.sync_user(&state.db.pool, &identity).await?;
    Ok(ResponseJson(ApiResponse::success(user)))
}

/// Admin probe for the UI. Never fails: any problem reads as "not admin".
pub async fn check_admin(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ResponseJson<CheckAdminResponse> {
    let is_admin = match identity_from_headers(&headers, &state.auth) {
        Some(identity) => User::find_by_auth_id(&state.db.pool, &identity.subject)
            .await
            .ok()
            .flatten()
            .map(|user| user.is_admin())
            .unwrap_or(false),
        None => false,
    };
    ResponseJson(CheckAdminResponse { is_admin })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sync-user", post(sync_user))
        .route("/check-admin", get(check_admin))
}
