use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::{
    auth::AuthError, catalog::CatalogError, settings::SettingsError,
};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

fn auth_status(error: &AuthError) -> (StatusCode, String) {
    match error {
        AuthError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        AuthError::AdminRequired => (
            StatusCode::FORBIDDEN,
            "Unauthorized: Admin access required".to_string(),
        ),
        AuthError::UserNotFound => (StatusCode::NOT_FOUND, "User not found".to_string()),
        AuthError::Database(e) => {
            tracing::error!(error = %e, "database error during auth");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

fn catalog_status(error: &CatalogError) -> (StatusCode, String) {
    match error {
        CatalogError::Auth(e) => auth_status(e),
        CatalogError::Database(e) => {
            tracing::error!(error = %e, "database error in catalog");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
        CatalogError::Storage(e) => {
            tracing::error!(error = %e, "storage error in catalog");
            (
                StatusCode::BAD_GATEWAY,
                "Failed to upload image".to_string(),
            )
        }
        // The Gemini error text carries the model-override remediation
        // hint; surface it.
        CatalogError::Gemini(e) => (StatusCode::BAD_GATEWAY, format!("Gemini API error: {e}")),
        CatalogError::Policy(e) => {
            tracing::error!(error = %e, "policy check failed");
            (StatusCode::BAD_GATEWAY, "Policy check failed".to_string())
        }
        CatalogError::NoValidImages => (
            StatusCode::BAD_REQUEST,
            "No valid images were uploaded".to_string(),
        ),
        CatalogError::CarNotFound => (StatusCode::NOT_FOUND, "Car not found".to_string()),
        CatalogError::InvalidImagePayload => (
            StatusCode::BAD_REQUEST,
            "Invalid image payload".to_string(),
        ),
        CatalogError::RateLimited(_) => (
            StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded. Please try again later.".to_string(),
        ),
        CatalogError::PolicyDenied => (
            StatusCode::FORBIDDEN,
            "Request denied by security policy.".to_string(),
        ),
    }
}

fn settings_status(error: &SettingsError) -> (StatusCode, String) {
    match error {
        SettingsError::Auth(e) => auth_status(e),
        SettingsError::Database(e) => {
            tracing::error!(error = %e, "database error in settings");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
        SettingsError::DealershipNotFound => (
            StatusCode::NOT_FOUND,
            "Dealership info not found".to_string(),
        ),
        SettingsError::UserNotFound => (StatusCode::NOT_FOUND, "User not found".to_string()),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Auth(e) => auth_status(e),
            ApiError::Catalog(e) => catalog_status(e),
            ApiError::Settings(e) => settings_status(e),
        };
        (status, Json(ApiResponse::error(message))).into_response()
    }
}
