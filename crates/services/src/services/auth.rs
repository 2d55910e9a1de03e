//! Auth resolver: verifies bearer tokens from the external auth provider
//! and maps the caller identity onto a persisted [`User`] record.
//!
//! Users are created on first successful authentication. The canonical
//! identity field is the provider's subject claim, stored as
//! `auth_user_id`.

use db::models::user::{CreateUser, User};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("admin access required")]
    AdminRequired,
    #[error("user not found")]
    UserNotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Verified caller identity, straight from the token claims.
#[derive(Debug, Clone)]
pub struct AuthIdentity {
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    email: Option<String>,
    user_metadata: Option<UserMetadata>,
}

#[derive(Debug, Deserialize)]
struct UserMetadata {
    full_name: Option<String>,
    avatar_url: Option<String>,
}

/// Verifies provider-issued JWTs (HS256, shared signing secret).
#[derive(Clone)]
pub struct AuthService {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthService {
    pub fn new(jwt_secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Audience varies between provider token types; the signature and
        // expiry checks are what gate access.
        validation.validate_aud = false;
        Self {
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Verify a bearer token and return the caller identity.
    pub fn verify_bearer(&self, token: &str) -> Result<AuthIdentity, AuthError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!(error = %e, "token verification failed");
                AuthError::Unauthorized
            })?;

        let claims = data.claims;
        let metadata = claims.user_metadata;
        Ok(AuthIdentity {
            subject: claims.sub,
            email: claims.email,
            name: metadata.as_ref().and_then(|m| m.full_name.clone()),
            avatar_url: metadata.and_then(|m| m.avatar_url),
        })
    }

    /// Resolve an identity to its user record, creating the record on
    /// first sight.
    pub async fn sync_user(
        &self,
        pool: &SqlitePool,
        identity: &AuthIdentity,
    ) -> Result<User, AuthError> {
        if let Some(user) = User::find_by_auth_id(pool, &identity.subject).await? {
            return Ok(user);
        }

        let name = identity
            .name
            .clone()
            .or_else(|| {
                identity
                    .email
                    .as_deref()
                    .and_then(|e| e.split('@').next())
                    .map(|s| s.to_string())
            })
            .unwrap_or_else(|| "User".to_string());

        let user = User::create(
            pool,
            &CreateUser {
                auth_user_id: identity.subject.clone(),
                email: identity.email.clone(),
                name,
                image_url: identity.avatar_url.clone(),
            },
        )
        .await?;

        info!(user_id = %user.id, "created user on first authentication");
        Ok(user)
    }
}

/// Look up the persisted user for an identity; absence is an error.
pub async fn require_user(pool: &SqlitePool, identity: &AuthIdentity) -> Result<User, AuthError> {
    User::find_by_auth_id(pool, &identity.subject)
        .await?
        .ok_or(AuthError::UserNotFound)
}

/// Like [`require_user`], but the user must hold the admin role.
pub async fn require_admin(pool: &SqlitePool, identity: &AuthIdentity) -> Result<User, AuthError> {
    let user = require_user(pool, identity).await?;
    if !user.is_admin() {
        return Err(AuthError::AdminRequired);
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use db::MIGRATOR;
    use db::models::user::UserRole;
    use jsonwebtoken::{EncodingKey, Header};
    use serde::Serialize;
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    const SECRET: &str = "test-signing-secret";

    #[derive(Serialize)]
    struct TestClaims<'a> {
        sub: &'a str,
        email: Option<&'a str>,
        user_metadata: Option<serde_json::Value>,
        exp: i64,
    }

    fn token(sub: &str, email: Option<&str>, metadata: Option<serde_json::Value>) -> String {
        let claims = TestClaims {
            sub,
            email,
            user_metadata: metadata,
            exp: chrono::Utc::now().timestamp() + 3600,
        };
        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        MIGRATOR.run(&pool).await.unwrap();
        pool
    }

    #[test]
    fn test_verify_bearer_roundtrip() {
        let auth = AuthService::new(SECRET);
        let identity = auth
            .verify_bearer(&token(
                "auth-1",
                Some("jo@example.com"),
                Some(serde_json::json!({"full_name": "Jo Driver", "avatar_url": "https://img"})),
            ))
            .unwrap();
        assert_eq!(identity.subject, "auth-1");
        assert_eq!(identity.email.as_deref(), Some("jo@example.com"));
        assert_eq!(identity.name.as_deref(), Some("Jo Driver"));
        assert_eq!(identity.avatar_url.as_deref(), Some("https://img"));
    }

    #[test]
    fn test_verify_bearer_rejects_wrong_secret() {
        let auth = AuthService::new("another-secret");
        let err = auth.verify_bearer(&token("auth-1", None, None)).unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized));
    }

    #[tokio::test]
    async fn test_sync_user_creates_once() {
        let pool = test_pool().await;
        let auth = AuthService::new(SECRET);
        let identity = AuthIdentity {
            subject: "auth-7".to_string(),
            email: Some("pat@example.com".to_string()),
            name: None,
            avatar_url: None,
        };

        let created = auth.sync_user(&pool, &identity).await.unwrap();
        // Name falls back to the local part of the email.
        assert_eq!(created.name, "pat");
        assert_eq!(created.role, UserRole::User);

        let again = auth.sync_user(&pool, &identity).await.unwrap();
        assert_eq!(again.id, created.id);
    }

    #[tokio::test]
    async fn test_require_user_without_record() {
        let pool = test_pool().await;
        let identity = AuthIdentity {
            subject: "missing".to_string(),
            email: None,
            name: None,
            avatar_url: None,
        };
        let err = require_user(&pool, &identity).await.unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));
    }
}
