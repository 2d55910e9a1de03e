use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, TS, EnumString, Display, Default,
)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

/// A dealership user, keyed by the external auth provider's subject.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct User {
    pub id: Uuid,
    pub auth_user_id: String,
    pub email: Option<String>,
    pub name: String,
    pub image_url: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateUser {
    pub auth_user_id: String,
    pub email: Option<String>,
    pub name: String,
    pub image_url: Option<String>,
}

const USER_COLUMNS: &str =
    "id, auth_user_id, email, name, image_url, role, created_at, updated_at";

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub async fn find_by_auth_id(
        pool: &SqlitePool,
        auth_user_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE auth_user_id = $1"
        ))
        .bind(auth_user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(pool: &SqlitePool, data: &CreateUser) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, auth_user_id, email, name, image_url)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(&data.auth_user_id)
        .bind(&data.email)
        .bind(&data.name)
        .bind(data.image_url.as_deref().unwrap_or_default())
        .fetch_one(pool)
        .await
    }

    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(pool)
        .await
    }

    /// Overwrite the role of the user identified by the external auth
    /// subject. Returns the number of rows touched.
    pub async fn update_role_by_auth_id(
        pool: &SqlitePool,
        auth_user_id: &str,
        role: UserRole,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET role = $2, updated_at = datetime('now', 'subsec')
             WHERE auth_user_id = $1",
        )
        .bind(auth_user_id)
        .bind(role)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
