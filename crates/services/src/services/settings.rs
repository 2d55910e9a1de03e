//! Settings service: dealership info, working hours, user administration.

use db::models::{
    dealership::{CreateWorkingHours, DealershipInfo, DealershipInfoData, WorkingHours},
    user::{User, UserRole},
};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

use super::auth::{self, AuthError, AuthIdentity};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("dealership info not found")]
    DealershipNotFound,
    #[error("user not found")]
    UserNotFound,
}

pub struct SettingsService {
    pool: SqlitePool,
}

impl SettingsService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Fetch the dealership singleton, creating it with the default weekly
    /// schedule on first read.
    pub async fn get_dealership_info(
        &self,
        identity: &AuthIdentity,
    ) -> Result<DealershipInfoData, SettingsError> {
        auth::require_user(&self.pool, identity).await?;

        let info = match DealershipInfo::find_first(&self.pool).await? {
            Some(info) => info,
            None => {
                let info = DealershipInfo::create_with_default_hours(&self.pool).await?;
                info!(dealership_id = %info.id, "created dealership info with default hours");
                info
            }
        };

        let working_hours = WorkingHours::find_for_dealership(&self.pool, info.id).await?;
        Ok(DealershipInfoData {
            info,
            working_hours,
        })
    }

    /// Replace the full weekly schedule. Admin only; the delete+insert
    /// pair runs in one transaction.
    pub async fn save_working_hours(
        &self,
        identity: &AuthIdentity,
        hours: &[CreateWorkingHours],
    ) -> Result<(), SettingsError> {
        auth::require_admin(&self.pool, identity).await?;

        let info = DealershipInfo::find_first(&self.pool)
            .await?
            .ok_or(SettingsError::DealershipNotFound)?;

        WorkingHours::replace_for_dealership(&self.pool, info.id, hours).await?;
        info!(dealership_id = %info.id, count = hours.len(), "working hours replaced");
        Ok(())
    }

    /// List all users, newest first. Admin only.
    pub async fn get_users(&self, identity: &AuthIdentity) -> Result<Vec<User>, SettingsError> {
        auth::require_admin(&self.pool, identity).await?;
        Ok(User::find_all(&self.pool).await?)
    }

    /// Overwrite the role of the user identified by the external auth
    /// subject. Admin only.
    pub async fn update_user_role(
        &self,
        identity: &AuthIdentity,
        auth_user_id: &str,
        role: UserRole,
    ) -> Result<(), SettingsError> {
        auth::require_admin(&self.pool, identity).await?;

        let updated = User::update_role_by_auth_id(&self.pool, auth_user_id, role).await?;
        if updated == 0 {
            return Err(SettingsError::UserNotFound);
        }

        info!(auth_user_id = %auth_user_id, role = %role, "user role updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use db::MIGRATOR;
    use db::models::dealership::DayOfWeek;
    use db::models::user::CreateUser;
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        MIGRATOR.run(&pool).await.unwrap();
        pool
    }

    async fn seed_user(pool: &SqlitePool, auth_id: &str, role: UserRole) -> User {
        let user = User::create(
            pool,
            &CreateUser {
                auth_user_id: auth_id.to_string(),
                email: None,
                name: auth_id.to_string(),
                image_url: None,
            },
        )
        .await
        .unwrap();
        if role == UserRole::Admin {
            User::update_role_by_auth_id(pool, auth_id, UserRole::Admin)
                .await
                .unwrap();
        }
        user
    }

    fn identity(subject: &str) -> AuthIdentity {
        AuthIdentity {
            subject: subject.to_string(),
            email: None,
            name: None,
            avatar_url: None,
        }
    }

    fn weekly(open: &str, close: &str) -> Vec<CreateWorkingHours> {
        [
            DayOfWeek::Monday,
            DayOfWeek::Tuesday,
            DayOfWeek::Wednesday,
            DayOfWeek::Thursday,
            DayOfWeek::Friday,
            DayOfWeek::Saturday,
            DayOfWeek::Sunday,
        ]
        .into_iter()
        .map(|day| CreateWorkingHours {
            day_of_week: day,
            open_time: open.to_string(),
            close_time: close.to_string(),
            is_open: day != DayOfWeek::Sunday,
        })
        .collect()
    }

    #[tokio::test]
    async fn test_get_dealership_info_creates_default_schedule() {
        let pool = test_pool().await;
        seed_user(&pool, "auth-1", UserRole::User).await;
        let settings = SettingsService::new(pool);

        let data = settings
            .get_dealership_info(&identity("auth-1"))
            .await
            .unwrap();

        assert_eq!(data.working_hours.len(), 7);
        assert_eq!(data.working_hours[0].day_of_week, DayOfWeek::Monday);
        assert_eq!(data.working_hours[0].open_time, "09:00");
        assert_eq!(data.working_hours[5].day_of_week, DayOfWeek::Saturday);
        assert_eq!(data.working_hours[5].open_time, "10:00");
        assert!(data.working_hours[5].is_open);
        assert_eq!(data.working_hours[6].day_of_week, DayOfWeek::Sunday);
        assert!(!data.working_hours[6].is_open);
    }

    #[tokio::test]
    async fn test_get_dealership_info_is_a_singleton() {
        let pool = test_pool().await;
        seed_user(&pool, "auth-1", UserRole::User).await;
        let settings = SettingsService::new(pool);

        let first = settings
            .get_dealership_info(&identity("auth-1"))
            .await
            .unwrap();
        let second = settings
            .get_dealership_info(&identity("auth-1"))
            .await
            .unwrap();
        assert_eq!(first.info.id, second.info.id);
    }

    #[tokio::test]
    async fn test_save_working_hours_replaces_wholesale() {
        let pool = test_pool().await;
        seed_user(&pool, "admin", UserRole::Admin).await;
        let settings = SettingsService::new(pool);

        // Seed the singleton (and its defaults), then replace.
        settings
            .get_dealership_info(&identity("admin"))
            .await
            .unwrap();
        settings
            .save_working_hours(&identity("admin"), &weekly("08:00", "20:00"))
            .await
            .unwrap();

        let data = settings
            .get_dealership_info(&identity("admin"))
            .await
            .unwrap();
        assert_eq!(data.working_hours.len(), 7);
        for (hours, expected_day) in data.working_hours.iter().zip([
            DayOfWeek::Monday,
            DayOfWeek::Tuesday,
            DayOfWeek::Wednesday,
            DayOfWeek::Thursday,
            DayOfWeek::Friday,
            DayOfWeek::Saturday,
            DayOfWeek::Sunday,
        ]) {
            assert_eq!(hours.day_of_week, expected_day);
            assert_eq!(hours.open_time, "08:00");
            assert_eq!(hours.close_time, "20:00");
        }
    }

    #[tokio::test]
    async fn test_save_working_hours_requires_admin() {
        let pool = test_pool().await;
        seed_user(&pool, "auth-1", UserRole::User).await;
        let settings = SettingsService::new(pool);

        settings
            .get_dealership_info(&identity("auth-1"))
            .await
            .unwrap();
        let err = settings
            .save_working_hours(&identity("auth-1"), &weekly("08:00", "20:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, SettingsError::Auth(AuthError::AdminRequired)));
    }

    #[tokio::test]
    async fn test_update_user_role_requires_admin() {
        let pool = test_pool().await;
        seed_user(&pool, "auth-1", UserRole::User).await;
        let target = seed_user(&pool, "auth-2", UserRole::User).await;
        let settings = SettingsService::new(pool.clone());

        let err = settings
            .update_user_role(&identity("auth-1"), "auth-2", UserRole::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, SettingsError::Auth(AuthError::AdminRequired)));

        // Role unchanged.
        let unchanged = User::find_by_auth_id(&pool, "auth-2").await.unwrap().unwrap();
        assert_eq!(unchanged.role, target.role);
    }

    #[tokio::test]
    async fn test_update_user_role_as_admin() {
        let pool = test_pool().await;
        seed_user(&pool, "admin", UserRole::Admin).await;
        seed_user(&pool, "auth-2", UserRole::User).await;
        let settings = SettingsService::new(pool.clone());

        settings
            .update_user_role(&identity("admin"), "auth-2", UserRole::Admin)
            .await
            .unwrap();

        let updated = User::find_by_auth_id(&pool, "auth-2").await.unwrap().unwrap();
        assert_eq!(updated.role, UserRole::Admin);
    }

    #[tokio::test]
    async fn test_update_user_role_unknown_subject() {
        let pool = test_pool().await;
        seed_user(&pool, "admin", UserRole::Admin).await;
        let settings = SettingsService::new(pool);

        let err = settings
            .update_user_role(&identity("admin"), "ghost", UserRole::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, SettingsError::UserNotFound));
    }

    #[tokio::test]
    async fn test_get_users_requires_admin() {
        let pool = test_pool().await;
        seed_user(&pool, "auth-1", UserRole::User).await;
        let settings = SettingsService::new(pool);

        let err = settings.get_users(&identity("auth-1")).await.unwrap_err();
        assert!(matches!(err, SettingsError::Auth(AuthError::AdminRequired)));
    }
}
