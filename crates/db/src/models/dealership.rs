use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

/// Day of the week for working hours. The declaration order is the sort
/// order used when returning a weekly schedule.
#[derive(
    Debug,
    Clone,
    Copy,
    Type,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    TS,
    EnumString,
    Display,
)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

/// The dealership configuration row; at most one exists.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct DealershipInfo {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct WorkingHours {
    pub id: Uuid,
    pub dealership_id: Uuid,
    pub day_of_week: DayOfWeek,
    pub open_time: String,
    pub close_time: String,
    pub is_open: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateWorkingHours {
    pub day_of_week: DayOfWeek,
    pub open_time: String,
    pub close_time: String,
    pub is_open: bool,
}

/// Dealership info plus its weekly schedule, as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct DealershipInfoData {
    #[serde(flatten)]
    #[ts(flatten)]
    pub info: DealershipInfo,
    pub working_hours: Vec<WorkingHours>,
}

const HOURS_COLUMNS: &str =
    "id, dealership_id, day_of_week, open_time, close_time, is_open, created_at";

impl DealershipInfo {
    /// The schedule seeded when the singleton is first created.
    pub fn default_weekly_schedule() -> Vec<CreateWorkingHours> {
        let hours = |day, open: &str, close: &str, is_open| CreateWorkingHours {
            day_of_week: day,
            open_time: open.to_string(),
            close_time: close.to_string(),
            is_open,
        };
        vec![
            hours(DayOfWeek::Monday, "09:00", "18:00", true),
            hours(DayOfWeek::Tuesday, "09:00", "18:00", true),
            hours(DayOfWeek::Wednesday, "09:00", "18:00", true),
            hours(DayOfWeek::Thursday, "09:00", "18:00", true),
            hours(DayOfWeek::Friday, "09:00", "18:00", true),
            hours(DayOfWeek::Saturday, "10:00", "16:00", true),
            hours(DayOfWeek::Sunday, "10:00", "16:00", false),
        ]
    }

    pub async fn find_first(pool: &SqlitePool) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, DealershipInfo>(
            "SELECT id, name, address, phone, email, created_at, updated_at
             FROM dealership_info
             LIMIT 1",
        )
        .fetch_optional(pool)
        .await
    }

    /// Create the singleton with the default weekly schedule, atomically.
    pub async fn create_with_default_hours(pool: &SqlitePool) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let id = Uuid::new_v4();
        let info = sqlx::query_as::<_, DealershipInfo>(
            "INSERT INTO dealership_info (id)
             VALUES ($1)
             RETURNING id, name, address, phone, email, created_at, updated_at",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        for hours in Self::default_weekly_schedule() {
            sqlx::query(
                "INSERT INTO working_hours (id, dealership_id, day_of_week, open_time,
                                            close_time, is_open)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(Uuid::new_v4())
            .bind(id)
            .bind(hours.day_of_week)
            .bind(&hours.open_time)
            .bind(&hours.close_time)
            .bind(hours.is_open)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(info)
    }
}

impl WorkingHours {
    /// Fetch the schedule for a dealership, day-of-week ascending.
    pub async fn find_for_dealership(
        pool: &SqlitePool,
        dealership_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut hours = sqlx::query_as::<_, WorkingHours>(&format!(
            "SELECT {HOURS_COLUMNS} FROM working_hours WHERE dealership_id = $1"
        ))
        .bind(dealership_id)
        .fetch_all(pool)
        .await?;
        hours.sort_by_key(|h| h.day_of_week);
        Ok(hours)
    }

    /// Replace the full schedule for a dealership: delete every existing
    /// row, then insert the provided set, inside one transaction.
    pub async fn replace_for_dealership(
        pool: &SqlitePool,
        dealership_id: Uuid,
        hours: &[CreateWorkingHours],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM working_hours WHERE dealership_id = $1")
            .bind(dealership_id)
            .execute(&mut *tx)
            .await?;

        for hour in hours {
            sqlx::query(
                "INSERT INTO working_hours (id, dealership_id, day_of_week, open_time,
                                            close_time, is_open)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(Uuid::new_v4())
            .bind(dealership_id)
            .bind(hour.day_of_week)
            .bind(&hour.open_time)
            .bind(&hour.close_time)
            .bind(hour.is_open)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
