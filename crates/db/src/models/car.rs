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
pub enum CarStatus {
    #[default]
    Available,
    Unavailable,
    Sold,
}

/// A vehicle listing. `images` holds a JSON-serialized array of public
/// URLs; use [`Car::image_urls`] to read it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Car {
    pub id: Uuid,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price: f64,
    pub mileage: i64,
    pub color: String,
    pub fuel_type: String,
    pub transmission: String,
    pub body_type: String,
    pub seats: Option<i32>,
    pub description: String,
    pub status: CarStatus,
    pub featured: bool,
    pub images: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Attributes for a new listing. Make/model/color and the drivetrain
/// fields are free text because they may come straight from AI
/// extraction.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateCar {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price: f64,
    pub mileage: i64,
    pub color: String,
    pub fuel_type: String,
    pub transmission: String,
    pub body_type: String,
    pub seats: Option<i32>,
    pub description: String,
    #[serde(default)]
    pub status: CarStatus,
    #[serde(default)]
    pub featured: bool,
}

/// Serialized listing returned to API clients, with `images` parsed.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CarData {
    pub id: Uuid,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub price: f64,
    pub mileage: i64,
    pub color: String,
    pub fuel_type: String,
    pub transmission: String,
    pub body_type: String,
    pub seats: Option<i32>,
    pub description: String,
    pub status: CarStatus,
    pub featured: bool,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const CAR_COLUMNS: &str = "id, make, model, year, price, mileage, color, fuel_type, \
     transmission, body_type, seats, description, status, featured, images, \
     created_at, updated_at";

impl Car {
    /// Parse the stored JSON image array.
    pub fn image_urls(&self) -> Vec<String> {
        serde_json::from_str(&self.images).unwrap_or_default()
    }

    pub fn into_data(self) -> CarData {
        let images = self.image_urls();
        CarData {
            id: self.id,
            make: self.make,
            model: self.model,
            year: self.year,
            price: self.price,
            mileage: self.mileage,
            color: self.color,
            fuel_type: self.fuel_type,
            transmission: self.transmission,
            body_type: self.body_type,
            seats: self.seats,
            description: self.description,
            status: self.status,
            featured: self.featured,
            images,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Insert a listing with a caller-supplied id (the id namespaces the
    /// already-uploaded image keys, so it must be generated up front).
    pub async fn create(
        pool: &SqlitePool,
        id: Uuid,
        data: &CreateCar,
        image_urls: &[String],
    ) -> Result<Self, sqlx::Error> {
        let images = serde_json::to_string(image_urls)
            .map_err(|e| sqlx::Error::Protocol(e.to_string()))?;
        sqlx::query_as::<_, Car>(&format!(
            "INSERT INTO cars (id, make, model, year, price, mileage, color, fuel_type,
                               transmission, body_type, seats, description, status,
                               featured, images)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
             RETURNING {CAR_COLUMNS}"
        ))
        .bind(id)
        .bind(&data.make)
        .bind(&data.model)
        .bind(data.year)
        .bind(data.price)
        .bind(data.mileage)
        .bind(&data.color)
        .bind(&data.fuel_type)
        .bind(&data.transmission)
        .bind(&data.body_type)
        .bind(data.seats)
        .bind(&data.description)
        .bind(data.status)
        .bind(data.featured)
        .bind(images)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Car>(&format!("SELECT {CAR_COLUMNS} FROM cars WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all cars, newest first. When `search` is given, match it as a
    /// case-insensitive substring of make, model, or color.
    pub async fn find_all(
        pool: &SqlitePool,
        search: Option<&str>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        match search.filter(|s| !s.is_empty()) {
            Some(term) => {
                let pattern = format!("%{term}%");
                sqlx::query_as::<_, Car>(&format!(
                    "SELECT {CAR_COLUMNS} FROM cars
                     WHERE make LIKE $1 OR model LIKE $1 OR color LIKE $1
                     ORDER BY created_at DESC"
                ))
                .bind(pattern)
                .fetch_all(pool)
                .await
            }
            None => {
                sqlx::query_as::<_, Car>(&format!(
                    "SELECT {CAR_COLUMNS} FROM cars ORDER BY created_at DESC"
                ))
                .fetch_all(pool)
                .await
            }
        }
    }

    pub async fn find_featured(pool: &SqlitePool, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Car>(&format!(
            "SELECT {CAR_COLUMNS} FROM cars
             WHERE featured = 1 AND status = 'AVAILABLE'
             ORDER BY created_at DESC
             LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// Partial update: only the fields provided are written. Returns the
    /// number of rows touched.
    pub async fn update_status(
        pool: &SqlitePool,
        id: Uuid,
        status: Option<CarStatus>,
        featured: Option<bool>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE cars
             SET status = COALESCE($2, status),
                 featured = COALESCE($3, featured),
                 updated_at = datetime('now', 'subsec')
             WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .bind(featured)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM cars WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
