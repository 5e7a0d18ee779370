//! SQLite storage layer for historical AQI records.
//!
//! Two tables: `cities` identifies a city once, `aqi_records` appends
//! one row per successful fresh fetch. Records are append-only; nothing
//! in this module updates or deletes them. Failures here are expected
//! to be swallowed by the caller, since a broken store must never break
//! a user-facing request.

use chrono::{DateTime, TimeZone, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::model::{HistoricalPoint, Measurement};

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    /// Create a new storage instance and initialize the schema.
    ///
    /// # Arguments
    ///
    /// * `database_url` - SQLite connection string (e.g., "sqlite:airsight.db" or "sqlite::memory:")
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        let storage = Self { pool };
        storage.initialize_schema().await?;

        Ok(storage)
    }

    async fn initialize_schema(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cities (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                country TEXT NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                UNIQUE(name, country)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS aqi_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                city_id INTEGER NOT NULL,
                aqi INTEGER NOT NULL,
                category TEXT NOT NULL,
                dominant_pollutant TEXT NOT NULL,
                pm25 REAL,
                pm10 REAL,
                o3 REAL,
                no2 REAL,
                so2 REAL,
                co REAL,
                temperature REAL,
                humidity REAL,
                pressure REAL,
                ts INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Index for efficient time-range queries by city
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_aqi_records_city_ts
            ON aqi_records(city_id, ts)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Find or create a city, returning its id.
    pub async fn upsert_city(
        &self,
        name: &str,
        country: &str,
        latitude: f64,
        longitude: f64,
    ) -> anyhow::Result<i64> {
        sqlx::query(
            r#"
            INSERT INTO cities (name, country, latitude, longitude)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(name, country) DO NOTHING
            "#,
        )
        .bind(name)
        .bind(country)
        .bind(latitude)
        .bind(longitude)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query("SELECT id FROM cities WHERE name = ? AND country = ?")
            .bind(name)
            .bind(country)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get("id"))
    }

    /// Look up a city id by name, ignoring case.
    pub async fn find_city(&self, name: &str) -> anyhow::Result<Option<i64>> {
        let row = sqlx::query("SELECT id FROM cities WHERE name = ? COLLATE NOCASE")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.get("id")))
    }

    /// Append one historical record for a city.
    pub async fn insert_record(
        &self,
        city_id: i64,
        measurement: &Measurement,
        category_code: &str,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO aqi_records (
                city_id, aqi, category, dominant_pollutant,
                pm25, pm10, o3, no2, so2, co,
                temperature, humidity, pressure, ts
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(city_id)
        .bind(i64::from(measurement.aqi))
        .bind(category_code)
        .bind(&measurement.dominant_pollutant)
        .bind(measurement.pollutants.pm25)
        .bind(measurement.pollutants.pm10)
        .bind(measurement.pollutants.o3)
        .bind(measurement.pollutants.no2)
        .bind(measurement.pollutants.so2)
        .bind(measurement.pollutants.co)
        .bind(measurement.temperature)
        .bind(measurement.humidity)
        .bind(measurement.pressure)
        .bind(measurement.timestamp.timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Query a city's records since a point in time, oldest first.
    pub async fn query_history(
        &self,
        city_id: i64,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<HistoricalPoint>> {
        let rows = sqlx::query(
            r#"
            SELECT ts, aqi, category
            FROM aqi_records
            WHERE city_id = ? AND ts >= ?
            ORDER BY ts ASC
            "#,
        )
        .bind(city_id)
        .bind(since.timestamp())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let ts: i64 = row.get("ts");
                HistoricalPoint {
                    timestamp: Utc
                        .timestamp_opt(ts, 0)
                        .single()
                        .unwrap_or_else(Utc::now),
                    aqi: row.get("aqi"),
                    category: row.get("category"),
                }
            })
            .collect())
    }
}
