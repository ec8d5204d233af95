use crate::errors::{Error, Result};
use crate::metrics::{MEASUREMENTS_RECORDED_TOTAL, STORE_FAILURES_TOTAL, STORE_LATENCY_SECONDS};
use crate::model::{AverageMeasurement, Measurement, NewMeasurement};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, info};

/// Number of rows returned by `GET /measurements/latest`.
pub const LATEST_LIMIT: i64 = 5;
/// Number of most recent rows averaged by `GET /measurements/average`.
pub const AVERAGE_WINDOW: i64 = 50;
/// Location that opens a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

const MAX_CONNECTIONS: u32 = 5;

const CREATE_MEASUREMENTS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS measurements (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp DATETIME NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
        temperature REAL,
        humidity REAL,
        moisture REAL
    )
    "#;

/// Handle to the `measurements` table. Cloning shares the underlying pool.
#[derive(Debug, Clone)]
pub struct MeasurementStore {
    pool: SqlitePool,
}

impl MeasurementStore {
    /// Opens (creating if needed) the store at `location` and ensures the schema exists.
    pub async fn open(location: &str) -> Result<Self> {
        info!("Opening measurement store at {}", location);
        let pool = make_pool(location).await.map_err(Error::StorageInit)?;

        let store = Self { pool };
        store.init_schema().await?;
        info!("Measurement store ready");

        Ok(store)
    }

    pub async fn open_in_memory() -> Result<Self> {
        Self::open(IN_MEMORY).await
    }

    /// Idempotent.
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(CREATE_MEASUREMENTS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(Error::StorageInit)?;
        Ok(())
    }

    pub async fn insert(&self, measurement: &NewMeasurement) -> Result<i64> {
        let start = Instant::now();
        let result = sqlx::query(
            "INSERT INTO measurements (temperature, humidity, moisture) VALUES (?1, ?2, ?3)",
        )
        .bind(measurement.temperature)
        .bind(measurement.humidity)
        .bind(measurement.moisture)
        .execute(&self.pool)
        .await;

        let id = observe(start, result)
            .map_err(Error::StorageWrite)?
            .last_insert_rowid();
        MEASUREMENTS_RECORDED_TOTAL.inc();
        debug!("Inserted measurement {}", id);

        Ok(id)
    }

    /// Up to `limit` rows, newest first. Same-timestamp rows come out newest id first.
    pub async fn fetch_latest(&self, limit: i64) -> Result<Vec<Measurement>> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, Measurement>(
            "SELECT id, timestamp, temperature, humidity, moisture
             FROM measurements
             ORDER BY timestamp DESC, id DESC
             LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await;

        observe(start, result).map_err(Error::StorageRead)
    }

    /// Averages the newest `window` rows. An empty table yields [`AverageMeasurement::EMPTY`].
    pub async fn compute_average(&self, window: i64) -> Result<AverageMeasurement> {
        let start = Instant::now();
        let result = sqlx::query_as::<_, (Option<f64>, Option<f64>, Option<f64>, i64)>(
            "SELECT AVG(temperature), AVG(humidity), AVG(moisture), COUNT(*)
             FROM (
                 SELECT temperature, humidity, moisture
                 FROM measurements
                 ORDER BY timestamp DESC, id DESC
                 LIMIT ?1
             )",
        )
        .bind(window)
        .fetch_one(&self.pool)
        .await;

        let (temperature, humidity, moisture, count) =
            observe(start, result).map_err(Error::StorageRead)?;
        if count == 0 {
            return Ok(AverageMeasurement::EMPTY);
        }

        Ok(AverageMeasurement {
            avg_temperature: temperature.unwrap_or(0.0),
            avg_humidity: humidity.unwrap_or(0.0),
            avg_moisture: moisture.unwrap_or(0.0),
            count,
        })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

async fn make_pool(location: &str) -> std::result::Result<SqlitePool, sqlx::Error> {
    if location == IN_MEMORY {
        // Every connection to :memory: is a separate database, so pin a single one.
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        return SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await;
    }

    let options = SqliteConnectOptions::new()
        .filename(location)
        .create_if_missing(true);
    SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await
}

fn observe<T>(
    start: Instant,
    result: std::result::Result<T, sqlx::Error>,
) -> std::result::Result<T, sqlx::Error> {
    STORE_LATENCY_SECONDS.observe(start.elapsed().as_secs_f64());
    if result.is_err() {
        STORE_FAILURES_TOTAL.inc();
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_db_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("greeter-{}-{}.db", name, std::process::id()))
    }

    #[test]
    fn test_init_schema_is_idempotent() {
        tokio_test::block_on(async {
            let path = temp_db_path("idempotent");
            let _ = std::fs::remove_file(&path);
            let location = path.to_string_lossy().to_string();

            let first = MeasurementStore::open(&location).await.unwrap();
            let id = first
                .insert(&NewMeasurement {
                    temperature: 21.5,
                    humidity: 55.0,
                    moisture: 30.0,
                })
                .await
                .unwrap();
            first.close().await;

            let second = MeasurementStore::open(&location).await.unwrap();
            second.init_schema().await.unwrap();
            let latest = second.fetch_latest(LATEST_LIMIT).await.unwrap();
            assert_eq!(latest.len(), 1);
            assert_eq!(latest[0].id, id);
            second.close().await;

            let _ = std::fs::remove_file(&path);
        });
    }

    #[test]
    fn test_open_unreachable_location_fails() {
        tokio_test::block_on(async {
            let err = MeasurementStore::open("/nonexistent-greeter-dir/nested/store.db")
                .await
                .unwrap_err();
            assert!(matches!(err, Error::StorageInit(_)));
        });
    }

    #[test]
    fn test_read_after_close_is_read_error() {
        tokio_test::block_on(async {
            let store = MeasurementStore::open_in_memory().await.unwrap();
            store.close().await;

            let err = store.fetch_latest(LATEST_LIMIT).await.unwrap_err();
            assert!(matches!(err, Error::StorageRead(_)));

            let err = store
                .insert(&NewMeasurement {
                    temperature: 1.0,
                    humidity: 1.0,
                    moisture: 1.0,
                })
                .await
                .unwrap_err();
            assert!(matches!(err, Error::StorageWrite(_)));
        });
    }
}
