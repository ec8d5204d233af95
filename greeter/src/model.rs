use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A persisted sensor measurement
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Measurement {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub temperature: f64,
    pub humidity: f64,
    pub moisture: f64,
}

/// Body of `POST /measurements`. Missing or `null` fields read as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NewMeasurement {
    #[serde(default, deserialize_with = "null_as_zero")]
    pub temperature: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub humidity: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub moisture: f64,
}

impl NewMeasurement {
    /// Decodes the first JSON value in `body`; anything after it is ignored.
    pub fn from_body(body: &[u8]) -> Result<Self, serde_json::Error> {
        let mut values = serde_json::Deserializer::from_slice(body).into_iter::<Option<Self>>();
        match values.next() {
            Some(value) => Ok(value?.unwrap_or_default()),
            // Empty body; surface serde's EOF error
            None => serde_json::from_slice::<Self>(body),
        }
    }
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or_default())
}

/// Mean of the most recent window of measurements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AverageMeasurement {
    pub avg_temperature: f64,
    pub avg_humidity: f64,
    pub avg_moisture: f64,
    pub count: i64,
}

impl AverageMeasurement {
    pub const EMPTY: Self = Self {
        avg_temperature: 0.0,
        avg_humidity: 0.0,
        avg_moisture: 0.0,
        count: 0,
    };
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeasurementCreated {
    pub id: i64,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GreetingResponse {
    pub greeting: String,
}
