use rand::Rng;
use serde::{Deserialize, Serialize};

/// Body of `POST /measurements`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Measurement {
    pub temperature: f64,
    pub humidity: f64,
    pub moisture: f64,
}

#[derive(Debug, Deserialize)]
pub struct Recorded {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct Average {
    pub avg_temperature: f64,
    pub avg_humidity: f64,
    pub avg_moisture: f64,
    pub count: i64,
}

pub fn generate(rng: &mut impl Rng) -> Measurement {
    let temperature = if rng.gen_bool(0.05) {
        rng.gen_range(-20.0..50.0) // 5% outliers
    } else {
        rng.gen_range(15.0..30.0) // Normal range
    };

    let humidity = if rng.gen_bool(0.05) {
        rng.gen_range(0.0..100.0) // 5% outliers
    } else {
        rng.gen_range(35.0..70.0) // Normal range
    };

    // Soil dries out slowly, so mostly mid-range
    let moisture = rng.gen_range(20.0..60.0);

    Measurement {
        temperature,
        humidity,
        moisture,
    }
}
