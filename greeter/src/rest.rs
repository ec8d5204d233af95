use crate::db::{MeasurementStore, AVERAGE_WINDOW, LATEST_LIMIT};
use crate::errors::{Error, Result};
use crate::greetings::{Catalog, RANDOM};
use crate::metrics::{self, GREETINGS_SERVED_TOTAL, GREETING_MISSES_TOTAL};
use crate::model::{
    AverageMeasurement, GreetingResponse, Measurement, MeasurementCreated, NewMeasurement,
};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, info, warn};

pub const MEASUREMENT_RECORDED: &str = "Measurement recorded successfully";

#[derive(Debug, Clone)]
pub struct AppState {
    store: MeasurementStore,
    catalog: Arc<Catalog>,
}

impl AppState {
    pub fn new(store: MeasurementStore, catalog: Catalog) -> Self {
        Self {
            store,
            catalog: Arc::new(catalog),
        }
    }
}

/// Advertises the allow-list only; requests from other origins are still served.
pub fn cors_layer(allowed_origins: &[String]) -> Result<CorsLayer> {
    let origins = allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|e| Error::Config(format!("invalid CORS origin '{}': {}", origin, e)))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]))
}

pub fn create_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/", get(get_random_greeting))
        .route("/:language", get(get_greeting))
        .route(
            "/measurements",
            get(get_measurements_greeting).post(post_measurement),
        )
        .route("/measurements/latest", get(get_latest_measurements))
        .route("/measurements/average", get(get_average_measurement))
        .route("/metrics", get(metrics_handler))
        .layer(cors)
        .with_state(state)
}

async fn get_random_greeting(State(state): State<AppState>) -> Result<Json<GreetingResponse>> {
    info!("got / request");
    greet(&state.catalog, RANDOM)
}

async fn get_greeting(
    State(state): State<AppState>,
    Path(language): Path<String>,
) -> Result<Json<GreetingResponse>> {
    info!("got /{} request", language);
    greet(&state.catalog, &language)
}

// A static route shadows `/:language` for this key, so look it up explicitly.
async fn get_measurements_greeting(State(state): State<AppState>) -> Result<Json<GreetingResponse>> {
    info!("got /measurements request");
    greet(&state.catalog, "measurements")
}

fn greet(catalog: &Catalog, key: &str) -> Result<Json<GreetingResponse>> {
    match catalog.select(key) {
        Ok(greeting) => {
            GREETINGS_SERVED_TOTAL.inc();
            Ok(Json(GreetingResponse {
                greeting: greeting.greeting.clone(),
            }))
        }
        Err(e) => {
            GREETING_MISSES_TOTAL.inc();
            Err(e)
        }
    }
}

// Parsed from raw bytes so a missing Content-Type is not rejected.
async fn post_measurement(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<MeasurementCreated>> {
    let measurement = NewMeasurement::from_body(&body).map_err(Error::RequestParse)?;

    let id = state.store.insert(&measurement).await?;
    info!(
        "Measurement {} recorded: temperature={}, humidity={}, moisture={}",
        id, measurement.temperature, measurement.humidity, measurement.moisture
    );

    Ok(Json(MeasurementCreated {
        id,
        message: MEASUREMENT_RECORDED.to_string(),
    }))
}

async fn get_latest_measurements(State(state): State<AppState>) -> Result<Json<Vec<Measurement>>> {
    let measurements = state.store.fetch_latest(LATEST_LIMIT).await?;
    Ok(Json(measurements))
}

async fn get_average_measurement(State(state): State<AppState>) -> Result<Json<AverageMeasurement>> {
    let average = state.store.compute_average(AVERAGE_WINDOW).await?;
    Ok(Json(average))
}

async fn metrics_handler() -> Response {
    match metrics::gather_metrics() {
        Ok(text) => text.into_response(),
        Err(e) => {
            error!("Failed to gather metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to gather metrics").into_response()
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Error::RequestParse(_) => (StatusCode::BAD_REQUEST, "Invalid request body".to_string()),
            Error::NotFound(message) => (StatusCode::BAD_REQUEST, message.clone()),
            Error::StorageWrite(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to insert measurement".to_string(),
            ),
            Error::StorageRead(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read measurements".to_string(),
            ),
            Error::Config(_) | Error::StorageInit(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        if status.is_server_error() {
            error!("API error: {}", self);
        } else {
            warn!("Rejected request: {}", self);
        }

        (status, body).into_response()
    }
}
