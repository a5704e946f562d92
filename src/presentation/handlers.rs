// HTTP request handlers
use crate::application::alert_query::{AlertQueryService, AlertSummary};
use crate::domain::alert::Alert;
use crate::domain::plant::Plant;
use crate::domain::reading::{Quantity, Reading};
use crate::infrastructure::http_response::ApiError;
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_HISTORY_HOURS: i64 = 24;
const MAX_HISTORY_HOURS: i64 = 24 * 365;

#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    Active,
    Acknowledged,
    All,
}

#[derive(Deserialize)]
pub struct AlertListQuery {
    #[serde(default)]
    pub status: StatusFilter,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub quantity: Quantity,
    pub hours: Option<i64>,
}

#[derive(Deserialize)]
pub struct IngestRequest {
    pub quantity: Quantity,
    pub reading: Reading,
}

#[derive(Deserialize)]
pub struct IngestSeriesRequest {
    pub quantity: Quantity,
    pub readings: Vec<Reading>,
}

#[derive(Serialize)]
pub struct ChangeResponse {
    pub changed: bool,
}

#[derive(Serialize)]
pub struct DismissAllResponse {
    pub dismissed: usize,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// List configured plants with their thresholds
pub async fn list_plants(State(state): State<Arc<AppState>>) -> Json<Vec<Plant>> {
    Json(state.monitor.plants().to_vec())
}

/// Alerts of a plant, highest severity and newest first
pub async fn list_alerts(
    Path(plant_id): Path<String>,
    Query(query): Query<AlertListQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Alert>>, ApiError> {
    let alerts = state.monitor.alerts(&plant_id).await?;
    let view = AlertQueryService::from_alerts(&alerts);

    let list = match query.status {
        StatusFilter::Active => view.active_alerts(&plant_id),
        StatusFilter::Acknowledged => view.acknowledged_alerts(&plant_id),
        StatusFilter::All => view.all_alerts(&plant_id),
    };
    Ok(Json(list))
}

/// Unread count and histograms for a plant
pub async fn alert_summary(
    Path(plant_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<AlertSummary>, ApiError> {
    let alerts = state.monitor.alerts(&plant_id).await?;
    Ok(Json(AlertQueryService::from_alerts(&alerts).summary(&plant_id)))
}

pub async fn acknowledge_alert(
    Path((plant_id, alert_id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ChangeResponse>, ApiError> {
    let changed = state.monitor.acknowledge(&plant_id, &alert_id).await?;
    Ok(Json(ChangeResponse { changed }))
}

pub async fn dismiss_alert(
    Path((plant_id, alert_id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<ChangeResponse>, ApiError> {
    let changed = state.monitor.dismiss(&plant_id, &alert_id).await?;
    Ok(Json(ChangeResponse { changed }))
}

pub async fn dismiss_all_alerts(
    Path(plant_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<DismissAllResponse>, ApiError> {
    let dismissed = state.monitor.dismiss_all(&plant_id).await?;
    Ok(Json(DismissAllResponse { dismissed }))
}

/// Pushed readings must come from the plant's own device
fn check_device<'a>(
    state: &AppState,
    plant_id: &str,
    readings: impl IntoIterator<Item = &'a Reading>,
) -> Result<(), ApiError> {
    let Some(plant) = state.monitor.plant(plant_id) else {
        return Ok(());
    };
    match readings.into_iter().find(|r| r.device_id != plant.device_id) {
        Some(reading) => Err(ApiError::unprocessable(format!(
            "Reading from device {} does not belong to plant {} (device {})",
            reading.device_id, plant_id, plant.device_id
        ))),
        None => Ok(()),
    }
}

/// Push a reading; responds with the created alert or `null`
pub async fn ingest_reading(
    Path(plant_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<IngestRequest>,
) -> Result<Json<Option<Alert>>, ApiError> {
    check_device(&state, &plant_id, [&request.reading])?;
    let alert = state
        .monitor
        .ingest_reading(&plant_id, request.quantity, request.reading)
        .await?;
    Ok(Json(alert))
}

/// Push a series of readings; only the newest one is evaluated
pub async fn ingest_series(
    Path(plant_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<IngestSeriesRequest>,
) -> Result<Json<Option<Alert>>, ApiError> {
    check_device(&state, &plant_id, &request.readings)?;
    let alert = state
        .monitor
        .ingest_latest(&plant_id, request.quantity, &request.readings)
        .await?;
    Ok(Json(alert))
}

/// Recent readings of a plant's device
pub async fn reading_history(
    Path(plant_id): Path<String>,
    Query(query): Query<HistoryQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Reading>>, ApiError> {
    let plant = state
        .monitor
        .plant(&plant_id)
        .ok_or_else(|| ApiError::not_found(format!("Unknown plant: {}", plant_id)))?;

    let hours = query.hours.unwrap_or(DEFAULT_HISTORY_HOURS).clamp(1, MAX_HISTORY_HOURS);
    let end = Utc::now();
    let start = end - chrono::Duration::hours(hours);

    let readings = state
        .readings
        .fetch_range(query.quantity, start, end)
        .await
        .map_err(|e| {
            tracing::warn!("Error fetching reading history for {}: {:#}", plant_id, e);
            ApiError::bad_gateway("Sensor API unavailable")
        })?;

    Ok(Json(
        readings
            .into_iter()
            .filter(|r| r.device_id == plant.device_id)
            .collect(),
    ))
}
