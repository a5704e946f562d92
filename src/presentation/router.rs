// Route table
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    acknowledge_alert, alert_summary, dismiss_alert, dismiss_all_alerts, health_check,
    ingest_reading, ingest_series, list_alerts, list_plants, reading_history,
};
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/plants", get(list_plants))
        .route("/plants/:plant_id/alerts", get(list_alerts))
        .route("/plants/:plant_id/alerts/summary", get(alert_summary))
        .route("/plants/:plant_id/alerts/dismiss-all", post(dismiss_all_alerts))
        .route(
            "/plants/:plant_id/alerts/:alert_id/acknowledge",
            post(acknowledge_alert),
        )
        .route("/plants/:plant_id/alerts/:alert_id/dismiss", post(dismiss_alert))
        .route(
            "/plants/:plant_id/readings",
            get(reading_history).post(ingest_reading),
        )
        .route("/plants/:plant_id/readings/batch", post(ingest_series))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
