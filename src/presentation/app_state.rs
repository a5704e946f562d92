// Application state for HTTP handlers
use crate::application::monitor_service::MonitorHandle;
use crate::application::reading_source::ReadingSource;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub monitor: MonitorHandle,
    pub readings: Arc<dyn ReadingSource>,
}
