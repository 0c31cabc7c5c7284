use axum::{extract::State, response::Json, routing::get, Router};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::app_metrics::RouterMetrics;
use crate::record::TrackerRecord;
use crate::router_state::RouterState;

#[derive(Clone)]
pub struct AppState {
    pub state: Arc<Mutex<RouterState>>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: "ok".to_string(),
            data: Some(data),
            error: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusSummary {
    pub uptime_seconds: i64,
    pub devices_seen: usize,
    pub metrics: RouterMetrics,
}

pub async fn get_status(State(app): State<AppState>) -> Json<ApiResponse<StatusSummary>> {
    info!("GET /api/status called");
    let state = app.state.lock().await;
    let summary = StatusSummary {
        uptime_seconds: (Utc::now() - state.started_at).num_seconds(),
        devices_seen: state.devices_seen(),
        metrics: state.metrics.clone(),
    };
    Json(ApiResponse::ok(summary))
}

pub async fn get_devices(State(app): State<AppState>) -> Json<ApiResponse<Vec<TrackerRecord>>> {
    info!("GET /api/devices called");
    let state = app.state.lock().await;
    let records: Vec<TrackerRecord> = state.last_records().cloned().collect();
    Json(ApiResponse::ok(records))
}

pub fn create_api_router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/devices", get(get_devices))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RawFrame, RecordKind};
    use crate::registry::ProtocolTag;

    #[tokio::test]
    async fn test_status_reflects_state() {
        let state = Arc::new(Mutex::new(RouterState::new()));
        {
            let mut guard = state.lock().await;
            guard.metrics.frames_received = 7;
            let frame = RawFrame::new(b"frame");
            let mut record =
                TrackerRecord::with_kind(&frame, ProtocolTag::TzAvl05, RecordKind::Data);
            record.device_id = Some("869444005480041".to_string());
            guard.update_record(&record);
        }

        let Json(response) = get_status(State(AppState { state })).await;
        assert_eq!(response.status, "ok");
        let summary = response.data.expect("status payload");
        assert_eq!(summary.devices_seen, 1);
        assert_eq!(summary.metrics.frames_received, 7);
        assert!(summary.uptime_seconds >= 0);
    }

    #[tokio::test]
    async fn test_devices_lists_last_records() {
        let state = Arc::new(Mutex::new(RouterState::new()));
        let Json(empty) = get_devices(State(AppState {
            state: state.clone(),
        }))
        .await;
        assert!(empty.data.expect("payload").is_empty());

        {
            let mut guard = state.lock().await;
            let frame = RawFrame::new(b"frame");
            let mut record =
                TrackerRecord::with_kind(&frame, ProtocolTag::MeitrackMvt380, RecordKind::Data);
            record.device_id = Some("866771026198345".to_string());
            guard.update_record(&record);
        }
        let Json(response) = get_devices(State(AppState { state })).await;
        let records = response.data.expect("payload");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].device_id.as_deref(), Some("866771026198345"));
    }
}
