//! API Request Handlers

use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use super::types::*;
use crate::core::SentryEngine;
use crate::intel::FileSnapshotStore;
use crate::models::{AnalysisResult, SentrySettings};
use crate::providers::{HttpFeedFetch, SkippedSimulation};

/// Engine flavor the server runs: real feed downloads, file-backed
/// snapshots, no simulation provider wired in
pub type ServerEngine = SentryEngine<HttpFeedFetch, FileSnapshotStore, SkippedSimulation>;

/// Shared application state
pub struct AppState {
    pub engine: Arc<ServerEngine>,
    /// Server defaults; a request body may override per evaluation
    pub base_settings: SentrySettings,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(engine: Arc<ServerEngine>, base_settings: SentrySettings) -> Self {
        Self {
            engine,
            base_settings,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

// ============================================
// Health Check
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();

    let data = HealthData {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        verification_level: state.engine.verification_level(),
        stats: state.engine.get_stats(),
    };

    Json(ApiResponse::success(
        data,
        start.elapsed().as_secs_f64() * 1000.0,
    ))
}

// ============================================
// Request Analysis
// ============================================

pub async fn analyze_request(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<ApiResponse<AnalysisResult>>, (StatusCode, Json<ApiResponse<()>>)> {
    let start = Instant::now();

    if req.request.request.method.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(
                ApiError::bad_request("Request method must not be empty"),
                start.elapsed().as_secs_f64() * 1000.0,
            )),
        ));
    }

    let settings = req.settings.unwrap_or(state.base_settings);
    let result = state.engine.analyze(&req.request, &settings).await;

    Ok(Json(ApiResponse::success(
        result,
        start.elapsed().as_secs_f64() * 1000.0,
    )))
}

// ============================================
// Intel Status & Refresh
// ============================================

pub async fn intel_status(State(state): State<Arc<AppState>>) -> Json<ApiResponse<IntelStatusData>> {
    let start = Instant::now();

    Json(ApiResponse::success(
        build_intel_status(&state),
        start.elapsed().as_secs_f64() * 1000.0,
    ))
}

pub async fn intel_refresh(
    State(state): State<Arc<AppState>>,
    body: Option<Json<RefreshRequest>>,
) -> Json<ApiResponse<IntelStatusData>> {
    let start = Instant::now();
    let force = body.map(|Json(req)| req.force).unwrap_or(true);

    info!("🔄 Intel refresh requested via API (force: {})", force);
    state.engine.refresh_intel(force).await;

    Json(ApiResponse::success(
        build_intel_status(&state),
        start.elapsed().as_secs_f64() * 1000.0,
    ))
}

fn build_intel_status(state: &AppState) -> IntelStatusData {
    let now = Utc::now().timestamp();
    let threat = state.engine.threat_store().get_cached();
    let addresses = state.engine.address_store().get_cached();

    IntelStatusData {
        threat: ThreatStoreStatus {
            updated_at: threat.updated_at,
            stale: threat.is_stale(now),
            verification_level: threat.verification_level(now),
            blocked_domains: threat.blocked_domains.len(),
            trusted_domains: threat.trusted_domains.len(),
            blocked_addresses: threat.blocked_addresses.len(),
            scam_tokens: threat.scam_tokens.len(),
            sources: threat.per_source_status.clone(),
        },
        addresses: AddressStoreStatus {
            updated_at: addresses.updated_at,
            stale: addresses.is_stale(now),
            verification_level: addresses.verification_level(now),
            flagged_addresses: addresses.labels_by_address.len(),
            sources: addresses.per_source_status.clone(),
        },
    }
}
