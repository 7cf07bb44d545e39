//! API Request/Response Types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::core::EngineStatsSnapshot;
use crate::intel::SourceStatus;
use crate::models::{SentrySettings, VerificationLevel, WalletRequest};

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub latency_ms: f64,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, latency_ms: f64) -> Self {
        Self {
            success: true,
            request_id: Uuid::new_v4().to_string(),
            data: Some(data),
            error: None,
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(error: ApiError, latency_ms: f64) -> Self {
        Self {
            success: false,
            request_id: Uuid::new_v4().to_string(),
            data: None,
            error: Some(error),
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// API Error
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "BAD_REQUEST".to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: "INTERNAL_ERROR".to_string(),
            message: message.into(),
            details: None,
        }
    }
}

// ============================================
// Request Analysis
// ============================================

/// The observed wallet request plus an optional settings override
/// that applies to this one evaluation only
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub request: WalletRequest,
    #[serde(default)]
    pub settings: Option<SentrySettings>,
}

// ============================================
// Intel Status / Refresh
// ============================================

#[derive(Debug, Serialize)]
pub struct IntelStatusData {
    pub threat: ThreatStoreStatus,
    pub addresses: AddressStoreStatus,
}

#[derive(Debug, Serialize)]
pub struct ThreatStoreStatus {
    pub updated_at: i64,
    pub stale: bool,
    pub verification_level: VerificationLevel,
    pub blocked_domains: usize,
    pub trusted_domains: usize,
    pub blocked_addresses: usize,
    pub scam_tokens: usize,
    pub sources: HashMap<String, SourceStatus>,
}

#[derive(Debug, Serialize)]
pub struct AddressStoreStatus {
    pub updated_at: i64,
    pub stale: bool,
    pub verification_level: VerificationLevel,
    pub flagged_addresses: usize,
    pub sources: HashMap<String, SourceStatus>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Ignore the TTL. An explicit refresh call usually means now.
    #[serde(default = "default_force")]
    pub force: bool,
}

fn default_force() -> bool {
    true
}

// ============================================
// Health Check
// ============================================

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub verification_level: VerificationLevel,
    pub stats: EngineStatsSnapshot,
}
