//! API response structures

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::{
    error::FunnelError,
    pricing::PricingSnapshot,
    state::{FunnelStep, PurchaseDetails, TimerPhase, TimerState, UserProfile},
    utils::format_remaining,
};

/// Countdown as shown to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerView {
    pub phase: TimerPhase,
    pub start_time: Option<i64>,
    pub duration_ms: i64,
    pub remaining_ms: i64,
    /// `mm:ss`
    pub remaining_display: String,
    pub expired: bool,
    pub discount_active: bool,
}

impl From<&TimerState> for TimerView {
    fn from(timer: &TimerState) -> Self {
        Self {
            phase: timer.phase(),
            start_time: timer.start_time(),
            duration_ms: timer.duration_ms(),
            remaining_ms: timer.remaining_ms(),
            remaining_display: format_remaining(timer.remaining_ms()),
            expired: timer.expired(),
            discount_active: timer.is_discount_active(),
        }
    }
}

/// Everything a screen needs to render the session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub step: FunnelStep,
    pub user: UserProfile,
    pub timer: TimerView,
    pub pricing: PricingSnapshot,
    pub purchase: Option<PurchaseDetails>,
}

/// API response structure for state change endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub session: SessionView,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>, session: SessionView) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
            timestamp: Utc::now(),
            session,
        }
    }
}

/// Body returned for every failed request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

impl IntoResponse for FunnelError {
    fn into_response(self) -> Response {
        let status = match &self {
            FunnelError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            FunnelError::MissingPrerequisite(_) => StatusCode::CONFLICT,
            FunnelError::StatePoisoned(_) => {
                error!("Request failed: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub status: String,
    pub purchase: Option<PurchaseDetails>,
    pub card_last_four: Option<String>,
}

/// Session overview plus server metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub session: SessionView,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_view_formats_remaining_time() {
        let mut timer = TimerState::default();
        timer.start(0);
        timer.tick(61_500);
        let view = TimerView::from(&timer);
        assert_eq!(view.phase, TimerPhase::Active);
        assert_eq!(view.remaining_ms, 238_500);
        assert_eq!(view.remaining_display, "03:58");
        assert!(view.discount_active);
    }

    #[test]
    fn error_status_codes() {
        let cases = [
            (FunnelError::Validation("bad".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (FunnelError::MissingPrerequisite("later".into()), StatusCode::CONFLICT),
            (FunnelError::StatePoisoned("timer".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
