//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{extract::State, response::Json};
use serde::Deserialize;
use tracing::info;

use super::responses::{
    ApiResponse, CheckoutResponse, HealthResponse, SessionView, StatusResponse, TimerView,
};
use crate::{
    error::FunnelError,
    pricing::PricingSnapshot,
    state::{AppState, FunnelStep, PaymentInfo},
};

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct NameRequest {
    pub name: String,
}

/// Evaluate the timer at the current time and gather the whole session
pub fn capture_session(state: &AppState) -> Result<SessionView, FunnelError> {
    let timer = state.tick_timer()?;
    let user = state.get_user()?;
    let checkout = state.get_checkout()?;

    Ok(SessionView {
        step: FunnelStep::of(&user, &timer, &checkout),
        pricing: timer.price_snapshot(&state.plan),
        timer: TimerView::from(&timer),
        user,
        purchase: checkout.purchase_details,
    })
}

/// Handle POST /user/email - Save the email from the first screen
pub async fn email_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EmailRequest>,
) -> Result<Json<ApiResponse>, FunnelError> {
    state.set_email(&request.email)?;
    Ok(Json(ApiResponse::ok("Email saved", capture_session(&state)?)))
}

/// Handle POST /user/name - Save the name and derive the promo code
pub async fn name_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NameRequest>,
) -> Result<Json<ApiResponse>, FunnelError> {
    state.set_name(&request.name)?;
    Ok(Json(ApiResponse::ok("Name saved", capture_session(&state)?)))
}

/// Handle POST /timer/start - Open the discount window on first product view
pub async fn timer_start_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, FunnelError> {
    let before = state.get_timer_state()?.start_time();
    state.start_timer()?;
    let message = if before.is_none() {
        "Discount window started"
    } else {
        "Discount window already running"
    };
    Ok(Json(ApiResponse::ok(message, capture_session(&state)?)))
}

/// Handle GET /timer - Current countdown
pub async fn timer_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TimerView>, FunnelError> {
    let timer = state.tick_timer()?;
    Ok(Json(TimerView::from(&timer)))
}

/// Handle GET /pricing - Current price figures
pub async fn pricing_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PricingSnapshot>, FunnelError> {
    Ok(Json(state.pricing_snapshot()?))
}

/// Handle POST /checkout - Validate payment details and complete the purchase
pub async fn checkout_handler(
    State(state): State<Arc<AppState>>,
    Json(payment): Json<PaymentInfo>,
) -> Result<Json<ApiResponse>, FunnelError> {
    let details = state.complete_purchase(payment)?;
    info!("Checkout endpoint called - purchase of {:.2} recorded", details.amount);
    Ok(Json(ApiResponse::ok("Purchase completed", capture_session(&state)?)))
}

/// Handle GET /checkout - Completed purchase, if any
pub async fn checkout_status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CheckoutResponse>, FunnelError> {
    let checkout = state.get_checkout()?;
    let status = if checkout.is_complete() { "complete" } else { "pending" };
    Ok(Json(CheckoutResponse {
        status: status.to_string(),
        card_last_four: checkout.payment_info.as_ref().and_then(PaymentInfo::card_last_four),
        purchase: checkout.purchase_details,
    }))
}

/// Handle POST /debug/reset - Clear the session and its stored copy
pub async fn reset_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, FunnelError> {
    state.reset_session()?;
    Ok(Json(ApiResponse::ok("Session reset", capture_session(&state)?)))
}

/// Handle GET /status - Return the session overview
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, FunnelError> {
    let session = capture_session(&state)?;
    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        session,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
