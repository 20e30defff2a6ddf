use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use bazaar_core::health::{healthz, readyz};
use bazaar_core::middleware::request_id_layer;

use crate::handlers::{
    login::{login_otp, login_password},
    otp::{send_otp, verify_otp},
    password_reset::reset_password,
    register::register,
    token::{logout, refresh_token},
};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // OTP engine
        .route("/auth/otp/send", post(send_otp))
        .route("/auth/otp/verify", post(verify_otp))
        // Flows
        .route("/auth/register", post(register))
        .route("/auth/login", post(login_password))
        .route("/auth/login/otp", post(login_otp))
        .route("/auth/password/reset", post(reset_password))
        // Sessions
        .route("/auth/token/refresh", post(refresh_token))
        .route("/auth/logout", post(logout))
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
        .with_state(state)
}
