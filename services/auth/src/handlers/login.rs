use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;

use crate::error::AuthServiceError;
use crate::handlers::token::TokenResponse;
use crate::state::AppState;
use crate::usecase::login::{
    CompleteOtpLoginInput, CompleteOtpLoginUseCase, PasswordLoginInput, PasswordLoginUseCase,
};
use crate::usecase::otp::VerifyOtpUseCase;

// ── POST /auth/login ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct PasswordLoginRequest {
    pub identifier: String,
    pub password: String,
}

pub async fn login_password(
    State(state): State<AppState>,
    Json(body): Json<PasswordLoginRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = PasswordLoginUseCase {
        directory: state.directory(),
        refresh_tokens: state.refresh_token_repo(),
        keys: state.token_keys.clone(),
    };

    let out = usecase
        .execute(PasswordLoginInput {
            identifier: body.identifier,
            password: body.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(TokenResponse::from(out.session))))
}

// ── POST /auth/login/otp ─────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct OtpLoginRequest {
    pub identifier: String,
    pub code: String,
}

/// Completes a passwordless login started via `POST /auth/otp/send`
/// (purpose `login`).
pub async fn login_otp(
    State(state): State<AppState>,
    Json(body): Json<OtpLoginRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = CompleteOtpLoginUseCase {
        directory: state.directory(),
        verify: VerifyOtpUseCase {
            otps: state.otp_repo(),
        },
        refresh_tokens: state.refresh_token_repo(),
        keys: state.token_keys.clone(),
    };

    let out = usecase
        .execute(CompleteOtpLoginInput {
            identifier: body.identifier,
            code: body.code,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(TokenResponse::from(out.session))))
}
