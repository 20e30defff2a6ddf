use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::OtpPurpose;
use crate::error::AuthServiceError;
use crate::state::AppState;
use crate::usecase::login::StartOtpLoginUseCase;
use crate::usecase::otp::VerifyOtpInput;
use crate::usecase::password_reset::StartPasswordResetUseCase;
use crate::usecase::register::{StartRegistrationInput, StartRegistrationUseCase};

// ── POST /auth/otp/send ──────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SendOtpRequest {
    pub identifier: String,
    pub purpose: OtpPurpose,
    /// Flow context; registration reads the pending profile `name` from here.
    #[serde(default)]
    pub context: Option<serde_json::Value>,
}

#[derive(Serialize)]
pub struct SendOtpResponse {
    pub expires_at: DateTime<Utc>,
    /// Present only in builds that expose codes for test automation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Purpose-specific gating (duplicate check, active-account check,
/// anti-enumeration) lives in the flow use cases this dispatches to.
pub async fn send_otp(
    State(state): State<AppState>,
    Json(body): Json<SendOtpRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let (expires_at, code) = match body.purpose {
        OtpPurpose::Verification => {
            let name = body
                .context
                .as_ref()
                .and_then(|c| c.get("name"))
                .and_then(|v| v.as_str())
                .map(str::to_owned);
            let out = StartRegistrationUseCase {
                directory: state.directory(),
                issue: state.issue_otp(),
            }
            .execute(StartRegistrationInput {
                identifier: body.identifier,
                name,
            })
            .await?;
            (out.expires_at, out.debug_code)
        }
        OtpPurpose::Login => {
            let out = StartOtpLoginUseCase {
                directory: state.directory(),
                issue: state.issue_otp(),
            }
            .execute(body.identifier)
            .await?;
            (out.expires_at, out.debug_code)
        }
        OtpPurpose::PasswordReset => {
            let out = StartPasswordResetUseCase {
                directory: state.directory(),
                issue: state.issue_otp(),
            }
            .execute(body.identifier)
            .await?;
            (out.expires_at, out.debug_code)
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(SendOtpResponse { expires_at, code }),
    ))
}

// ── POST /auth/otp/verify ────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct VerifyOtpRequest {
    pub identifier: String,
    pub code: String,
    pub purpose: OtpPurpose,
}

#[derive(Serialize)]
pub struct VerifyOtpResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

pub async fn verify_otp(
    State(state): State<AppState>,
    Json(body): Json<VerifyOtpRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let out = state
        .verify_otp()
        .execute(VerifyOtpInput {
            identifier: body.identifier,
            code: body.code,
            purpose: body.purpose,
        })
        .await?;

    let metadata = (!out.metadata.is_null()).then_some(out.metadata);
    Ok((
        StatusCode::OK,
        Json(VerifyOtpResponse {
            valid: true,
            metadata,
        }),
    ))
}
