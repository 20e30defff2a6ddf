use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;

use crate::error::AuthServiceError;
use crate::state::AppState;
use crate::usecase::otp::VerifyOtpUseCase;
use crate::usecase::password_reset::{CompletePasswordResetInput, CompletePasswordResetUseCase};

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub identifier: String,
    pub code: String,
    pub new_password: String,
}

/// Completes a reset started via `POST /auth/otp/send` (purpose
/// `password_reset`). Every open session for the user is revoked.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = CompletePasswordResetUseCase {
        directory: state.directory(),
        verify: VerifyOtpUseCase {
            otps: state.otp_repo(),
        },
        refresh_tokens: state.refresh_token_repo(),
        bcrypt_cost: state.bcrypt_cost,
    };

    usecase
        .execute(CompletePasswordResetInput {
            identifier: body.identifier,
            code: body.code,
            new_password: body.new_password,
        })
        .await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "message": "password updated, sign in again" })),
    ))
}
