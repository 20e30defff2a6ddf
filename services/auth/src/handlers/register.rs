use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;

use crate::error::AuthServiceError;
use crate::handlers::token::TokenResponse;
use crate::state::AppState;
use crate::usecase::otp::VerifyOtpUseCase;
use crate::usecase::register::{CompleteRegistrationInput, CompleteRegistrationUseCase};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub identifier: String,
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
    pub password: String,
}

/// Completes a registration started via `POST /auth/otp/send`
/// (purpose `verification`).
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = CompleteRegistrationUseCase {
        directory: state.directory(),
        verify: VerifyOtpUseCase {
            otps: state.otp_repo(),
        },
        refresh_tokens: state.refresh_token_repo(),
        notifier: state.notifier(),
        keys: state.token_keys.clone(),
        bcrypt_cost: state.bcrypt_cost,
    };

    let out = usecase
        .execute(CompleteRegistrationInput {
            identifier: body.identifier,
            code: body.code,
            name: body.name,
            password: body.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(TokenResponse::from(out.session))))
}
