use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::TypedHeader;
use axum_extra::headers::{Authorization, authorization::Bearer};
use serde::{Deserialize, Serialize};

use bazaar_auth_types::token::validate_access_token;

use crate::error::AuthServiceError;
use crate::state::AppState;
use crate::usecase::token::{RevokeTokenUseCase, RotateTokenUseCase, SessionPair};

/// Token pair payload shared by every flow that ends in a session.
#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub access_token_exp: u64,
}

impl From<SessionPair> for TokenResponse {
    fn from(session: SessionPair) -> Self {
        Self {
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            access_token_exp: session.access_token_exp,
        }
    }
}

// ── POST /auth/token/refresh ─────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

pub async fn refresh_token(
    State(state): State<AppState>,
    Json(body): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = RotateTokenUseCase {
        directory: state.directory(),
        refresh_tokens: state.refresh_token_repo(),
        keys: state.token_keys.clone(),
    };

    let session = usecase.execute(&body.refresh_token).await?;

    Ok((StatusCode::CREATED, Json(TokenResponse::from(session))))
}

// ── POST /auth/logout ────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// With a refresh token in the body only that session ends; without one,
/// every session for the bearer is revoked.
pub async fn logout(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    body: Option<Json<LogoutRequest>>,
) -> Result<StatusCode, AuthServiceError> {
    let info = validate_access_token(bearer.token(), &state.token_keys.access_secret)
        .map_err(|_| AuthServiceError::InvalidToken)?;

    let refresh_token = body.and_then(|Json(b)| b.refresh_token);

    RevokeTokenUseCase {
        refresh_tokens: state.refresh_token_repo(),
    }
    .execute(info.user_id, refresh_token.as_deref())
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
