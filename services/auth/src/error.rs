use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Auth service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account disabled")]
    AccountDisabled,
    #[error("invalid code")]
    InvalidOtp,
    #[error("code expired")]
    OtpExpired,
    #[error("invalid token")]
    InvalidToken,
    #[error("invalid refresh token")]
    InvalidRefreshToken,
    #[error("refresh token expired")]
    ExpiredRefreshToken,
    #[error("user not found")]
    UserNotFound,
    #[error("account already exists")]
    DuplicateUser,
    #[error("too many requests, retry in {retry_after_secs}s")]
    TooManyRequests { retry_after_secs: i64 },
    #[error("too many attempts, request a new code")]
    TooManyAttempts,
    #[error("failed to deliver code, try again")]
    NotificationFailed,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AuthServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::AccountDisabled => "ACCOUNT_DISABLED",
            Self::InvalidOtp => "INVALID_OTP",
            Self::OtpExpired => "OTP_EXPIRED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            Self::ExpiredRefreshToken => "EXPIRED_REFRESH_TOKEN",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::DuplicateUser => "DUPLICATE_USER",
            Self::TooManyRequests { .. } => "TOO_MANY_REQUESTS",
            Self::TooManyAttempts => "TOO_MANY_ATTEMPTS",
            Self::NotificationFailed => "NOTIFICATION_FAILED",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for AuthServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials
            | Self::AccountDisabled
            | Self::InvalidOtp
            | Self::OtpExpired
            | Self::InvalidToken
            | Self::InvalidRefreshToken
            | Self::ExpiredRefreshToken => StatusCode::UNAUTHORIZED,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::DuplicateUser => StatusCode::CONFLICT,
            Self::TooManyRequests { .. } | Self::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
            Self::NotificationFailed => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // Log 500s only — tower-http TraceLayer already records method/uri/status for all
        // requests. 4xx are expected client errors; logging them here would be noise.
        // Internal errors need the anyhow chain logged so the root cause is traceable.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %e, kind = "INTERNAL", "internal error");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
