use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use bazaar_auth_types::token::{JwtClaims, validate_token};

use crate::domain::repository::{RefreshTokenRepository, UserDirectory};
use crate::domain::types::{DirectoryUser, RefreshTokenRecord};
use crate::error::AuthServiceError;

/// Signing material and lifetimes for both token kinds. The secrets are
/// distinct so a leaked access secret cannot forge refresh tokens.
#[derive(Debug, Clone)]
pub struct TokenKeys {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
}

/// Token pair returned to the client. The access token is stateless; the
/// refresh token is backed by a store row and is the only revocable side.
#[derive(Debug)]
pub struct SessionPair {
    pub access_token: String,
    pub access_token_exp: u64,
    pub refresh_token: String,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before UNIX epoch")
        .as_secs()
}

fn claims_for(user: &DirectoryUser, exp: u64) -> JwtClaims {
    JwtClaims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: user.role.as_u8(),
        tenant: user.tenant.clone(),
        exp,
    }
}

pub fn issue_access_token(
    user: &DirectoryUser,
    keys: &TokenKeys,
) -> Result<(String, u64), AuthServiceError> {
    let exp = now_secs() + keys.access_ttl_secs;
    let token = encode(
        &Header::default(),
        &claims_for(user, exp),
        &EncodingKey::from_secret(keys.access_secret.as_bytes()),
    )
    .map_err(|e| AuthServiceError::Internal(e.into()))?;
    Ok((token, exp))
}

pub fn issue_refresh_token(
    user: &DirectoryUser,
    keys: &TokenKeys,
) -> Result<String, AuthServiceError> {
    let exp = now_secs() + keys.refresh_ttl_secs;
    encode(
        &Header::default(),
        &claims_for(user, exp),
        &EncodingKey::from_secret(keys.refresh_secret.as_bytes()),
    )
    .map_err(|e| AuthServiceError::Internal(e.into()))
}

/// Mint a session pair and persist the refresh side.
pub async fn mint_session<R: RefreshTokenRepository>(
    user: &DirectoryUser,
    keys: &TokenKeys,
    refresh_tokens: &R,
) -> Result<SessionPair, AuthServiceError> {
    let (access_token, access_token_exp) = issue_access_token(user, keys)?;
    let refresh_token = issue_refresh_token(user, keys)?;

    let now = Utc::now();
    refresh_tokens
        .create(&RefreshTokenRecord {
            token: refresh_token.clone(),
            user_id: user.id,
            expires_at: now + Duration::seconds(keys.refresh_ttl_secs as i64),
            created_at: now,
        })
        .await?;

    Ok(SessionPair {
        access_token,
        access_token_exp,
        refresh_token,
    })
}

// ── RotateToken ──────────────────────────────────────────────────────────────

pub struct RotateTokenUseCase<D, R>
where
    D: UserDirectory,
    R: RefreshTokenRepository,
{
    pub directory: D,
    pub refresh_tokens: R,
    pub keys: TokenKeys,
}

impl<D, R> RotateTokenUseCase<D, R>
where
    D: UserDirectory,
    R: RefreshTokenRepository,
{
    pub async fn execute(&self, presented: &str) -> Result<SessionPair, AuthServiceError> {
        // Signature check first — garbage never reaches the store.
        validate_token(presented, &self.keys.refresh_secret)
            .map_err(|_| AuthServiceError::InvalidRefreshToken)?;

        let record = self
            .refresh_tokens
            .find(presented)
            .await?
            .ok_or(AuthServiceError::InvalidRefreshToken)?;

        if record.expires_at <= Utc::now() {
            self.refresh_tokens.delete(presented).await?;
            return Err(AuthServiceError::ExpiredRefreshToken);
        }

        // Single use: whoever wins this delete owns the rotation. The loser
        // of a concurrent race sees `false` and fails like any replay.
        if !self.refresh_tokens.delete(presented).await? {
            return Err(AuthServiceError::InvalidRefreshToken);
        }

        // Re-resolve the user so role/email changes propagate and deleted
        // users cannot rotate.
        let user = self
            .directory
            .find_by_id(record.user_id)
            .await?
            .ok_or(AuthServiceError::InvalidRefreshToken)?;

        mint_session(&user, &self.keys, &self.refresh_tokens).await
    }
}

// ── RevokeToken ──────────────────────────────────────────────────────────────

pub struct RevokeTokenUseCase<R: RefreshTokenRepository> {
    pub refresh_tokens: R,
}

impl<R: RefreshTokenRepository> RevokeTokenUseCase<R> {
    /// Scoped logout when `token` is given, logout-everywhere otherwise.
    /// Deleting an already-gone row is a no-op, not an error — logout is
    /// idempotent.
    pub async fn execute(
        &self,
        user_id: Uuid,
        token: Option<&str>,
    ) -> Result<(), AuthServiceError> {
        match token {
            Some(token) => {
                self.refresh_tokens.delete(token).await?;
            }
            None => {
                let revoked = self.refresh_tokens.delete_all_for_user(user_id).await?;
                tracing::debug!(user_id = %user_id, revoked, "revoked all sessions");
            }
        }
        Ok(())
    }
}
