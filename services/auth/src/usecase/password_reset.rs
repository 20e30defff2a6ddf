use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::crypto;
use crate::domain::repository::{Notifier, OtpRepository, RefreshTokenRepository, UserDirectory};
use crate::domain::types::{MIN_PASSWORD_LEN, OtpPurpose};
use crate::error::AuthServiceError;
use crate::usecase::otp::{IssueOtpInput, IssueOtpUseCase, VerifyOtpInput, VerifyOtpUseCase};

// ── StartPasswordReset ───────────────────────────────────────────────────────

#[derive(Debug)]
pub struct StartPasswordResetOutput {
    pub expires_at: DateTime<Utc>,
    /// Plaintext code for test automation; `None` unless codes are exposed,
    /// and always `None` for unknown identifiers.
    pub debug_code: Option<String>,
}

pub struct StartPasswordResetUseCase<D, O, N>
where
    D: UserDirectory,
    O: OtpRepository,
    N: Notifier,
{
    pub directory: D,
    pub issue: IssueOtpUseCase<O, N>,
}

impl<D, O, N> StartPasswordResetUseCase<D, O, N>
where
    D: UserDirectory,
    O: OtpRepository,
    N: Notifier,
{
    /// Never discloses whether the identifier exists. The unknown-identifier
    /// arm burns the same code-generation work and yields an output of the
    /// same shape, so callers cannot tell the two apart.
    pub async fn execute(
        &self,
        identifier: String,
    ) -> Result<StartPasswordResetOutput, AuthServiceError> {
        match self.directory.find_by_email(&identifier).await? {
            Some(user) => {
                let out = self
                    .issue
                    .execute(IssueOtpInput {
                        identifier,
                        purpose: OtpPurpose::PasswordReset,
                        metadata: json!({ "user_id": user.id }),
                    })
                    .await?;
                Ok(StartPasswordResetOutput {
                    expires_at: out.expires_at,
                    debug_code: out.debug_code,
                })
            }
            None => {
                let code = crypto::generate_code(self.issue.config.code_length);
                let _ = crypto::hash_code(&code);
                Ok(StartPasswordResetOutput {
                    expires_at: Utc::now() + Duration::minutes(self.issue.config.expiry_minutes),
                    debug_code: None,
                })
            }
        }
    }
}

// ── CompletePasswordReset ────────────────────────────────────────────────────

pub struct CompletePasswordResetInput {
    pub identifier: String,
    pub code: String,
    pub new_password: String,
}

pub struct CompletePasswordResetUseCase<D, O, R>
where
    D: UserDirectory,
    O: OtpRepository,
    R: RefreshTokenRepository,
{
    pub directory: D,
    pub verify: VerifyOtpUseCase<O>,
    pub refresh_tokens: R,
    pub bcrypt_cost: u32,
}

impl<D, O, R> CompletePasswordResetUseCase<D, O, R>
where
    D: UserDirectory,
    O: OtpRepository,
    R: RefreshTokenRepository,
{
    pub async fn execute(
        &self,
        input: CompletePasswordResetInput,
    ) -> Result<(), AuthServiceError> {
        if input.new_password.len() < MIN_PASSWORD_LEN {
            return Err(AuthServiceError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let verified = self
            .verify
            .execute(VerifyOtpInput {
                identifier: input.identifier,
                code: input.code,
                purpose: OtpPurpose::PasswordReset,
            })
            .await?;

        // The record carries the user id resolved at issue time; trust it over
        // a second directory lookup so a concurrent email change cannot
        // redirect the reset.
        let user_id: Uuid = verified
            .metadata
            .get("user_id")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| {
                AuthServiceError::Internal(anyhow::anyhow!("reset record missing user id"))
            })?;

        let password_hash = crypto::hash_password(&input.new_password, self.bcrypt_cost)?;
        self.directory
            .update_password_hash(user_id, &password_hash)
            .await?;

        // A changed password invalidates every open session.
        self.refresh_tokens.delete_all_for_user(user_id).await?;

        // The verified record has served its single use.
        self.verify.otps.delete(verified.record_id).await?;

        Ok(())
    }
}
