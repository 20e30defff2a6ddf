use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::crypto;
use crate::domain::repository::{Notifier, OtpRepository};
use crate::domain::types::{MAX_VERIFY_ATTEMPTS, OtpPurpose, OtpRecord};
use crate::error::AuthServiceError;

/// OTP engine tuning. Built once in `config.rs`.
///
/// `expose_codes` can only be true in builds carrying the `expose-otp-codes`
/// cargo feature; see `AuthConfig::from_env`.
#[derive(Debug, Clone)]
pub struct OtpConfig {
    pub code_length: u32,
    pub expiry_minutes: i64,
    pub resend_cooldown_secs: i64,
    pub expose_codes: bool,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            code_length: 6,
            expiry_minutes: 10,
            resend_cooldown_secs: 60,
            expose_codes: false,
        }
    }
}

// ── IssueOtp ─────────────────────────────────────────────────────────────────

pub struct IssueOtpInput {
    pub identifier: String,
    pub purpose: OtpPurpose,
    pub metadata: Value,
}

#[derive(Debug)]
pub struct IssueOtpOutput {
    pub expires_at: DateTime<Utc>,
    /// Plaintext code for test automation. `None` unless `expose_codes`.
    pub debug_code: Option<String>,
}

pub struct IssueOtpUseCase<O, N>
where
    O: OtpRepository,
    N: Notifier,
{
    pub otps: O,
    pub notifier: N,
    pub config: OtpConfig,
}

impl<O, N> IssueOtpUseCase<O, N>
where
    O: OtpRepository,
    N: Notifier,
{
    pub async fn execute(&self, input: IssueOtpInput) -> Result<IssueOtpOutput, AuthServiceError> {
        let now = Utc::now();

        // 1. Resend cooldown, anchored on the newest record for the pair.
        if let Some(prev) = self.otps.find_newest(&input.identifier, input.purpose).await? {
            let retry_at = prev.created_at + Duration::seconds(self.config.resend_cooldown_secs);
            if retry_at > now {
                return Err(AuthServiceError::TooManyRequests {
                    retry_after_secs: (retry_at - now).num_seconds().max(1),
                });
            }
        }

        // 2. New record; prior unverified rows for the pair die in the same
        //    transaction, so at most one stays live.
        let code = crypto::generate_code(self.config.code_length);
        let record = OtpRecord {
            id: Uuid::new_v4(),
            identifier: input.identifier.clone(),
            purpose: input.purpose,
            code_hash: crypto::hash_code(&code),
            expires_at: now + Duration::minutes(self.config.expiry_minutes),
            verified: false,
            attempts: 0,
            metadata: input.metadata,
            created_at: now,
        };
        self.otps.replace_active(&record).await?;

        // 3. Inline dispatch. Failure fails the whole call — a code nobody can
        //    receive must not look issued to the caller.
        if let Err(e) = self
            .notifier
            .send_otp(
                &input.identifier,
                &code,
                input.purpose,
                self.config.expiry_minutes,
            )
            .await
        {
            if !self.config.expose_codes {
                tracing::error!(error = %e, purpose = input.purpose.as_str(), "otp dispatch failed");
                return Err(AuthServiceError::NotificationFailed);
            }
            tracing::warn!(error = %e, "otp dispatch failed, continuing because codes are exposed");
        }

        Ok(IssueOtpOutput {
            expires_at: record.expires_at,
            debug_code: self.config.expose_codes.then_some(code),
        })
    }
}

// ── VerifyOtp ────────────────────────────────────────────────────────────────

pub struct VerifyOtpInput {
    pub identifier: String,
    pub code: String,
    pub purpose: OtpPurpose,
}

#[derive(Debug)]
pub struct VerifyOtpOutput {
    pub record_id: Uuid,
    pub metadata: Value,
}

pub struct VerifyOtpUseCase<O: OtpRepository> {
    pub otps: O,
}

impl<O: OtpRepository> VerifyOtpUseCase<O> {
    pub async fn execute(
        &self,
        input: VerifyOtpInput,
    ) -> Result<VerifyOtpOutput, AuthServiceError> {
        let code_hash = crypto::hash_code(&input.code);
        let matched = self
            .otps
            .find_match(&input.identifier, input.purpose, &code_hash)
            .await?;

        let Some(record) = matched else {
            // Mismatch: charge the live record for the pair; at the ceiling the
            // record is destroyed, so even the original code stops working.
            if let Some(live) = self
                .otps
                .find_newest_unverified(&input.identifier, input.purpose)
                .await?
            {
                let attempts = live.attempts + 1;
                if attempts >= MAX_VERIFY_ATTEMPTS {
                    self.otps.delete(live.id).await?;
                    return Err(AuthServiceError::TooManyAttempts);
                }
                self.otps.set_attempts(live.id, attempts).await?;
            }
            return Err(AuthServiceError::InvalidOtp);
        };

        if record.is_expired(Utc::now()) {
            self.otps.delete(record.id).await?;
            return Err(AuthServiceError::OtpExpired);
        }

        self.otps.mark_verified(record.id).await?;
        Ok(VerifyOtpOutput {
            record_id: record.id,
            metadata: record.metadata,
        })
    }
}

// ── Expiry sweep ─────────────────────────────────────────────────────────────

/// Housekeeping sweep: drop every expired record. `verify` re-checks expiry
/// itself, so this has no correctness dependency; run at startup and then on
/// an hourly interval.
pub async fn cleanup_expired<O: OtpRepository>(otps: &O) -> Result<u64, AuthServiceError> {
    otps.delete_expired(Utc::now()).await
}
