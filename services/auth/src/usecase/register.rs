use serde_json::json;

use crate::crypto;
use crate::domain::repository::{Notifier, OtpRepository, RefreshTokenRepository, UserDirectory};
use crate::domain::types::{
    DirectoryUser, MIN_PASSWORD_LEN, NewDirectoryUser, OtpPurpose, validate_identifier,
};
use crate::error::AuthServiceError;
use crate::usecase::otp::{
    IssueOtpInput, IssueOtpOutput, IssueOtpUseCase, VerifyOtpInput, VerifyOtpUseCase,
};
use crate::usecase::token::{SessionPair, TokenKeys, mint_session};

// ── StartRegistration ────────────────────────────────────────────────────────

pub struct StartRegistrationInput {
    pub identifier: String,
    /// Display name submitted up front; stashed in the OTP record so the
    /// completion call may omit it.
    pub name: Option<String>,
}

pub struct StartRegistrationUseCase<D, O, N>
where
    D: UserDirectory,
    O: OtpRepository,
    N: Notifier,
{
    pub directory: D,
    pub issue: IssueOtpUseCase<O, N>,
}

impl<D, O, N> StartRegistrationUseCase<D, O, N>
where
    D: UserDirectory,
    O: OtpRepository,
    N: Notifier,
{
    pub async fn execute(
        &self,
        input: StartRegistrationInput,
    ) -> Result<IssueOtpOutput, AuthServiceError> {
        if !validate_identifier(&input.identifier) {
            return Err(AuthServiceError::Validation(
                "identifier must be an email address".to_owned(),
            ));
        }

        // Registration is the one flow where the identifier must NOT exist.
        if self
            .directory
            .find_by_email(&input.identifier)
            .await?
            .is_some()
        {
            return Err(AuthServiceError::DuplicateUser);
        }

        self.issue
            .execute(IssueOtpInput {
                identifier: input.identifier,
                purpose: OtpPurpose::Verification,
                metadata: json!({ "name": input.name }),
            })
            .await
    }
}

// ── CompleteRegistration ─────────────────────────────────────────────────────

pub struct CompleteRegistrationInput {
    pub identifier: String,
    pub code: String,
    pub name: Option<String>,
    pub password: String,
}

#[derive(Debug)]
pub struct CompleteRegistrationOutput {
    pub user: DirectoryUser,
    pub session: SessionPair,
}

pub struct CompleteRegistrationUseCase<D, O, R, N>
where
    D: UserDirectory,
    O: OtpRepository,
    R: RefreshTokenRepository,
    N: Notifier,
{
    pub directory: D,
    pub verify: VerifyOtpUseCase<O>,
    pub refresh_tokens: R,
    pub notifier: N,
    pub keys: TokenKeys,
    pub bcrypt_cost: u32,
}

impl<D, O, R, N> CompleteRegistrationUseCase<D, O, R, N>
where
    D: UserDirectory,
    O: OtpRepository,
    R: RefreshTokenRepository,
    N: Notifier,
{
    pub async fn execute(
        &self,
        input: CompleteRegistrationInput,
    ) -> Result<CompleteRegistrationOutput, AuthServiceError> {
        if input.password.len() < MIN_PASSWORD_LEN {
            return Err(AuthServiceError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let verified = self
            .verify
            .execute(VerifyOtpInput {
                identifier: input.identifier.clone(),
                code: input.code,
                purpose: OtpPurpose::Verification,
            })
            .await?;

        // Profile submitted now wins; the issue-time name backs it up.
        let name = input
            .name
            .filter(|n| !n.is_empty())
            .or_else(|| {
                verified
                    .metadata
                    .get("name")
                    .and_then(|v| v.as_str())
                    .map(str::to_owned)
            })
            .ok_or_else(|| AuthServiceError::Validation("name is required".to_owned()))?;

        let password_hash = crypto::hash_password(&input.password, self.bcrypt_cost)?;
        let user = self
            .directory
            .create(&NewDirectoryUser {
                email: input.identifier,
                name,
                password_hash,
            })
            .await?;

        // The verified record has served its single use.
        self.verify.otps.delete(verified.record_id).await?;

        let session = mint_session(&user, &self.keys, &self.refresh_tokens).await?;

        // Best-effort: the account exists even if the welcome mail bounces.
        if let Err(e) = self.notifier.send_welcome(&user.email, &user.name).await {
            tracing::warn!(error = %e, "welcome mail failed");
        }

        Ok(CompleteRegistrationOutput { user, session })
    }
}
