use serde_json::json;

use crate::crypto;
use crate::domain::repository::{Notifier, OtpRepository, RefreshTokenRepository, UserDirectory};
use crate::domain::types::{DirectoryUser, OtpPurpose};
use crate::error::AuthServiceError;
use crate::usecase::otp::{
    IssueOtpInput, IssueOtpOutput, IssueOtpUseCase, VerifyOtpInput, VerifyOtpUseCase,
};
use crate::usecase::token::{SessionPair, TokenKeys, mint_session};

#[derive(Debug)]
pub struct LoginOutput {
    pub user: DirectoryUser,
    pub session: SessionPair,
}

// ── StartOtpLogin ────────────────────────────────────────────────────────────

pub struct StartOtpLoginUseCase<D, O, N>
where
    D: UserDirectory,
    O: OtpRepository,
    N: Notifier,
{
    pub directory: D,
    pub issue: IssueOtpUseCase<O, N>,
}

impl<D, O, N> StartOtpLoginUseCase<D, O, N>
where
    D: UserDirectory,
    O: OtpRepository,
    N: Notifier,
{
    /// Revealing non-existence is acceptable here: creating the account
    /// already required verified ownership of the identifier.
    pub async fn execute(&self, identifier: String) -> Result<IssueOtpOutput, AuthServiceError> {
        let user = self
            .directory
            .find_by_email(&identifier)
            .await?
            .ok_or(AuthServiceError::UserNotFound)?;

        if !user.status.is_active() {
            return Err(AuthServiceError::AccountDisabled);
        }

        self.issue
            .execute(IssueOtpInput {
                identifier,
                purpose: OtpPurpose::Login,
                metadata: json!({ "user_id": user.id }),
            })
            .await
    }
}

// ── CompleteOtpLogin ─────────────────────────────────────────────────────────

pub struct CompleteOtpLoginInput {
    pub identifier: String,
    pub code: String,
}

pub struct CompleteOtpLoginUseCase<D, O, R>
where
    D: UserDirectory,
    O: OtpRepository,
    R: RefreshTokenRepository,
{
    pub directory: D,
    pub verify: VerifyOtpUseCase<O>,
    pub refresh_tokens: R,
    pub keys: TokenKeys,
}

impl<D, O, R> CompleteOtpLoginUseCase<D, O, R>
where
    D: UserDirectory,
    O: OtpRepository,
    R: RefreshTokenRepository,
{
    pub async fn execute(
        &self,
        input: CompleteOtpLoginInput,
    ) -> Result<LoginOutput, AuthServiceError> {
        let user = self
            .directory
            .find_by_email(&input.identifier)
            .await?
            .ok_or(AuthServiceError::UserNotFound)?;

        if !user.status.is_active() {
            return Err(AuthServiceError::AccountDisabled);
        }

        self.verify
            .execute(VerifyOtpInput {
                identifier: input.identifier,
                code: input.code,
                purpose: OtpPurpose::Login,
            })
            .await?;

        let session = mint_session(&user, &self.keys, &self.refresh_tokens).await?;
        self.directory.touch_last_login(user.id).await?;

        Ok(LoginOutput { user, session })
    }
}

// ── PasswordLogin ────────────────────────────────────────────────────────────

pub struct PasswordLoginInput {
    pub identifier: String,
    pub password: String,
}

pub struct PasswordLoginUseCase<D, R>
where
    D: UserDirectory,
    R: RefreshTokenRepository,
{
    pub directory: D,
    pub refresh_tokens: R,
    pub keys: TokenKeys,
}

impl<D, R> PasswordLoginUseCase<D, R>
where
    D: UserDirectory,
    R: RefreshTokenRepository,
{
    pub async fn execute(
        &self,
        input: PasswordLoginInput,
    ) -> Result<LoginOutput, AuthServiceError> {
        // Unknown identifier and wrong password collapse into one answer.
        let user = self
            .directory
            .find_by_email(&input.identifier)
            .await?
            .ok_or(AuthServiceError::InvalidCredentials)?;

        let digest = user
            .password_hash
            .as_deref()
            .ok_or(AuthServiceError::InvalidCredentials)?;

        if !crypto::verify_password(&input.password, digest) {
            return Err(AuthServiceError::InvalidCredentials);
        }

        // Even a correct password does not open a disabled account.
        if !user.status.is_active() {
            return Err(AuthServiceError::AccountDisabled);
        }

        let session = mint_session(&user, &self.keys, &self.refresh_tokens).await?;
        self.directory.touch_last_login(user.id).await?;

        Ok(LoginOutput { user, session })
    }
}
