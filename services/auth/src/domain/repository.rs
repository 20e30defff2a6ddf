#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::types::{
    DirectoryUser, NewDirectoryUser, OtpPurpose, OtpRecord, RefreshTokenRecord,
};
use crate::error::AuthServiceError;

/// Repository for one-time passcode records.
pub trait OtpRepository: Send + Sync {
    /// Newest record for the pair regardless of state. Anchors the resend cooldown.
    async fn find_newest(
        &self,
        identifier: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpRecord>, AuthServiceError>;

    /// Unverified record matching the supplied code digest.
    async fn find_match(
        &self,
        identifier: &str,
        purpose: OtpPurpose,
        code_hash: &str,
    ) -> Result<Option<OtpRecord>, AuthServiceError>;

    /// Newest unverified record for the pair (attempt bookkeeping on mismatch).
    async fn find_newest_unverified(
        &self,
        identifier: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpRecord>, AuthServiceError>;

    /// Delete all unverified records for the pair and insert `record`, in one
    /// transaction — upholds the one-unverified-record-per-pair invariant.
    async fn replace_active(&self, record: &OtpRecord) -> Result<(), AuthServiceError>;

    /// Flip `verified` to true (exactly once per record).
    async fn mark_verified(&self, id: Uuid) -> Result<(), AuthServiceError>;

    /// Store the failed-attempt counter.
    async fn set_attempts(&self, id: Uuid, attempts: i32) -> Result<(), AuthServiceError>;

    async fn delete(&self, id: Uuid) -> Result<(), AuthServiceError>;

    /// Bulk-delete records expired at `now`. Returns the number removed.
    /// Safe to run concurrently with live verify calls.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthServiceError>;
}

/// Repository for persisted refresh tokens.
pub trait RefreshTokenRepository: Send + Sync {
    async fn create(&self, record: &RefreshTokenRecord) -> Result<(), AuthServiceError>;

    /// Exact-match lookup by token value.
    async fn find(&self, token: &str) -> Result<Option<RefreshTokenRecord>, AuthServiceError>;

    /// Delete by exact token value. Returns `false` when the row was already
    /// gone — the loser of a concurrent rotation must observe this.
    async fn delete(&self, token: &str) -> Result<bool, AuthServiceError>;

    /// Delete every token for the user (logout-everywhere, password change).
    /// Returns the number removed.
    async fn delete_all_for_user(&self, user_id: Uuid) -> Result<u64, AuthServiceError>;
}

/// Port for the external user directory (users service).
pub trait UserDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str)
    -> Result<Option<DirectoryUser>, AuthServiceError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<DirectoryUser>, AuthServiceError>;

    /// Create an ACTIVE user at registration completion.
    async fn create(&self, user: &NewDirectoryUser) -> Result<DirectoryUser, AuthServiceError>;

    async fn update_password_hash(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), AuthServiceError>;

    async fn touch_last_login(&self, id: Uuid) -> Result<(), AuthServiceError>;
}

/// Port for outbound mail. Dispatch happens inline on the issuing call path;
/// there is no queueing or retry behind this trait.
pub trait Notifier: Send + Sync {
    async fn send_otp(
        &self,
        identifier: &str,
        code: &str,
        purpose: OtpPurpose,
        expiry_minutes: i64,
    ) -> Result<(), AuthServiceError>;

    async fn send_welcome(&self, identifier: &str, name: &str) -> Result<(), AuthServiceError>;
}
