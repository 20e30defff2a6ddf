use sea_orm::entity::prelude::*;

/// One-time passcode record, keyed by (identifier, purpose).
/// Stores only the SHA-256 digest of the code, never the plaintext.
/// At most one unverified row exists per (identifier, purpose) pair.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "otp_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub identifier: String,
    /// Wire value of `OtpPurpose` (0 = verification, 1 = login, 2 = password reset).
    pub purpose: i16,
    pub code_hash: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub verified: bool,
    pub attempts: i32,
    /// Flow context: pending registration profile, or the resolved user id
    /// for password resets.
    pub metadata: Json,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
