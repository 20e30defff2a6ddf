use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use uuid::Uuid;

use bazaar_auth_schema::{otp_records, refresh_tokens};

use crate::domain::repository::{OtpRepository, RefreshTokenRepository};
use crate::domain::types::{OtpPurpose, OtpRecord, RefreshTokenRecord};
use crate::error::AuthServiceError;

// ── OTP repository ────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbOtpRepository {
    pub db: DatabaseConnection,
}

impl OtpRepository for DbOtpRepository {
    async fn find_newest(
        &self,
        identifier: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpRecord>, AuthServiceError> {
        let model = otp_records::Entity::find()
            .filter(otp_records::Column::Identifier.eq(identifier))
            .filter(otp_records::Column::Purpose.eq(purpose.as_i16()))
            .order_by_desc(otp_records::Column::CreatedAt)
            .one(&self.db)
            .await
            .context("find newest otp record")?;
        model.map(otp_from_model).transpose()
    }

    async fn find_match(
        &self,
        identifier: &str,
        purpose: OtpPurpose,
        code_hash: &str,
    ) -> Result<Option<OtpRecord>, AuthServiceError> {
        let model = otp_records::Entity::find()
            .filter(otp_records::Column::Identifier.eq(identifier))
            .filter(otp_records::Column::Purpose.eq(purpose.as_i16()))
            .filter(otp_records::Column::CodeHash.eq(code_hash))
            .filter(otp_records::Column::Verified.eq(false))
            .one(&self.db)
            .await
            .context("find matching otp record")?;
        model.map(otp_from_model).transpose()
    }

    async fn find_newest_unverified(
        &self,
        identifier: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpRecord>, AuthServiceError> {
        let model = otp_records::Entity::find()
            .filter(otp_records::Column::Identifier.eq(identifier))
            .filter(otp_records::Column::Purpose.eq(purpose.as_i16()))
            .filter(otp_records::Column::Verified.eq(false))
            .order_by_desc(otp_records::Column::CreatedAt)
            .one(&self.db)
            .await
            .context("find newest unverified otp record")?;
        model.map(otp_from_model).transpose()
    }

    async fn replace_active(&self, record: &OtpRecord) -> Result<(), AuthServiceError> {
        // Delete-then-insert in one transaction keeps the
        // one-unverified-record-per-pair invariant under concurrent issues.
        self.db
            .transaction::<_, (), sea_orm::DbErr>(|txn| {
                let record = record.clone();
                Box::pin(async move {
                    otp_records::Entity::delete_many()
                        .filter(otp_records::Column::Identifier.eq(record.identifier.clone()))
                        .filter(otp_records::Column::Purpose.eq(record.purpose.as_i16()))
                        .filter(otp_records::Column::Verified.eq(false))
                        .exec(txn)
                        .await?;
                    otp_records::ActiveModel {
                        id: Set(record.id),
                        identifier: Set(record.identifier.clone()),
                        purpose: Set(record.purpose.as_i16()),
                        code_hash: Set(record.code_hash.clone()),
                        expires_at: Set(record.expires_at),
                        verified: Set(record.verified),
                        attempts: Set(record.attempts),
                        metadata: Set(record.metadata.clone()),
                        created_at: Set(record.created_at),
                    }
                    .insert(txn)
                    .await?;
                    Ok(())
                })
            })
            .await
            .context("replace active otp record")?;
        Ok(())
    }

    async fn mark_verified(&self, id: Uuid) -> Result<(), AuthServiceError> {
        otp_records::ActiveModel {
            id: Set(id),
            verified: Set(true),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("mark otp record verified")?;
        Ok(())
    }

    async fn set_attempts(&self, id: Uuid, attempts: i32) -> Result<(), AuthServiceError> {
        otp_records::ActiveModel {
            id: Set(id),
            attempts: Set(attempts),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("set otp record attempts")?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AuthServiceError> {
        otp_records::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .context("delete otp record")?;
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AuthServiceError> {
        let result = otp_records::Entity::delete_many()
            .filter(otp_records::Column::ExpiresAt.lt(now))
            .exec(&self.db)
            .await
            .context("delete expired otp records")?;
        Ok(result.rows_affected)
    }
}

fn otp_from_model(model: otp_records::Model) -> Result<OtpRecord, AuthServiceError> {
    let purpose = OtpPurpose::from_i16(model.purpose)
        .ok_or_else(|| anyhow::anyhow!("unknown otp purpose wire value: {}", model.purpose))?;
    Ok(OtpRecord {
        id: model.id,
        identifier: model.identifier,
        purpose,
        code_hash: model.code_hash,
        expires_at: model.expires_at,
        verified: model.verified,
        attempts: model.attempts,
        metadata: model.metadata,
        created_at: model.created_at,
    })
}

// ── Refresh token repository ──────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbRefreshTokenRepository {
    pub db: DatabaseConnection,
}

impl RefreshTokenRepository for DbRefreshTokenRepository {
    async fn create(&self, record: &RefreshTokenRecord) -> Result<(), AuthServiceError> {
        refresh_tokens::ActiveModel {
            token: Set(record.token.clone()),
            user_id: Set(record.user_id),
            expires_at: Set(record.expires_at),
            created_at: Set(record.created_at),
        }
        .insert(&self.db)
        .await
        .context("create refresh token")?;
        Ok(())
    }

    async fn find(&self, token: &str) -> Result<Option<RefreshTokenRecord>, AuthServiceError> {
        let model = refresh_tokens::Entity::find_by_id(token.to_owned())
            .one(&self.db)
            .await
            .context("find refresh token")?;
        Ok(model.map(refresh_token_from_model))
    }

    async fn delete(&self, token: &str) -> Result<bool, AuthServiceError> {
        // rows_affected carries the rotation race: only one concurrent
        // delete for the same token value can report 1.
        let result = refresh_tokens::Entity::delete_by_id(token.to_owned())
            .exec(&self.db)
            .await
            .context("delete refresh token")?;
        Ok(result.rows_affected > 0)
    }

    async fn delete_all_for_user(&self, user_id: Uuid) -> Result<u64, AuthServiceError> {
        let result = refresh_tokens::Entity::delete_many()
            .filter(refresh_tokens::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .context("delete refresh tokens for user")?;
        Ok(result.rows_affected)
    }
}

fn refresh_token_from_model(model: refresh_tokens::Model) -> RefreshTokenRecord {
    RefreshTokenRecord {
        token: model.token,
        user_id: model.user_id,
        expires_at: model.expires_at,
        created_at: model.created_at,
    }
}
