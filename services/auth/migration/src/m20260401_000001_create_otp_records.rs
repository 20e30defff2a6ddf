use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OtpRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OtpRecords::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OtpRecords::Identifier).string().not_null())
                    .col(ColumnDef::new(OtpRecords::Purpose).small_integer().not_null())
                    .col(ColumnDef::new(OtpRecords::CodeHash).string().not_null())
                    .col(
                        ColumnDef::new(OtpRecords::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OtpRecords::Verified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(OtpRecords::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(OtpRecords::Metadata).json_binary().not_null())
                    .col(
                        ColumnDef::new(OtpRecords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Covers cooldown lookup, digest match, and the delete-unverified sweep.
        manager
            .create_index(
                Index::create()
                    .table(OtpRecords::Table)
                    .col(OtpRecords::Identifier)
                    .col(OtpRecords::Purpose)
                    .name("idx_otp_records_identifier_purpose")
                    .to_owned(),
            )
            .await?;

        // Expiry sweep scans by expires_at alone.
        manager
            .create_index(
                Index::create()
                    .table(OtpRecords::Table)
                    .col(OtpRecords::ExpiresAt)
                    .name("idx_otp_records_expires_at")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OtpRecords::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum OtpRecords {
    Table,
    Id,
    Identifier,
    Purpose,
    CodeHash,
    ExpiresAt,
    Verified,
    Attempts,
    Metadata,
    CreatedAt,
}
