use sea_orm::DatabaseConnection;
use tonic::transport::Channel;

use crate::infra::db::{DbOtpRepository, DbRefreshTokenRepository};
use crate::infra::grpc::GrpcUserDirectory;
use crate::infra::notifier::MailerNotifier;
use crate::usecase::otp::{IssueOtpUseCase, OtpConfig, VerifyOtpUseCase};
use crate::usecase::token::TokenKeys;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub directory_channel: Channel,
    pub mailer: MailerNotifier,
    pub otp_config: OtpConfig,
    pub token_keys: TokenKeys,
    pub bcrypt_cost: u32,
}

impl AppState {
    pub fn otp_repo(&self) -> DbOtpRepository {
        DbOtpRepository {
            db: self.db.clone(),
        }
    }

    pub fn refresh_token_repo(&self) -> DbRefreshTokenRepository {
        DbRefreshTokenRepository {
            db: self.db.clone(),
        }
    }

    pub fn directory(&self) -> GrpcUserDirectory {
        GrpcUserDirectory::new(self.directory_channel.clone())
    }

    pub fn notifier(&self) -> MailerNotifier {
        self.mailer.clone()
    }

    pub fn issue_otp(&self) -> IssueOtpUseCase<DbOtpRepository, MailerNotifier> {
        IssueOtpUseCase {
            otps: self.otp_repo(),
            notifier: self.notifier(),
            config: self.otp_config.clone(),
        }
    }

    pub fn verify_otp(&self) -> VerifyOtpUseCase<DbOtpRepository> {
        VerifyOtpUseCase {
            otps: self.otp_repo(),
        }
    }
}
