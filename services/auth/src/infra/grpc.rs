use tonic::transport::Channel;
use uuid::Uuid;

use bazaar_domain::user::{UserRole, UserStatus};
use bazaar_proto::directory::{
    CreateUserRequest, GetUserByEmailRequest, GetUserRequest, TouchLastLoginRequest,
    UpdatePasswordHashRequest, directory_service_client::DirectoryServiceClient,
};

use crate::domain::repository::UserDirectory;
use crate::domain::types::{DirectoryUser, NewDirectoryUser};
use crate::error::AuthServiceError;

#[derive(Clone)]
pub struct GrpcUserDirectory {
    client: DirectoryServiceClient<Channel>,
}

impl GrpcUserDirectory {
    pub fn new(channel: Channel) -> Self {
        Self {
            client: DirectoryServiceClient::new(channel),
        }
    }
}

impl UserDirectory for GrpcUserDirectory {
    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<DirectoryUser>, AuthServiceError> {
        let response = self
            .client
            .clone()
            .get_user_by_email(GetUserByEmailRequest {
                email: email.to_string(),
            })
            .await;
        match response {
            Ok(resp) => Ok(Some(resp.into_inner().try_into()?)),
            Err(status) if status.code() == tonic::Code::NotFound => Ok(None),
            Err(e) => Err(anyhow::anyhow!("gRPC get_user_by_email failed: {e}").into()),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<DirectoryUser>, AuthServiceError> {
        let response = self
            .client
            .clone()
            .get_user(GetUserRequest {
                user_id: id.to_string(),
            })
            .await;
        match response {
            Ok(resp) => Ok(Some(resp.into_inner().try_into()?)),
            Err(status) if status.code() == tonic::Code::NotFound => Ok(None),
            Err(e) => Err(anyhow::anyhow!("gRPC get_user failed: {e}").into()),
        }
    }

    async fn create(&self, user: &NewDirectoryUser) -> Result<DirectoryUser, AuthServiceError> {
        let response = self
            .client
            .clone()
            .create_user(CreateUserRequest {
                email: user.email.clone(),
                name: user.name.clone(),
                password_hash: user.password_hash.clone(),
            })
            .await;
        match response {
            Ok(resp) => resp.into_inner().try_into(),
            // Lost the duplicate race against a concurrent registration.
            Err(status) if status.code() == tonic::Code::AlreadyExists => {
                Err(AuthServiceError::DuplicateUser)
            }
            Err(e) => Err(anyhow::anyhow!("gRPC create_user failed: {e}").into()),
        }
    }

    async fn update_password_hash(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), AuthServiceError> {
        self.client
            .clone()
            .update_password_hash(UpdatePasswordHashRequest {
                user_id: id.to_string(),
                password_hash: password_hash.to_string(),
            })
            .await
            .map_err(|e| anyhow::anyhow!("gRPC update_password_hash failed: {e}"))?;
        Ok(())
    }

    async fn touch_last_login(&self, id: Uuid) -> Result<(), AuthServiceError> {
        self.client
            .clone()
            .touch_last_login(TouchLastLoginRequest {
                user_id: id.to_string(),
            })
            .await
            .map_err(|e| anyhow::anyhow!("gRPC touch_last_login failed: {e}"))?;
        Ok(())
    }
}

impl TryFrom<bazaar_proto::directory::User> for DirectoryUser {
    type Error = AuthServiceError;

    fn try_from(user: bazaar_proto::directory::User) -> Result<Self, Self::Error> {
        let id = user
            .id
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid UUID from directory service"))?;
        let role = u8::try_from(user.role)
            .ok()
            .and_then(UserRole::from_u8)
            .ok_or_else(|| anyhow::anyhow!("role out of range: {}", user.role))?;
        let status = u8::try_from(user.status)
            .ok()
            .and_then(UserStatus::from_u8)
            .ok_or_else(|| anyhow::anyhow!("status out of range: {}", user.status))?;
        Ok(DirectoryUser {
            id,
            email: user.email,
            name: user.name,
            role,
            status,
            password_hash: user.password_hash,
            tenant: user.tenant,
        })
    }
}
