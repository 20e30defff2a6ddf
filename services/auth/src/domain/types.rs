use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use bazaar_domain::user::{UserRole, UserStatus};

/// Scope tag binding a one-time code to exactly one flow. A code issued for
/// one purpose never matches under another.
///
/// Wire format: `i16` column value (0 = verification, 1 = login,
/// 2 = password reset); snake_case strings on the HTTP surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Verification = 0,
    Login = 1,
    PasswordReset = 2,
}

impl OtpPurpose {
    /// Convert from `i16` wire value. Returns `None` for unknown values.
    pub fn from_i16(v: i16) -> Option<Self> {
        match v {
            0 => Some(Self::Verification),
            1 => Some(Self::Login),
            2 => Some(Self::PasswordReset),
            _ => None,
        }
    }

    /// Convert to `i16` wire value.
    pub fn as_i16(self) -> i16 {
        self as i16
    }

    /// Stable name for mail templates and log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Verification => "verification",
            Self::Login => "login",
            Self::PasswordReset => "password_reset",
        }
    }
}

/// One-time passcode record. Only the SHA-256 digest of the code is kept.
#[derive(Debug, Clone)]
pub struct OtpRecord {
    pub id: Uuid,
    pub identifier: String,
    pub purpose: OtpPurpose,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    pub verified: bool,
    pub attempts: i32,
    /// Flow context: pending registration profile, or the resolved user id
    /// for password resets.
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

impl OtpRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Persisted refresh token row. Deleted on rotation/logout/password change,
/// never updated in place.
#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// User record as served by the directory service.
#[derive(Debug, Clone)]
pub struct DirectoryUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub status: UserStatus,
    /// Absent for accounts registered via OTP that never set a password.
    pub password_hash: Option<String>,
    pub tenant: Option<String>,
}

/// Payload for creating a user at registration completion.
#[derive(Debug, Clone)]
pub struct NewDirectoryUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
}

/// Failed verify calls tolerated per record before it is destroyed,
/// forcing a re-issue. Bounds guessing of the code space to this many tries.
pub const MAX_VERIFY_ATTEMPTS: i32 = 5;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Light email-shape check for inbound identifiers. The directory is the
/// authority on existence; this only rejects obvious garbage before it
/// reaches a store or the mailer.
pub fn validate_identifier(identifier: &str) -> bool {
    if identifier.len() > 254 {
        return false;
    }
    match identifier.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    }
}
