use crate::crypto::DEFAULT_BCRYPT_COST;
use crate::usecase::otp::OtpConfig;
use crate::usecase::token::TokenKeys;

/// Auth service configuration loaded from environment variables.
#[derive(Debug)]
pub struct AuthConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Users service gRPC URL (e.g. "http://users:50051"). Env var: `USERS_GRPC_URL`.
    pub users_grpc_url: String,
    /// Mailer service base URL (e.g. "http://mailer:3120"). Env var: `MAILER_URL`.
    pub mailer_url: String,
    /// Signing secrets and lifetimes for access/refresh tokens.
    pub token_keys: TokenKeys,
    /// OTP engine tuning.
    pub otp: OtpConfig,
    /// bcrypt work factor for password digests. Env var: `BCRYPT_COST`.
    pub bcrypt_cost: u32,
    /// TCP port to listen on (default 3112). Env var: `AUTH_PORT`.
    pub auth_port: u16,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl AuthConfig {
    pub fn from_env() -> Self {
        let access_secret = std::env::var("ACCESS_TOKEN_SECRET").expect("ACCESS_TOKEN_SECRET");
        let refresh_secret = std::env::var("REFRESH_TOKEN_SECRET").expect("REFRESH_TOKEN_SECRET");
        assert_ne!(
            access_secret, refresh_secret,
            "ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ"
        );

        // The only place the expose flag can enter the process. Builds without
        // the `expose-otp-codes` feature never consult the env var, so a typo'd
        // deployment cannot switch it on in production.
        #[cfg(feature = "expose-otp-codes")]
        let expose_codes = matches!(
            std::env::var("OTP_EXPOSE_CODES").as_deref(),
            Ok("1") | Ok("true")
        );
        #[cfg(not(feature = "expose-otp-codes"))]
        let expose_codes = false;

        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL"),
            users_grpc_url: std::env::var("USERS_GRPC_URL").expect("USERS_GRPC_URL"),
            mailer_url: std::env::var("MAILER_URL").expect("MAILER_URL"),
            token_keys: TokenKeys {
                access_secret,
                refresh_secret,
                access_ttl_secs: env_parse("ACCESS_TOKEN_TTL_SECS", 7 * 24 * 3600),
                refresh_ttl_secs: env_parse("REFRESH_TOKEN_TTL_SECS", 30 * 24 * 3600),
            },
            otp: OtpConfig {
                // 4..=9 keeps the uniform u64 draw in range and codes typable.
                code_length: env_parse::<u32>("OTP_CODE_LENGTH", 6).clamp(4, 9),
                expiry_minutes: env_parse("OTP_EXPIRY_MINUTES", 10),
                resend_cooldown_secs: env_parse("OTP_RESEND_COOLDOWN_SECS", 60),
                expose_codes,
            },
            bcrypt_cost: env_parse("BCRYPT_COST", DEFAULT_BCRYPT_COST),
            auth_port: env_parse("AUTH_PORT", 3112),
        }
    }
}
