use sea_orm::Database;
use tracing::{error, info};

use bazaar_auth::config::AuthConfig;
use bazaar_auth::infra::notifier::MailerNotifier;
use bazaar_auth::router::build_router;
use bazaar_auth::state::AppState;
use bazaar_auth::usecase::otp::cleanup_expired;

#[tokio::main]
async fn main() {
    bazaar_core::tracing::init_tracing();

    let config = AuthConfig::from_env();

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let directory_channel = tonic::transport::Channel::from_shared(config.users_grpc_url.clone())
        .expect("invalid USERS_GRPC_URL")
        .connect_lazy();

    let state = AppState {
        db,
        directory_channel,
        mailer: MailerNotifier::new(config.mailer_url),
        otp_config: config.otp,
        token_keys: config.token_keys,
        bcrypt_cost: config.bcrypt_cost,
    };

    // Expired-record sweep: the first tick fires immediately (process start),
    // then hourly. Purely housekeeping — verify re-checks expiry itself.
    let sweeper = state.otp_repo();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(std::time::Duration::from_secs(3600));
        loop {
            tick.tick().await;
            match cleanup_expired(&sweeper).await {
                Ok(0) => {}
                Ok(removed) => info!(removed, "swept expired otp records"),
                Err(e) => error!(error = %e, "otp sweep failed"),
            }
        }
    });

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.auth_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("auth service listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
