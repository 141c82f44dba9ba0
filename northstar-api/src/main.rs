mod app_state;
mod auth;
mod config;
mod domain;
mod repositories;
mod router;
mod routes;

pub use app_state::AppState;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "northstar_api=debug,tower_http=debug".into()),
        )
        .init();

    let config = config::read_config().expect("Failed to read configuration");

    let connection_pool = PgPoolOptions::new().connect_lazy_with(config.database.with_db());
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to run database migrations");

    let address = format!(
        "{}:{}",
        config.application.host, config.application.port
    );
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .expect("Failed to bind listener");
    tracing::info!("Listening on {address}");

    let app = router::create(connection_pool, config);
    axum::serve(listener, app)
        .await
        .expect("Server exited unexpectedly");
}
