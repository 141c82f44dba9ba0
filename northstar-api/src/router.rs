use axum::{http::Method, routing::get, Json, Router};
use serde::Serialize;
use sqlx::PgPool;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::{app_state::AppState, config::Settings, routes};

pub fn create(connection_pool: PgPool, config: Settings) -> Router<()> {
    let app = Router::new()
        .route("/", get(service_info))
        .nest("/businesses", routes::businesses::router())
        .nest("/events", routes::events::router())
        .nest("/reviews", routes::reviews::router())
        .nest("/categories", routes::categories::router())
        .nest("/assistant", routes::assistant::router())
        .nest("/admin/claims", routes::claims::router())
        .nest("/api/v1", routes::public_api::router());

    let app_state = AppState::new(connection_pool, &config);

    let app_url = config.application.app_url.clone();
    let allowed_suffix = config.application.cors_allowed_origin_suffix.clone();
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(["content-type".parse().unwrap(), "authorization".parse().unwrap()])
        .allow_credentials(true)
        .allow_origin(AllowOrigin::predicate(move |origin, _| {
            let origin_str = origin.to_str().unwrap_or_default();
            if origin_str == app_url {
                return true;
            }
            if let Some(ref suffix) = allowed_suffix {
                return origin_str.starts_with("https://") && origin_str.ends_with(suffix.as_str());
            }
            false
        }));

    app.with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
}

#[derive(Serialize)]
struct ServiceInfo {
    name: &'static str,
    version: &'static str,
}

async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}
