//! Read-only partner API, keyed by an `X-API-Key` header whose SHA-256
//! digest is checked against configuration.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::instrument;

use crate::{
    domain::search::pagination::Paginated,
    domain::search::query::{RawEventSearchParams, RawSearchParams, EventSearchQuery, SearchQuery},
    routes::ApiError,
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(descriptor))
        .route("/businesses", get(list_businesses))
        .route("/businesses/:id", get(get_business))
        .route("/events", get(list_events))
}

fn verify_api_key(app_state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = &app_state.public_api_key_hash else {
        return Err(ApiError::unauthorized("The public API is not enabled"));
    };

    let provided = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Missing X-API-Key header"))?;

    let digest = hex::encode(Sha256::digest(provided.as_bytes()));
    if !digest.eq_ignore_ascii_case(expected) {
        return Err(ApiError::unauthorized("Invalid API key"));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiDescriptor {
    name: &'static str,
    version: &'static str,
    endpoints: [&'static str; 3],
}

#[instrument(name = "GET /api/v1", skip(app_state, headers))]
async fn descriptor(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiDescriptor>, ApiError> {
    verify_api_key(&app_state, &headers)?;
    Ok(Json(ApiDescriptor {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        endpoints: ["/businesses", "/businesses/:id", "/events"],
    }))
}

/// Trimmed projection served to API consumers.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PublicBusiness {
    id: i32,
    slug: String,
    name: String,
    short_description: Option<String>,
    city: Option<String>,
    verified: bool,
    average_rating: Option<f64>,
    review_count: i64,
}

#[instrument(name = "GET /api/v1/businesses", skip(app_state, headers))]
async fn list_businesses(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<RawSearchParams>,
) -> Result<Json<Paginated<PublicBusiness>>, ApiError> {
    verify_api_key(&app_state, &headers)?;

    let query = SearchQuery::parse(params)?;
    let page = app_state.search_service.search_businesses(&query).await?;

    Ok(Json(page.map(|b| PublicBusiness {
        id: b.id,
        slug: b.slug,
        name: b.name,
        short_description: b.short_description,
        city: b
            .locations
            .iter()
            .find(|l| l.is_primary)
            .or(b.locations.first())
            .map(|l| l.city.clone()),
        verified: b.verified,
        average_rating: b.average_rating,
        review_count: b.review_count,
    })))
}

#[instrument(name = "GET /api/v1/businesses/:id", skip(app_state, headers))]
async fn get_business(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i32>,
) -> Result<Json<PublicBusiness>, ApiError> {
    verify_api_key(&app_state, &headers)?;

    let business = app_state.business_repo.get_business(id).await?;
    let locations = app_state.business_repo.locations_for(id).await?;
    let rating_rows = app_state.review_repo.rating_rows(id).await?;
    let stats = crate::domain::review::compute_review_stats(&rating_rows);

    Ok(Json(PublicBusiness {
        id: business.id,
        slug: business.slug,
        name: business.name,
        short_description: business.short_description,
        city: locations.first().map(|l| l.city.clone()),
        verified: business.verified,
        average_rating: (stats.total_reviews > 0).then_some(stats.average_rating),
        review_count: stats.total_reviews,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PublicEvent {
    id: i32,
    slug: String,
    title: String,
    #[serde(with = "time::serde::rfc3339")]
    start_date: time::OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    end_date: time::OffsetDateTime,
    city: Option<String>,
    is_virtual: bool,
    registration_count: i64,
}

#[instrument(name = "GET /api/v1/events", skip(app_state, headers))]
async fn list_events(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<RawEventSearchParams>,
) -> Result<Json<Paginated<PublicEvent>>, ApiError> {
    verify_api_key(&app_state, &headers)?;

    let query = EventSearchQuery::parse(params)?;
    let page = app_state.search_service.search_events(&query).await?;

    Ok(Json(page.map(|item| {
        let event = item.event.event;
        PublicEvent {
            id: event.id,
            slug: event.slug,
            title: event.title,
            start_date: event.start_date,
            end_date: event.end_date,
            city: event.city,
            is_virtual: event.is_virtual,
            registration_count: item.event.registration_count,
        }
    })))
}
