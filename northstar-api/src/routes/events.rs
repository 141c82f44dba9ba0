use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    auth::CurrentUser,
    domain::{
        business::Business,
        event::{
            Event, EventRegistration, EventStatus, EventUpdate, EventWithCount, NewEvent,
            NewRegistration, RegistrationStatus,
        },
        search::pagination::Paginated,
        search::query::{EventSearchQuery, RawEventSearchParams, ValidationError},
        search::types::EventSearchItem,
        slug::slugify,
    },
    routes::ApiError,
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/search", get(search))
        .route("/", post(create_event))
        .route(
            "/:id",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route("/:id/status", axum::routing::patch(set_status))
        .route("/:id/register", post(register).delete(cancel_registration))
}

#[instrument(name = "GET /events/search", skip(app_state))]
async fn search(
    State(app_state): State<AppState>,
    Query(params): Query<RawEventSearchParams>,
) -> Result<Json<Paginated<EventSearchItem>>, ApiError> {
    let query = EventSearchQuery::parse(params)?;
    let page = app_state.search_service.search_events(&query).await?;
    Ok(Json(page))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventDetail {
    #[serde(flatten)]
    event: EventWithCount,
    business: Business,
}

#[instrument(name = "GET /events/:id", skip(app_state))]
async fn get_event(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<EventDetail>, ApiError> {
    let event = app_state.event_repo.get_with_count(id).await?;
    let business = app_state
        .business_repo
        .get_business(event.event.business_id)
        .await?;

    Ok(Json(EventDetail { event, business }))
}

#[instrument(name = "POST /events", skip(user, app_state, body), fields(user_id = user.0.id))]
async fn create_event(
    user: CurrentUser,
    State(app_state): State<AppState>,
    Json(body): Json<NewEvent>,
) -> Result<(StatusCode, Json<Event>), ApiError> {
    require_business_owner(&app_state, body.business_id, user.0.id).await?;

    let slug = slugify(&body.title);
    if slug.is_empty() {
        return Err(ValidationError::single("title").into());
    }
    if body.end_date < body.start_date {
        return Err(ValidationError::single("endDate").into());
    }

    let event = app_state.event_repo.insert_event(&slug, &body).await?;
    tracing::info!("Created event {} ({})", event.id, event.slug);
    Ok((StatusCode::CREATED, Json(event)))
}

#[instrument(name = "PUT /events/:id", skip(user, app_state, body))]
async fn update_event(
    user: CurrentUser,
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<EventUpdate>,
) -> Result<Json<Event>, ApiError> {
    let event = app_state.event_repo.get_event(id).await?;
    require_business_owner(&app_state, event.business_id, user.0.id).await?;

    let event = app_state.event_repo.update_event(id, &body).await?;
    Ok(Json(event))
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: EventStatus,
}

#[instrument(name = "PATCH /events/:id/status", skip(user, app_state))]
async fn set_status(
    user: CurrentUser,
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<StatusBody>,
) -> Result<Json<Event>, ApiError> {
    let event = app_state.event_repo.get_event(id).await?;
    require_business_owner(&app_state, event.business_id, user.0.id).await?;

    let event = app_state.event_repo.set_status(id, body.status).await?;
    Ok(Json(event))
}

#[instrument(name = "DELETE /events/:id", skip(user, app_state))]
async fn delete_event(
    user: CurrentUser,
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let event = app_state.event_repo.get_event(id).await?;
    require_business_owner(&app_state, event.business_id, user.0.id).await?;

    app_state.event_repo.delete_event(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(name = "POST /events/:id/register", skip(user, app_state, body), fields(user_id = user.0.id))]
async fn register(
    user: CurrentUser,
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<NewRegistration>,
) -> Result<(StatusCode, Json<EventRegistration>), ApiError> {
    let event = app_state.event_repo.get_event(id).await?;
    if event.status != EventStatus::Published {
        return Err(ApiError::bad_request(
            "Registration is only open for published events",
        ));
    }

    if let Some(existing) = app_state.event_repo.find_registration(id, user.0.id).await? {
        if existing.status == RegistrationStatus::Confirmed {
            return Err(ApiError::bad_request(
                "You are already registered for this event",
            ));
        }
    }

    if let Some(max_attendees) = event.max_attendees {
        let confirmed = app_state.event_repo.registration_count(id).await?;
        if confirmed >= i64::from(max_attendees) {
            return Err(ApiError::bad_request("This event is full"));
        }
    }

    let attendee_name = body
        .attendee_name
        .clone()
        .unwrap_or_else(|| user.0.full_name.clone());
    let attendee_email = body
        .attendee_email
        .clone()
        .unwrap_or_else(|| user.0.email.clone());

    let registration = app_state
        .event_repo
        .insert_registration(id, user.0.id, &attendee_name, &attendee_email, &body)
        .await?;

    Ok((StatusCode::CREATED, Json(registration)))
}

#[instrument(name = "DELETE /events/:id/register", skip(user, app_state), fields(user_id = user.0.id))]
async fn cancel_registration(
    user: CurrentUser,
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    app_state
        .event_repo
        .cancel_registration(id, user.0.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn require_business_owner(
    app_state: &AppState,
    business_id: i32,
    user_id: i32,
) -> Result<(), ApiError> {
    let business = app_state.business_repo.get_business(business_id).await?;
    if business.claimed_by != Some(user_id) {
        return Err(ApiError::forbidden(
            "Only the business owner can manage its events",
        ));
    }
    Ok(())
}
