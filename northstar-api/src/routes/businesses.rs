use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use openai_client::{ChatClient, ChatMessage, ChatRequest};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::instrument;

use crate::{
    auth::CurrentUser,
    domain::{
        analytics::{reviews_over_time, views_change, AnalyticsOverview, AnalyticsReport, TimeRange},
        business::{Business, BusinessDetail, BusinessUpdate, NewBusiness},
        claim::{Claim, NewClaim},
        recommendation::{RecommendationBody, RecommendationSet},
        review::compute_review_stats,
        search::pagination::Paginated,
        search::query::{
            AiSearchBody, RawSearchParams, SearchQuery, UserContext, ValidationError,
        },
        search::types::{BusinessSearchItem, Enhancement},
        slug::slugify,
    },
    routes::ApiError,
    AppState,
};

pub fn router() -> Router<AppState> {
    // one wildcard name per position: the detail route matches slugs, the
    // mutating routes parse the same segment as a numeric id
    Router::new()
        .route("/search", get(search))
        .route("/ai-search", post(ai_search))
        .route("/recommendations", post(recommendations))
        .route("/", post(create_business))
        .route(
            "/:slug",
            get(get_business)
                .put(update_business)
                .delete(delete_business),
        )
        .route("/:slug/claim", post(claim_business))
        .route("/:slug/analytics", get(business_analytics))
}

#[instrument(name = "GET /businesses/search", skip(app_state))]
async fn search(
    State(app_state): State<AppState>,
    Query(params): Query<RawSearchParams>,
) -> Result<Json<Paginated<BusinessSearchItem>>, ApiError> {
    let query = SearchQuery::parse(params)?;
    let page = app_state.search_service.search_businesses(&query).await?;
    Ok(Json(page))
}

#[instrument(name = "GET /businesses/:slug", skip(app_state))]
async fn get_business(
    State(app_state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<BusinessDetail>, ApiError> {
    let detail = app_state.business_repo.get_detail(&slug).await?;

    // a lost counter increment should never fail the page
    let today = OffsetDateTime::now_utc().date();
    if let Err(err) = app_state
        .analytics_repo
        .record_detail_view(detail.business.id, today)
        .await
    {
        tracing::warn!("Failed to record detail view: {err}");
    }

    Ok(Json(detail))
}

#[instrument(name = "POST /businesses", skip(user, app_state, body), fields(user_id = user.0.id))]
async fn create_business(
    user: CurrentUser,
    State(app_state): State<AppState>,
    Json(body): Json<NewBusiness>,
) -> Result<(StatusCode, Json<Business>), ApiError> {
    let slug = slugify(&body.name);
    if slug.is_empty() {
        return Err(ValidationError::single("name").into());
    }
    if app_state.business_repo.slug_exists(&slug).await? {
        return Err(ApiError::bad_request(format!(
            "A business with the slug '{slug}' already exists"
        )));
    }

    let business = app_state
        .business_repo
        .insert_business(user.0.id, &slug, &body)
        .await?;

    tracing::info!("Created business {} ({})", business.id, business.slug);
    Ok((StatusCode::CREATED, Json(business)))
}

#[instrument(name = "PUT /businesses/:id", skip(user, app_state, body))]
async fn update_business(
    user: CurrentUser,
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<BusinessUpdate>,
) -> Result<Json<Business>, ApiError> {
    require_owner(&app_state, id, user.0.id).await?;
    let business = app_state.business_repo.update_business(id, &body).await?;
    Ok(Json(business))
}

#[instrument(name = "DELETE /businesses/:id", skip(user, app_state))]
async fn delete_business(
    user: CurrentUser,
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    require_owner(&app_state, id, user.0.id).await?;
    app_state.business_repo.delete_business(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(name = "POST /businesses/:id/claim", skip(user, app_state, body))]
async fn claim_business(
    user: CurrentUser,
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<NewClaim>,
) -> Result<(StatusCode, Json<Claim>), ApiError> {
    let business = app_state.business_repo.get_business(id).await?;
    if business.claimed_by.is_some() {
        return Err(ApiError::bad_request("This business is already claimed"));
    }
    if app_state.claim_repo.open_claim_exists(id).await? {
        return Err(ApiError::bad_request(
            "A claim for this business is already under review",
        ));
    }

    let claim = app_state.claim_repo.insert_claim(id, user.0.id, &body).await?;
    Ok((StatusCode::CREATED, Json(claim)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyticsParams {
    time_range: Option<String>,
}

#[instrument(name = "GET /businesses/:id/analytics", skip(user, app_state))]
async fn business_analytics(
    user: CurrentUser,
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
    Query(params): Query<AnalyticsParams>,
) -> Result<Json<AnalyticsReport>, ApiError> {
    require_owner(&app_state, id, user.0.id).await?;

    let range = match params.time_range.as_deref() {
        None => TimeRange::Month,
        Some(raw) => TimeRange::from_str(raw)
            .map_err(|_| ValidationError::single("timeRange"))?,
    };

    let days = range.days();
    let today = OffsetDateTime::now_utc().date();
    let from = today - Duration::days(days - 1);
    let previous_to = from - Duration::days(1);
    let previous_from = previous_to - Duration::days(days - 1);

    let current_views = app_state.analytics_repo.views_total(id, from, today).await?;
    let previous_views = app_state
        .analytics_repo
        .views_total(id, previous_from, previous_to)
        .await?;

    let rating_rows = app_state.review_repo.rating_rows(id).await?;
    let review_stats = compute_review_stats(&rating_rows);

    let views = app_state.analytics_repo.views_over_time(id, from, today).await?;
    let review_days = app_state
        .analytics_repo
        .review_ratings_by_day(id, from, today)
        .await?;

    Ok(Json(AnalyticsReport {
        overview: AnalyticsOverview {
            total_views: current_views,
            views_change: views_change(current_views, previous_views),
            average_rating: review_stats.average_rating,
            total_reviews: review_stats.total_reviews,
            total_events: app_state.analytics_repo.event_count(id).await?,
        },
        views_over_time: views,
        reviews_over_time: reviews_over_time(&review_days),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AiSearchResponse {
    results: Vec<BusinessSearchItem>,
    search_enhancements: Option<Enhancement>,
    recommendations: Option<Vec<String>>,
    total_results: usize,
}

#[instrument(name = "POST /businesses/ai-search", skip(app_state, body))]
async fn ai_search(
    State(app_state): State<AppState>,
    Json(body): Json<AiSearchBody>,
) -> Result<Json<AiSearchResponse>, ApiError> {
    let query = body.validate()?;
    let outcome = app_state.search_service.ai_search(&query).await?;

    let recommendations = match (&app_state.chat, query.include_recommendations) {
        (Some(chat), true) if !outcome.results.is_empty() => {
            generate_recommendations(
                chat,
                &app_state.chat_model,
                &query.query,
                query.user_context.as_ref(),
                &outcome.results,
            )
            .await
        }
        _ => None,
    };

    Ok(Json(AiSearchResponse {
        results: outcome.results,
        search_enhancements: outcome.search_enhancements,
        recommendations,
        total_results: outcome.total_results,
    }))
}

/// Ask the completion service for three actionable suggestions based on the
/// top hits. Best-effort; any failure just drops the section.
async fn generate_recommendations(
    chat: &ChatClient,
    model: &str,
    query: &str,
    user_context: Option<&UserContext>,
    results: &[BusinessSearchItem],
) -> Option<Vec<String>> {
    let context = match user_context {
        Some(context) => serde_json::to_string(context).unwrap_or_default(),
        None => "No specific context provided".to_string(),
    };
    let listing = results
        .iter()
        .take(5)
        .map(|b| {
            format!(
                "- {}: {}",
                b.name,
                b.short_description
                    .as_deref()
                    .or(b.description.as_deref())
                    .unwrap_or_default()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!(
        "Based on the user's search \"{query}\" and context:\n{context}\n\n\
         And these search results:\n{listing}\n\n\
         Provide 3 specific recommendations for how these businesses could help the user. \
         Be specific and actionable. Format as a JSON object with a \"recommendations\" \
         array of strings."
    );

    let request = ChatRequest::new(
        model,
        vec![
            ChatMessage::system("You are a helpful Minnesota business directory assistant."),
            ChatMessage::user(prompt),
        ],
    )
    .as_json();

    match chat.complete(&request).await {
        Ok(content) => match serde_json::from_str::<RecommendationsPayload>(&content) {
            Ok(payload) => Some(payload.recommendations),
            Err(err) => {
                tracing::warn!("Malformed AI recommendations payload: {err}");
                None
            }
        },
        Err(err) => {
            tracing::warn!("AI recommendations call failed: {err}");
            None
        }
    }
}

#[derive(Debug, Deserialize)]
struct RecommendationsPayload {
    #[serde(default)]
    recommendations: Vec<String>,
}

#[instrument(name = "POST /businesses/recommendations", skip(app_state, body))]
async fn recommendations(
    State(app_state): State<AppState>,
    Json(body): Json<RecommendationBody>,
) -> Result<Json<RecommendationSet>, ApiError> {
    let request = body.validate()?;
    let set = app_state.search_service.recommend(&request).await?;
    Ok(Json(set))
}

async fn require_owner(
    app_state: &AppState,
    business_id: i32,
    user_id: i32,
) -> Result<Business, ApiError> {
    let business = app_state.business_repo.get_business(business_id).await?;
    if business.claimed_by != Some(user_id) {
        return Err(ApiError::forbidden(
            "Only the business owner can perform this action",
        ));
    }
    Ok(business)
}
