use std::str::FromStr;

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
        review::{
            compute_review_stats, NewReview, Review, ReviewResponseEntry, ReviewSort,
            ReviewStats, ReviewUpdate, ReviewWithMeta,
        },
        search::pagination::{PageMeta, Paginated},
        search::query::{ValidationError, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE},
    },
    routes::ApiError,
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/business/:id", get(list_for_business))
        .route("/business/:id/stats", get(business_stats))
        .route("/", post(create_review))
        .route(
            "/:id",
            axum::routing::put(update_review).delete(delete_review),
        )
        .route("/:id/vote", post(vote))
        .route("/:id/response", post(respond))
        .route("/:id/report", post(report))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    sort_by: Option<String>,
    page: Option<u32>,
    limit: Option<u32>,
}

#[instrument(name = "GET /reviews/business/:id", skip(app_state))]
async fn list_for_business(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
    Query(params): Query<ListParams>,
) -> Result<Json<Paginated<ReviewWithMeta>>, ApiError> {
    let sort = match params.sort_by.as_deref() {
        None => ReviewSort::Recent,
        Some(raw) => {
            ReviewSort::from_str(raw).map_err(|_| ValidationError::single("sortBy"))?
        }
    };
    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if page < 1 {
        return Err(ValidationError::single("page").into());
    }
    if limit < 1 || limit > MAX_PAGE_SIZE {
        return Err(ValidationError::single("limit").into());
    }

    let (reviews, total) = app_state
        .review_repo
        .list_for_business(id, sort, page, limit)
        .await?;

    Ok(Json(Paginated {
        data: reviews,
        pagination: PageMeta {
            page,
            limit,
            total: total as u64,
            total_pages: (total as u64).div_ceil(u64::from(limit)),
        },
    }))
}

#[instrument(name = "GET /reviews/business/:id/stats", skip(app_state))]
async fn business_stats(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ReviewStats>, ApiError> {
    let rows = app_state.review_repo.rating_rows(id).await?;
    Ok(Json(compute_review_stats(&rows)))
}

#[instrument(name = "POST /reviews", skip(user, app_state, body), fields(user_id = user.0.id))]
async fn create_review(
    user: CurrentUser,
    State(app_state): State<AppState>,
    Json(body): Json<NewReview>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    if !(1..=5).contains(&body.rating) {
        return Err(ValidationError::single("rating").into());
    }

    // 404 for a review against a business that does not exist
    app_state.business_repo.get_business(body.business_id).await?;

    if app_state
        .review_repo
        .user_has_reviewed(user.0.id, body.business_id)
        .await?
    {
        return Err(ApiError::bad_request(
            "You have already reviewed this business",
        ));
    }

    let review = app_state.review_repo.insert_review(user.0.id, &body).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

#[instrument(name = "PUT /reviews/:id", skip(user, app_state, body))]
async fn update_review(
    user: CurrentUser,
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<ReviewUpdate>,
) -> Result<Json<Review>, ApiError> {
    if let Some(rating) = body.rating {
        if !(1..=5).contains(&rating) {
            return Err(ValidationError::single("rating").into());
        }
    }

    let review = app_state.review_repo.get_review(id).await?;
    if review.user_id != user.0.id {
        return Err(ApiError::forbidden("Only the author can edit a review"));
    }

    let review = app_state.review_repo.update_review(id, &body).await?;
    Ok(Json(review))
}

#[instrument(name = "DELETE /reviews/:id", skip(user, app_state))]
async fn delete_review(
    user: CurrentUser,
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let review = app_state.review_repo.get_review(id).await?;
    if review.user_id != user.0.id {
        return Err(ApiError::forbidden("Only the author can delete a review"));
    }

    app_state.review_repo.delete_review(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VoteBody {
    is_helpful: bool,
}

#[instrument(name = "POST /reviews/:id/vote", skip(user, app_state, body), fields(user_id = user.0.id))]
async fn vote(
    user: CurrentUser,
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<VoteBody>,
) -> Result<StatusCode, ApiError> {
    // ensure the review exists before recording a vote against it
    app_state.review_repo.get_review(id).await?;
    app_state
        .review_repo
        .upsert_vote(id, user.0.id, body.is_helpful)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct ResponseBody {
    comment: String,
}

#[instrument(name = "POST /reviews/:id/response", skip(user, app_state, body))]
async fn respond(
    user: CurrentUser,
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<ResponseBody>,
) -> Result<(StatusCode, Json<ReviewResponseEntry>), ApiError> {
    let review = app_state.review_repo.get_review(id).await?;
    let business = app_state
        .business_repo
        .get_business(review.business_id)
        .await?;
    if business.claimed_by != Some(user.0.id) {
        return Err(ApiError::forbidden(
            "Only the business owner can respond to reviews",
        ));
    }
    if app_state.review_repo.has_response(id).await? {
        return Err(ApiError::bad_request("This review already has a response"));
    }

    let entry = app_state
        .review_repo
        .insert_response(id, user.0.id, &body.comment)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[derive(Debug, Deserialize)]
struct ReportBody {
    reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct ReportReceipt {
    message: &'static str,
}

#[instrument(name = "POST /reviews/:id/report", skip(user, app_state, body), fields(user_id = user.0.id))]
async fn report(
    user: CurrentUser,
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<ReportBody>,
) -> Result<Json<ReportReceipt>, ApiError> {
    // moderation is manual for now; the report trail lives in the logs
    let review = app_state.review_repo.get_review(id).await?;
    tracing::warn!(
        review_id = review.id,
        reporter = user.0.id,
        reason = body.reason.as_deref().unwrap_or("unspecified"),
        "Review reported"
    );
    Ok(Json(ReportReceipt {
        message: "Report received; our team will take a look",
    }))
}
