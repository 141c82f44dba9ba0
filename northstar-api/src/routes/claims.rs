use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    auth::AdminUser,
    domain::{
        claim::{Claim, ClaimDetail, ClaimStats, ClaimStatus, ClaimSummary},
        search::query::ValidationError,
    },
    routes::ApiError,
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_claims))
        .route("/stats", get(claim_stats))
        .route("/:id", get(get_claim))
        .route("/:id/approve", post(approve_claim))
        .route("/:id/reject", post(reject_claim))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    status: Option<String>,
}

#[instrument(name = "GET /admin/claims", skip(admin, app_state), fields(admin_id = admin.0.id))]
async fn list_claims(
    admin: AdminUser,
    State(app_state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<ClaimSummary>>, ApiError> {
    let status = match params.status.as_deref() {
        None => None,
        Some(raw) => Some(
            ClaimStatus::from_str(raw).map_err(|_| ValidationError::single("status"))?,
        ),
    };

    let claims = app_state.claim_repo.list_claims(status).await?;
    Ok(Json(claims))
}

#[instrument(name = "GET /admin/claims/stats", skip(admin, app_state), fields(admin_id = admin.0.id))]
async fn claim_stats(
    admin: AdminUser,
    State(app_state): State<AppState>,
) -> Result<Json<ClaimStats>, ApiError> {
    let stats = app_state.claim_repo.stats().await?;
    Ok(Json(stats))
}

#[instrument(name = "GET /admin/claims/:id", skip(admin, app_state), fields(admin_id = admin.0.id))]
async fn get_claim(
    admin: AdminUser,
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ClaimDetail>, ApiError> {
    let detail = app_state
        .claim_repo
        .get_detail(id, &app_state.business_repo)
        .await?;
    Ok(Json(detail))
}

#[instrument(name = "POST /admin/claims/:id/approve", skip(admin, app_state), fields(admin_id = admin.0.id))]
async fn approve_claim(
    admin: AdminUser,
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Claim>, ApiError> {
    require_open(&app_state, id).await?;
    let claim = app_state.claim_repo.approve(id).await?;
    tracing::info!(
        "Approved claim {} for business {}",
        claim.id,
        claim.business_id
    );
    Ok(Json(claim))
}

#[derive(Debug, Deserialize)]
struct RejectBody {
    notes: Option<String>,
}

#[instrument(name = "POST /admin/claims/:id/reject", skip(admin, app_state, body), fields(admin_id = admin.0.id))]
async fn reject_claim(
    admin: AdminUser,
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<RejectBody>,
) -> Result<Json<Claim>, ApiError> {
    require_open(&app_state, id).await?;
    let claim = app_state
        .claim_repo
        .reject(id, body.notes.as_deref())
        .await?;
    Ok(Json(claim))
}

/// Approvals and rejections only apply to claims still in flight.
async fn require_open(app_state: &AppState, claim_id: i32) -> Result<(), ApiError> {
    let claim = app_state.claim_repo.get_claim(claim_id).await?;
    match claim.status {
        ClaimStatus::Pending | ClaimStatus::InReview => Ok(()),
        _ => Err(ApiError::bad_request(format!(
            "Claim has already been processed ({})",
            claim.status
        ))),
    }
}
