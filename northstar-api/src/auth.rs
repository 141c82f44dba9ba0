//! Bearer-token authentication against the sessions table.
//!
//! Session issuance lives with the external identity provider; this service
//! only validates the tokens it is handed.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::{app_state::AppState, domain::user::User, routes::ApiError};

/// The authenticated caller. Rejects with 401 when the token is missing,
/// unknown, or expired.
pub struct CurrentUser(pub User);

/// An authenticated caller holding the admin role; 403 otherwise.
pub struct AdminUser(pub User);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;

        let user = state
            .user_repo
            .user_by_session_token(token)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

        Ok(CurrentUser(user))
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(ApiError::forbidden("Admin role required"));
        }
        Ok(AdminUser(user))
    }
}
