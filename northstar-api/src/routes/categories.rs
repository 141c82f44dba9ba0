use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    auth::AdminUser,
    domain::category::{
        build_category_tree, Category, CategoryNode, CategoryUpdate, NewCategory,
    },
    routes::ApiError,
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/tree", get(category_tree))
        .route(
            "/:slug",
            get(get_category)
                .put(update_category)
                .delete(delete_category),
        )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    parent_id: Option<i32>,
    featured: Option<bool>,
}

#[instrument(name = "GET /categories", skip(app_state))]
async fn list_categories(
    State(app_state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<CategoryNode>>, ApiError> {
    let all = app_state.category_repo.list_with_counts().await?;
    let tree = build_category_tree(all);

    // default listing shows the top level; parentId descends one level, and
    // an unknown parent simply matches nothing
    let mut nodes = match params.parent_id {
        Some(parent_id) => find_node(tree, parent_id)
            .map(|node| node.children)
            .unwrap_or_default(),
        None => tree,
    };

    if let Some(featured) = params.featured {
        nodes.retain(|node| node.category.featured == featured);
    }

    Ok(Json(nodes))
}

#[instrument(name = "GET /categories/tree", skip(app_state))]
async fn category_tree(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<CategoryNode>>, ApiError> {
    let all = app_state.category_repo.list_with_counts().await?;
    Ok(Json(build_category_tree(all)))
}

#[instrument(name = "GET /categories/:slug", skip(app_state))]
async fn get_category(
    State(app_state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryNode>, ApiError> {
    let category = app_state.category_repo.get_by_slug(&slug).await?;

    let all = app_state.category_repo.list_with_counts().await?;
    let node = find_node(build_category_tree(all), category.id)
        .ok_or_else(|| ApiError::not_found(format!("category {slug}")))?;

    Ok(Json(node))
}

fn find_node(nodes: Vec<CategoryNode>, id: i32) -> Option<CategoryNode> {
    for node in nodes {
        if node.category.id == id {
            return Some(node);
        }
        if let Some(found) = find_node(node.children, id) {
            return Some(found);
        }
    }
    None
}

#[instrument(name = "POST /categories", skip(admin, app_state, body), fields(admin_id = admin.0.id))]
async fn create_category(
    admin: AdminUser,
    State(app_state): State<AppState>,
    Json(body): Json<NewCategory>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    if app_state.category_repo.slug_exists(&body.slug).await? {
        return Err(ApiError::bad_request(format!(
            "A category with the slug '{}' already exists",
            body.slug
        )));
    }

    let category = app_state.category_repo.insert_category(&body).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

#[instrument(name = "PUT /categories/:id", skip(admin, app_state, body), fields(admin_id = admin.0.id))]
async fn update_category(
    admin: AdminUser,
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<CategoryUpdate>,
) -> Result<Json<Category>, ApiError> {
    let category = app_state.category_repo.update_category(id, &body).await?;
    Ok(Json(category))
}

#[instrument(name = "DELETE /categories/:id", skip(admin, app_state), fields(admin_id = admin.0.id))]
async fn delete_category(
    admin: AdminUser,
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let (businesses, children) = app_state.category_repo.usage_counts(id).await?;
    if businesses > 0 || children > 0 {
        return Err(ApiError::bad_request(format!(
            "Category is still referenced by {businesses} businesses and {children} child categories"
        )));
    }

    app_state.category_repo.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
