//! Review endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use shelf_common::models::{Deleted, Review};

use super::ApiJson;
use crate::access::Caller;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewRequest {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub book_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReviewRequest {
    #[serde(default)]
    pub content: String,
}

/// POST /reviews
pub async fn create_review(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(request): ApiJson<CreateReviewRequest>,
) -> ApiResult<(StatusCode, Json<Review>)> {
    let review = state
        .engagement
        .add_review(&request.book_id, &caller.user_id, &request.content)
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// GET /reviews/:id
pub async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Review>> {
    Ok(Json(state.engagement.get_review(&id).await?))
}

/// PATCH /reviews/:id
pub async fn update_review(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateReviewRequest>,
) -> ApiResult<Json<Review>> {
    let review = state
        .engagement
        .update_review(&id, &caller, &request.content)
        .await?;
    Ok(Json(review))
}

/// DELETE /reviews/:id
pub async fn delete_review(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<Deleted>> {
    Ok(Json(state.engagement.remove_review(&id, &caller).await?))
}

/// POST /reviews/:id/like
pub async fn like_review(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<Review>> {
    Ok(Json(state.engagement.toggle_like(&id, &caller.user_id).await?))
}

/// POST /reviews/:id/dislike
pub async fn dislike_review(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<Review>> {
    Ok(Json(
        state.engagement.toggle_dislike(&id, &caller.user_id).await?,
    ))
}

pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/reviews", post(create_review))
        .route(
            "/reviews/:id",
            get(get_review).patch(update_review).delete(delete_review),
        )
        .route("/reviews/:id/like", post(like_review))
        .route("/reviews/:id/dislike", post(dislike_review))
}
