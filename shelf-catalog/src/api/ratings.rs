//! Rating endpoints
//!
//! Ratings are keyed by `(bookId, userId)`. Update and delete act on the
//! caller's own rating unless an explicit `userId` names another user's,
//! which only an admin may touch.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use shelf_common::models::{Deleted, Rating};
use uuid::Uuid;

use super::ApiJson;
use crate::access::Caller;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRatingRequest {
    pub rating: i64,
    #[serde(default)]
    pub book_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRatingRequest {
    pub rating: i64,
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingOwnerQuery {
    pub user_id: Option<String>,
}

/// Rating as returned to clients
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingResponse {
    pub rating: u8,
    pub user_id: String,
    pub book_id: Uuid,
}

impl From<Rating> for RatingResponse {
    fn from(rating: Rating) -> Self {
        Self {
            rating: rating.value,
            user_id: rating.user_id,
            book_id: rating.book_id,
        }
    }
}

/// POST /ratings
pub async fn create_rating(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(request): ApiJson<CreateRatingRequest>,
) -> ApiResult<(StatusCode, Json<RatingResponse>)> {
    let rating = state
        .engagement
        .add_rating(&request.book_id, &caller.user_id, request.rating)
        .await?;
    Ok((StatusCode::CREATED, Json(rating.into())))
}

/// PATCH /ratings/:bookId
pub async fn update_rating(
    State(state): State<AppState>,
    caller: Caller,
    Path(book_id): Path<String>,
    ApiJson(request): ApiJson<UpdateRatingRequest>,
) -> ApiResult<Json<RatingResponse>> {
    let rating = state
        .engagement
        .update_rating(&book_id, &caller, request.user_id.as_deref(), request.rating)
        .await?;
    Ok(Json(rating.into()))
}

/// DELETE /ratings/:bookId?userId=
pub async fn delete_rating(
    State(state): State<AppState>,
    caller: Caller,
    Path(book_id): Path<String>,
    Query(query): Query<RatingOwnerQuery>,
) -> ApiResult<Json<Deleted>> {
    let deleted = state
        .engagement
        .remove_rating(&book_id, &caller, query.user_id.as_deref())
        .await?;
    Ok(Json(deleted))
}

/// GET /ratings/average/book/:id
pub async fn book_average(
    State(state): State<AppState>,
    Path(book_id): Path<String>,
) -> ApiResult<Json<f64>> {
    Ok(Json(state.engagement.average_for_book(&book_id).await?))
}

/// GET /ratings/average/user/:id
pub async fn user_average(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<f64>> {
    Ok(Json(state.engagement.average_for_user(&user_id).await?))
}

pub fn rating_routes() -> Router<AppState> {
    Router::new()
        .route("/ratings", post(create_rating))
        .route("/ratings/:book_id", patch(update_rating).delete(delete_rating))
        .route("/ratings/average/book/:id", get(book_average))
        .route("/ratings/average/user/:id", get(user_average))
}
