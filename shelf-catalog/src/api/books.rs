//! Book endpoints
//!
//! Reads are public. Creating a book needs an identity (recorded in the
//! log); re-scraping and deleting are admin-only.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use shelf_common::models::{Book, Deleted, Review};
use tracing::info;
use uuid::Uuid;

use super::ApiJson;
use crate::access::{require_admin, Caller};
use crate::error::ApiResult;
use crate::pagination::{parse_limit, parse_page};
use crate::services::engagement::{ReviewListing, ReviewSort, SortOrder};
use crate::AppState;

/// Body of `POST /books` and `PATCH /books/:id`
#[derive(Debug, Deserialize)]
pub struct BookUrlRequest {
    #[serde(default)]
    pub url: String,
}

/// Query parameters for the book listing
///
/// Kept as strings so a malformed `page` falls back to page 1 instead of
/// rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListBooksQuery {
    pub page: Option<String>,
    pub keyword: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListReviewsQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

/// Book header shown above its reviews
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSummary {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub category: String,
    pub cover_image_url: String,
    pub avg_rating: f64,
    pub review_count: i64,
}

impl From<&Book> for BookSummary {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.fields.title.clone(),
            author: book.fields.author.clone(),
            category: book.fields.category.clone(),
            cover_image_url: book.fields.cover_image_url.clone(),
            avg_rating: book.avg_rating,
            review_count: book.review_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookReviewsResponse {
    pub book: BookSummary,
    pub reviews: Vec<Review>,
}

/// POST /books
pub async fn create_book(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(request): ApiJson<BookUrlRequest>,
) -> ApiResult<(StatusCode, Json<Book>)> {
    let book = state.books.create(&request.url, &caller).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// GET /books?page=&keyword=
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<ListBooksQuery>,
) -> ApiResult<Json<Vec<Book>>> {
    let page = parse_page(query.page.as_deref());
    let books = state
        .catalog
        .find_paginated(query.keyword.as_deref(), page)
        .await?;
    Ok(Json(books))
}

/// GET /books/:id
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Book>> {
    Ok(Json(state.catalog.find_by_id(&id).await?))
}

/// PATCH /books/:id
pub async fn update_book(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<BookUrlRequest>,
) -> ApiResult<Json<Book>> {
    require_admin(&caller)?;
    let book = state.books.update(&id, &request.url).await?;
    info!(book_id = %book.id, updated_by = %caller.user_id, "Book re-scraped");
    Ok(Json(book))
}

/// DELETE /books/:id
pub async fn delete_book(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<Deleted>> {
    require_admin(&caller)?;
    let deleted = state.catalog.delete_by_id(&id).await?;
    info!(book_id = %id, deleted_by = %caller.user_id, "Book removed by admin");
    Ok(Json(deleted))
}

/// GET /books/:id/reviews?page=&limit=&sort=&order=
pub async fn list_book_reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ListReviewsQuery>,
) -> ApiResult<Json<BookReviewsResponse>> {
    let listing = ReviewListing {
        page: parse_page(query.page.as_deref()),
        limit: parse_limit(
            query.limit.as_deref(),
            state.engagement.config().reviews_page_limit,
        ),
        sort: ReviewSort::parse(query.sort.as_deref()),
        order: SortOrder::parse(query.order.as_deref()),
    };

    let (book, reviews) = state.engagement.list_reviews(&id, listing).await?;
    Ok(Json(BookReviewsResponse {
        book: BookSummary::from(&book),
        reviews,
    }))
}

pub fn book_routes() -> Router<AppState> {
    Router::new()
        .route("/books", get(list_books).post(create_book))
        .route(
            "/books/:id",
            get(get_book).patch(update_book).delete(delete_book),
        )
        .route("/books/:id/reviews", get(list_book_reviews))
}
