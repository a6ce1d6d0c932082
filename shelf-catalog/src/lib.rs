//! shelf-catalog library - book ingestion and engagement service
//!
//! Books are created from a retailer page URL and carry reviews, ratings and
//! a denormalized average rating.

use axum::Router;
use shelf_common::config::TomlConfig;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod access;
pub mod api;
pub mod db;
pub mod error;
pub mod pagination;
pub mod services;

use db::CatalogStore;
use services::{BookService, EngagementAggregator, PageScraper};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: CatalogStore,
    pub books: BookService,
    pub engagement: EngagementAggregator,
}

impl AppState {
    /// Wire the services over one pool
    pub fn new(db: SqlitePool, scraper: PageScraper, config: &TomlConfig) -> Self {
        let catalog = CatalogStore::new(db);
        let books = BookService::new(scraper, catalog.clone(), config.scraper.timeout());
        let engagement = EngagementAggregator::new(catalog.clone(), config.engagement.clone());

        Self {
            catalog,
            books,
            engagement,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::book_routes())
        .merge(api::review_routes())
        .merge(api::rating_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
