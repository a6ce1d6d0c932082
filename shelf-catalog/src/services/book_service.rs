//! Book creation and update from retailer pages
//!
//! The page fetch is bounded by a timeout here, at the caller, so a slow
//! retailer surfaces as an upstream failure instead of a hung request. On
//! update, a failed scrape never reaches the store and the existing record
//! stays as it was.

use shelf_common::models::{Book, BookFields};
use shelf_common::{Error, Result};
use std::time::Duration;
use tracing::{error, info};

use super::book_normalizer;
use super::page_scraper::{PageScraper, ScrapeError};
use crate::access::Caller;
use crate::db::CatalogStore;

#[derive(Clone)]
pub struct BookService {
    scraper: PageScraper,
    catalog: CatalogStore,
    fetch_timeout: Duration,
}

impl BookService {
    pub fn new(scraper: PageScraper, catalog: CatalogStore, fetch_timeout: Duration) -> Self {
        Self {
            scraper,
            catalog,
            fetch_timeout,
        }
    }

    /// Scrape `url` and catalog the result
    pub async fn create(&self, url: &str, caller: &Caller) -> Result<Book> {
        let url = require_url(url)?;
        let fields = self.scrape(url).await?;
        let book = self.catalog.create(fields).await?;

        info!(
            book_id = %book.id,
            source_url = %book.fields.source_url,
            created_by = %caller.user_id,
            "Book created"
        );
        Ok(book)
    }

    /// Re-scrape `url` into the existing book `id`
    pub async fn update(&self, id: &str, url: &str) -> Result<Book> {
        let url = require_url(url)?;
        // Reject bad or unknown ids before spending a network round trip
        let before = self.catalog.find_by_id(id).await?;

        let fields = self.scrape(url).await.map_err(|e| {
            error!(book_id = %before.id, url = %url, error = %e, "Book update aborted");
            e
        })?;

        let book = self.catalog.update(id, fields).await?;
        info!(book_id = %book.id, source_url = %book.fields.source_url, "Book updated");
        Ok(book)
    }

    async fn scrape(&self, url: &str) -> Result<BookFields> {
        let raw = match tokio::time::timeout(self.fetch_timeout, self.scraper.fetch(url)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                error!(url = %url, error = %e, "Failed to retrieve book");
                return Err(e.into());
            }
            Err(_) => {
                error!(url = %url, timeout = ?self.fetch_timeout, "Failed to retrieve book");
                return Err(ScrapeError::Timeout(self.fetch_timeout).into());
            }
        };

        Ok(book_normalizer::normalize(raw, url))
    }
}

fn require_url(url: &str) -> Result<&str> {
    let url = url.trim();
    if url.is_empty() {
        return Err(Error::InvalidInput("url is required".to_string()));
    }
    Ok(url)
}
