//! Catalog services
//!
//! - `page_scraper`: retailer page → raw fields
//! - `book_normalizer`: raw fields → canonical book fields
//! - `book_service`: scrape + normalize + persist for create/update
//! - `engagement`: ratings, reviews, reactions and the running average

pub mod book_normalizer;
pub mod book_service;
pub mod engagement;
pub mod page_scraper;

pub use book_service::BookService;
pub use engagement::EngagementAggregator;
pub use page_scraper::{HttpFetcher, PageFetcher, PageScraper, RawFields, ScrapeError};
