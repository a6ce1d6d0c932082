//! HttpFetcher against a local retailer stand-in
//!
//! A throwaway axum server on an ephemeral port serves the product page, so
//! the real HTTP path (status handling, body decoding, timeout) is covered
//! without network access.

mod helpers;

use std::net::SocketAddr;
use std::time::Duration;

use axum::{http::StatusCode, response::Html, routing::get, Router};
use helpers::clean_code_page;
use shelf_catalog::services::{HttpFetcher, PageFetcher, PageScraper, ScrapeError};
use shelf_common::config::ScraperConfig;

async fn spawn_retailer() -> SocketAddr {
    let app = Router::new()
        .route("/goods/11681152", get(|| async { Html(clean_code_page()) }))
        .route(
            "/goods/broken",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "try later") }),
        )
        .route(
            "/goods/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Html(clean_code_page())
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn test_scrape_over_http() {
    let addr = spawn_retailer().await;
    let scraper = PageScraper::http(&ScraperConfig::default()).unwrap();

    let raw = scraper
        .fetch(&format!("http://{}/goods/11681152", addr))
        .await
        .unwrap();

    assert_eq!(raw.title, "Clean Code");
    assert_eq!(raw.author, "Robert C. Martin");
    assert_eq!(raw.category, "IT 모바일");
    assert_eq!(raw.publisher, "Insight");
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let addr = spawn_retailer().await;
    let fetcher = HttpFetcher::new(&ScraperConfig::default()).unwrap();

    let err = fetcher
        .fetch_html(&format!("http://{}/goods/broken", addr))
        .await
        .unwrap_err();
    assert!(matches!(err, ScrapeError::Status(503)));

    let err = fetcher
        .fetch_html(&format!("http://{}/goods/unknown", addr))
        .await
        .unwrap_err();
    assert!(matches!(err, ScrapeError::Status(404)));
}

#[tokio::test]
async fn test_client_timeout_applies() {
    let addr = spawn_retailer().await;
    let config = ScraperConfig {
        timeout_secs: 1,
        ..ScraperConfig::default()
    };
    let fetcher = HttpFetcher::new(&config).unwrap();

    let err = fetcher
        .fetch_html(&format!("http://{}/goods/slow", addr))
        .await
        .unwrap_err();
    assert!(matches!(err, ScrapeError::NetworkError(_)));
}

#[tokio::test]
async fn test_unreachable_host() {
    // Bind then drop to get a port nobody listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let fetcher = HttpFetcher::new(&ScraperConfig::default()).unwrap();
    let err = fetcher
        .fetch_html(&format!("http://{}/goods/1", addr))
        .await
        .unwrap_err();
    assert!(matches!(err, ScrapeError::NetworkError(_)));
}
