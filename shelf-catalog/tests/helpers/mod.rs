//! Shared fixtures for shelf-catalog integration tests
//!
//! Each test builds its own in-memory database and a stub page fetcher that
//! serves canned retailer pages keyed by URL.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use shelf_catalog::api::{USER_ID_HEADER, USER_ROLES_HEADER};
use shelf_catalog::services::{PageFetcher, PageScraper, ScrapeError};
use shelf_catalog::{build_router, AppState};
use shelf_common::config::TomlConfig;
use tower::ServiceExt;

pub const CLEAN_CODE_URL: &str = "https://books.example.com/goods/11681152";

/// Retailer page in the fixed product layout
pub fn book_page(title: &str, author: &str, category: &str) -> String {
    format!(
        r#"<html><body>
          <div class="yLocaSet">
            <span class="yLocaDepth">국내도서</span>
            <span class="yLocaDepth">{category}</span>
          </div>
          <div class="gd_titArea"><h2 class="gd_name">{title}</h2></div>
          <span class="gd_auth">{author}</span>
          <span class="gd_pub">Insight</span>
          <span class="gd_date">2013년 12월</span>
          <div class="gd_img"><img src="https://image.example.com/{author}.jpg"></div>
        </body></html>"#
    )
}

pub fn clean_code_page() -> String {
    book_page("Clean Code", "Robert C. Martin", "IT 모바일")
}

/// Serves registered pages; any other URL answers 404
#[derive(Default)]
pub struct StubPages {
    pages: HashMap<String, String>,
}

impl StubPages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }
}

#[async_trait]
impl PageFetcher for StubPages {
    async fn fetch_html(&self, url: &str) -> Result<String, ScrapeError> {
        self.pages.get(url).cloned().ok_or(ScrapeError::Status(404))
    }
}

/// App state over a fresh in-memory database
pub async fn test_state(pages: StubPages) -> AppState {
    let db = shelf_common::db::init_in_memory()
        .await
        .expect("in-memory database");
    AppState::new(db, PageScraper::new(Arc::new(pages)), &TomlConfig::default())
}

pub async fn test_app(pages: StubPages) -> Router {
    build_router(test_state(pages).await)
}

/// Who sends a request
#[derive(Debug, Clone, Copy)]
pub enum As {
    Anonymous,
    User(&'static str),
    Admin(&'static str),
}

pub fn request(method: &str, uri: &str, who: As, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    match who {
        As::Anonymous => {}
        As::User(id) => builder = builder.header(USER_ID_HEADER, id),
        As::Admin(id) => {
            builder = builder
                .header(USER_ID_HEADER, id)
                .header(USER_ROLES_HEADER, "user,admin")
        }
    }

    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Send one request; an empty body comes back as `Value::Null`
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();

    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

/// Create a book through the API and return its id
pub async fn create_book(app: &Router, url: &str) -> String {
    let (status, body) = send(
        app,
        request("POST", "/books", As::User("creator"), Some(serde_json::json!({ "url": url }))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
    body["id"].as_str().unwrap().to_string()
}
