//! Retailer product page scraper
//!
//! One GET per call, no retries. The page layout is fixed and known ahead
//! of time; each field is read from a CSS selector. Optional elements that
//! are missing become empty strings. A page without the title element is
//! treated as a failed retrieval.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use shelf_common::config::ScraperConfig;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Scraper errors
///
/// All of these surface to callers as the single "failed to retrieve book"
/// condition (`shelf_common::Error::Upstream`).
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Retailer responded with HTTP {0}")]
    Status(u16),

    #[error("Page is missing required element: {0}")]
    MissingElement(&'static str),

    #[error("Fetch timed out after {0:?}")]
    Timeout(Duration),
}

impl From<ScrapeError> for shelf_common::Error {
    fn from(err: ScrapeError) -> Self {
        shelf_common::Error::Upstream(format!("failed to retrieve book: {}", err))
    }
}

/// Raw field set extracted from a retailer page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFields {
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub cover_image: String,
    pub publisher: String,
    pub published_at: String,
    pub category: String,
}

/// CSS selectors of the retailer product page
pub mod layout {
    pub const TITLE: &str = ".gd_titArea h2.gd_name";
    pub const SUBTITLE: &str = "h3.gd_nameE";
    pub const AUTHOR: &str = "span.gd_auth";
    pub const COVER_IMAGE: &str = "div.gd_img img";
    pub const PUBLISHER: &str = "span.gd_pub";
    pub const PUBLISHED_AT: &str = "span.gd_date";
    /// Breadcrumb; the second depth entry is the category label
    pub const CATEGORY: &str = ".yLocaSet .yLocaDepth";
    pub const CATEGORY_DEPTH: usize = 1;
}

/// Source of raw page HTML
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_html(&self, url: &str) -> Result<String, ScrapeError>;
}

/// `PageFetcher` over HTTP
pub struct HttpFetcher {
    http_client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self, ScrapeError> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .build()
            .map_err(|e| ScrapeError::NetworkError(e.to_string()))?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_html(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| ScrapeError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| ScrapeError::NetworkError(e.to_string()))
    }
}

/// Turns a retailer URL into `RawFields`
#[derive(Clone)]
pub struct PageScraper {
    fetcher: Arc<dyn PageFetcher>,
}

impl PageScraper {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }

    /// Scraper backed by `HttpFetcher`
    pub fn http(config: &ScraperConfig) -> Result<Self, ScrapeError> {
        Ok(Self::new(Arc::new(HttpFetcher::new(config)?)))
    }

    pub async fn fetch(&self, url: &str) -> Result<RawFields, ScrapeError> {
        debug!(url = %url, "Fetching retailer page");
        let html = self.fetcher.fetch_html(url).await?;
        parse_book_page(&html)
    }
}

/// Parse the fixed retailer layout
pub fn parse_book_page(html: &str) -> Result<RawFields, ScrapeError> {
    let document = Html::parse_document(html);

    let title = select_text(&document, layout::TITLE, 0)
        .ok_or(ScrapeError::MissingElement("title"))?;

    Ok(RawFields {
        title,
        subtitle: select_text(&document, layout::SUBTITLE, 0).unwrap_or_default(),
        author: select_text(&document, layout::AUTHOR, 0).unwrap_or_default(),
        cover_image: select_attr(&document, layout::COVER_IMAGE, "src").unwrap_or_default(),
        publisher: select_text(&document, layout::PUBLISHER, 0).unwrap_or_default(),
        published_at: select_text(&document, layout::PUBLISHED_AT, 0).unwrap_or_default(),
        category: select_text(&document, layout::CATEGORY, layout::CATEGORY_DEPTH)
            .unwrap_or_default(),
    })
}

fn select_nth<'a>(document: &'a Html, css: &str, nth: usize) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    document.select(&selector).nth(nth)
}

fn select_text(document: &Html, css: &str, nth: usize) -> Option<String> {
    select_nth(document, css, nth).map(|el| el.text().collect::<String>().trim().to_string())
}

fn select_attr(document: &Html, css: &str, attr: &str) -> Option<String> {
    select_nth(document, css, 0)
        .and_then(|el| el.value().attr(attr))
        .map(|value| value.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_PAGE: &str = r#"
        <html><body>
          <div class="yLocaSet">
            <span class="yLocaDepth">국내도서</span>
            <span class="yLocaDepth"> IT 모바일 </span>
          </div>
          <div class="gd_titArea">
            <h2 class="gd_name">
              Clean Code
            </h2>
            <h3 class="gd_nameE">A Handbook of Agile Software Craftsmanship</h3>
          </div>
          <span class="gd_auth"> Robert C. Martin </span>
          <span class="gd_pub">Insight</span>
          <span class="gd_date">2013년 12월</span>
          <div class="gd_img"><img src=" https://image.example.com/clean-code.jpg "></div>
        </body></html>
    "#;

    #[test]
    fn test_parse_full_page() {
        let raw = parse_book_page(FULL_PAGE).unwrap();

        assert_eq!(raw.title, "Clean Code");
        assert_eq!(raw.subtitle, "A Handbook of Agile Software Craftsmanship");
        assert_eq!(raw.author, "Robert C. Martin");
        assert_eq!(raw.publisher, "Insight");
        assert_eq!(raw.published_at, "2013년 12월");
        assert_eq!(raw.cover_image, "https://image.example.com/clean-code.jpg");
        assert_eq!(raw.category, "IT 모바일");
    }

    #[test]
    fn test_missing_optional_fields_are_empty() {
        let html = r#"<div class="gd_titArea"><h2 class="gd_name">Refactoring</h2></div>"#;
        let raw = parse_book_page(html).unwrap();

        assert_eq!(raw.title, "Refactoring");
        assert_eq!(raw.subtitle, "");
        assert_eq!(raw.author, "");
        assert_eq!(raw.cover_image, "");
        assert_eq!(raw.category, "");
    }

    #[test]
    fn test_single_breadcrumb_has_no_category() {
        let html = r#"
            <div class="yLocaSet"><span class="yLocaDepth">국내도서</span></div>
            <div class="gd_titArea"><h2 class="gd_name">Refactoring</h2></div>
        "#;
        assert_eq!(parse_book_page(html).unwrap().category, "");
    }

    #[test]
    fn test_page_without_title_fails() {
        let err = parse_book_page("<html><body><p>Not a product</p></body></html>").unwrap_err();
        assert!(matches!(err, ScrapeError::MissingElement("title")));
    }

    #[test]
    fn test_scrape_error_becomes_upstream() {
        let err: shelf_common::Error = ScrapeError::Status(503).into();
        assert!(matches!(err, shelf_common::Error::Upstream(msg) if msg.contains("503")));
    }

    struct FixedPage(&'static str);

    #[async_trait]
    impl PageFetcher for FixedPage {
        async fn fetch_html(&self, _url: &str) -> Result<String, ScrapeError> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn test_fetch_uses_fetcher() {
        let scraper = PageScraper::new(Arc::new(FixedPage(FULL_PAGE)));
        let raw = scraper.fetch("https://example.com/book/1").await.unwrap();
        assert_eq!(raw.title, "Clean Code");
    }
}
