//! Domain models shared between the store, the services and the HTTP layer
//!
//! Reviews and ratings reference books and users by id only. They are
//! joined at query time rather than embedded in the book record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Scraped-derived fields of a book
///
/// This is the part of a book that a re-scrape replaces wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookFields {
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub category: String,
    pub cover_image_url: String,
    pub publisher: String,
    /// Free-text publication date as printed on the retailer page
    pub published_at: String,
    /// Retailer page URL; unique across all books
    pub source_url: String,
}

/// Catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Store-assigned identifier, immutable
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: BookFields,
    /// Mean of all rating values, one decimal place; 0 when unrated
    pub avg_rating: f64,
    pub rating_count: i64,
    pub review_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Free-text commentary by one user on one book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub book_id: Uuid,
    pub user_id: String,
    pub content: String,
    /// Users who liked the review (disjoint from `dislikes`)
    pub likes: Vec<String>,
    pub dislikes: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-user score (1..=5) on one book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub book_id: Uuid,
    pub user_id: String,
    #[serde(rename = "rating")]
    pub value: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reaction a user can leave on a review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reaction {
    Like,
    Dislike,
}

impl Reaction {
    /// Value stored in the `review_reactions.kind` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Reaction::Like => "like",
            Reaction::Dislike => "dislike",
        }
    }
}

/// Confirmation returned by delete operations instead of the deleted record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deleted {
    pub deleted: bool,
}

impl Deleted {
    pub fn confirmed() -> Self {
        Self { deleted: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_book_serializes_flat_camel_case() {
        let now = Utc::now();
        let book = Book {
            id: Uuid::nil(),
            fields: BookFields {
                title: "Clean Code".into(),
                cover_image_url: "https://img.example.com/1.jpg".into(),
                source_url: "https://example.com/book/1".into(),
                ..Default::default()
            },
            avg_rating: 3.5,
            rating_count: 2,
            review_count: 0,
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(&book).unwrap();
        assert_eq!(value["title"], json!("Clean Code"));
        assert_eq!(value["coverImageUrl"], json!("https://img.example.com/1.jpg"));
        assert_eq!(value["sourceUrl"], json!("https://example.com/book/1"));
        assert_eq!(value["avgRating"], json!(3.5));
        assert!(value.get("fields").is_none());
    }

    #[test]
    fn test_rating_value_serializes_as_rating() {
        let now = Utc::now();
        let rating = Rating {
            book_id: Uuid::nil(),
            user_id: "u1".into(),
            value: 4,
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(&rating).unwrap();
        assert_eq!(value["rating"], json!(4));
        assert_eq!(value["userId"], json!("u1"));
    }
}
