//! Raw scrape → canonical book fields
//!
//! Pure functions, no I/O.

use chrono::{DateTime, Utc};
use shelf_common::models::{Book, BookFields};

use super::page_scraper::RawFields;

/// Copy raw fields onto the canonical shape and stamp the source URL
pub fn normalize(raw: RawFields, source_url: &str) -> BookFields {
    BookFields {
        title: raw.title,
        subtitle: raw.subtitle,
        author: raw.author,
        category: raw.category,
        cover_image_url: raw.cover_image,
        publisher: raw.publisher,
        published_at: raw.published_at,
        source_url: source_url.to_string(),
    }
}

/// New book value after a re-scrape
///
/// Every scraped field is replaced. Identity, aggregates and creation time
/// carry over from `before`.
pub fn merge(before: &Book, fields: BookFields, now: DateTime<Utc>) -> Book {
    Book {
        id: before.id,
        fields,
        avg_rating: before.avg_rating,
        rating_count: before.rating_count,
        review_count: before.review_count,
        created_at: before.created_at,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn raw(title: &str) -> RawFields {
        RawFields {
            title: title.to_string(),
            author: "Robert C. Martin".to_string(),
            cover_image: "https://image.example.com/1.jpg".to_string(),
            category: "IT".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_stamps_source_url() {
        let fields = normalize(raw("Clean Code"), "https://example.com/book/1");

        assert_eq!(fields.title, "Clean Code");
        assert_eq!(fields.cover_image_url, "https://image.example.com/1.jpg");
        assert_eq!(fields.source_url, "https://example.com/book/1");
        assert_eq!(fields.subtitle, "");
    }

    #[test]
    fn test_merge_preserves_identity_and_aggregates() {
        let created = Utc::now() - chrono::Duration::days(3);
        let before = Book {
            id: Uuid::new_v4(),
            fields: normalize(raw("Old Title"), "https://example.com/book/1"),
            avg_rating: 3.5,
            rating_count: 2,
            review_count: 4,
            created_at: created,
            updated_at: created,
        };

        let now = Utc::now();
        let after = merge(
            &before,
            normalize(raw("New Title"), "https://example.com/book/2"),
            now,
        );

        assert_eq!(after.id, before.id);
        assert_eq!(after.avg_rating, 3.5);
        assert_eq!(after.rating_count, 2);
        assert_eq!(after.review_count, 4);
        assert_eq!(after.created_at, created);
        assert_eq!(after.updated_at, now);
        assert_eq!(after.fields.title, "New Title");
        assert_eq!(after.fields.source_url, "https://example.com/book/2");
        // before is untouched
        assert_eq!(before.fields.title, "Old Title");
    }
}
