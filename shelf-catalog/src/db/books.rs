//! Book persistence: CRUD plus keyword-paginated search
//!
//! Ids are validated before any query runs. `source_url` uniqueness is
//! enforced by the table's unique index, so concurrent duplicate creates
//! resolve to exactly one success.

use chrono::Utc;
use shelf_common::models::{Book, BookFields, Deleted};
use shelf_common::uuid_utils::{generate, parse_record_id};
use shelf_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;
use uuid::Uuid;

use super::parse_guid;
use crate::pagination::Pagination;
use crate::services::book_normalizer;

const SELECT_BOOK: &str = r#"
    SELECT b.guid, b.title, b.subtitle, b.author, b.category, b.cover_image_url,
           b.publisher, b.published_at, b.source_url, b.avg_rating,
           b.created_at, b.updated_at,
           (SELECT COUNT(*) FROM ratings r WHERE r.book_id = b.guid) AS rating_count,
           (SELECT COUNT(*) FROM reviews v WHERE v.book_id = b.guid) AS review_count
    FROM books b
"#;

/// Persistence abstraction for book records
#[derive(Clone)]
pub struct CatalogStore {
    db: SqlitePool,
}

impl CatalogStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }

    /// Insert a new book; `Conflict` if its source URL is already cataloged
    pub async fn create(&self, fields: BookFields) -> Result<Book> {
        let now = Utc::now();
        let book = Book {
            id: generate(),
            fields,
            avg_rating: 0.0,
            rating_count: 0,
            review_count: 0,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO books (guid, title, title_folded, subtitle, author, category,
                               cover_image_url, publisher, published_at, source_url,
                               avg_rating, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(book.id.to_string())
        .bind(&book.fields.title)
        .bind(fold_case(&book.fields.title))
        .bind(&book.fields.subtitle)
        .bind(&book.fields.author)
        .bind(&book.fields.category)
        .bind(&book.fields.cover_image_url)
        .bind(&book.fields.publisher)
        .bind(&book.fields.published_at)
        .bind(&book.fields.source_url)
        .bind(book.created_at)
        .bind(book.updated_at)
        .execute(&self.db)
        .await
        .map_err(|e| duplicate_source_url(e, &book.fields.source_url))?;

        Ok(book)
    }

    /// Look up a book by caller-supplied id
    pub async fn find_by_id(&self, id: &str) -> Result<Book> {
        let id = parse_record_id(id, "book")?;
        self.fetch(id).await
    }

    /// Look up a book by an already-validated id
    pub async fn fetch(&self, id: Uuid) -> Result<Book> {
        let sql = format!("{} WHERE b.guid = ?", SELECT_BOOK);
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.db)
            .await?;

        match row {
            Some(row) => book_from_row(&row),
            None => Err(Error::NotFound(format!("book {}", id))),
        }
    }

    /// One page of books in insertion order
    ///
    /// A non-blank `keyword` keeps only books whose title contains it,
    /// ignoring case. Folding happens in Rust on both sides because SQLite's
    /// `lower()` only folds ASCII.
    pub async fn find_paginated(&self, keyword: Option<&str>, page: i64) -> Result<Vec<Book>> {
        let window = Pagination::books(page);
        let keyword = keyword.map(str::trim).filter(|k| !k.is_empty());

        let rows = match keyword {
            Some(keyword) => {
                let sql = format!(
                    "{} WHERE instr(b.title_folded, ?) > 0 ORDER BY b.rowid LIMIT ? OFFSET ?",
                    SELECT_BOOK
                );
                sqlx::query(&sql)
                    .bind(fold_case(keyword))
                    .bind(window.limit)
                    .bind(window.offset)
                    .fetch_all(&self.db)
                    .await?
            }
            None => {
                let sql = format!("{} ORDER BY b.rowid LIMIT ? OFFSET ?", SELECT_BOOK);
                sqlx::query(&sql)
                    .bind(window.limit)
                    .bind(window.offset)
                    .fetch_all(&self.db)
                    .await?
            }
        };

        rows.iter().map(book_from_row).collect()
    }

    /// Replace the scraped-derived fields of an existing book
    ///
    /// Identity, average rating, reviews and ratings are preserved.
    pub async fn update(&self, id: &str, fields: BookFields) -> Result<Book> {
        let before = self.find_by_id(id).await?;
        let after = book_normalizer::merge(&before, fields, Utc::now());

        let result = sqlx::query(
            r#"
            UPDATE books
            SET title = ?, title_folded = ?, subtitle = ?, author = ?, category = ?,
                cover_image_url = ?, publisher = ?, published_at = ?, source_url = ?,
                updated_at = ?
            WHERE guid = ?
            "#,
        )
        .bind(&after.fields.title)
        .bind(fold_case(&after.fields.title))
        .bind(&after.fields.subtitle)
        .bind(&after.fields.author)
        .bind(&after.fields.category)
        .bind(&after.fields.cover_image_url)
        .bind(&after.fields.publisher)
        .bind(&after.fields.published_at)
        .bind(&after.fields.source_url)
        .bind(after.updated_at)
        .bind(after.id.to_string())
        .execute(&self.db)
        .await
        .map_err(|e| duplicate_source_url(e, &after.fields.source_url))?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("book {}", after.id)));
        }

        Ok(after)
    }

    /// Delete a book; its reviews, reactions and ratings cascade with it
    pub async fn delete_by_id(&self, id: &str) -> Result<Deleted> {
        let id = parse_record_id(id, "book")?;

        let result = sqlx::query("DELETE FROM books WHERE guid = ?")
            .bind(id.to_string())
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("book {}", id)));
        }

        info!(book_id = %id, "Book deleted");
        Ok(Deleted::confirmed())
    }
}

/// Unicode-aware lowercase used for title search
fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

fn duplicate_source_url(err: sqlx::Error, source_url: &str) -> Error {
    match Error::from(err) {
        Error::Conflict(_) => {
            Error::Conflict(format!("book with source url {} already exists", source_url))
        }
        other => other,
    }
}

fn book_from_row(row: &SqliteRow) -> Result<Book> {
    let guid: String = row.try_get("guid")?;

    Ok(Book {
        id: parse_guid(&guid)?,
        fields: BookFields {
            title: row.try_get("title")?,
            subtitle: row.try_get("subtitle")?,
            author: row.try_get("author")?,
            category: row.try_get("category")?,
            cover_image_url: row.try_get("cover_image_url")?,
            publisher: row.try_get("publisher")?,
            published_at: row.try_get("published_at")?,
            source_url: row.try_get("source_url")?,
        },
        avg_rating: row.try_get("avg_rating")?,
        rating_count: row.try_get("rating_count")?,
        review_count: row.try_get("review_count")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
