//! Ratings, reviews and review reactions attached to books
//!
//! Invariants kept here:
//! - at most one rating and one review per (book, user)
//! - `books.avg_rating` equals the mean of the book's ratings rounded to one
//!   decimal, or 0 when there are none
//! - only the owner or an admin edits or removes a rating or review
//! - a user either likes or dislikes a review, never both
//!
//! Existence checks run before writing so duplicates fail fast, but the
//! unique keys in the schema are what settle races between writers. Each
//! rating mutation and its average recompute share one transaction whose
//! first statement is the write.

use chrono::Utc;
use shelf_common::config::EngagementConfig;
use shelf_common::models::{Book, Deleted, Rating, Reaction, Review};
use shelf_common::uuid_utils::{generate, parse_record_id};
use shelf_common::{Error, Result};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};
use uuid::Uuid;

use crate::access::{ensure_can_mutate, Caller};
use crate::db::{ratings, reviews, CatalogStore};
use crate::pagination::Pagination;

pub use crate::db::reviews::{ReviewSort, SortOrder};

/// Smallest and largest accepted rating value
pub const RATING_RANGE: std::ops::RangeInclusive<i64> = 1..=5;

/// Listing options for a book's reviews
#[derive(Debug, Clone, Copy)]
pub struct ReviewListing {
    pub page: i64,
    pub limit: i64,
    pub sort: ReviewSort,
    pub order: SortOrder,
}

/// Mean of `values` rounded to one decimal, half away from zero; 0 when empty
pub fn average_rating(values: &[u8]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let total: u32 = values.iter().map(|v| u32::from(*v)).sum();
    round_one_decimal(f64::from(total) / values.len() as f64)
}

fn round_one_decimal(value: f64) -> f64 {
    // f64::round rounds half away from zero
    (value * 10.0).round() / 10.0
}

pub fn validate_rating_value(value: i64) -> Result<u8> {
    if !RATING_RANGE.contains(&value) {
        return Err(Error::InvalidInput(format!(
            "rating must be between {} and {}, got {}",
            RATING_RANGE.start(),
            RATING_RANGE.end(),
            value
        )));
    }
    // Range checked above
    Ok(value as u8)
}

#[derive(Clone)]
pub struct EngagementAggregator {
    db: SqlitePool,
    catalog: CatalogStore,
    config: EngagementConfig,
}

impl EngagementAggregator {
    pub fn new(catalog: CatalogStore, config: EngagementConfig) -> Self {
        Self {
            db: catalog.pool().clone(),
            catalog,
            config,
        }
    }

    pub fn config(&self) -> &EngagementConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Ratings
    // ------------------------------------------------------------------

    pub async fn add_rating(&self, book_id: &str, user_id: &str, value: i64) -> Result<Rating> {
        let value = validate_rating_value(value)?;
        let book = self.catalog.find_by_id(book_id).await?;

        {
            let mut conn = self.db.acquire().await?;
            if ratings::load_rating(&mut conn, book.id, user_id).await?.is_some() {
                warn!(book_id = %book.id, user_id = %user_id, "Duplicate rating rejected");
                return Err(duplicate_rating(book.id, user_id));
            }
        }

        let now = Utc::now();
        let rating = Rating {
            book_id: book.id,
            user_id: user_id.to_string(),
            value,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.db.begin().await?;
        ratings::insert_rating(&mut tx, &rating)
            .await
            .map_err(|e| match e {
                Error::Conflict(_) => duplicate_rating(book.id, user_id),
                other => other,
            })?;
        let avg_rating = recompute_average(&mut tx, book.id).await?;
        tx.commit().await?;

        info!(book_id = %book.id, user_id = %user_id, value, avg_rating, "Rating added");
        Ok(rating)
    }

    /// Change the rating `target_user_id` gave (the caller's own when `None`)
    pub async fn update_rating(
        &self,
        book_id: &str,
        caller: &Caller,
        target_user_id: Option<&str>,
        value: i64,
    ) -> Result<Rating> {
        let value = validate_rating_value(value)?;
        let book = self.catalog.find_by_id(book_id).await?;
        let stored = self
            .stored_rating(&book, target_user_id.unwrap_or(&caller.user_id))
            .await?;
        self.check_owner(caller, &stored.user_id)?;

        let now = Utc::now();
        let mut tx = self.db.begin().await?;
        let changed =
            ratings::update_rating_value(&mut tx, book.id, &stored.user_id, value, now).await?;
        if changed == 0 {
            return Err(rating_not_found(book.id, &stored.user_id));
        }
        let avg_rating = recompute_average(&mut tx, book.id).await?;
        tx.commit().await?;

        info!(
            book_id = %book.id,
            user_id = %stored.user_id,
            updated_by = %caller.user_id,
            value,
            avg_rating,
            "Rating updated"
        );
        Ok(Rating {
            value,
            updated_at: now,
            ..stored
        })
    }

    /// Remove the rating `target_user_id` gave (the caller's own when `None`)
    pub async fn remove_rating(
        &self,
        book_id: &str,
        caller: &Caller,
        target_user_id: Option<&str>,
    ) -> Result<Deleted> {
        let book = self.catalog.find_by_id(book_id).await?;
        let stored = self
            .stored_rating(&book, target_user_id.unwrap_or(&caller.user_id))
            .await?;
        self.check_owner(caller, &stored.user_id)?;

        let mut tx = self.db.begin().await?;
        if ratings::delete_rating(&mut tx, book.id, &stored.user_id).await? == 0 {
            return Err(rating_not_found(book.id, &stored.user_id));
        }
        let avg_rating = recompute_average(&mut tx, book.id).await?;
        tx.commit().await?;

        info!(
            book_id = %book.id,
            user_id = %stored.user_id,
            removed_by = %caller.user_id,
            avg_rating,
            "Rating removed"
        );
        Ok(Deleted::confirmed())
    }

    /// Stored average of one book
    pub async fn average_for_book(&self, book_id: &str) -> Result<f64> {
        Ok(self.catalog.find_by_id(book_id).await?.avg_rating)
    }

    /// Mean of every rating one user has given; 0 when they rated nothing
    pub async fn average_for_user(&self, user_id: &str) -> Result<f64> {
        let mut conn = self.db.acquire().await?;
        let values = ratings::user_rating_values(&mut conn, user_id).await?;
        Ok(average_rating(&values))
    }

    async fn stored_rating(&self, book: &Book, user_id: &str) -> Result<Rating> {
        let mut conn = self.db.acquire().await?;
        ratings::load_rating(&mut conn, book.id, user_id)
            .await?
            .ok_or_else(|| rating_not_found(book.id, user_id))
    }

    // ------------------------------------------------------------------
    // Reviews
    // ------------------------------------------------------------------

    pub async fn add_review(&self, book_id: &str, user_id: &str, content: &str) -> Result<Review> {
        let content = self.validate_content(content)?;
        let book = self.catalog.find_by_id(book_id).await?;

        let mut conn = self.db.acquire().await?;
        if reviews::find_review_id(&mut conn, book.id, user_id).await?.is_some() {
            warn!(book_id = %book.id, user_id = %user_id, "Duplicate review rejected");
            return Err(duplicate_review(book.id, user_id));
        }

        let now = Utc::now();
        let review = Review {
            id: generate(),
            book_id: book.id,
            user_id: user_id.to_string(),
            content,
            likes: Vec::new(),
            dislikes: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        reviews::insert_review(&mut conn, &review)
            .await
            .map_err(|e| match e {
                Error::Conflict(_) => duplicate_review(book.id, user_id),
                other => other,
            })?;

        info!(review_id = %review.id, book_id = %book.id, user_id = %user_id, "Review added");
        Ok(review)
    }

    pub async fn get_review(&self, review_id: &str) -> Result<Review> {
        let review_id = parse_record_id(review_id, "review")?;
        self.load_review(review_id).await
    }

    pub async fn update_review(
        &self,
        review_id: &str,
        caller: &Caller,
        content: &str,
    ) -> Result<Review> {
        let content = self.validate_content(content)?;
        let review = self.get_review(review_id).await?;
        self.check_owner(caller, &review.user_id)?;

        let now = Utc::now();
        let mut conn = self.db.acquire().await?;
        if reviews::update_review_content(&mut conn, review.id, &content, now).await? == 0 {
            return Err(review_not_found(review.id));
        }

        info!(review_id = %review.id, updated_by = %caller.user_id, "Review updated");
        Ok(Review {
            content,
            updated_at: now,
            ..review
        })
    }

    pub async fn remove_review(&self, review_id: &str, caller: &Caller) -> Result<Deleted> {
        let review = self.get_review(review_id).await?;
        self.check_owner(caller, &review.user_id)?;

        let mut conn = self.db.acquire().await?;
        if reviews::delete_review(&mut conn, review.id).await? == 0 {
            return Err(review_not_found(review.id));
        }

        info!(review_id = %review.id, removed_by = %caller.user_id, "Review removed");
        Ok(Deleted::confirmed())
    }

    /// One page of a book's reviews, plus the book they belong to
    pub async fn list_reviews(
        &self,
        book_id: &str,
        listing: ReviewListing,
    ) -> Result<(Book, Vec<Review>)> {
        let book = self.catalog.find_by_id(book_id).await?;
        let window = Pagination::new(listing.page, listing.limit);

        let mut conn = self.db.acquire().await?;
        let page =
            reviews::list_reviews(&mut conn, book.id, listing.sort, listing.order, window).await?;
        Ok((book, page))
    }

    pub async fn toggle_like(&self, review_id: &str, user_id: &str) -> Result<Review> {
        self.toggle_reaction(review_id, user_id, Reaction::Like).await
    }

    pub async fn toggle_dislike(&self, review_id: &str, user_id: &str) -> Result<Review> {
        self.toggle_reaction(review_id, user_id, Reaction::Dislike).await
    }

    /// Flip `kind` for the user; setting one reaction clears the other
    async fn toggle_reaction(&self, review_id: &str, user_id: &str, kind: Reaction) -> Result<Review> {
        let review_id = parse_record_id(review_id, "review")?;
        // Existence check so an unknown review is NotFound rather than a FK failure
        self.load_review(review_id).await?;

        let mut tx = self.db.begin().await?;
        let cleared = reviews::clear_reaction(&mut tx, review_id, user_id, kind).await?;
        if cleared == 0 {
            reviews::set_reaction(&mut tx, review_id, user_id, kind, Utc::now()).await?;
        }
        tx.commit().await?;

        info!(
            review_id = %review_id,
            user_id = %user_id,
            reaction = kind.as_str(),
            active = cleared == 0,
            "Review reaction toggled"
        );
        self.load_review(review_id).await
    }

    async fn load_review(&self, review_id: Uuid) -> Result<Review> {
        let mut conn = self.db.acquire().await?;
        reviews::load_review(&mut conn, review_id)
            .await?
            .ok_or_else(|| review_not_found(review_id))
    }

    fn validate_content(&self, content: &str) -> Result<String> {
        let content = content.trim();
        let length = content.chars().count();
        let max = self.config.review_max_chars;

        if length == 0 || length > max {
            return Err(Error::InvalidInput(format!(
                "review content must be 1 to {} characters, got {}",
                max, length
            )));
        }
        Ok(content.to_string())
    }

    fn check_owner(&self, caller: &Caller, owner_id: &str) -> Result<()> {
        ensure_can_mutate(caller, owner_id).map_err(|e| {
            warn!(caller = %caller.user_id, owner = %owner_id, "Ownership check failed");
            e
        })
    }
}

async fn recompute_average(conn: &mut SqliteConnection, book_id: Uuid) -> Result<f64> {
    let values = ratings::book_rating_values(conn, book_id).await?;
    let avg_rating = average_rating(&values);
    ratings::store_book_average(conn, book_id, avg_rating).await?;
    Ok(avg_rating)
}

fn duplicate_rating(book_id: Uuid, user_id: &str) -> Error {
    Error::Conflict(format!("user {} already rated book {}", user_id, book_id))
}

fn duplicate_review(book_id: Uuid, user_id: &str) -> Error {
    Error::Conflict(format!("user {} already reviewed book {}", user_id, book_id))
}

fn rating_not_found(book_id: Uuid, user_id: &str) -> Error {
    Error::NotFound(format!("rating by {} on book {}", user_id, book_id))
}

fn review_not_found(review_id: Uuid) -> Error {
    Error::NotFound(format!("review {}", review_id))
}
