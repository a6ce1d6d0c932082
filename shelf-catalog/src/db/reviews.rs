//! Review and review-reaction row operations

use chrono::{DateTime, Utc};
use shelf_common::models::{Reaction, Review};
use shelf_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection};
use std::collections::HashMap;
use uuid::Uuid;

use super::parse_guid;
use crate::pagination::Pagination;

/// Column a review listing is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewSort {
    #[default]
    CreatedAt,
    UpdatedAt,
}

impl ReviewSort {
    /// Accepts the API field names; anything else sorts by creation time
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("updatedAt") | Some("updated_at") => ReviewSort::UpdatedAt,
            _ => ReviewSort::CreatedAt,
        }
    }

    fn column(&self) -> &'static str {
        match self {
            ReviewSort::CreatedAt => "created_at",
            ReviewSort::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// Only an explicit `asc` sorts ascending
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

const SELECT_REVIEW: &str =
    "SELECT guid, book_id, user_id, content, created_at, updated_at FROM reviews";

/// Load one review with its reactions
pub async fn load_review(conn: &mut SqliteConnection, review_id: Uuid) -> Result<Option<Review>> {
    let sql = format!("{} WHERE guid = ?", SELECT_REVIEW);
    let row = sqlx::query(&sql)
        .bind(review_id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut review = review_from_row(&row)?;
    let reactions = sqlx::query(
        "SELECT review_id, user_id, kind FROM review_reactions WHERE review_id = ? ORDER BY rowid",
    )
    .bind(review_id.to_string())
    .fetch_all(&mut *conn)
    .await?;

    for row in &reactions {
        apply_reaction(&mut review, row)?;
    }

    Ok(Some(review))
}

/// Id of the review `user_id` wrote on `book_id`, if any
pub async fn find_review_id(
    conn: &mut SqliteConnection,
    book_id: Uuid,
    user_id: &str,
) -> Result<Option<Uuid>> {
    let guid: Option<String> =
        sqlx::query_scalar("SELECT guid FROM reviews WHERE book_id = ? AND user_id = ?")
            .bind(book_id.to_string())
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?;

    guid.as_deref().map(parse_guid).transpose()
}

pub async fn insert_review(conn: &mut SqliteConnection, review: &Review) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO reviews (guid, book_id, user_id, content, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(review.id.to_string())
    .bind(review.book_id.to_string())
    .bind(&review.user_id)
    .bind(&review.content)
    .bind(review.created_at)
    .bind(review.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn update_review_content(
    conn: &mut SqliteConnection,
    review_id: Uuid,
    content: &str,
    now: DateTime<Utc>,
) -> Result<u64> {
    let result = sqlx::query("UPDATE reviews SET content = ?, updated_at = ? WHERE guid = ?")
        .bind(content)
        .bind(now)
        .bind(review_id.to_string())
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

pub async fn delete_review(conn: &mut SqliteConnection, review_id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM reviews WHERE guid = ?")
        .bind(review_id.to_string())
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

/// One page of a book's reviews with their reactions
pub async fn list_reviews(
    conn: &mut SqliteConnection,
    book_id: Uuid,
    sort: ReviewSort,
    order: SortOrder,
    window: Pagination,
) -> Result<Vec<Review>> {
    // Column and direction come from closed enums, never from input text
    let sql = format!(
        "{} WHERE book_id = ? ORDER BY {} {}, rowid {} LIMIT ? OFFSET ?",
        SELECT_REVIEW,
        sort.column(),
        order.keyword(),
        order.keyword()
    );
    let rows = sqlx::query(&sql)
        .bind(book_id.to_string())
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(&mut *conn)
        .await?;

    let mut reviews = rows.iter().map(review_from_row).collect::<Result<Vec<_>>>()?;
    if reviews.is_empty() {
        return Ok(reviews);
    }

    // Only reactions on the reviews of this page
    let mut query = QueryBuilder::<Sqlite>::new(
        "SELECT review_id, user_id, kind FROM review_reactions WHERE review_id IN (",
    );
    let mut ids = query.separated(", ");
    for review in &reviews {
        ids.push_bind(review.id.to_string());
    }
    ids.push_unseparated(") ORDER BY rowid");
    let reactions = query.build().fetch_all(&mut *conn).await?;

    let index: HashMap<Uuid, usize> = reviews
        .iter()
        .enumerate()
        .map(|(i, review)| (review.id, i))
        .collect();

    for row in &reactions {
        let review_id: String = row.try_get("review_id")?;
        if let Some(&i) = index.get(&parse_guid(&review_id)?) {
            apply_reaction(&mut reviews[i], row)?;
        }
    }

    Ok(reviews)
}

/// Remove `user_id`'s reaction of `kind`; returns rows removed
pub async fn clear_reaction(
    conn: &mut SqliteConnection,
    review_id: Uuid,
    user_id: &str,
    kind: Reaction,
) -> Result<u64> {
    let result = sqlx::query(
        "DELETE FROM review_reactions WHERE review_id = ? AND user_id = ? AND kind = ?",
    )
    .bind(review_id.to_string())
    .bind(user_id)
    .bind(kind.as_str())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Record `kind` for `user_id`, replacing any opposite reaction
pub async fn set_reaction(
    conn: &mut SqliteConnection,
    review_id: Uuid,
    user_id: &str,
    kind: Reaction,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO review_reactions (review_id, user_id, kind, created_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(review_id, user_id) DO UPDATE SET
            kind = excluded.kind,
            created_at = excluded.created_at
        "#,
    )
    .bind(review_id.to_string())
    .bind(user_id)
    .bind(kind.as_str())
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

fn apply_reaction(review: &mut Review, row: &SqliteRow) -> Result<()> {
    let user_id: String = row.try_get("user_id")?;
    let kind: String = row.try_get("kind")?;

    match kind.as_str() {
        "like" => review.likes.push(user_id),
        "dislike" => review.dislikes.push(user_id),
        other => {
            return Err(Error::Internal(format!(
                "corrupt reaction kind {:?} on review {}",
                other, review.id
            )))
        }
    }
    Ok(())
}

fn review_from_row(row: &SqliteRow) -> Result<Review> {
    let guid: String = row.try_get("guid")?;
    let book_id: String = row.try_get("book_id")?;

    Ok(Review {
        id: parse_guid(&guid)?,
        book_id: parse_guid(&book_id)?,
        user_id: row.try_get("user_id")?,
        content: row.try_get("content")?,
        likes: Vec::new(),
        dislikes: Vec::new(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::CatalogStore;
    use shelf_common::db::init_in_memory;
    use shelf_common::models::BookFields;
    use shelf_common::uuid_utils::generate;

    fn review(book_id: Uuid, user_id: &str) -> Review {
        let now = Utc::now();
        Review {
            id: generate(),
            book_id,
            user_id: user_id.to_string(),
            content: format!("by {}", user_id),
            likes: Vec::new(),
            dislikes: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_listing_attaches_only_own_reactions() {
        let pool = init_in_memory().await.unwrap();
        let book = CatalogStore::new(pool.clone())
            .create(BookFields {
                title: "Clean Code".to_string(),
                source_url: "https://example.com/1".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let mut written = Vec::new();
        for user in ["u1", "u2", "u3"] {
            let r = review(book.id, user);
            insert_review(&mut conn, &r).await.unwrap();
            written.push(r);
        }
        let now = Utc::now();
        set_reaction(&mut conn, written[0].id, "fan", Reaction::Like, now).await.unwrap();
        set_reaction(&mut conn, written[1].id, "critic", Reaction::Dislike, now).await.unwrap();
        set_reaction(&mut conn, written[2].id, "fan", Reaction::Like, now).await.unwrap();
        set_reaction(&mut conn, written[2].id, "critic", Reaction::Dislike, now).await.unwrap();

        let page = list_reviews(
            &mut conn,
            book.id,
            ReviewSort::CreatedAt,
            SortOrder::Asc,
            Pagination::new(2, 2),
        )
        .await
        .unwrap();

        assert_eq!(page.len(), 1);
        assert_eq!(page[0].user_id, "u3");
        assert_eq!(page[0].likes, vec!["fan".to_string()]);
        assert_eq!(page[0].dislikes, vec!["critic".to_string()]);

        let first = list_reviews(
            &mut conn,
            book.id,
            ReviewSort::CreatedAt,
            SortOrder::Asc,
            Pagination::new(1, 2),
        )
        .await
        .unwrap();
        assert_eq!(first[0].likes, vec!["fan".to_string()]);
        assert!(first[0].dislikes.is_empty());
        assert!(first[1].likes.is_empty());
        assert_eq!(first[1].dislikes, vec!["critic".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_reaction_kind_is_internal_error() {
        let pool = init_in_memory().await.unwrap();
        let row = sqlx::query("SELECT 'u1' AS user_id, 'shrug' AS kind")
            .fetch_one(&pool)
            .await
            .unwrap();

        let mut target = review(Uuid::nil(), "author");
        let err = apply_reaction(&mut target, &row).unwrap_err();

        assert!(matches!(err, Error::Internal(msg) if msg.contains("shrug")));
        assert!(target.likes.is_empty() && target.dislikes.is_empty());
    }

    #[test]
    fn test_sort_parse() {
        assert_eq!(ReviewSort::parse(Some("updatedAt")), ReviewSort::UpdatedAt);
        assert_eq!(ReviewSort::parse(Some("likes")), ReviewSort::CreatedAt);
        assert_eq!(ReviewSort::parse(None), ReviewSort::CreatedAt);
    }

    #[test]
    fn test_order_parse() {
        assert_eq!(SortOrder::parse(Some("ASC")), SortOrder::Asc);
        assert_eq!(SortOrder::parse(Some("desc")), SortOrder::Desc);
        assert_eq!(SortOrder::parse(Some("sideways")), SortOrder::Desc);
        assert_eq!(SortOrder::parse(None), SortOrder::Desc);
    }
}
