//! Rating row operations
//!
//! The `(book_id, user_id)` primary key is what makes "one rating per user
//! per book" hold under concurrent writers.

use chrono::{DateTime, Utc};
use shelf_common::models::Rating;
use shelf_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use uuid::Uuid;

use super::parse_guid;

pub async fn load_rating(
    conn: &mut SqliteConnection,
    book_id: Uuid,
    user_id: &str,
) -> Result<Option<Rating>> {
    let row = sqlx::query(
        r#"
        SELECT book_id, user_id, value, created_at, updated_at
        FROM ratings
        WHERE book_id = ? AND user_id = ?
        "#,
    )
    .bind(book_id.to_string())
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    row.as_ref().map(rating_from_row).transpose()
}

pub async fn insert_rating(conn: &mut SqliteConnection, rating: &Rating) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO ratings (book_id, user_id, value, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(rating.book_id.to_string())
    .bind(&rating.user_id)
    .bind(i64::from(rating.value))
    .bind(rating.created_at)
    .bind(rating.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Returns the number of rows changed (0 when the rating is gone)
pub async fn update_rating_value(
    conn: &mut SqliteConnection,
    book_id: Uuid,
    user_id: &str,
    value: u8,
    now: DateTime<Utc>,
) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE ratings SET value = ?, updated_at = ? WHERE book_id = ? AND user_id = ?",
    )
    .bind(i64::from(value))
    .bind(now)
    .bind(book_id.to_string())
    .bind(user_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

pub async fn delete_rating(conn: &mut SqliteConnection, book_id: Uuid, user_id: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM ratings WHERE book_id = ? AND user_id = ?")
        .bind(book_id.to_string())
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

/// All rating values of one book
pub async fn book_rating_values(conn: &mut SqliteConnection, book_id: Uuid) -> Result<Vec<u8>> {
    let values: Vec<i64> = sqlx::query_scalar("SELECT value FROM ratings WHERE book_id = ?")
        .bind(book_id.to_string())
        .fetch_all(&mut *conn)
        .await?;

    values.into_iter().map(to_rating_value).collect()
}

/// All rating values one user has given, across books
pub async fn user_rating_values(conn: &mut SqliteConnection, user_id: &str) -> Result<Vec<u8>> {
    let values: Vec<i64> = sqlx::query_scalar("SELECT value FROM ratings WHERE user_id = ?")
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

    values.into_iter().map(to_rating_value).collect()
}

/// Persist a recomputed average on the book row
pub async fn store_book_average(
    conn: &mut SqliteConnection,
    book_id: Uuid,
    avg_rating: f64,
) -> Result<()> {
    let result = sqlx::query("UPDATE books SET avg_rating = ? WHERE guid = ?")
        .bind(avg_rating)
        .bind(book_id.to_string())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("book {}", book_id)));
    }
    Ok(())
}

fn to_rating_value(raw: i64) -> Result<u8> {
    u8::try_from(raw).map_err(|_| Error::Internal(format!("stored rating out of range: {}", raw)))
}

fn rating_from_row(row: &SqliteRow) -> Result<Rating> {
    let book_id: String = row.try_get("book_id")?;

    Ok(Rating {
        book_id: parse_guid(&book_id)?,
        user_id: row.try_get("user_id")?,
        value: to_rating_value(row.try_get("value")?)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
