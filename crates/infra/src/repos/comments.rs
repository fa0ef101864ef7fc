use crate::{models::CommentRow, pagination::LimitOffset};
use sqlx::{PgExecutor, Result as SqlxResult};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CreateComment {
    pub restaurant_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub name: String,
}

pub async fn create<'e>(
    executor: impl PgExecutor<'e>,
    data: CreateComment,
) -> SqlxResult<CommentRow> {
    sqlx::query_as::<_, CommentRow>(
        r#"
        INSERT INTO comments (restaurant_id, rating, comment, name)
        VALUES ($1, $2, $3, $4)
        RETURNING id, restaurant_id, rating, comment, name, created_at
        "#,
    )
    .bind(data.restaurant_id)
    .bind(data.rating)
    .bind(data.comment)
    .bind(data.name)
    .fetch_one(executor)
    .await
}

pub async fn list_by_restaurant<'e>(
    executor: impl PgExecutor<'e>,
    restaurant_id: Uuid,
    page: Option<LimitOffset>,
) -> SqlxResult<Vec<CommentRow>> {
    let p = page.unwrap_or_default();

    sqlx::query_as::<_, CommentRow>(
        r#"
        SELECT id, restaurant_id, rating, comment, name, created_at
        FROM comments
        WHERE restaurant_id = $1
        ORDER BY created_at DESC, id ASC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(restaurant_id)
    .bind(p.limit)
    .bind(p.offset)
    .fetch_all(executor)
    .await
}

pub async fn count_by_restaurant<'e>(
    executor: impl PgExecutor<'e>,
    restaurant_id: Uuid,
) -> SqlxResult<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE restaurant_id = $1")
        .bind(restaurant_id)
        .fetch_one(executor)
        .await
}
