use crate::{models::RestaurantTableRow, pagination::LimitOffset};
use sqlx::{PgExecutor, Result as SqlxResult};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CreateRestaurantTable {
    pub restaurant_id: Uuid,
    pub seats: i32,
}

pub async fn create<'e>(
    executor: impl PgExecutor<'e>,
    data: CreateRestaurantTable,
) -> SqlxResult<RestaurantTableRow> {
    sqlx::query_as::<_, RestaurantTableRow>(
        r#"
        INSERT INTO restaurant_tables (restaurant_id, seats)
        VALUES ($1, $2)
        RETURNING id, restaurant_id, seats, created_at
        "#,
    )
    .bind(data.restaurant_id)
    .bind(data.seats)
    .fetch_one(executor)
    .await
}

pub async fn get_by_ids<'e>(
    executor: impl PgExecutor<'e>,
    ids: &[Uuid],
) -> SqlxResult<Vec<RestaurantTableRow>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, RestaurantTableRow>(
        r#"
        SELECT id, restaurant_id, seats, created_at
        FROM restaurant_tables
        WHERE id = ANY($1::uuid[])
        ORDER BY id ASC
        "#,
    )
    .bind(ids)
    .fetch_all(executor)
    .await
}

pub async fn list_by_restaurant<'e>(
    executor: impl PgExecutor<'e>,
    restaurant_id: Uuid,
    page: Option<LimitOffset>,
) -> SqlxResult<Vec<RestaurantTableRow>> {
    let p = page.unwrap_or_default();

    sqlx::query_as::<_, RestaurantTableRow>(
        r#"
        SELECT id, restaurant_id, seats, created_at
        FROM restaurant_tables
        WHERE restaurant_id = $1
        ORDER BY seats ASC, id ASC
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
    sqlx::query_scalar("SELECT COUNT(*) FROM restaurant_tables WHERE restaurant_id = $1")
        .bind(restaurant_id)
        .fetch_one(executor)
        .await
}
