use crate::models::RestaurantImageRow;
use sqlx::{PgExecutor, Result as SqlxResult};
use uuid::Uuid;

pub async fn create<'e>(
    executor: impl PgExecutor<'e>,
    restaurant_id: Uuid,
    image_url: &str,
) -> SqlxResult<RestaurantImageRow> {
    sqlx::query_as::<_, RestaurantImageRow>(
        r#"
        INSERT INTO restaurant_images (restaurant_id, image_url)
        VALUES ($1, $2)
        RETURNING id, restaurant_id, image_url, created_at
        "#,
    )
    .bind(restaurant_id)
    .bind(image_url)
    .fetch_one(executor)
    .await
}

pub async fn list_by_restaurant<'e>(
    executor: impl PgExecutor<'e>,
    restaurant_id: Uuid,
) -> SqlxResult<Vec<RestaurantImageRow>> {
    sqlx::query_as::<_, RestaurantImageRow>(
        r#"
        SELECT id, restaurant_id, image_url, created_at
        FROM restaurant_images
        WHERE restaurant_id = $1
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(restaurant_id)
    .fetch_all(executor)
    .await
}

pub async fn list_by_restaurants<'e>(
    executor: impl PgExecutor<'e>,
    restaurant_ids: &[Uuid],
) -> SqlxResult<Vec<RestaurantImageRow>> {
    if restaurant_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, RestaurantImageRow>(
        r#"
        SELECT id, restaurant_id, image_url, created_at
        FROM restaurant_images
        WHERE restaurant_id = ANY($1::uuid[])
        ORDER BY restaurant_id ASC, created_at ASC, id ASC
        "#,
    )
    .bind(restaurant_ids)
    .fetch_all(executor)
    .await
}
