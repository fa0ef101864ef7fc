use crate::models::TimeslotRow;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, Result as SqlxResult};
use uuid::Uuid;

pub async fn create<'e>(
    executor: impl PgExecutor<'e>,
    restaurant_id: Uuid,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> SqlxResult<TimeslotRow> {
    sqlx::query_as::<_, TimeslotRow>(
        r#"
        INSERT INTO opening_hours (restaurant_id, timeslot_from, timeslot_to)
        VALUES ($1, $2, $3)
        RETURNING id, restaurant_id, timeslot_from, timeslot_to
        "#,
    )
    .bind(restaurant_id)
    .bind(from)
    .bind(to)
    .fetch_one(executor)
    .await
}

pub async fn list_by_restaurant<'e>(
    executor: impl PgExecutor<'e>,
    restaurant_id: Uuid,
) -> SqlxResult<Vec<TimeslotRow>> {
    sqlx::query_as::<_, TimeslotRow>(
        r#"
        SELECT id, restaurant_id, timeslot_from, timeslot_to
        FROM opening_hours
        WHERE restaurant_id = $1
        ORDER BY timeslot_from ASC
        "#,
    )
    .bind(restaurant_id)
    .fetch_all(executor)
    .await
}

/// Timeslots lying entirely inside `[from, to]`.
pub async fn list_within<'e>(
    executor: impl PgExecutor<'e>,
    restaurant_id: Uuid,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> SqlxResult<Vec<TimeslotRow>> {
    sqlx::query_as::<_, TimeslotRow>(
        r#"
        SELECT id, restaurant_id, timeslot_from, timeslot_to
        FROM opening_hours
        WHERE restaurant_id = $1
          AND timeslot_from >= $2
          AND timeslot_to <= $3
        ORDER BY timeslot_from ASC
        "#,
    )
    .bind(restaurant_id)
    .bind(from)
    .bind(to)
    .fetch_all(executor)
    .await
}
