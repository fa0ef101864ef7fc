use crate::{
    models::{BookedSlotRow, ReservationRow, ReservationTableRow},
    pagination::LimitOffset,
};
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgExecutor, Result as SqlxResult};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CreateReservation {
    pub reservation_from: DateTime<Utc>,
    pub reservation_to: DateTime<Utc>,
    pub user_name: String,
    pub user_email: String,
    pub confirmation_token_hash: String,
}

pub async fn create<'e>(
    executor: impl PgExecutor<'e>,
    data: CreateReservation,
) -> SqlxResult<ReservationRow> {
    sqlx::query_as::<_, ReservationRow>(
        r#"
        INSERT INTO reservations (reservation_from, reservation_to, user_name, user_email, confirmation_token_hash)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, reservation_from, reservation_to, user_name, user_email, confirmed,
                  confirmation_token_hash, confirmed_at, reminder_sent_at, created_at, updated_at
        "#,
    )
    .bind(data.reservation_from)
    .bind(data.reservation_to)
    .bind(data.user_name)
    .bind(data.user_email)
    .bind(data.confirmation_token_hash)
    .fetch_one(executor)
    .await
}

pub async fn attach_tables<'e>(
    executor: impl PgExecutor<'e>,
    reservation_id: Uuid,
    table_ids: &[Uuid],
) -> SqlxResult<u64> {
    let result = sqlx::query(
        r#"
        INSERT INTO reservation_tables (reservation_id, table_id)
        SELECT $1, table_id FROM unnest($2::uuid[]) AS table_id
        "#,
    )
    .bind(reservation_id)
    .bind(table_ids)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

pub async fn get_by_id<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<ReservationRow>> {
    sqlx::query_as::<_, ReservationRow>(
        r#"
        SELECT id, reservation_from, reservation_to, user_name, user_email, confirmed,
               confirmation_token_hash, confirmed_at, reminder_sent_at, created_at, updated_at
        FROM reservations
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Same as [`get_by_id`] but holds a row lock until the transaction ends.
pub async fn get_for_update<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<ReservationRow>> {
    sqlx::query_as::<_, ReservationRow>(
        r#"
        SELECT id, reservation_from, reservation_to, user_name, user_email, confirmed,
               confirmation_token_hash, confirmed_at, reminder_sent_at, created_at, updated_at
        FROM reservations
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn table_ids<'e>(
    executor: impl PgExecutor<'e>,
    reservation_id: Uuid,
) -> SqlxResult<Vec<Uuid>> {
    sqlx::query_scalar(
        r#"
        SELECT table_id
        FROM reservation_tables
        WHERE reservation_id = $1
        ORDER BY table_id ASC
        "#,
    )
    .bind(reservation_id)
    .fetch_all(executor)
    .await
}

pub async fn table_ids_for_many<'e>(
    executor: impl PgExecutor<'e>,
    reservation_ids: &[Uuid],
) -> SqlxResult<Vec<ReservationTableRow>> {
    if reservation_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, ReservationTableRow>(
        r#"
        SELECT reservation_id, table_id
        FROM reservation_tables
        WHERE reservation_id = ANY($1::uuid[])
        ORDER BY reservation_id ASC, table_id ASC
        "#,
    )
    .bind(reservation_ids)
    .fetch_all(executor)
    .await
}

/// Advisory lock key for a table. Collisions only serialize unrelated tables.
pub fn table_lock_key(table_id: Uuid) -> i64 {
    let (hi, lo) = table_id.as_u64_pair();
    (hi ^ lo) as i64
}

/// Take a transaction-scoped advisory lock on every table, in ascending key
/// order so concurrent bookings of overlapping table sets cannot deadlock.
pub async fn lock_tables(conn: &mut PgConnection, table_ids: &[Uuid]) -> SqlxResult<()> {
    let mut keys: Vec<i64> = table_ids.iter().copied().map(table_lock_key).collect();
    keys.sort_unstable();
    keys.dedup();

    for key in keys {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(key)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

/// Every (reservation, table) pair on one of `table_ids` whose interval
/// overlaps the half-open interval `[from, to)`.
pub async fn find_overlapping<'e>(
    executor: impl PgExecutor<'e>,
    table_ids: &[Uuid],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> SqlxResult<Vec<BookedSlotRow>> {
    if table_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, BookedSlotRow>(
        r#"
        SELECT rs.id AS reservation_id, rt.table_id, rs.reservation_from, rs.reservation_to
        FROM reservations rs
        JOIN reservation_tables rt ON rt.reservation_id = rs.id
        WHERE rt.table_id = ANY($1::uuid[])
          AND rs.reservation_from < $3
          AND $2 < rs.reservation_to
        ORDER BY rt.table_id ASC, rs.reservation_from ASC
        "#,
    )
    .bind(table_ids)
    .bind(from)
    .bind(to)
    .fetch_all(executor)
    .await
}

/// Flip `confirmed` to true. Returns `None` when the row is missing or was
/// already confirmed.
pub async fn mark_confirmed<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<ReservationRow>> {
    sqlx::query_as::<_, ReservationRow>(
        r#"
        UPDATE reservations
        SET confirmed = TRUE, confirmed_at = NOW(), updated_at = NOW()
        WHERE id = $1 AND confirmed = FALSE
        RETURNING id, reservation_from, reservation_to, user_name, user_email, confirmed,
                  confirmation_token_hash, confirmed_at, reminder_sent_at, created_at, updated_at
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn delete<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<ReservationRow>> {
    sqlx::query_as::<_, ReservationRow>(
        r#"
        DELETE FROM reservations
        WHERE id = $1
        RETURNING id, reservation_from, reservation_to, user_name, user_email, confirmed,
                  confirmation_token_hash, confirmed_at, reminder_sent_at, created_at, updated_at
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Reservations on tables of a restaurant lying entirely within `[from, to]`.
pub async fn list_for_restaurant_within<'e>(
    executor: impl PgExecutor<'e>,
    restaurant_id: Uuid,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    page: Option<LimitOffset>,
) -> SqlxResult<Vec<ReservationRow>> {
    let p = page.unwrap_or_default();

    sqlx::query_as::<_, ReservationRow>(
        r#"
        SELECT rs.id, rs.reservation_from, rs.reservation_to, rs.user_name, rs.user_email,
               rs.confirmed, rs.confirmation_token_hash, rs.confirmed_at, rs.reminder_sent_at,
               rs.created_at, rs.updated_at
        FROM reservations rs
        WHERE EXISTS (
                SELECT 1
                FROM reservation_tables rt
                JOIN restaurant_tables t ON t.id = rt.table_id
                WHERE rt.reservation_id = rs.id AND t.restaurant_id = $1
            )
          AND rs.reservation_from >= $2
          AND rs.reservation_to <= $3
        ORDER BY rs.reservation_from ASC, rs.id ASC
        LIMIT $4 OFFSET $5
        "#,
    )
    .bind(restaurant_id)
    .bind(from)
    .bind(to)
    .bind(p.limit)
    .bind(p.offset)
    .fetch_all(executor)
    .await
}

pub async fn count_for_restaurant_within<'e>(
    executor: impl PgExecutor<'e>,
    restaurant_id: Uuid,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> SqlxResult<i64> {
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM reservations rs
        WHERE EXISTS (
                SELECT 1
                FROM reservation_tables rt
                JOIN restaurant_tables t ON t.id = rt.table_id
                WHERE rt.reservation_id = rs.id AND t.restaurant_id = $1
            )
          AND rs.reservation_from >= $2
          AND rs.reservation_to <= $3
        "#,
    )
    .bind(restaurant_id)
    .bind(from)
    .bind(to)
    .fetch_one(executor)
    .await
}

/// Confirmed, not yet reminded reservations starting between now and `until`.
pub async fn list_due_for_reminder<'e>(
    executor: impl PgExecutor<'e>,
    until: DateTime<Utc>,
) -> SqlxResult<Vec<ReservationRow>> {
    sqlx::query_as::<_, ReservationRow>(
        r#"
        SELECT id, reservation_from, reservation_to, user_name, user_email, confirmed,
               confirmation_token_hash, confirmed_at, reminder_sent_at, created_at, updated_at
        FROM reservations
        WHERE confirmed = TRUE
          AND reminder_sent_at IS NULL
          AND reservation_from > NOW()
          AND reservation_from <= $1
        ORDER BY reservation_from ASC
        "#,
    )
    .bind(until)
    .fetch_all(executor)
    .await
}

pub async fn mark_reminder_sent<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> SqlxResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE reservations
        SET reminder_sent_at = NOW(), updated_at = NOW()
        WHERE id = $1 AND reminder_sent_at IS NULL
        "#,
    )
    .bind(id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}
