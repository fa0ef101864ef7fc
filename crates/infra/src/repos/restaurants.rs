use crate::{models::RestaurantRow, pagination::LimitOffset};
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, Result as SqlxResult};
use uuid::Uuid;

const RESTAURANT_COLUMNS: &str = "r.id, r.name, r.latitude, r.longitude, r.price_category, \
     r.average_rating, r.website, r.floor_plan_url, r.created_at, r.updated_at";

/// Mean Earth radius in kilometres, used by the great-circle radius filter.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone)]
pub struct CreateRestaurant {
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub price_category: i32,
    pub website: Option<String>,
    pub floor_plan_url: Option<String>,
}

/// Search criteria; every field is optional and `None` disables that criterion.
#[derive(Debug, Clone, Default)]
pub struct RestaurantFilter {
    pub query: Option<String>,
    pub price_category: Option<i32>,
    pub minimum_average_rating: Option<f64>,
    pub number_of_visitors: Option<i32>,
    pub time_from: Option<DateTime<Utc>>,
    pub time_to: Option<DateTime<Utc>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_km: Option<f64>,
}

// A table is free for [$5, $6) when no reservation on it satisfies
// `reservation_from < $6 AND $5 < reservation_to`.
const SEARCH_PREDICATE: &str = r#"
    ($1::text IS NULL OR r.name ILIKE '%' || $1 || '%')
    AND ($2::int IS NULL OR r.price_category = $2)
    AND ($3::float8 IS NULL OR r.average_rating >= $3)
    AND ($4::int IS NULL OR t.seats >= $4)
    AND (
        $5::timestamptz IS NULL OR $6::timestamptz IS NULL
        OR NOT EXISTS (
            SELECT 1
            FROM reservation_tables rt
            JOIN reservations rs ON rs.id = rt.reservation_id
            WHERE rt.table_id = t.id
              AND rs.reservation_from < $6
              AND $5 < rs.reservation_to
        )
    )
    AND (
        r.latitude IS NULL OR r.longitude IS NULL
        OR $7::float8 IS NULL OR $8::float8 IS NULL OR $9::float8 IS NULL
        OR $9 >= $10 * acos(LEAST(1.0, GREATEST(-1.0,
            cos(radians($7)) * cos(radians(r.latitude))
            * cos(radians(r.longitude) - radians($8))
            + sin(radians($7)) * sin(radians(r.latitude))
        )))
    )
"#;

pub async fn create<'e>(
    executor: impl PgExecutor<'e>,
    data: CreateRestaurant,
) -> SqlxResult<RestaurantRow> {
    sqlx::query_as::<_, RestaurantRow>(
        r#"
        INSERT INTO restaurants (name, latitude, longitude, price_category, website, floor_plan_url)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, name, latitude, longitude, price_category, average_rating,
                  website, floor_plan_url, created_at, updated_at
        "#,
    )
    .bind(data.name)
    .bind(data.latitude)
    .bind(data.longitude)
    .bind(data.price_category)
    .bind(data.website)
    .bind(data.floor_plan_url)
    .fetch_one(executor)
    .await
}

pub async fn get_by_id<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<RestaurantRow>> {
    sqlx::query_as::<_, RestaurantRow>(&format!(
        "SELECT {RESTAURANT_COLUMNS} FROM restaurants r WHERE r.id = $1"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn get_by_ids<'e>(
    executor: impl PgExecutor<'e>,
    ids: &[Uuid],
) -> SqlxResult<Vec<RestaurantRow>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, RestaurantRow>(&format!(
        "SELECT {RESTAURANT_COLUMNS} FROM restaurants r WHERE r.id = ANY($1::uuid[])"
    ))
    .bind(ids)
    .fetch_all(executor)
    .await
}

pub async fn list<'e>(
    executor: impl PgExecutor<'e>,
    page: Option<LimitOffset>,
) -> SqlxResult<Vec<RestaurantRow>> {
    let p = page.unwrap_or_default();

    sqlx::query_as::<_, RestaurantRow>(&format!(
        "SELECT {RESTAURANT_COLUMNS} FROM restaurants r ORDER BY r.name ASC, r.id ASC LIMIT $1 OFFSET $2"
    ))
    .bind(p.limit)
    .bind(p.offset)
    .fetch_all(executor)
    .await
}

pub async fn count<'e>(executor: impl PgExecutor<'e>) -> SqlxResult<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM restaurants")
        .fetch_one(executor)
        .await
}

/// Filter restaurants. A restaurant matches when at least one of its tables
/// satisfies the seat and availability criteria.
pub async fn search<'e>(
    executor: impl PgExecutor<'e>,
    filter: RestaurantFilter,
    page: Option<LimitOffset>,
) -> SqlxResult<Vec<RestaurantRow>> {
    let p = page.unwrap_or_default();

    let sql = format!(
        r#"
        SELECT DISTINCT {RESTAURANT_COLUMNS}
        FROM restaurants r
        JOIN restaurant_tables t ON t.restaurant_id = r.id
        WHERE {SEARCH_PREDICATE}
        ORDER BY r.name ASC, r.id ASC
        LIMIT $11 OFFSET $12
        "#
    );

    sqlx::query_as::<_, RestaurantRow>(&sql)
        .bind(filter.query)
        .bind(filter.price_category)
        .bind(filter.minimum_average_rating)
        .bind(filter.number_of_visitors)
        .bind(filter.time_from)
        .bind(filter.time_to)
        .bind(filter.latitude)
        .bind(filter.longitude)
        .bind(filter.radius_km)
        .bind(EARTH_RADIUS_KM)
        .bind(p.limit)
        .bind(p.offset)
        .fetch_all(executor)
        .await
}

pub async fn count_search<'e>(
    executor: impl PgExecutor<'e>,
    filter: RestaurantFilter,
) -> SqlxResult<i64> {
    let sql = format!(
        r#"
        SELECT COUNT(DISTINCT r.id)
        FROM restaurants r
        JOIN restaurant_tables t ON t.restaurant_id = r.id
        WHERE {SEARCH_PREDICATE}
        "#
    );

    sqlx::query_scalar(&sql)
        .bind(filter.query)
        .bind(filter.price_category)
        .bind(filter.minimum_average_rating)
        .bind(filter.number_of_visitors)
        .bind(filter.time_from)
        .bind(filter.time_to)
        .bind(filter.latitude)
        .bind(filter.longitude)
        .bind(filter.radius_km)
        .bind(EARTH_RADIUS_KM)
        .fetch_one(executor)
        .await
}

/// Recompute `average_rating` from the restaurant's comments.
pub async fn refresh_average_rating<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> SqlxResult<Option<f64>> {
    sqlx::query_scalar::<_, Option<f64>>(
        r#"
        UPDATE restaurants
        SET average_rating = (
                SELECT AVG(rating)::float8 FROM comments WHERE restaurant_id = $1
            ),
            updated_at = NOW()
        WHERE id = $1
        RETURNING average_rating
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
    .map(Option::flatten)
}

/// Restaurant owning the tables of a reservation.
pub async fn get_for_reservation<'e>(
    executor: impl PgExecutor<'e>,
    reservation_id: Uuid,
) -> SqlxResult<Option<RestaurantRow>> {
    sqlx::query_as::<_, RestaurantRow>(&format!(
        r#"
        SELECT {RESTAURANT_COLUMNS}
        FROM restaurants r
        WHERE r.id = (
            SELECT t.restaurant_id
            FROM reservation_tables rt
            JOIN restaurant_tables t ON t.id = rt.table_id
            WHERE rt.reservation_id = $1
            LIMIT 1
        )
        "#
    ))
    .bind(reservation_id)
    .fetch_optional(executor)
    .await
}
