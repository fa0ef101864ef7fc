use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RestaurantRow {
    pub id: Uuid,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub price_category: i32,
    pub average_rating: Option<f64>,
    pub website: Option<String>,
    pub floor_plan_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RestaurantImageRow {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RestaurantTableRow {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub seats: i32,
    pub created_at: DateTime<Utc>,
}

/// Opening-hours interval of a restaurant, half-open `[timeslot_from, timeslot_to)`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TimeslotRow {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub timeslot_from: DateTime<Utc>,
    pub timeslot_to: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CommentRow {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ReservationRow {
    pub id: Uuid,
    pub reservation_from: DateTime<Utc>,
    pub reservation_to: DateTime<Utc>,
    pub user_name: String,
    pub user_email: String,
    pub confirmed: bool,
    #[serde(skip)]
    pub confirmation_token_hash: String,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub reminder_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One (reservation, table) pair together with the reservation interval.
/// Produced by the overlap query of the availability check.
#[derive(Debug, Clone, FromRow, PartialEq, Eq)]
pub struct BookedSlotRow {
    pub reservation_id: Uuid,
    pub table_id: Uuid,
    pub reservation_from: DateTime<Utc>,
    pub reservation_to: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ReservationTableRow {
    pub reservation_id: Uuid,
    pub table_id: Uuid,
}
